//! RediSearch index management and KNN vector search (FT.* commands).

use rmcp::model::{CallToolResult, ErrorData};
use rmcp::schemars;
use serde::Deserialize;

use crate::server::{json_result, text_result, value_to_json, RedisMcpServer};
use crate::tools::hash::pack_vector;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct IndexInfoParams {
    #[schemars(description = "The index name (default: vector_index)")]
    #[serde(default)]
    pub index_name: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateVectorIndexParams {
    #[schemars(description = "The index name (default: vector_index)")]
    #[serde(default)]
    pub index_name: Option<String>,

    #[schemars(description = "Key prefix the index covers (default: doc:)")]
    #[serde(default)]
    pub prefix: Option<String>,

    #[schemars(description = "The hash field holding the vector (default: vector)")]
    #[serde(default)]
    pub vector_field: Option<String>,

    #[schemars(description = "Vector dimensionality (default: 1536)")]
    #[serde(default)]
    pub dim: Option<u32>,

    #[schemars(description = "Distance metric: COSINE, L2, or IP (default: COSINE)")]
    #[serde(default)]
    pub distance_metric: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct VectorSearchParams {
    #[schemars(description = "The query vector, as a list of numbers")]
    pub query_vector: Vec<f64>,

    #[schemars(description = "The index name (default: vector_index)")]
    #[serde(default)]
    pub index_name: Option<String>,

    #[schemars(description = "The hash field holding the vector (default: vector)")]
    #[serde(default)]
    pub vector_field: Option<String>,

    #[schemars(description = "Number of nearest neighbors to return (default: 10)")]
    #[serde(default)]
    pub k: Option<u32>,

    #[schemars(description = "Hash fields to return (default: all)")]
    #[serde(default)]
    pub return_fields: Option<Vec<String>>,
}

/// FT.SEARCH replies are a flat array: total count, then alternating key
/// and field-value array. Anything else is rendered as-is.
fn search_reply_to_json(value: redis::Value) -> serde_json::Value {
    let redis::Value::Array(items) = value else {
        return value_to_json(value);
    };
    let mut iter = items.into_iter();
    let total = match iter.next() {
        Some(redis::Value::Int(n)) => n,
        Some(other) => return value_to_json(other),
        None => return serde_json::json!({"total": 0, "results": []}),
    };

    let mut results = Vec::new();
    while let Some(key) = iter.next() {
        let key = value_to_json(key);
        let fields = match iter.next() {
            Some(redis::Value::Array(pairs)) => {
                let mut map = serde_json::Map::new();
                let mut pair_iter = pairs.into_iter();
                while let (Some(field), Some(value)) = (pair_iter.next(), pair_iter.next()) {
                    let field = match value_to_json(field) {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    };
                    map.insert(field, value_to_json(value));
                }
                serde_json::Value::Object(map)
            }
            Some(other) => value_to_json(other),
            None => serde_json::Value::Null,
        };
        results.push(serde_json::json!({"key": key, "fields": fields}));
    }

    serde_json::json!({"total": total, "results": results})
}

impl RedisMcpServer {
    pub async fn do_get_indexes(&self) -> Result<CallToolResult, ErrorData> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };

        let result: Result<Vec<String>, redis::RedisError> =
            redis::cmd("FT._LIST").query_async(&mut conn).await;

        Ok(match result {
            Ok(indexes) => json_result(&serde_json::json!(indexes)),
            Err(e) => text_result(format!("Error retrieving indexes: {}", e)),
        })
    }

    pub async fn do_get_index_info(
        &self,
        params: IndexInfoParams,
    ) -> Result<CallToolResult, ErrorData> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };
        let index = params.index_name.as_deref().unwrap_or("vector_index");

        let result: Result<redis::Value, redis::RedisError> = redis::cmd("FT.INFO")
            .arg(index)
            .query_async(&mut conn)
            .await;

        Ok(match result {
            Ok(value) => json_result(&flat_pairs_to_json(value)),
            Err(e) => text_result(format!("Error retrieving info for index {}: {}", index, e)),
        })
    }

    pub async fn do_get_indexed_keys_number(
        &self,
        params: IndexInfoParams,
    ) -> Result<CallToolResult, ErrorData> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };
        let index = params.index_name.as_deref().unwrap_or("vector_index");

        let result: Result<redis::Value, redis::RedisError> = redis::cmd("FT.INFO")
            .arg(index)
            .query_async(&mut conn)
            .await;

        Ok(match result {
            Ok(value) => match flat_pairs_to_json(value).get("num_docs") {
                Some(num_docs) => json_result(&serde_json::json!({
                    "index": index,
                    "num_docs": num_docs,
                })),
                None => text_result(format!(
                    "Index {} reported no num_docs field",
                    index
                )),
            },
            Err(e) => text_result(format!(
                "Error retrieving indexed keys number for {}: {}",
                index, e
            )),
        })
    }

    pub async fn do_create_vector_index_hash(
        &self,
        params: CreateVectorIndexParams,
    ) -> Result<CallToolResult, ErrorData> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };
        let index = params.index_name.as_deref().unwrap_or("vector_index");
        let prefix = params.prefix.as_deref().unwrap_or("doc:");
        let field = params.vector_field.as_deref().unwrap_or("vector");
        let dim = params.dim.unwrap_or(1536);
        let metric = params
            .distance_metric
            .as_deref()
            .unwrap_or("COSINE")
            .to_ascii_uppercase();

        let result: Result<(), redis::RedisError> = redis::cmd("FT.CREATE")
            .arg(index)
            .arg("ON")
            .arg("HASH")
            .arg("PREFIX")
            .arg(1)
            .arg(prefix)
            .arg("SCHEMA")
            .arg(field)
            .arg("VECTOR")
            .arg("FLAT")
            .arg(6)
            .arg("TYPE")
            .arg("FLOAT32")
            .arg("DIM")
            .arg(dim)
            .arg("DISTANCE_METRIC")
            .arg(&metric)
            .query_async(&mut conn)
            .await;

        Ok(match result {
            Ok(()) => text_result(format!(
                "Index '{}' created on prefix '{}' ({} dimensions, {}).",
                index, prefix, dim, metric
            )),
            Err(e) => text_result(format!("Error creating index {}: {}", index, e)),
        })
    }

    pub async fn do_vector_search_hash(
        &self,
        params: VectorSearchParams,
    ) -> Result<CallToolResult, ErrorData> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };
        let index = params.index_name.as_deref().unwrap_or("vector_index");
        let field = params.vector_field.as_deref().unwrap_or("vector");
        let k = params.k.unwrap_or(10);

        let query = format!("*=>[KNN {} @{} $vec AS vector_score]", k, field);
        let mut cmd = redis::cmd("FT.SEARCH");
        cmd.arg(index)
            .arg(&query)
            .arg("SORTBY")
            .arg("vector_score")
            .arg("PARAMS")
            .arg(2)
            .arg("vec")
            .arg(pack_vector(&params.query_vector));
        if let Some(fields) = &params.return_fields {
            cmd.arg("RETURN").arg(fields.len());
            for name in fields {
                cmd.arg(name);
            }
        }
        cmd.arg("DIALECT").arg(2);

        let result: Result<redis::Value, redis::RedisError> = cmd.query_async(&mut conn).await;
        Ok(match result {
            Ok(value) => json_result(&search_reply_to_json(value)),
            Err(e) => text_result(format!("Error searching index {}: {}", index, e)),
        })
    }
}

/// Render a flat `[key, value, ...]` reply (FT.INFO shape) as an object.
fn flat_pairs_to_json(value: redis::Value) -> serde_json::Value {
    match value {
        redis::Value::Array(items) => {
            let mut map = serde_json::Map::new();
            let mut iter = items.into_iter();
            while let (Some(key), Some(value)) = (iter.next(), iter.next()) {
                let key = match value_to_json(key) {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                map.insert(key, value_to_json(value));
            }
            serde_json::Value::Object(map)
        }
        other => value_to_json(other),
    }
}
