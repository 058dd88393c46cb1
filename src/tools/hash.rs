use rmcp::model::{CallToolResult, ErrorData};
use rmcp::schemars;
use serde::Deserialize;

use crate::server::{json_result, text_result, RedisMcpServer};

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct HashFieldValueParams {
    #[schemars(description = "The Redis hash key")]
    pub name: String,

    #[schemars(description = "The field name inside the hash")]
    pub key: String,

    #[schemars(description = "The value to set")]
    pub value: String,

    #[schemars(description = "Expiration time for the hash key in seconds")]
    #[serde(default)]
    pub expire_seconds: Option<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct HashFieldParams {
    #[schemars(description = "The Redis hash key")]
    pub name: String,

    #[schemars(description = "The field name inside the hash")]
    pub key: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct HashParams {
    #[schemars(description = "The Redis hash key")]
    pub name: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetVectorParams {
    #[schemars(description = "The Redis hash key")]
    pub name: String,

    #[schemars(description = "The vector to store, as a list of numbers")]
    pub vector: Vec<f64>,

    #[schemars(description = "The hash field holding the vector (default: vector)")]
    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetVectorParams {
    #[schemars(description = "The Redis hash key")]
    pub name: String,

    #[schemars(description = "The hash field holding the vector (default: vector)")]
    #[serde(default)]
    pub key: Option<String>,
}

/// Vectors are stored the way the search engine indexes them: packed
/// 32-bit little-endian floats.
pub(crate) fn pack_vector(values: &[f64]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(values.len() * 4);
    for value in values {
        bytes.extend_from_slice(&(*value as f32).to_le_bytes());
    }
    bytes
}

pub(crate) fn unpack_vector(bytes: &[u8]) -> Option<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect(),
    )
}

impl RedisMcpServer {
    pub async fn do_hset(&self, params: HashFieldValueParams) -> Result<CallToolResult, ErrorData> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };

        let result: Result<(), redis::RedisError> = redis::cmd("HSET")
            .arg(&params.name)
            .arg(&params.key)
            .arg(&params.value)
            .query_async(&mut conn)
            .await;
        if let Err(e) = result {
            return Ok(text_result(format!(
                "Error setting field '{}' in hash '{}': {}",
                params.key, params.name, e
            )));
        }

        if let Some(seconds) = params.expire_seconds {
            let result: Result<i64, redis::RedisError> = redis::cmd("EXPIRE")
                .arg(&params.name)
                .arg(seconds)
                .query_async(&mut conn)
                .await;
            if let Err(e) = result {
                return Ok(text_result(format!(
                    "Error setting expiration on hash '{}': {}",
                    params.name, e
                )));
            }
        }

        Ok(text_result(format!(
            "Field '{}' set successfully in hash '{}'.",
            params.key, params.name
        )))
    }

    pub async fn do_hget(&self, params: HashFieldParams) -> Result<CallToolResult, ErrorData> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };

        let result: Result<Option<String>, redis::RedisError> = redis::cmd("HGET")
            .arg(&params.name)
            .arg(&params.key)
            .query_async(&mut conn)
            .await;

        Ok(match result {
            Ok(Some(value)) => text_result(value),
            Ok(None) => text_result(format!(
                "Field '{}' not found in hash '{}'.",
                params.key, params.name
            )),
            Err(e) => text_result(format!(
                "Error getting field '{}' from hash '{}': {}",
                params.key, params.name, e
            )),
        })
    }

    pub async fn do_hdel(&self, params: HashFieldParams) -> Result<CallToolResult, ErrorData> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };

        let result: Result<i64, redis::RedisError> = redis::cmd("HDEL")
            .arg(&params.name)
            .arg(&params.key)
            .query_async(&mut conn)
            .await;

        Ok(match result {
            Ok(deleted) if deleted > 0 => text_result(format!(
                "Field '{}' deleted from hash '{}'.",
                params.key, params.name
            )),
            Ok(_) => text_result(format!(
                "Field '{}' not found in hash '{}'.",
                params.key, params.name
            )),
            Err(e) => text_result(format!(
                "Error deleting field '{}' from hash '{}': {}",
                params.key, params.name, e
            )),
        })
    }

    pub async fn do_hgetall(&self, params: HashParams) -> Result<CallToolResult, ErrorData> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };

        let result: Result<Vec<(String, String)>, redis::RedisError> = redis::cmd("HGETALL")
            .arg(&params.name)
            .query_async(&mut conn)
            .await;

        Ok(match result {
            Ok(fields) if fields.is_empty() => text_result(format!(
                "Hash '{}' is empty or does not exist.",
                params.name
            )),
            Ok(fields) => {
                let map: serde_json::Map<String, serde_json::Value> = fields
                    .into_iter()
                    .map(|(field, value)| (field, serde_json::Value::String(value)))
                    .collect();
                json_result(&serde_json::Value::Object(map))
            }
            Err(e) => text_result(format!(
                "Error getting all fields from hash '{}': {}",
                params.name, e
            )),
        })
    }

    pub async fn do_hexists(&self, params: HashFieldParams) -> Result<CallToolResult, ErrorData> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };

        let result: Result<bool, redis::RedisError> = redis::cmd("HEXISTS")
            .arg(&params.name)
            .arg(&params.key)
            .query_async(&mut conn)
            .await;

        Ok(match result {
            Ok(exists) => text_result(exists.to_string()),
            Err(e) => text_result(format!(
                "Error checking existence of field '{}' in hash '{}': {}",
                params.key, params.name, e
            )),
        })
    }

    pub async fn do_set_vector_in_hash(
        &self,
        params: SetVectorParams,
    ) -> Result<CallToolResult, ErrorData> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };
        let field = params.key.as_deref().unwrap_or("vector");

        let result: Result<(), redis::RedisError> = redis::cmd("HSET")
            .arg(&params.name)
            .arg(field)
            .arg(pack_vector(&params.vector))
            .query_async(&mut conn)
            .await;

        Ok(match result {
            Ok(()) => text_result(format!(
                "Vector of {} dimensions stored in hash '{}' field '{}'.",
                params.vector.len(),
                params.name,
                field
            )),
            Err(e) => text_result(format!(
                "Error storing vector in hash '{}': {}",
                params.name, e
            )),
        })
    }

    pub async fn do_get_vector_from_hash(
        &self,
        params: GetVectorParams,
    ) -> Result<CallToolResult, ErrorData> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };
        let field = params.key.as_deref().unwrap_or("vector");

        let result: Result<Option<Vec<u8>>, redis::RedisError> = redis::cmd("HGET")
            .arg(&params.name)
            .arg(field)
            .query_async(&mut conn)
            .await;

        Ok(match result {
            Ok(Some(bytes)) => match unpack_vector(&bytes) {
                Some(vector) => json_result(&serde_json::json!(vector)),
                None => text_result(format!(
                    "Field '{}' in hash '{}' does not hold a packed float32 vector.",
                    field, params.name
                )),
            },
            Ok(None) => text_result(format!(
                "Field '{}' not found in hash '{}'.",
                field, params.name
            )),
            Err(e) => text_result(format!(
                "Error retrieving vector from hash '{}': {}",
                params.name, e
            )),
        })
    }
}
