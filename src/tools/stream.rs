use std::collections::HashMap;

use rmcp::model::{CallToolResult, ErrorData};
use rmcp::schemars;
use serde::Deserialize;

use crate::server::{json_result, text_result, RedisMcpServer};

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct XAddParams {
    #[schemars(description = "The Redis stream key")]
    pub key: String,

    #[schemars(description = "Field-value pairs for the stream entry")]
    pub fields: HashMap<String, String>,

    #[schemars(description = "Expiration time for the stream key in seconds")]
    #[serde(default)]
    pub expiration: Option<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct XRangeParams {
    #[schemars(description = "The Redis stream key")]
    pub key: String,

    #[schemars(description = "Maximum number of entries to return (default: 1)")]
    #[serde(default)]
    pub count: Option<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct XDelParams {
    #[schemars(description = "The Redis stream key")]
    pub key: String,

    #[schemars(description = "The stream entry ID to delete")]
    pub entry_id: String,
}

impl RedisMcpServer {
    pub async fn do_xadd(&self, params: XAddParams) -> Result<CallToolResult, ErrorData> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };
        if params.fields.is_empty() {
            return Ok(text_result(format!(
                "Error adding to stream {}: at least one field is required",
                params.key
            )));
        }

        let mut cmd = redis::cmd("XADD");
        cmd.arg(&params.key).arg("*");
        for (field, value) in &params.fields {
            cmd.arg(field).arg(value);
        }

        let result: Result<String, redis::RedisError> = cmd.query_async(&mut conn).await;
        let entry_id = match result {
            Ok(id) => id,
            Err(e) => {
                return Ok(text_result(format!(
                    "Error adding to stream {}: {}",
                    params.key, e
                )))
            }
        };

        if let Some(seconds) = params.expiration {
            let result: Result<i64, redis::RedisError> = redis::cmd("EXPIRE")
                .arg(&params.key)
                .arg(seconds)
                .query_async(&mut conn)
                .await;
            if let Err(e) = result {
                return Ok(text_result(format!(
                    "Error setting expiration on stream {}: {}",
                    params.key, e
                )));
            }
        }

        Ok(text_result(format!(
            "Successfully added entry {} to {}",
            entry_id, params.key
        )))
    }

    pub async fn do_xrange(&self, params: XRangeParams) -> Result<CallToolResult, ErrorData> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };
        let count = params.count.unwrap_or(1);

        let result: Result<Vec<(String, Vec<(String, String)>)>, redis::RedisError> =
            redis::cmd("XRANGE")
                .arg(&params.key)
                .arg("-")
                .arg("+")
                .arg("COUNT")
                .arg(count)
                .query_async(&mut conn)
                .await;

        Ok(match result {
            Ok(entries) if entries.is_empty() => {
                text_result(format!("Stream {} is empty or does not exist", params.key))
            }
            Ok(entries) => {
                let shaped: Vec<serde_json::Value> = entries
                    .into_iter()
                    .map(|(id, fields)| {
                        let map: serde_json::Map<String, serde_json::Value> = fields
                            .into_iter()
                            .map(|(field, value)| (field, serde_json::Value::String(value)))
                            .collect();
                        serde_json::json!({"id": id, "fields": map})
                    })
                    .collect();
                json_result(&serde_json::json!(shaped))
            }
            Err(e) => text_result(format!("Error reading stream {}: {}", params.key, e)),
        })
    }

    pub async fn do_xdel(&self, params: XDelParams) -> Result<CallToolResult, ErrorData> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };

        let result: Result<i64, redis::RedisError> = redis::cmd("XDEL")
            .arg(&params.key)
            .arg(&params.entry_id)
            .query_async(&mut conn)
            .await;

        Ok(match result {
            Ok(deleted) if deleted > 0 => text_result(format!(
                "Successfully deleted entry {} from {}",
                params.entry_id, params.key
            )),
            Ok(_) => text_result(format!(
                "Entry {} not found in stream {}",
                params.entry_id, params.key
            )),
            Err(e) => text_result(format!(
                "Error deleting from stream {}: {}",
                params.key, e
            )),
        })
    }
}
