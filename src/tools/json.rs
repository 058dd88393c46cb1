//! RedisJSON commands, issued through the raw command interface. The
//! JSON module is optional server-side; a missing module surfaces as a
//! descriptive error result like any other command failure.

use rmcp::model::{CallToolResult, ErrorData};
use rmcp::schemars;
use serde::Deserialize;

use crate::server::{text_result, RedisMcpServer};

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct JsonSetParams {
    #[schemars(description = "The Redis key holding the JSON document")]
    pub name: String,

    #[schemars(description = "JSONPath to set (default: $)")]
    #[serde(default)]
    pub path: Option<String>,

    #[schemars(description = "The JSON value to store")]
    pub value: serde_json::Value,

    #[schemars(description = "Expiration time for the key in seconds")]
    #[serde(default)]
    pub expiration: Option<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct JsonPathParams {
    #[schemars(description = "The Redis key holding the JSON document")]
    pub name: String,

    #[schemars(description = "JSONPath to operate on (default: $)")]
    #[serde(default)]
    pub path: Option<String>,
}

impl RedisMcpServer {
    pub async fn do_json_set(&self, params: JsonSetParams) -> Result<CallToolResult, ErrorData> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };
        let path = params.path.as_deref().unwrap_or("$");
        let payload = params.value.to_string();

        let result: Result<(), redis::RedisError> = redis::cmd("JSON.SET")
            .arg(&params.name)
            .arg(path)
            .arg(&payload)
            .query_async(&mut conn)
            .await;
        if let Err(e) = result {
            return Ok(text_result(format!(
                "Error setting JSON value at path '{}' in '{}': {}",
                path, params.name, e
            )));
        }

        if let Some(seconds) = params.expiration {
            let result: Result<i64, redis::RedisError> = redis::cmd("EXPIRE")
                .arg(&params.name)
                .arg(seconds)
                .query_async(&mut conn)
                .await;
            if let Err(e) = result {
                return Ok(text_result(format!(
                    "Error setting expiration on '{}': {}",
                    params.name, e
                )));
            }
        }

        Ok(text_result(format!(
            "JSON value set at path '{}' in '{}'.",
            path, params.name
        )))
    }

    pub async fn do_json_get(&self, params: JsonPathParams) -> Result<CallToolResult, ErrorData> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };
        let path = params.path.as_deref().unwrap_or("$");

        let result: Result<Option<String>, redis::RedisError> = redis::cmd("JSON.GET")
            .arg(&params.name)
            .arg(path)
            .query_async(&mut conn)
            .await;

        Ok(match result {
            Ok(Some(value)) => text_result(value),
            Ok(None) => text_result(format!(
                "No JSON value found at path '{}' in '{}'",
                path, params.name
            )),
            Err(e) => text_result(format!(
                "Error retrieving JSON value at path '{}' in '{}': {}",
                path, params.name, e
            )),
        })
    }

    pub async fn do_json_del(&self, params: JsonPathParams) -> Result<CallToolResult, ErrorData> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };
        let path = params.path.as_deref().unwrap_or("$");

        let result: Result<i64, redis::RedisError> = redis::cmd("JSON.DEL")
            .arg(&params.name)
            .arg(path)
            .query_async(&mut conn)
            .await;

        Ok(match result {
            Ok(deleted) if deleted > 0 => text_result(format!(
                "Deleted JSON value at path '{}' in '{}'.",
                path, params.name
            )),
            Ok(_) => text_result(format!(
                "No JSON value found at path '{}' in '{}'",
                path, params.name
            )),
            Err(e) => text_result(format!(
                "Error deleting JSON value at path '{}' in '{}': {}",
                path, params.name, e
            )),
        })
    }
}
