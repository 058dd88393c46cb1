use rmcp::model::{CallToolResult, ErrorData};
use rmcp::schemars;
use serde::Deserialize;

use crate::server::{text_result, RedisMcpServer};

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetStringParams {
    #[schemars(description = "The key to set")]
    pub key: String,

    #[schemars(description = "The value to store")]
    pub value: String,

    #[schemars(description = "Expiration time in seconds")]
    #[serde(default)]
    pub expiration: Option<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetStringParams {
    #[schemars(description = "The key to retrieve")]
    pub key: String,
}

impl RedisMcpServer {
    pub async fn do_set(&self, params: SetStringParams) -> Result<CallToolResult, ErrorData> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };

        let result: Result<(), redis::RedisError> = match params.expiration {
            Some(seconds) => {
                redis::cmd("SETEX")
                    .arg(&params.key)
                    .arg(seconds)
                    .arg(&params.value)
                    .query_async(&mut conn)
                    .await
            }
            None => {
                redis::cmd("SET")
                    .arg(&params.key)
                    .arg(&params.value)
                    .query_async(&mut conn)
                    .await
            }
        };

        Ok(match result {
            Ok(()) => match params.expiration {
                Some(seconds) => text_result(format!(
                    "Successfully set {} with expiration {} seconds",
                    params.key, seconds
                )),
                None => text_result(format!("Successfully set {}", params.key)),
            },
            Err(e) => text_result(format!("Error setting key {}: {}", params.key, e)),
        })
    }

    pub async fn do_get(&self, params: GetStringParams) -> Result<CallToolResult, ErrorData> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };

        let result: Result<Option<String>, redis::RedisError> = redis::cmd("GET")
            .arg(&params.key)
            .query_async(&mut conn)
            .await;

        Ok(match result {
            // This tool reports an empty value and a missing key
            // identically; callers cannot tell the two apart.
            Ok(Some(value)) if !value.is_empty() => text_result(value),
            Ok(_) => text_result(format!("Key {} does not exist", params.key)),
            Err(e) => text_result(format!("Error retrieving key {}: {}", params.key, e)),
        })
    }
}
