use rmcp::model::{CallToolResult, ErrorData};
use rmcp::schemars;
use serde::Deserialize;

use crate::server::{json_result, text_result, RedisMcpServer};

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetMemberParams {
    #[schemars(description = "The Redis set key")]
    pub name: String,

    #[schemars(description = "The member value")]
    pub value: String,

    #[schemars(description = "Expiration time for the set key in seconds")]
    #[serde(default)]
    pub expire_seconds: Option<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetParams {
    #[schemars(description = "The Redis set key")]
    pub name: String,
}

impl RedisMcpServer {
    pub async fn do_sadd(&self, params: SetMemberParams) -> Result<CallToolResult, ErrorData> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };

        let result: Result<i64, redis::RedisError> = redis::cmd("SADD")
            .arg(&params.name)
            .arg(&params.value)
            .query_async(&mut conn)
            .await;
        if let Err(e) = result {
            return Ok(text_result(format!(
                "Error adding member to set '{}': {}",
                params.name, e
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
                    "Error setting expiration on set '{}': {}",
                    params.name, e
                )));
            }
        }

        Ok(text_result(format!(
            "Value '{}' added to set '{}'.",
            params.value, params.name
        )))
    }

    pub async fn do_srem(&self, params: SetMemberParams) -> Result<CallToolResult, ErrorData> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };

        let result: Result<i64, redis::RedisError> = redis::cmd("SREM")
            .arg(&params.name)
            .arg(&params.value)
            .query_async(&mut conn)
            .await;

        Ok(match result {
            Ok(removed) if removed > 0 => text_result(format!(
                "Value '{}' removed from set '{}'.",
                params.value, params.name
            )),
            Ok(_) => text_result(format!(
                "Value '{}' not found in set '{}'.",
                params.value, params.name
            )),
            Err(e) => text_result(format!(
                "Error removing member from set '{}': {}",
                params.name, e
            )),
        })
    }

    pub async fn do_smembers(&self, params: SetParams) -> Result<CallToolResult, ErrorData> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };

        let result: Result<Vec<String>, redis::RedisError> = redis::cmd("SMEMBERS")
            .arg(&params.name)
            .query_async(&mut conn)
            .await;

        Ok(match result {
            Ok(members) if members.is_empty() => text_result(format!(
                "Set '{}' is empty or does not exist.",
                params.name
            )),
            Ok(members) => json_result(&serde_json::json!(members)),
            Err(e) => text_result(format!(
                "Error retrieving members of set '{}': {}",
                params.name, e
            )),
        })
    }
}
