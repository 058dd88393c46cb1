use rmcp::model::{CallToolResult, ErrorData};
use rmcp::schemars;
use serde::Deserialize;

use crate::server::{json_result, text_result, RedisMcpServer};

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListPushParams {
    #[schemars(description = "The Redis list key")]
    pub name: String,

    #[schemars(description = "The value to push")]
    pub value: String,

    #[schemars(description = "Expiration time for the list key in seconds")]
    #[serde(default)]
    pub expire: Option<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListParams {
    #[schemars(description = "The Redis list key")]
    pub name: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListRangeParams {
    #[schemars(description = "The Redis list key")]
    pub name: String,

    #[schemars(description = "Start index (default: 0)")]
    #[serde(default)]
    pub start: Option<i64>,

    #[schemars(description = "Stop index, inclusive (default: -1 for end of list)")]
    #[serde(default)]
    pub stop: Option<i64>,
}

impl RedisMcpServer {
    async fn push(
        &self,
        command: &str,
        side: &str,
        params: ListPushParams,
    ) -> Result<CallToolResult, ErrorData> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };

        let result: Result<i64, redis::RedisError> = redis::cmd(command)
            .arg(&params.name)
            .arg(&params.value)
            .query_async(&mut conn)
            .await;
        if let Err(e) = result {
            return Ok(text_result(format!(
                "Error pushing value to list '{}': {}",
                params.name, e
            )));
        }

        if let Some(seconds) = params.expire {
            let result: Result<i64, redis::RedisError> = redis::cmd("EXPIRE")
                .arg(&params.name)
                .arg(seconds)
                .query_async(&mut conn)
                .await;
            if let Err(e) = result {
                return Ok(text_result(format!(
                    "Error setting expiration on list '{}': {}",
                    params.name, e
                )));
            }
        }

        Ok(text_result(format!(
            "Value '{}' pushed to the {} of list '{}'.",
            params.value, side, params.name
        )))
    }

    pub async fn do_lpush(&self, params: ListPushParams) -> Result<CallToolResult, ErrorData> {
        self.push("LPUSH", "left", params).await
    }

    pub async fn do_rpush(&self, params: ListPushParams) -> Result<CallToolResult, ErrorData> {
        self.push("RPUSH", "right", params).await
    }

    async fn pop(&self, command: &str, params: ListParams) -> Result<CallToolResult, ErrorData> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };

        let result: Result<Option<String>, redis::RedisError> = redis::cmd(command)
            .arg(&params.name)
            .query_async(&mut conn)
            .await;

        Ok(match result {
            Ok(Some(value)) => text_result(value),
            Ok(None) => text_result(format!(
                "List '{}' is empty or does not exist.",
                params.name
            )),
            Err(e) => text_result(format!(
                "Error popping value from list '{}': {}",
                params.name, e
            )),
        })
    }

    pub async fn do_lpop(&self, params: ListParams) -> Result<CallToolResult, ErrorData> {
        self.pop("LPOP", params).await
    }

    pub async fn do_rpop(&self, params: ListParams) -> Result<CallToolResult, ErrorData> {
        self.pop("RPOP", params).await
    }

    pub async fn do_lrange(&self, params: ListRangeParams) -> Result<CallToolResult, ErrorData> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };
        let start = params.start.unwrap_or(0);
        let stop = params.stop.unwrap_or(-1);

        let result: Result<Vec<String>, redis::RedisError> = redis::cmd("LRANGE")
            .arg(&params.name)
            .arg(start)
            .arg(stop)
            .query_async(&mut conn)
            .await;

        Ok(match result {
            Ok(elements) if elements.is_empty() => text_result(format!(
                "List '{}' is empty or does not exist.",
                params.name
            )),
            Ok(elements) => json_result(&serde_json::json!(elements)),
            Err(e) => text_result(format!(
                "Error retrieving values from list '{}': {}",
                params.name, e
            )),
        })
    }

    pub async fn do_llen(&self, params: ListParams) -> Result<CallToolResult, ErrorData> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };

        let result: Result<i64, redis::RedisError> = redis::cmd("LLEN")
            .arg(&params.name)
            .query_async(&mut conn)
            .await;

        Ok(match result {
            Ok(len) => text_result(len.to_string()),
            Err(e) => text_result(format!(
                "Error retrieving length of list '{}': {}",
                params.name, e
            )),
        })
    }
}
