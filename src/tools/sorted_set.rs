use rmcp::model::{CallToolResult, ErrorData};
use rmcp::schemars;
use serde::Deserialize;

use crate::server::{json_result, text_result, RedisMcpServer};

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ZAddParams {
    #[schemars(description = "The Redis sorted set key")]
    pub name: String,

    #[schemars(description = "The score for the member")]
    pub score: f64,

    #[schemars(description = "The member to add")]
    pub member: String,

    #[schemars(description = "Expiration time for the sorted set key in seconds")]
    #[serde(default)]
    pub expiration: Option<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ZRangeParams {
    #[schemars(description = "The Redis sorted set key")]
    pub name: String,

    #[schemars(description = "Start index (default: 0)")]
    #[serde(default)]
    pub start: Option<i64>,

    #[schemars(description = "Stop index, inclusive (default: -1 for the full set)")]
    #[serde(default)]
    pub stop: Option<i64>,

    #[schemars(description = "Include scores in the result")]
    #[serde(default)]
    pub with_scores: Option<bool>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ZRemParams {
    #[schemars(description = "The Redis sorted set key")]
    pub name: String,

    #[schemars(description = "The member to remove")]
    pub member: String,
}

impl RedisMcpServer {
    pub async fn do_zadd(&self, params: ZAddParams) -> Result<CallToolResult, ErrorData> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };

        let result: Result<i64, redis::RedisError> = redis::cmd("ZADD")
            .arg(&params.name)
            .arg(params.score)
            .arg(&params.member)
            .query_async(&mut conn)
            .await;
        if let Err(e) = result {
            return Ok(text_result(format!(
                "Error adding member to sorted set '{}': {}",
                params.name, e
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
                    "Error setting expiration on sorted set '{}': {}",
                    params.name, e
                )));
            }
        }

        Ok(text_result(format!(
            "Member '{}' added to sorted set '{}' with score {}.",
            params.member, params.name, params.score
        )))
    }

    pub async fn do_zrange(&self, params: ZRangeParams) -> Result<CallToolResult, ErrorData> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };
        let start = params.start.unwrap_or(0);
        let stop = params.stop.unwrap_or(-1);

        if params.with_scores.unwrap_or(false) {
            let result: Result<Vec<(String, f64)>, redis::RedisError> = redis::cmd("ZRANGE")
                .arg(&params.name)
                .arg(start)
                .arg(stop)
                .arg("WITHSCORES")
                .query_async(&mut conn)
                .await;
            Ok(match result {
                Ok(members) if members.is_empty() => text_result(format!(
                    "Sorted set '{}' is empty or does not exist.",
                    params.name
                )),
                Ok(members) => {
                    let entries: Vec<serde_json::Value> = members
                        .iter()
                        .map(|(member, score)| {
                            serde_json::json!({"member": member, "score": score})
                        })
                        .collect();
                    json_result(&serde_json::json!(entries))
                }
                Err(e) => text_result(format!(
                    "Error retrieving members of sorted set '{}': {}",
                    params.name, e
                )),
            })
        } else {
            let result: Result<Vec<String>, redis::RedisError> = redis::cmd("ZRANGE")
                .arg(&params.name)
                .arg(start)
                .arg(stop)
                .query_async(&mut conn)
                .await;
            Ok(match result {
                Ok(members) if members.is_empty() => text_result(format!(
                    "Sorted set '{}' is empty or does not exist.",
                    params.name
                )),
                Ok(members) => json_result(&serde_json::json!(members)),
                Err(e) => text_result(format!(
                    "Error retrieving members of sorted set '{}': {}",
                    params.name, e
                )),
            })
        }
    }

    pub async fn do_zrem(&self, params: ZRemParams) -> Result<CallToolResult, ErrorData> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };

        let result: Result<i64, redis::RedisError> = redis::cmd("ZREM")
            .arg(&params.name)
            .arg(&params.member)
            .query_async(&mut conn)
            .await;

        Ok(match result {
            Ok(removed) if removed > 0 => text_result(format!(
                "Member '{}' removed from sorted set '{}'.",
                params.member, params.name
            )),
            Ok(_) => text_result(format!(
                "Member '{}' not found in sorted set '{}'.",
                params.member, params.name
            )),
            Err(e) => text_result(format!(
                "Error removing member from sorted set '{}': {}",
                params.name, e
            )),
        })
    }
}
