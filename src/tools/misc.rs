use rmcp::model::{CallToolResult, ErrorData};
use rmcp::schemars;
use serde::Deserialize;

use crate::server::{json_result, text_result, value_to_json, RedisMcpServer};

/// Maximum number of SCAN iterations as a safety valve
const MAX_SCAN_ITERATIONS: usize = 1000;

const DEFAULT_SCAN_KEYS: usize = 100;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RawCommandParams {
    #[schemars(description = "The Redis command to execute, e.g. GET, HSET, FT.SEARCH")]
    pub command: String,

    #[schemars(description = "Arguments for the command")]
    #[serde(default)]
    pub args: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct KeyParams {
    #[schemars(description = "The key to operate on")]
    pub key: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ExpireParams {
    #[schemars(description = "The key to expire")]
    pub key: String,

    #[schemars(description = "Time to live in seconds")]
    pub seconds: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RenameParams {
    #[schemars(description = "The current key name")]
    pub old_key: String,

    #[schemars(description = "The new key name")]
    pub new_key: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ScanParams {
    #[schemars(description = "Key pattern to match (e.g. 'user:*'). Default: *")]
    #[serde(default)]
    pub pattern: Option<String>,

    #[schemars(description = "Maximum number of keys to return (default: 100)")]
    #[serde(default)]
    pub count: Option<u32>,
}

impl RedisMcpServer {
    /// Raw pass-through. The only tool whose effect may be inherently
    /// global (CONFIG SET, FLUSHDB, SELECT and friends run unguarded).
    pub async fn do_execute_raw_command(
        &self,
        params: RawCommandParams,
    ) -> Result<CallToolResult, ErrorData> {
        if params.command.trim().is_empty() {
            return Err(ErrorData::invalid_params("command must not be empty", None));
        }
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };

        let mut cmd = redis::cmd(&params.command);
        for arg in params.args.iter().flatten() {
            cmd.arg(arg);
        }

        let result: Result<redis::Value, redis::RedisError> = cmd.query_async(&mut conn).await;
        Ok(match result {
            Ok(value) => json_result(&value_to_json(value)),
            Err(e) => text_result(format!(
                "Error executing command {}: {}",
                params.command, e
            )),
        })
    }

    pub async fn do_get_key_info(&self, params: KeyParams) -> Result<CallToolResult, ErrorData> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };

        let key_type: String = match redis::cmd("TYPE")
            .arg(&params.key)
            .query_async(&mut conn)
            .await
        {
            Ok(t) => t,
            Err(e) => {
                return Ok(text_result(format!(
                    "Error inspecting key {}: {}",
                    params.key, e
                )))
            }
        };
        if key_type == "none" {
            return Ok(text_result(format!("Key {} does not exist", params.key)));
        }

        let ttl: i64 = match redis::cmd("TTL")
            .arg(&params.key)
            .query_async(&mut conn)
            .await
        {
            Ok(ttl) => ttl,
            Err(e) => {
                return Ok(text_result(format!(
                    "Error inspecting key {}: {}",
                    params.key, e
                )))
            }
        };

        let value: Result<redis::Value, redis::RedisError> = match key_type.as_str() {
            "string" => {
                redis::cmd("GET")
                    .arg(&params.key)
                    .query_async(&mut conn)
                    .await
            }
            "list" => {
                redis::cmd("LRANGE")
                    .arg(&params.key)
                    .arg(0)
                    .arg(-1)
                    .query_async(&mut conn)
                    .await
            }
            "hash" => {
                redis::cmd("HGETALL")
                    .arg(&params.key)
                    .query_async(&mut conn)
                    .await
            }
            "set" => {
                redis::cmd("SMEMBERS")
                    .arg(&params.key)
                    .query_async(&mut conn)
                    .await
            }
            "zset" => {
                redis::cmd("ZRANGE")
                    .arg(&params.key)
                    .arg(0)
                    .arg(-1)
                    .arg("WITHSCORES")
                    .query_async(&mut conn)
                    .await
            }
            "ReJSON-RL" => {
                redis::cmd("JSON.GET")
                    .arg(&params.key)
                    .arg("$")
                    .query_async(&mut conn)
                    .await
            }
            _ => Ok(redis::Value::Nil),
        };

        Ok(match value {
            Ok(value) => json_result(&serde_json::json!({
                "key": params.key,
                "type": key_type,
                "ttl": ttl,
                "value": value_to_json(value),
            })),
            Err(e) => text_result(format!("Error inspecting key {}: {}", params.key, e)),
        })
    }

    pub async fn do_delete_key(&self, params: KeyParams) -> Result<CallToolResult, ErrorData> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };

        let result: Result<i64, redis::RedisError> = redis::cmd("DEL")
            .arg(&params.key)
            .query_async(&mut conn)
            .await;

        Ok(match result {
            Ok(deleted) if deleted > 0 => {
                text_result(format!("Successfully deleted {}", params.key))
            }
            Ok(_) => text_result(format!("Key {} not found", params.key)),
            Err(e) => text_result(format!("Error deleting key {}: {}", params.key, e)),
        })
    }

    pub async fn do_expire_key(&self, params: ExpireParams) -> Result<CallToolResult, ErrorData> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };

        let result: Result<i64, redis::RedisError> = redis::cmd("EXPIRE")
            .arg(&params.key)
            .arg(params.seconds)
            .query_async(&mut conn)
            .await;

        Ok(match result {
            Ok(1) => text_result(format!(
                "Expiration of {} seconds set on {}",
                params.seconds, params.key
            )),
            Ok(_) => text_result(format!("Key {} does not exist", params.key)),
            Err(e) => text_result(format!(
                "Error setting expiration on key {}: {}",
                params.key, e
            )),
        })
    }

    pub async fn do_rename_key(&self, params: RenameParams) -> Result<CallToolResult, ErrorData> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };

        let result: Result<(), redis::RedisError> = redis::cmd("RENAME")
            .arg(&params.old_key)
            .arg(&params.new_key)
            .query_async(&mut conn)
            .await;

        Ok(match result {
            Ok(()) => text_result(format!(
                "Renamed {} to {}",
                params.old_key, params.new_key
            )),
            Err(e) => text_result(format!(
                "Error renaming key {}: {}",
                params.old_key, e
            )),
        })
    }

    pub async fn do_scan_keys(&self, params: ScanParams) -> Result<CallToolResult, ErrorData> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };
        let pattern = params.pattern.as_deref().unwrap_or("*");
        if pattern.contains('\0') {
            return Err(ErrorData::invalid_params(
                "pattern must not contain null bytes",
                None,
            ));
        }
        let max_keys = params.count.unwrap_or(DEFAULT_SCAN_KEYS as u32) as usize;

        let mut keys: Vec<String> = Vec::new();
        let mut cursor: u64 = 0;
        let mut iterations = 0;

        loop {
            let result: Result<(u64, Vec<String>), redis::RedisError> = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await;

            let (next_cursor, batch) = match result {
                Ok(reply) => reply,
                Err(e) => return Ok(text_result(format!("Error scanning keys: {}", e))),
            };

            keys.extend(batch);
            cursor = next_cursor;
            iterations += 1;

            if cursor == 0 || keys.len() >= max_keys || iterations >= MAX_SCAN_ITERATIONS {
                break;
            }
        }

        keys.truncate(max_keys);

        Ok(json_result(&serde_json::json!({
            "pattern": pattern,
            "keys": keys,
            "count": keys.len(),
        })))
    }
}
