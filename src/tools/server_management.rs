use rmcp::model::{CallToolResult, ErrorData};
use rmcp::schemars;
use serde::Deserialize;

use crate::server::{json_result, text_result, RedisMcpServer};

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct InfoParams {
    #[schemars(
        description = "Info section to retrieve (e.g. 'memory', 'stats', 'keyspace', 'server'). Default: all"
    )]
    #[serde(default)]
    pub section: Option<String>,
}

impl RedisMcpServer {
    pub async fn do_dbsize(&self) -> Result<CallToolResult, ErrorData> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };

        let result: Result<i64, redis::RedisError> =
            redis::cmd("DBSIZE").query_async(&mut conn).await;

        Ok(match result {
            Ok(size) => json_result(&serde_json::json!({ "dbsize": size })),
            Err(e) => text_result(format!("Error getting database size: {}", e)),
        })
    }

    pub async fn do_info(&self, params: InfoParams) -> Result<CallToolResult, ErrorData> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };

        let mut cmd = redis::cmd("INFO");
        if let Some(section) = &params.section {
            cmd.arg(section);
        }

        let result: Result<String, redis::RedisError> = cmd.query_async(&mut conn).await;
        Ok(match result {
            Ok(info) => text_result(info),
            Err(e) => text_result(format!("Error retrieving server info: {}", e)),
        })
    }

    pub async fn do_client_list(&self) -> Result<CallToolResult, ErrorData> {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(result) => return Ok(result),
        };

        let result: Result<String, redis::RedisError> = redis::cmd("CLIENT")
            .arg("LIST")
            .query_async(&mut conn)
            .await;
        let raw = match result {
            Ok(raw) => raw,
            Err(e) => return Ok(text_result(format!("Error retrieving client list: {}", e))),
        };

        // CLIENT LIST is one space-separated key=value line per client.
        let clients: Vec<serde_json::Value> = raw
            .lines()
            .filter(|line| !line.is_empty())
            .map(|line| {
                let mut map = serde_json::Map::new();
                for part in line.split(' ') {
                    if let Some((key, value)) = part.split_once('=') {
                        map.insert(
                            key.to_string(),
                            serde_json::Value::String(value.to_string()),
                        );
                    }
                }
                serde_json::Value::Object(map)
            })
            .collect();

        Ok(json_result(&serde_json::json!({
            "clients": clients,
            "count": clients.len(),
        })))
    }
}
