use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};

use crate::connection::{RedisConnectionManager, RedisHandle};
use crate::tools::hash::{
    GetVectorParams, HashFieldParams, HashFieldValueParams, HashParams, SetVectorParams,
};
use crate::tools::json::{JsonPathParams, JsonSetParams};
use crate::tools::list::{ListParams, ListPushParams, ListRangeParams};
use crate::tools::misc::{ExpireParams, KeyParams, RawCommandParams, RenameParams, ScanParams};
use crate::tools::pub_sub::{ChannelParams, PublishParams};
use crate::tools::query_engine::{CreateVectorIndexParams, IndexInfoParams, VectorSearchParams};
use crate::tools::server_management::InfoParams;
use crate::tools::set::{SetMemberParams, SetParams};
use crate::tools::sorted_set::{ZAddParams, ZRangeParams, ZRemParams};
use crate::tools::stream::{XAddParams, XDelParams, XRangeParams};
use crate::tools::string::{GetStringParams, SetStringParams};

#[derive(Clone)]
pub struct RedisMcpServer {
    manager: Arc<RedisConnectionManager>,
    tool_router: ToolRouter<Self>,
}

impl RedisMcpServer {
    pub fn new(manager: Arc<RedisConnectionManager>) -> Self {
        Self {
            manager,
            tool_router: Self::tool_router(),
        }
    }

    pub fn manager(&self) -> &RedisConnectionManager {
        &self.manager
    }

    /// The shared connection, or the formatted failure text the tool
    /// returns. Per-call connection failures never crash the server.
    pub(crate) async fn connection(&self) -> Result<RedisHandle, CallToolResult> {
        match self.manager.get_connection().await {
            Ok(conn) => Ok(conn),
            Err(e) => Err(text_result(format!("Error connecting to Redis: {}", e))),
        }
    }
}

pub(crate) fn text_result(text: impl Into<String>) -> CallToolResult {
    CallToolResult::success(vec![Content::text(text.into())])
}

pub(crate) fn json_result(value: &serde_json::Value) -> CallToolResult {
    let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string());
    CallToolResult::success(vec![Content::text(text)])
}

/// Render an arbitrary Redis reply as JSON for tool output. Binary-unsafe
/// payloads are summarized rather than mangled.
pub(crate) fn value_to_json(value: redis::Value) -> serde_json::Value {
    match value {
        redis::Value::Nil => serde_json::Value::Null,
        redis::Value::Int(i) => serde_json::json!(i),
        redis::Value::Double(d) => serde_json::json!(d),
        redis::Value::Boolean(b) => serde_json::Value::Bool(b),
        redis::Value::SimpleString(s) => serde_json::Value::String(s),
        redis::Value::Okay => serde_json::Value::String("OK".to_string()),
        redis::Value::BulkString(bytes) => match String::from_utf8(bytes) {
            Ok(s) => serde_json::Value::String(s),
            Err(e) => serde_json::Value::String(format!(
                "<{} bytes of binary data>",
                e.as_bytes().len()
            )),
        },
        redis::Value::Array(values) | redis::Value::Set(values) => {
            serde_json::Value::Array(values.into_iter().map(value_to_json).collect())
        }
        redis::Value::Map(entries) => {
            let mut map = serde_json::Map::new();
            for (key, value) in entries {
                let key = match value_to_json(key) {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                map.insert(key, value_to_json(value));
            }
            serde_json::Value::Object(map)
        }
        redis::Value::VerbatimString { text, .. } => serde_json::Value::String(text),
        other => serde_json::Value::String(format!("{other:?}")),
    }
}

#[tool_router]
impl RedisMcpServer {
    // -- strings --

    #[tool(
        name = "set",
        description = "Set a Redis string value with an optional expiration time in seconds"
    )]
    async fn set(
        &self,
        Parameters(params): Parameters<SetStringParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_set(params).await
    }

    #[tool(name = "get", description = "Get a Redis string value")]
    async fn get(
        &self,
        Parameters(params): Parameters<GetStringParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_get(params).await
    }

    // -- hashes --

    #[tool(name = "hset", description = "Set a field in a hash stored at key")]
    async fn hset(
        &self,
        Parameters(params): Parameters<HashFieldValueParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_hset(params).await
    }

    #[tool(name = "hget", description = "Get the value of a field in a Redis hash")]
    async fn hget(
        &self,
        Parameters(params): Parameters<HashFieldParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_hget(params).await
    }

    #[tool(name = "hdel", description = "Delete a field from a Redis hash")]
    async fn hdel(
        &self,
        Parameters(params): Parameters<HashFieldParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_hdel(params).await
    }

    #[tool(name = "hgetall", description = "Get all fields and values from a Redis hash")]
    async fn hgetall(
        &self,
        Parameters(params): Parameters<HashParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_hgetall(params).await
    }

    #[tool(name = "hexists", description = "Check if a field exists in a Redis hash")]
    async fn hexists(
        &self,
        Parameters(params): Parameters<HashFieldParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_hexists(params).await
    }

    #[tool(
        name = "set_vector_in_hash",
        description = "Store a vector as a packed float32 blob in a hash field, ready for vector search"
    )]
    async fn set_vector_in_hash(
        &self,
        Parameters(params): Parameters<SetVectorParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_set_vector_in_hash(params).await
    }

    #[tool(
        name = "get_vector_from_hash",
        description = "Read a packed float32 vector from a hash field as a list of numbers"
    )]
    async fn get_vector_from_hash(
        &self,
        Parameters(params): Parameters<GetVectorParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_get_vector_from_hash(params).await
    }

    // -- lists --

    #[tool(name = "lpush", description = "Push a value onto the left of a Redis list")]
    async fn lpush(
        &self,
        Parameters(params): Parameters<ListPushParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_lpush(params).await
    }

    #[tool(name = "rpush", description = "Push a value onto the right of a Redis list")]
    async fn rpush(
        &self,
        Parameters(params): Parameters<ListPushParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_rpush(params).await
    }

    #[tool(name = "lpop", description = "Remove and return the first element of a Redis list")]
    async fn lpop(
        &self,
        Parameters(params): Parameters<ListParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_lpop(params).await
    }

    #[tool(name = "rpop", description = "Remove and return the last element of a Redis list")]
    async fn rpop(
        &self,
        Parameters(params): Parameters<ListParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_rpop(params).await
    }

    #[tool(name = "lrange", description = "Get elements of a Redis list within a range")]
    async fn lrange(
        &self,
        Parameters(params): Parameters<ListRangeParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_lrange(params).await
    }

    #[tool(name = "llen", description = "Get the length of a Redis list")]
    async fn llen(
        &self,
        Parameters(params): Parameters<ListParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_llen(params).await
    }

    // -- sets --

    #[tool(name = "sadd", description = "Add a member to a Redis set")]
    async fn sadd(
        &self,
        Parameters(params): Parameters<SetMemberParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_sadd(params).await
    }

    #[tool(name = "srem", description = "Remove a member from a Redis set")]
    async fn srem(
        &self,
        Parameters(params): Parameters<SetMemberParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_srem(params).await
    }

    #[tool(name = "smembers", description = "Get all members of a Redis set")]
    async fn smembers(
        &self,
        Parameters(params): Parameters<SetParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_smembers(params).await
    }

    // -- sorted sets --

    #[tool(name = "zadd", description = "Add a member with a score to a Redis sorted set")]
    async fn zadd(
        &self,
        Parameters(params): Parameters<ZAddParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_zadd(params).await
    }

    #[tool(
        name = "zrange",
        description = "Get members of a Redis sorted set within a range, optionally with scores"
    )]
    async fn zrange(
        &self,
        Parameters(params): Parameters<ZRangeParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_zrange(params).await
    }

    #[tool(name = "zrem", description = "Remove a member from a Redis sorted set")]
    async fn zrem(
        &self,
        Parameters(params): Parameters<ZRemParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_zrem(params).await
    }

    // -- streams --

    #[tool(
        name = "xadd",
        description = "Append an entry with field-value pairs to a Redis stream"
    )]
    async fn xadd(
        &self,
        Parameters(params): Parameters<XAddParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_xadd(params).await
    }

    #[tool(name = "xrange", description = "Read entries from a Redis stream")]
    async fn xrange(
        &self,
        Parameters(params): Parameters<XRangeParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_xrange(params).await
    }

    #[tool(name = "xdel", description = "Delete an entry from a Redis stream by ID")]
    async fn xdel(
        &self,
        Parameters(params): Parameters<XDelParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_xdel(params).await
    }

    // -- pub/sub --

    #[tool(name = "publish", description = "Publish a message to a Redis channel")]
    async fn publish(
        &self,
        Parameters(params): Parameters<PublishParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_publish(params).await
    }

    #[tool(
        name = "subscribe",
        description = "Subscribe to a Redis channel (connectivity check; the subscription is not kept open)"
    )]
    async fn subscribe(
        &self,
        Parameters(params): Parameters<ChannelParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_subscribe(params).await
    }

    #[tool(name = "unsubscribe", description = "Unsubscribe from a Redis channel")]
    async fn unsubscribe(
        &self,
        Parameters(params): Parameters<ChannelParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_unsubscribe(params).await
    }

    // -- JSON --

    #[tool(
        name = "json_set",
        description = "Set a JSON value at a path in a RedisJSON document"
    )]
    async fn json_set(
        &self,
        Parameters(params): Parameters<JsonSetParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_json_set(params).await
    }

    #[tool(
        name = "json_get",
        description = "Get a JSON value at a path from a RedisJSON document"
    )]
    async fn json_get(
        &self,
        Parameters(params): Parameters<JsonPathParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_json_get(params).await
    }

    #[tool(
        name = "json_del",
        description = "Delete a JSON value at a path from a RedisJSON document"
    )]
    async fn json_del(
        &self,
        Parameters(params): Parameters<JsonPathParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_json_del(params).await
    }

    // -- query engine --

    #[tool(name = "get_indexes", description = "List search indexes in the Redis database")]
    async fn get_indexes(&self) -> Result<CallToolResult, ErrorData> {
        self.do_get_indexes().await
    }

    #[tool(name = "get_index_info", description = "Get schema and statistics for a search index")]
    async fn get_index_info(
        &self,
        Parameters(params): Parameters<IndexInfoParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_get_index_info(params).await
    }

    #[tool(
        name = "get_indexed_keys_number",
        description = "Get the number of keys covered by a search index"
    )]
    async fn get_indexed_keys_number(
        &self,
        Parameters(params): Parameters<IndexInfoParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_get_indexed_keys_number(params).await
    }

    #[tool(
        name = "create_vector_index_hash",
        description = "Create a vector search index over hash keys with a given prefix"
    )]
    async fn create_vector_index_hash(
        &self,
        Parameters(params): Parameters<CreateVectorIndexParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_create_vector_index_hash(params).await
    }

    #[tool(
        name = "vector_search_hash",
        description = "KNN vector similarity search over hashes indexed by a vector index"
    )]
    async fn vector_search_hash(
        &self,
        Parameters(params): Parameters<VectorSearchParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_vector_search_hash(params).await
    }

    // -- server management --

    #[tool(name = "dbsize", description = "Get the number of keys stored in the Redis database")]
    async fn dbsize(&self) -> Result<CallToolResult, ErrorData> {
        self.do_dbsize().await
    }

    #[tool(
        name = "info",
        description = "Get Redis server info. Optionally specify a section: memory, stats, keyspace, server, clients, etc."
    )]
    async fn info(
        &self,
        Parameters(params): Parameters<InfoParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_info(params).await
    }

    #[tool(
        name = "client_list",
        description = "List connected Redis clients with address, name, idle time, and current command"
    )]
    async fn client_list(&self) -> Result<CallToolResult, ErrorData> {
        self.do_client_list().await
    }

    // -- misc --

    #[tool(
        name = "execute_raw_command",
        description = "Execute a raw Redis command like SET, HGET, JSON.SET, or FT.SEARCH. Any command can be run through this call."
    )]
    async fn execute_raw_command(
        &self,
        Parameters(params): Parameters<RawCommandParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_execute_raw_command(params).await
    }

    #[tool(
        name = "get_key_info",
        description = "Get type, TTL, and value for a key of any data type"
    )]
    async fn get_key_info(
        &self,
        Parameters(params): Parameters<KeyParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_get_key_info(params).await
    }

    #[tool(name = "delete", description = "Delete a Redis key")]
    async fn delete(
        &self,
        Parameters(params): Parameters<KeyParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_delete_key(params).await
    }

    #[tool(name = "expire", description = "Set an expiration time on a Redis key")]
    async fn expire(
        &self,
        Parameters(params): Parameters<ExpireParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_expire_key(params).await
    }

    #[tool(name = "rename", description = "Rename a Redis key")]
    async fn rename(
        &self,
        Parameters(params): Parameters<RenameParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_rename_key(params).await
    }

    #[tool(
        name = "scan_keys",
        description = "Scan keys matching a pattern using SCAN (non-blocking). Returns key names."
    )]
    async fn scan_keys(
        &self,
        Parameters(params): Parameters<ScanParams>,
    ) -> Result<CallToolResult, ErrorData> {
        self.do_scan_keys(params).await
    }
}

#[tool_handler]
impl ServerHandler for RedisMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "redis-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(
                "Redis server. Tools cover strings (set, get), hashes (hset, hget, \
                 hgetall, vectors), lists (lpush, rpush, lrange), sets (sadd, \
                 smembers), sorted sets (zadd, zrange), streams (xadd, xrange), \
                 pub/sub (publish), JSON documents (json_set, json_get), vector \
                 search (create_vector_index_hash, vector_search_hash), key \
                 management (get_key_info, delete, expire, rename, scan_keys), \
                 server stats (info, dbsize, client_list), and a raw command \
                 escape hatch (execute_raw_command)."
                    .to_string(),
            ),
        }
    }
}
