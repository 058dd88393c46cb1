use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use redis_mcp::config::{parse_redis_uri, ConnectionConfig};
use redis_mcp::connection::RedisConnectionManager;
use redis_mcp::server::RedisMcpServer;
use redis_mcp::tools::hash::{
    GetVectorParams, HashFieldParams, HashFieldValueParams, HashParams, SetVectorParams,
};
use redis_mcp::tools::list::{ListParams, ListPushParams, ListRangeParams};
use redis_mcp::tools::misc::{ExpireParams, KeyParams, RawCommandParams, RenameParams, ScanParams};
use redis_mcp::tools::pub_sub::{ChannelParams, PublishParams};
use redis_mcp::tools::server_management::InfoParams;
use redis_mcp::tools::set::{SetMemberParams, SetParams};
use redis_mcp::tools::sorted_set::{ZAddParams, ZRangeParams, ZRemParams};
use redis_mcp::tools::stream::{XAddParams, XDelParams, XRangeParams};
use redis_mcp::tools::string::{GetStringParams, SetStringParams};

/// Try to connect to Redis with a short timeout. Skip tests if not
/// available.
async fn try_manager() -> Option<Arc<RedisConnectionManager>> {
    let url =
        std::env::var("REDIS_TEST_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379/15".to_string());

    let mut config = ConnectionConfig::default();
    config.apply_uri(&parse_redis_uri(&url).ok()?);
    let manager = Arc::new(RedisConnectionManager::new(config));

    let mut conn = match tokio::time::timeout(Duration::from_secs(2), manager.get_connection()).await
    {
        Ok(Ok(conn)) => conn,
        _ => return None,
    };

    let pong: Result<String, _> = redis::cmd("PING").query_async(&mut conn).await;
    if pong.is_err() {
        return None;
    }

    Some(manager)
}

/// Connect or skip the test gracefully.
macro_rules! require_redis {
    () => {
        match try_manager().await {
            Some(manager) => manager,
            None => {
                eprintln!("Skipping: Redis not available");
                return;
            }
        }
    };
}

async fn del_keys(manager: &RedisConnectionManager, keys: &[&str]) {
    let mut conn = manager.get_connection().await.expect("connection");
    for key in keys {
        let _: Result<i64, _> = redis::cmd("DEL").arg(key).query_async(&mut conn).await;
    }
}

fn extract_text(result: rmcp::model::CallToolResult) -> String {
    result
        .content
        .first()
        .and_then(|c| c.as_text())
        .map(|t| t.text.clone())
        .unwrap_or_default()
}

fn extract_json(result: rmcp::model::CallToolResult) -> serde_json::Value {
    serde_json::from_str(&extract_text(result)).unwrap_or(serde_json::Value::Null)
}

// -- connection lifecycle --

#[tokio::test]
async fn sequential_calls_reuse_the_connection() {
    let manager = require_redis!();
    // try_manager already called get_connection once.
    assert_eq!(manager.construction_attempts(), 1);
    manager.get_connection().await.expect("second call");
    manager.get_connection().await.expect("third call");
    assert_eq!(manager.construction_attempts(), 1);
}

#[tokio::test]
async fn concurrent_first_calls_construct_exactly_once() {
    // Fresh manager: do not reuse the one try_manager connected.
    let probe = require_redis!();
    let manager = Arc::new(RedisConnectionManager::new(probe.config().clone()));

    let mut handles = Vec::new();
    for _ in 0..16 {
        let manager = manager.clone();
        handles.push(tokio::spawn(
            async move { manager.get_connection().await },
        ));
    }
    for handle in handles {
        handle.await.expect("task").expect("connection");
    }
    assert_eq!(manager.construction_attempts(), 1);
}

#[tokio::test]
async fn reset_forces_reconstruction() {
    let manager = require_redis!();
    assert_eq!(manager.construction_attempts(), 1);
    manager.reset().await;
    manager.get_connection().await.expect("reconnect");
    assert_eq!(manager.construction_attempts(), 2);
}

// -- strings --

#[tokio::test]
async fn set_and_get_string() {
    let manager = require_redis!();
    let server = RedisMcpServer::new(manager.clone());

    let result = server
        .do_set(SetStringParams {
            key: "itest:str".to_string(),
            value: "hello world".to_string(),
            expiration: None,
        })
        .await
        .expect("set");
    assert!(extract_text(result).contains("Successfully set"));

    let result = server
        .do_get(GetStringParams {
            key: "itest:str".to_string(),
        })
        .await
        .expect("get");
    assert_eq!(extract_text(result), "hello world");
}

#[tokio::test]
async fn set_with_expiration_sets_ttl() {
    let manager = require_redis!();
    let server = RedisMcpServer::new(manager.clone());

    server
        .do_set(SetStringParams {
            key: "itest:ttl".to_string(),
            value: "v".to_string(),
            expiration: Some(120),
        })
        .await
        .expect("setex");

    let mut conn = manager.get_connection().await.expect("connection");
    let ttl: i64 = redis::cmd("TTL")
        .arg("itest:ttl")
        .query_async(&mut conn)
        .await
        .expect("ttl");
    assert!(ttl > 0 && ttl <= 120);
}

#[tokio::test]
async fn get_missing_key_reports_not_found() {
    let manager = require_redis!();
    let server = RedisMcpServer::new(manager.clone());
    del_keys(&manager, &["itest:absent"]).await;

    let result = server
        .do_get(GetStringParams {
            key: "itest:absent".to_string(),
        })
        .await
        .expect("get");
    assert!(extract_text(result).contains("does not exist"));
}

#[tokio::test]
async fn get_empty_value_reports_not_found() {
    // Documented ambiguity: an empty string value is indistinguishable
    // from a missing key in the tool output.
    let manager = require_redis!();
    let server = RedisMcpServer::new(manager.clone());

    server
        .do_set(SetStringParams {
            key: "itest:empty".to_string(),
            value: String::new(),
            expiration: None,
        })
        .await
        .expect("set");

    let result = server
        .do_get(GetStringParams {
            key: "itest:empty".to_string(),
        })
        .await
        .expect("get");
    assert!(extract_text(result).contains("does not exist"));
}

// -- hashes --

#[tokio::test]
async fn hash_field_round_trip() {
    let manager = require_redis!();
    let server = RedisMcpServer::new(manager.clone());
    del_keys(&manager, &["itest:h1"]).await;

    server
        .do_hset(HashFieldValueParams {
            name: "itest:h1".to_string(),
            key: "field1".to_string(),
            value: "val1".to_string(),
            expire_seconds: None,
        })
        .await
        .expect("hset");

    let result = server
        .do_hget(HashFieldParams {
            name: "itest:h1".to_string(),
            key: "field1".to_string(),
        })
        .await
        .expect("hget");
    assert_eq!(extract_text(result), "val1");

    let result = server
        .do_hexists(HashFieldParams {
            name: "itest:h1".to_string(),
            key: "field1".to_string(),
        })
        .await
        .expect("hexists");
    assert_eq!(extract_text(result), "true");

    let result = server
        .do_hdel(HashFieldParams {
            name: "itest:h1".to_string(),
            key: "field1".to_string(),
        })
        .await
        .expect("hdel");
    assert!(extract_text(result).contains("deleted"));

    let result = server
        .do_hget(HashFieldParams {
            name: "itest:h1".to_string(),
            key: "field1".to_string(),
        })
        .await
        .expect("hget after hdel");
    assert!(extract_text(result).contains("not found"));
}

#[tokio::test]
async fn hgetall_returns_all_fields() {
    let manager = require_redis!();
    let server = RedisMcpServer::new(manager.clone());
    del_keys(&manager, &["itest:h2"]).await;

    for (field, value) in [("a", "1"), ("b", "2")] {
        server
            .do_hset(HashFieldValueParams {
                name: "itest:h2".to_string(),
                key: field.to_string(),
                value: value.to_string(),
                expire_seconds: None,
            })
            .await
            .expect("hset");
    }

    let json = extract_json(
        server
            .do_hgetall(HashParams {
                name: "itest:h2".to_string(),
            })
            .await
            .expect("hgetall"),
    );
    assert_eq!(json["a"], "1");
    assert_eq!(json["b"], "2");
}

#[tokio::test]
async fn vector_round_trip_through_hash() {
    let manager = require_redis!();
    let server = RedisMcpServer::new(manager.clone());
    del_keys(&manager, &["itest:vec"]).await;

    server
        .do_set_vector_in_hash(SetVectorParams {
            name: "itest:vec".to_string(),
            vector: vec![1.0, -0.5, 3.25],
            key: None,
        })
        .await
        .expect("set vector");

    let json = extract_json(
        server
            .do_get_vector_from_hash(GetVectorParams {
                name: "itest:vec".to_string(),
                key: None,
            })
            .await
            .expect("get vector"),
    );
    let values: Vec<f64> = json
        .as_array()
        .expect("array")
        .iter()
        .map(|v| v.as_f64().expect("number"))
        .collect();
    assert_eq!(values, vec![1.0, -0.5, 3.25]);
}

// -- lists --

#[tokio::test]
async fn list_push_range_and_pop() {
    let manager = require_redis!();
    let server = RedisMcpServer::new(manager.clone());
    del_keys(&manager, &["itest:list"]).await;

    for value in ["a", "b", "c"] {
        server
            .do_rpush(ListPushParams {
                name: "itest:list".to_string(),
                value: value.to_string(),
                expire: None,
            })
            .await
            .expect("rpush");
    }

    let json = extract_json(
        server
            .do_lrange(ListRangeParams {
                name: "itest:list".to_string(),
                start: None,
                stop: None,
            })
            .await
            .expect("lrange"),
    );
    assert_eq!(json, serde_json::json!(["a", "b", "c"]));

    let result = server
        .do_llen(ListParams {
            name: "itest:list".to_string(),
        })
        .await
        .expect("llen");
    assert_eq!(extract_text(result), "3");

    let result = server
        .do_lpop(ListParams {
            name: "itest:list".to_string(),
        })
        .await
        .expect("lpop");
    assert_eq!(extract_text(result), "a");

    let result = server
        .do_rpop(ListParams {
            name: "itest:list".to_string(),
        })
        .await
        .expect("rpop");
    assert_eq!(extract_text(result), "c");
}

#[tokio::test]
async fn empty_list_reports_not_found() {
    let manager = require_redis!();
    let server = RedisMcpServer::new(manager.clone());
    del_keys(&manager, &["itest:nolist"]).await;

    let result = server
        .do_lrange(ListRangeParams {
            name: "itest:nolist".to_string(),
            start: None,
            stop: None,
        })
        .await
        .expect("lrange");
    assert!(extract_text(result).contains("empty or does not exist"));
}

// -- sets --

#[tokio::test]
async fn set_add_list_and_remove_members() {
    let manager = require_redis!();
    let server = RedisMcpServer::new(manager.clone());
    del_keys(&manager, &["itest:set"]).await;

    for value in ["alpha", "beta"] {
        server
            .do_sadd(SetMemberParams {
                name: "itest:set".to_string(),
                value: value.to_string(),
                expire_seconds: None,
            })
            .await
            .expect("sadd");
    }

    let json = extract_json(
        server
            .do_smembers(SetParams {
                name: "itest:set".to_string(),
            })
            .await
            .expect("smembers"),
    );
    let members = json.as_array().expect("array");
    assert_eq!(members.len(), 2);

    let result = server
        .do_srem(SetMemberParams {
            name: "itest:set".to_string(),
            value: "alpha".to_string(),
            expire_seconds: None,
        })
        .await
        .expect("srem");
    assert!(extract_text(result).contains("removed"));

    let result = server
        .do_srem(SetMemberParams {
            name: "itest:set".to_string(),
            value: "alpha".to_string(),
            expire_seconds: None,
        })
        .await
        .expect("srem again");
    assert!(extract_text(result).contains("not found"));
}

// -- sorted sets --

#[tokio::test]
async fn sorted_set_round_trip() {
    let manager = require_redis!();
    let server = RedisMcpServer::new(manager.clone());
    del_keys(&manager, &["itest:zset"]).await;

    for (score, member) in [(1.0, "one"), (2.0, "two"), (3.0, "three")] {
        server
            .do_zadd(ZAddParams {
                name: "itest:zset".to_string(),
                score,
                member: member.to_string(),
                expiration: None,
            })
            .await
            .expect("zadd");
    }

    let json = extract_json(
        server
            .do_zrange(ZRangeParams {
                name: "itest:zset".to_string(),
                start: None,
                stop: None,
                with_scores: Some(true),
            })
            .await
            .expect("zrange"),
    );
    let entries = json.as_array().expect("array");
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["member"], "one");
    assert!(entries[0]["score"].as_f64().expect("score") > 0.0);

    let result = server
        .do_zrem(ZRemParams {
            name: "itest:zset".to_string(),
            member: "two".to_string(),
        })
        .await
        .expect("zrem");
    assert!(extract_text(result).contains("removed"));

    let json = extract_json(
        server
            .do_zrange(ZRangeParams {
                name: "itest:zset".to_string(),
                start: None,
                stop: None,
                with_scores: None,
            })
            .await
            .expect("zrange without scores"),
    );
    assert_eq!(json, serde_json::json!(["one", "three"]));
}

// -- streams --

#[tokio::test]
async fn stream_add_read_and_delete() {
    let manager = require_redis!();
    let server = RedisMcpServer::new(manager.clone());
    del_keys(&manager, &["itest:stream"]).await;

    let mut fields = HashMap::new();
    fields.insert("sensor".to_string(), "42".to_string());
    let result = server
        .do_xadd(XAddParams {
            key: "itest:stream".to_string(),
            fields,
            expiration: None,
        })
        .await
        .expect("xadd");
    assert!(extract_text(result).contains("Successfully added entry"));

    let json = extract_json(
        server
            .do_xrange(XRangeParams {
                key: "itest:stream".to_string(),
                count: Some(10),
            })
            .await
            .expect("xrange"),
    );
    let entries = json.as_array().expect("array");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["fields"]["sensor"], "42");
    let entry_id = entries[0]["id"].as_str().expect("id").to_string();

    let result = server
        .do_xdel(XDelParams {
            key: "itest:stream".to_string(),
            entry_id,
        })
        .await
        .expect("xdel");
    assert!(extract_text(result).contains("Successfully deleted"));
}

// -- pub/sub --

#[tokio::test]
async fn publish_reports_subscriber_count() {
    let manager = require_redis!();
    let server = RedisMcpServer::new(manager.clone());

    let result = server
        .do_publish(PublishParams {
            channel: "itest:channel".to_string(),
            message: "ping".to_string(),
        })
        .await
        .expect("publish");
    assert!(extract_text(result).contains("published"));
}

#[tokio::test]
async fn subscribe_and_unsubscribe_confirm() {
    let manager = require_redis!();
    let server = RedisMcpServer::new(manager.clone());

    let result = server
        .do_subscribe(ChannelParams {
            channel: "itest:channel".to_string(),
        })
        .await
        .expect("subscribe");
    assert!(extract_text(result).contains("Subscribed"));

    let result = server
        .do_unsubscribe(ChannelParams {
            channel: "itest:channel".to_string(),
        })
        .await
        .expect("unsubscribe");
    assert!(extract_text(result).contains("Unsubscribed"));
}

// -- key management --

#[tokio::test]
async fn key_info_reports_type_ttl_and_value() {
    let manager = require_redis!();
    let server = RedisMcpServer::new(manager.clone());

    server
        .do_set(SetStringParams {
            key: "itest:info".to_string(),
            value: "val".to_string(),
            expiration: None,
        })
        .await
        .expect("set");

    let json = extract_json(
        server
            .do_get_key_info(KeyParams {
                key: "itest:info".to_string(),
            })
            .await
            .expect("key info"),
    );
    assert_eq!(json["type"], "string");
    assert_eq!(json["ttl"], -1);
    assert_eq!(json["value"], "val");
}

#[tokio::test]
async fn delete_rename_and_expire() {
    let manager = require_redis!();
    let server = RedisMcpServer::new(manager.clone());
    del_keys(&manager, &["itest:old", "itest:new"]).await;

    server
        .do_set(SetStringParams {
            key: "itest:old".to_string(),
            value: "v".to_string(),
            expiration: None,
        })
        .await
        .expect("set");

    let result = server
        .do_rename_key(RenameParams {
            old_key: "itest:old".to_string(),
            new_key: "itest:new".to_string(),
        })
        .await
        .expect("rename");
    assert!(extract_text(result).contains("Renamed"));

    let result = server
        .do_expire_key(ExpireParams {
            key: "itest:new".to_string(),
            seconds: 120,
        })
        .await
        .expect("expire");
    assert!(extract_text(result).contains("Expiration"));

    let result = server
        .do_delete_key(KeyParams {
            key: "itest:new".to_string(),
        })
        .await
        .expect("delete");
    assert!(extract_text(result).contains("Successfully deleted"));

    let result = server
        .do_delete_key(KeyParams {
            key: "itest:new".to_string(),
        })
        .await
        .expect("delete again");
    assert!(extract_text(result).contains("not found"));
}

#[tokio::test]
async fn scan_keys_matches_pattern() {
    let manager = require_redis!();
    let server = RedisMcpServer::new(manager.clone());
    del_keys(&manager, &["itest:scan:1", "itest:scan:2"]).await;

    for key in ["itest:scan:1", "itest:scan:2"] {
        server
            .do_set(SetStringParams {
                key: key.to_string(),
                value: "v".to_string(),
                expiration: None,
            })
            .await
            .expect("set");
    }

    let json = extract_json(
        server
            .do_scan_keys(ScanParams {
                pattern: Some("itest:scan:*".to_string()),
                count: None,
            })
            .await
            .expect("scan"),
    );
    assert_eq!(json["count"], 2);
}

// -- server management --

#[tokio::test]
async fn dbsize_counts_keys() {
    let manager = require_redis!();
    let server = RedisMcpServer::new(manager.clone());

    server
        .do_set(SetStringParams {
            key: "itest:dbsize".to_string(),
            value: "v".to_string(),
            expiration: None,
        })
        .await
        .expect("set");

    let json = extract_json(server.do_dbsize().await.expect("dbsize"));
    assert!(json["dbsize"].as_i64().expect("dbsize") >= 1);
}

#[tokio::test]
async fn info_contains_redis_version() {
    let manager = require_redis!();
    let server = RedisMcpServer::new(manager.clone());

    let result = server
        .do_info(InfoParams { section: None })
        .await
        .expect("info");
    assert!(extract_text(result).contains("redis_version"));

    let result = server
        .do_info(InfoParams {
            section: Some("memory".to_string()),
        })
        .await
        .expect("info memory");
    assert!(extract_text(result).contains("used_memory"));
}

#[tokio::test]
async fn client_list_includes_our_identity() {
    let manager = require_redis!();
    let server = RedisMcpServer::new(manager.clone());
    let conn = manager.get_connection().await.expect("connection");

    let json = extract_json(server.do_client_list().await.expect("client list"));
    let clients = json["clients"].as_array().expect("clients");
    assert!(!clients.is_empty());
    assert!(
        clients
            .iter()
            .any(|c| c["name"] == conn.client_identity()),
        "expected a client named {}",
        conn.client_identity()
    );
}

// -- raw commands --

#[tokio::test]
async fn execute_raw_command_round_trip() {
    let manager = require_redis!();
    let server = RedisMcpServer::new(manager.clone());

    let result = server
        .do_execute_raw_command(RawCommandParams {
            command: "SET".to_string(),
            args: Some(vec!["itest:raw".to_string(), "raw-value".to_string()]),
        })
        .await
        .expect("raw set");
    assert!(extract_text(result).contains("OK"));

    let json = extract_json(
        server
            .do_execute_raw_command(RawCommandParams {
                command: "GET".to_string(),
                args: Some(vec!["itest:raw".to_string()]),
            })
            .await
            .expect("raw get"),
    );
    assert_eq!(json, "raw-value");
}

#[tokio::test]
async fn get_indexes_returns_list_or_module_error() {
    // The query engine is an optional server module: accept either a JSON
    // list of indexes or a descriptive error text.
    let manager = require_redis!();
    let server = RedisMcpServer::new(manager.clone());

    let text = extract_text(server.do_get_indexes().await.expect("get_indexes"));
    assert!(
        text.starts_with('[') || text.starts_with("Error retrieving indexes"),
        "unexpected output: {text}"
    );
}
