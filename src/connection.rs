//! The single process-wide Redis connection.
//!
//! `RedisConnectionManager` constructs the client lazily on first use,
//! picking the standalone or cluster shape from the resolved
//! configuration, and hands out cheap clones of the multiplexed handle on
//! every later call. Construction is serialized by the slot mutex, so
//! concurrent first callers can never build a second client; a failed
//! attempt leaves the slot empty and the next call retries from scratch.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use redis::aio::ConnectionLike;
use redis::cluster::ClusterClientBuilder;
use redis::{Cmd, Pipeline, RedisFuture, Value};
use tokio::sync::Mutex;

use crate::config::{CertRequirement, ConnectionConfig};
use crate::error::RedisMcpError;

/// Identity registered with the server via CLIENT SETNAME, so this
/// process is recognizable in CLIENT LIST output.
const CLIENT_NAME: &str = concat!("redis-mcp-v", env!("CARGO_PKG_VERSION"));

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);

/// The shared live client. Both variants are multiplexed and cheap to
/// clone; tools issue commands through `ConnectionLike` without knowing
/// which shape they hold.
#[derive(Clone)]
pub enum RedisHandle {
    Standalone(redis::aio::ConnectionManager),
    Cluster(redis::cluster_async::ClusterConnection),
}

impl RedisHandle {
    /// Identity string this process registered with the server.
    pub fn client_identity(&self) -> &'static str {
        CLIENT_NAME
    }

    pub fn is_cluster(&self) -> bool {
        matches!(self, RedisHandle::Cluster(_))
    }
}

impl std::fmt::Debug for RedisHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RedisHandle::Standalone(_) => f.write_str("RedisHandle::Standalone"),
            RedisHandle::Cluster(_) => f.write_str("RedisHandle::Cluster"),
        }
    }
}

impl ConnectionLike for RedisHandle {
    fn req_packed_command<'a>(&'a mut self, cmd: &'a Cmd) -> RedisFuture<'a, Value> {
        match self {
            RedisHandle::Standalone(conn) => conn.req_packed_command(cmd),
            RedisHandle::Cluster(conn) => conn.req_packed_command(cmd),
        }
    }

    fn req_packed_commands<'a>(
        &'a mut self,
        cmd: &'a Pipeline,
        offset: usize,
        count: usize,
    ) -> RedisFuture<'a, Vec<Value>> {
        match self {
            RedisHandle::Standalone(conn) => conn.req_packed_commands(cmd, offset, count),
            RedisHandle::Cluster(conn) => conn.req_packed_commands(cmd, offset, count),
        }
    }

    fn get_db(&self) -> i64 {
        match self {
            RedisHandle::Standalone(conn) => conn.get_db(),
            // Cluster has no per-connection database index.
            RedisHandle::Cluster(_) => 0,
        }
    }
}

/// Owns the singleton connection slot. Constructed once at startup from
/// the resolved configuration and shared by reference with the tool
/// layer; never accessed through global state.
pub struct RedisConnectionManager {
    config: ConnectionConfig,
    slot: Mutex<Option<RedisHandle>>,
    attempts: AtomicU64,
}

impl RedisConnectionManager {
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            slot: Mutex::new(None),
            attempts: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Number of construction attempts so far, successful or not.
    pub fn construction_attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// The shared connection, constructing it on first call.
    ///
    /// Concurrent first callers wait on the slot lock while the winner
    /// connects; at most one construction is ever in flight. A failure is
    /// logged, classified, and returned without poisoning the slot, so
    /// the next call is a fresh attempt. There is no automatic retry.
    pub async fn get_connection(&self) -> Result<RedisHandle, RedisMcpError> {
        let mut slot = self.slot.lock().await;
        if let Some(handle) = slot.as_ref() {
            return Ok(handle.clone());
        }

        self.attempts.fetch_add(1, Ordering::Relaxed);
        let result = if self.config.cluster_mode {
            self.connect_cluster().await
        } else {
            self.connect_standalone().await
        };

        match result {
            Ok(mut handle) => {
                // Best effort: some proxies reject CLIENT SETNAME.
                let _: Result<(), _> = redis::cmd("CLIENT")
                    .arg("SETNAME")
                    .arg(CLIENT_NAME)
                    .query_async(&mut handle)
                    .await;

                *slot = Some(handle.clone());
                tracing::info!(
                    addr = %self.config.redacted_addr(),
                    "Established Redis connection"
                );
                Ok(handle)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to establish Redis connection");
                Err(e)
            }
        }
    }

    /// Drop the live handle so the next call reconstructs it.
    /// Administrative and test use only.
    pub async fn reset(&self) {
        let mut slot = self.slot.lock().await;
        *slot = None;
    }

    /// Dedicated short-lived subscriber connection. SUBSCRIBE cannot run
    /// on the shared multiplexed handle.
    pub async fn subscriber(&self) -> Result<redis::aio::PubSub, RedisMcpError> {
        if self.config.cluster_mode {
            return Err(RedisMcpError::InvalidParams(
                "pub/sub subscriptions require a standalone connection".to_string(),
            ));
        }
        let client = self.standalone_client()?;
        Ok(client.get_async_pubsub().await?)
    }

    async fn connect_standalone(&self) -> Result<RedisHandle, RedisMcpError> {
        let client = self.standalone_client()?;
        let config = redis::aio::ConnectionManagerConfig::new()
            .set_connection_timeout(CONNECT_TIMEOUT)
            .set_response_timeout(RESPONSE_TIMEOUT);
        let conn = redis::aio::ConnectionManager::new_with_config(client, config).await?;
        Ok(RedisHandle::Standalone(conn))
    }

    async fn connect_cluster(&self) -> Result<RedisHandle, RedisMcpError> {
        let (host, port) = self.startup_node();
        let info = self.connection_info(&host, port);
        let mut builder = ClusterClientBuilder::new(vec![info])
            .connection_timeout(CONNECT_TIMEOUT)
            .response_timeout(RESPONSE_TIMEOUT);
        if let Some(certs) = self.tls_certificates()? {
            builder = builder.certs(certs);
        }
        let client = builder.build()?;
        let conn = client.get_async_connection().await?;
        Ok(RedisHandle::Cluster(conn))
    }

    fn standalone_client(&self) -> Result<redis::Client, RedisMcpError> {
        let info = self.connection_info(&self.config.host, self.config.port);
        let client = match self.tls_certificates()? {
            Some(certs) => redis::Client::build_with_tls(info, certs)?,
            None => redis::Client::open(info)?,
        };
        Ok(client)
    }

    /// Startup node for cluster topology discovery: the first configured
    /// seed, with the port falling back to the configured port when the
    /// seed omits one. Without seeds, the primary host/port is used.
    fn startup_node(&self) -> (String, u16) {
        match self.config.cluster_nodes.first().filter(|n| !n.is_empty()) {
            Some(node) => split_seed_node(node, self.config.port),
            None => (self.config.host.clone(), self.config.port),
        }
    }

    fn connection_info(&self, host: &str, port: u16) -> redis::ConnectionInfo {
        let addr = if self.config.ssl {
            redis::ConnectionAddr::TcpTls {
                host: host.to_string(),
                port,
                insecure: self.config.ssl_cert_reqs == CertRequirement::None,
                tls_params: None,
            }
        } else {
            redis::ConnectionAddr::Tcp(host.to_string(), port)
        };
        redis::ConnectionInfo {
            addr,
            redis: redis::RedisConnectionInfo {
                db: if self.config.cluster_mode {
                    0
                } else {
                    self.config.db
                },
                username: self.config.username.clone(),
                password: if self.config.password.is_empty() {
                    None
                } else {
                    Some(self.config.password.clone())
                },
                ..Default::default()
            },
        }
    }

    /// Client certificate and CA material, read once at construction.
    /// Unset fields stay unset so the client library keeps its own
    /// defaults.
    fn tls_certificates(&self) -> Result<Option<redis::TlsCertificates>, RedisMcpError> {
        if !self.config.ssl {
            return Ok(None);
        }

        let root_cert = match self
            .config
            .ssl_ca_certs
            .as_deref()
            .or(self.config.ssl_ca_path.as_deref())
        {
            Some(path) => Some(read_tls_file(path)?),
            None => None,
        };
        let client_tls = match (&self.config.ssl_certfile, &self.config.ssl_keyfile) {
            (Some(cert), Some(key)) => Some(redis::ClientTlsConfig {
                client_cert: read_tls_file(cert)?,
                client_key: read_tls_file(key)?,
            }),
            _ => None,
        };

        if root_cert.is_none() && client_tls.is_none() {
            return Ok(None);
        }
        Ok(Some(redis::TlsCertificates {
            client_tls,
            root_cert,
        }))
    }
}

fn read_tls_file(path: &str) -> Result<Vec<u8>, RedisMcpError> {
    std::fs::read(path).map_err(|source| RedisMcpError::TlsFile {
        path: path.to_string(),
        source,
    })
}

fn split_seed_node(node: &str, default_port: u16) -> (String, u16) {
    match node.rsplit_once(':') {
        Some((host, port)) => (host.to_string(), port.parse().unwrap_or(default_port)),
        None => (node.to_string(), default_port),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_node_with_port() {
        assert_eq!(
            split_seed_node("10.0.0.5:7001", 6379),
            ("10.0.0.5".to_string(), 7001)
        );
    }

    #[test]
    fn seed_node_without_port_uses_default() {
        assert_eq!(
            split_seed_node("10.0.0.5", 6379),
            ("10.0.0.5".to_string(), 6379)
        );
    }

    #[test]
    fn seed_node_with_bad_port_uses_default() {
        assert_eq!(
            split_seed_node("10.0.0.5:abc", 6380),
            ("10.0.0.5".to_string(), 6380)
        );
    }

    #[test]
    fn startup_node_prefers_first_seed() {
        let manager = RedisConnectionManager::new(ConnectionConfig {
            cluster_mode: true,
            cluster_nodes: vec!["10.0.0.5:7001".to_string(), "10.0.0.6:7001".to_string()],
            ..Default::default()
        });
        assert_eq!(manager.startup_node(), ("10.0.0.5".to_string(), 7001));
    }

    #[test]
    fn startup_node_seed_port_falls_back_to_config_port() {
        let manager = RedisConnectionManager::new(ConnectionConfig {
            port: 7000,
            cluster_mode: true,
            cluster_nodes: vec!["10.0.0.5".to_string()],
            ..Default::default()
        });
        assert_eq!(manager.startup_node(), ("10.0.0.5".to_string(), 7000));
    }

    #[test]
    fn startup_node_without_seeds_uses_primary() {
        let manager = RedisConnectionManager::new(ConnectionConfig {
            host: "cache1".to_string(),
            port: 7000,
            cluster_mode: true,
            ..Default::default()
        });
        assert_eq!(manager.startup_node(), ("cache1".to_string(), 7000));
    }

    #[test]
    fn connection_info_omits_empty_password() {
        let manager = RedisConnectionManager::new(ConnectionConfig::default());
        let info = manager.connection_info("127.0.0.1", 6379);
        assert_eq!(info.redis.password, None);
        assert_eq!(info.redis.username, None);
    }

    #[test]
    fn connection_info_ignores_db_in_cluster_mode() {
        let manager = RedisConnectionManager::new(ConnectionConfig {
            db: 5,
            cluster_mode: true,
            ..Default::default()
        });
        let info = manager.connection_info("127.0.0.1", 6379);
        assert_eq!(info.redis.db, 0);
    }

    #[test]
    fn unset_tls_material_is_omitted_entirely() {
        let manager = RedisConnectionManager::new(ConnectionConfig {
            ssl: true,
            ..Default::default()
        });
        assert!(manager.tls_certificates().unwrap().is_none());
    }
}
