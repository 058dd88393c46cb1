use rmcp::model::ErrorData;

/// Error taxonomy surfaced by the connection core.
///
/// Redis failures are classified once, in the `From` impl below, so the
/// startup path and every tool report the same distinct kinds.
#[derive(Debug, thiserror::Error)]
pub enum RedisMcpError {
    #[error("Unsupported URI scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Invalid Redis URI: {0}")]
    InvalidUri(#[from] url::ParseError),

    #[error("Failed to connect to Redis server: {0}")]
    ConnectionRefused(#[source] redis::RedisError),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(#[source] redis::RedisError),

    #[error("Connection timed out: {0}")]
    OperationTimeout(#[source] redis::RedisError),

    #[error("Response error: {0}")]
    Protocol(#[source] redis::RedisError),

    #[error("Redis Cluster error: {0}")]
    ClusterTopology(#[source] redis::RedisError),

    #[error("Cannot read TLS file {path}: {source}")]
    TlsFile {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParams(String),

    #[error("Unexpected error: {0}")]
    Unexpected(#[source] redis::RedisError),
}

impl From<redis::RedisError> for RedisMcpError {
    fn from(e: redis::RedisError) -> Self {
        use redis::ErrorKind;

        if e.kind() == ErrorKind::AuthenticationFailed {
            RedisMcpError::AuthenticationFailed(e)
        } else if e.is_timeout() {
            RedisMcpError::OperationTimeout(e)
        } else if e.is_connection_refusal() {
            RedisMcpError::ConnectionRefused(e)
        } else if e.is_cluster_error()
            || matches!(
                e.kind(),
                ErrorKind::CrossSlot | ErrorKind::MasterDown | ErrorKind::ClusterConnectionNotFound
            )
        {
            RedisMcpError::ClusterTopology(e)
        } else if matches!(e.kind(), ErrorKind::ResponseError | ErrorKind::TypeError) {
            RedisMcpError::Protocol(e)
        } else {
            RedisMcpError::Unexpected(e)
        }
    }
}

impl RedisMcpError {
    pub fn to_mcp_error(&self) -> ErrorData {
        match self {
            RedisMcpError::UnsupportedScheme(_)
            | RedisMcpError::InvalidUri(_)
            | RedisMcpError::InvalidParams(_) => ErrorData::invalid_params(self.to_string(), None),
            _ => ErrorData::internal_error(self.to_string(), None),
        }
    }
}
