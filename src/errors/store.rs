use std::time::Duration;

use redis::RedisError;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// Backend unreachable or the command failed on the wire
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Backend did not answer within the configured bound
    #[error("Store {operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}

impl From<RedisError> for StoreError {
    fn from(err: RedisError) -> Self {
        Self::Unavailable(err.to_string())
    }
}
