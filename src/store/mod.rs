// src/store/mod.rs - Key-value storage contract
use std::time::Instant;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};

mod memory;
mod redis;

pub use self::memory::InMemoryStore;
pub use self::redis::RedisStore;

use crate::errors::StoreError;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Lazy sequence of keys produced by [`KeyValueStore::scan_keys`].
pub type KeyStream = BoxStream<'static, StoreResult<String>>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetches the value stored under `key`
    ///
    /// ### Returns
    /// * `Ok(None)` - If nothing is stored under the key
    ///
    /// ### Errors
    /// * `StoreError::Unavailable` - If the backend cannot be reached
    /// * `StoreError::Timeout` - If the backend does not answer in time
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Stores `value` under `key` only if the key is currently unset
    ///
    /// The check and the write are a single atomic step on the backend; of
    /// any number of concurrent callers for one key, exactly one sees `true`.
    ///
    /// ### Returns
    /// * `Ok(true)` - If the value was written
    /// * `Ok(false)` - If the key already held a value (left untouched)
    async fn set_if_absent(&self, key: &str, value: &str) -> StoreResult<bool>;

    /// Checks whether anything is stored under `key`
    async fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Enumerates every key starting with `prefix`
    ///
    /// The stream is finite and unordered, and may yield a key more than
    /// once. Writes running concurrently with the scan may or may not be
    /// observed. Errors are yielded in-stream and end the scan.
    fn scan_keys(&self, prefix: &str) -> KeyStream;

    /// Round-trips to the backend to confirm it is reachable
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Store health status
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreHealthStatus {
    Healthy,
    Unhealthy,
}

/// Complete store health check result
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreHealth {
    pub status: StoreHealthStatus,
    pub response_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StoreHealth {
    /// Times a [`KeyValueStore::ping`] and folds the outcome into a report.
    pub async fn probe(store: &(impl KeyValueStore + ?Sized)) -> Self {
        let start = Instant::now();
        let result = store.ping().await;
        let response_time_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(()) => Self {
                status: StoreHealthStatus::Healthy,
                response_time_ms,
                message: None,
            },
            Err(e) => Self {
                status: StoreHealthStatus::Unhealthy,
                response_time_ms,
                message: Some(format!("Store ping failed: {}", e)),
            },
        }
    }
}
