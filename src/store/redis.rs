use std::collections::VecDeque;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use log::{debug, info, trace, warn};
use redis::{aio::ConnectionManager, AsyncCommands, RedisResult};

use super::{KeyStream, KeyValueStore, StoreResult};
use crate::config::StoreConfig;
use crate::errors::StoreError;

/// Keys requested per SCAN round trip
const SCAN_BATCH: usize = 100;

/// Redis-backed store. Cheap to clone; clones share one managed connection.
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
    operation_timeout: Duration,
}

impl RedisStore {
    /// Opens a managed connection to the configured Redis server
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        info!("Initializing store connection");
        debug!(
            "Store configuration: connect_timeout={}s, operation_timeout={}ms",
            config.connect_timeout_seconds, config.operation_timeout_ms
        );

        let client = redis::Client::open(config.url.as_str()).map_err(|e| {
            warn!("Invalid store URL: {}", e);
            StoreError::from(e)
        })?;

        let connection = bounded(
            "connect",
            config.connect_timeout(),
            ConnectionManager::new(client),
        )
        .await
        .map_err(|e| {
            warn!("Failed to connect to store: {}", e);
            e
        })?;

        info!("Successfully connected to store");

        Ok(Self {
            connection,
            operation_timeout: config.operation_timeout(),
        })
    }

    fn connection(&self) -> ConnectionManager {
        self.connection.clone()
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        trace!("GET {}", key);
        let mut conn = self.connection();
        bounded("get", self.operation_timeout, conn.get(key)).await
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> StoreResult<bool> {
        trace!("SETNX {}", key);
        let mut conn = self.connection();
        bounded("set_if_absent", self.operation_timeout, conn.set_nx(key, value)).await
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        trace!("EXISTS {}", key);
        let mut conn = self.connection();
        bounded("exists", self.operation_timeout, conn.exists(key)).await
    }

    fn scan_keys(&self, prefix: &str) -> KeyStream {
        let connection = self.connection();
        let pattern = format!("{}*", escape_glob(prefix));
        let operation_timeout = self.operation_timeout;

        paginate(move |cursor| {
            let mut connection = connection.clone();
            let pattern = pattern.clone();
            async move {
                let (next, keys): Page = bounded(
                    "scan_keys",
                    operation_timeout,
                    redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(&pattern)
                        .arg("COUNT")
                        .arg(SCAN_BATCH)
                        .query_async(&mut connection),
                )
                .await?;

                trace!("SCAN {} -> {} keys, next cursor {}", cursor, keys.len(), next);
                Ok::<Page, StoreError>((next, keys))
            }
        })
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.connection();
        let _: String = bounded(
            "ping",
            self.operation_timeout,
            redis::cmd("PING").query_async(&mut conn),
        )
        .await?;
        Ok(())
    }
}

/// One page of a cursor walk: the cursor to resume from and the keys found
type Page = (u64, Vec<String>);

/// Cursor state for one paged walk
struct Pager<F> {
    fetch: F,
    cursor: u64,
    pending: VecDeque<String>,
    finished: bool,
}

/// Flattens a cursor-paged fetch into a key stream.
///
/// `fetch` is called with cursor 0 first and then with each cursor it
/// returns, until it hands back 0. Pages may be empty. The first error is
/// yielded and ends the stream.
fn paginate<F, Fut>(fetch: F) -> KeyStream
where
    F: FnMut(u64) -> Fut + Send + 'static,
    Fut: Future<Output = StoreResult<Page>> + Send + 'static,
{
    let pager = Pager {
        fetch,
        cursor: 0,
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(pager, |mut pager| async move {
        loop {
            if let Some(key) = pager.pending.pop_front() {
                return Some((Ok(key), pager));
            }
            if pager.finished {
                return None;
            }

            match (pager.fetch)(pager.cursor).await {
                Ok((next, keys)) => {
                    pager.pending.extend(keys);
                    pager.cursor = next;
                    pager.finished = next == 0;
                }
                Err(e) => {
                    pager.finished = true;
                    return Some((Err(e), pager));
                }
            }
        }
    })
    .boxed()
}

/// Runs a Redis future under a deadline, mapping both failure kinds into
/// [`StoreError`].
async fn bounded<T>(
    operation: &'static str,
    after: Duration,
    fut: impl Future<Output = RedisResult<T>>,
) -> StoreResult<T> {
    match tokio::time::timeout(after, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            warn!("Store {} failed: {}", operation, e);
            Err(StoreError::from(e))
        }
        Err(_) => {
            warn!("Store {} timed out after {:?}", operation, after);
            Err(StoreError::Timeout { operation, after })
        }
    }
}

/// Escapes Redis glob metacharacters so a prefix matches literally.
fn escape_glob(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len());
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\' | '^' | '-') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::{Arc, Mutex};

    use futures_util::TryStreamExt;

    /// Serves canned pages in order and records the cursors asked for
    fn scripted(
        pages: Vec<StoreResult<Page>>,
    ) -> (
        impl FnMut(u64) -> futures_util::future::Ready<StoreResult<Page>> + Send + 'static,
        Arc<Mutex<Vec<u64>>>,
    ) {
        let pages = Arc::new(Mutex::new(VecDeque::from(pages)));
        let cursors = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&cursors);

        let fetch = move |cursor: u64| {
            seen.lock().unwrap().push(cursor);
            let page = pages
                .lock()
                .unwrap()
                .pop_front()
                .expect("fetched past the last page");
            futures_util::future::ready(page)
        };
        (fetch, cursors)
    }

    fn live_config() -> StoreConfig {
        StoreConfig {
            url: std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into()),
            connect_timeout_seconds: 2,
            operation_timeout_ms: 2000,
        }
    }

    #[tokio::test]
    async fn test_paginate_follows_cursor_until_zero() {
        let (fetch, cursors) = scripted(vec![
            Ok((7, vec!["a".into(), "b".into()])),
            Ok((3, vec![])),
            Ok((0, vec!["c".into()])),
        ]);

        let keys: Vec<String> = paginate(fetch).try_collect().await.unwrap();

        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(*cursors.lock().unwrap(), vec![0, 7, 3]);
    }

    #[tokio::test]
    async fn test_paginate_spans_several_full_batches() {
        let batch = |range: std::ops::Range<usize>| -> Vec<String> {
            range.map(|i| format!("k{}", i)).collect()
        };
        let (fetch, cursors) = scripted(vec![
            Ok((11, batch(0..SCAN_BATCH))),
            Ok((22, batch(SCAN_BATCH..2 * SCAN_BATCH))),
            Ok((0, batch(2 * SCAN_BATCH..2 * SCAN_BATCH + 50))),
        ]);

        let keys: Vec<String> = paginate(fetch).try_collect().await.unwrap();

        assert_eq!(keys.len(), 2 * SCAN_BATCH + 50);
        assert_eq!(cursors.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_paginate_error_ends_stream() {
        let (fetch, cursors) = scripted(vec![
            Ok((5, vec!["a".into()])),
            Err(StoreError::Unavailable("connection reset".into())),
        ]);

        let items: Vec<StoreResult<String>> = paginate(fetch).collect().await;

        assert_eq!(items.len(), 2);
        assert!(matches!(&items[0], Ok(key) if key == "a"));
        assert!(matches!(&items[1], Err(StoreError::Unavailable(_))));
        // Nothing is fetched after the failure
        assert_eq!(*cursors.lock().unwrap(), vec![0, 5]);
    }

    #[tokio::test]
    async fn test_paginate_empty_walk() {
        let (fetch, _) = scripted(vec![Ok((0, vec![]))]);

        let keys: Vec<String> = paginate(fetch).try_collect().await.unwrap();
        assert!(keys.is_empty());
    }

    #[tokio::test]
    #[ignore = "needs a running Redis at REDIS_URL"]
    async fn test_redis_set_if_absent_never_overwrites() {
        let store = RedisStore::connect(&live_config()).await.unwrap();
        let key = format!("shorty-test:{}:setnx", uuid::Uuid::new_v4());

        assert!(store.set_if_absent(&key, "first").await.unwrap());
        assert!(!store.set_if_absent(&key, "second").await.unwrap());
        assert_eq!(store.get(&key).await.unwrap().as_deref(), Some("first"));
        assert!(store.exists(&key).await.unwrap());

        let _: () = redis::cmd("DEL")
            .arg(&key)
            .query_async(&mut store.connection())
            .await
            .unwrap();
    }

    #[tokio::test]
    #[ignore = "needs a running Redis at REDIS_URL"]
    async fn test_redis_scan_walks_past_one_batch() {
        let store = RedisStore::connect(&live_config()).await.unwrap();
        let prefix = format!("shorty-test:{}:", uuid::Uuid::new_v4());
        let total = 2 * SCAN_BATCH + 50;

        let written: BTreeSet<String> = (0..total).map(|i| format!("{}{}", prefix, i)).collect();
        for key in &written {
            assert!(store.set_if_absent(key, "v").await.unwrap());
        }

        // SCAN may repeat keys; compare as a set
        let scanned: BTreeSet<String> = store.scan_keys(&prefix).try_collect().await.unwrap();
        assert_eq!(scanned, written);

        let _: () = redis::cmd("DEL")
            .arg(written.iter().collect::<Vec<_>>())
            .query_async(&mut store.connection())
            .await
            .unwrap();
    }

    #[test]
    fn test_escape_glob() {
        assert_eq!(escape_glob("shortener:hash:"), "shortener:hash:");
        assert_eq!(escape_glob("a*b?c[d]"), "a\\*b\\?c\\[d\\]");
    }

    #[tokio::test]
    async fn test_connect_to_unreachable_server_is_unavailable() {
        let config = StoreConfig {
            // Port 1 is reserved and never has a Redis listening on it
            url: "redis://127.0.0.1:1".to_string(),
            connect_timeout_seconds: 1,
            operation_timeout_ms: 100,
        };

        let result = RedisStore::connect(&config).await;
        assert!(matches!(
            result,
            Err(StoreError::Unavailable(_)) | Err(StoreError::Timeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_connect_rejects_malformed_url() {
        let config = StoreConfig {
            url: "not a redis url".to_string(),
            connect_timeout_seconds: 1,
            operation_timeout_ms: 100,
        };

        assert!(matches!(
            RedisStore::connect(&config).await,
            Err(StoreError::Unavailable(_))
        ));
    }
}
