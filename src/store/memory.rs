use std::sync::Arc;

use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use futures_util::stream::{self, StreamExt};

use super::{KeyStream, KeyValueStore, StoreResult};

/// In-process store for tests and local runs.
///
/// DashMap shards its locks, so `set_if_absent` on one key only contends
/// with callers hashing to the same shard. Nothing survives a restart.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<DashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys, across all prefixes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.get(key).map(|value| value.clone()))
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> StoreResult<bool> {
        // The entry guard holds the shard lock across check and insert
        match self.entries.entry(key.to_owned()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(value.to_owned());
                Ok(true)
            }
        }
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.entries.contains_key(key))
    }

    fn scan_keys(&self, prefix: &str) -> KeyStream {
        let keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect();

        stream::iter(keys.into_iter().map(Ok)).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::TryStreamExt;

    #[tokio::test]
    async fn test_set_if_absent_never_overwrites() {
        let store = InMemoryStore::new();

        assert!(store.set_if_absent("k", "first").await.unwrap());
        assert!(!store.set_if_absent("k", "second").await.unwrap());
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn test_get_and_exists_on_missing_key() {
        let store = InMemoryStore::new();

        assert_eq!(store.get("missing").await.unwrap(), None);
        assert!(!store.exists("missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_scan_keys_filters_by_prefix() {
        let store = InMemoryStore::new();
        store.set_if_absent("p:a", "1").await.unwrap();
        store.set_if_absent("p:b", "2").await.unwrap();
        store.set_if_absent("other:c", "3").await.unwrap();

        let mut keys: Vec<String> = store.scan_keys("p:").try_collect().await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["p:a".to_string(), "p:b".to_string()]);
    }

    #[tokio::test]
    async fn test_concurrent_set_if_absent_has_one_winner() {
        let store = InMemoryStore::new();

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .set_if_absent("race", &format!("writer-{}", i))
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(store.len(), 1);
    }
}
