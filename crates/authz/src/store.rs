//! Cache store interface and the in-memory implementation.
//!
//! The store speaks strings: callers serialize their own values. Each
//! operation is individually atomic; there are no cross-key transactions.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::CacheStoreError;

/// How many keys one `delete_prefix` pass touches before yielding.
///
/// Keeps bulk invalidation from blocking other cache users on large key
/// counts; both backends iterate in batches of this size.
pub(crate) const SCAN_BATCH: usize = 100;

/// Shared cache store consumed by the status and decision caches.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch a value. Expired entries read as absent.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError>;

    /// Store a value for `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheStoreError>;

    /// Delete every key with the given prefix, in bounded batches.
    /// Returns the number of keys deleted.
    async fn delete_prefix(&self, prefix: &str) -> Result<u64, CacheStoreError>;
}

struct Entry {
    value: String,
    expires_at: Instant,
}

/// Process-local cache store.
///
/// The default for single-instance deployments and tests; multi-instance
/// deployments use the redis backend so invalidation reaches every node.
#[derive(Default)]
pub struct InMemoryCacheStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError> {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                // Reads past expiry are treated as absent; drop eagerly.
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheStoreError> {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64, CacheStoreError> {
        let mut deleted = 0u64;
        loop {
            // Lock is released between batches so concurrent gets/sets are
            // never blocked behind one large invalidation.
            let batch: Vec<String> = {
                let entries = self.entries.lock().expect("cache mutex poisoned");
                entries
                    .keys()
                    .filter(|k| k.starts_with(prefix))
                    .take(SCAN_BATCH)
                    .cloned()
                    .collect()
            };

            if batch.is_empty() {
                return Ok(deleted);
            }

            {
                let mut entries = self.entries.lock().expect("cache mutex poisoned");
                for key in &batch {
                    if entries.remove(key).is_some() {
                        deleted += 1;
                    }
                }
            }

            if batch.len() < SCAN_BATCH {
                return Ok(deleted);
            }
            tokio::task::yield_now().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn set_then_get_within_ttl() {
        let store = InMemoryCacheStore::new();
        store
            .set("k", "v", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn expired_entry_reads_as_absent() {
        let store = InMemoryCacheStore::new();
        store.set("k", "v", Duration::ZERO).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_prefix_spares_other_prefixes() {
        let store = InMemoryCacheStore::new();
        let ttl = Duration::from_secs(60);
        store.set("authz:u1:User:read:User:a", "x", ttl).await.unwrap();
        store.set("authz:u1:User:list:User:self", "x", ttl).await.unwrap();
        store.set("authz:u2:User:read:User:a", "x", ttl).await.unwrap();
        store.set("user_status:u1", "enabled", ttl).await.unwrap();

        let deleted = store.delete_prefix("authz:u1:").await.unwrap();
        assert_eq!(deleted, 2);
        assert!(store.get("authz:u2:User:read:User:a").await.unwrap().is_some());
        assert!(store.get("user_status:u1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_prefix_handles_more_keys_than_one_batch() {
        let store = InMemoryCacheStore::new();
        let ttl = Duration::from_secs(60);
        for i in 0..(SCAN_BATCH * 2 + 13) {
            store
                .set(&format!("authz:bulk:{i}"), "x", ttl)
                .await
                .unwrap();
        }
        store.set("authz:other:1", "x", ttl).await.unwrap();

        let deleted = store.delete_prefix("authz:bulk:").await.unwrap();
        assert_eq!(deleted, (SCAN_BATCH * 2 + 13) as u64);
        assert!(store.get("authz:other:1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_prefix_future_can_run_on_a_spawned_task() {
        // Spawning requires the future to be Send; the mutex guard must not
        // be held across the inter-batch yield point.
        let store = Arc::new(InMemoryCacheStore::new());
        let ttl = Duration::from_secs(60);
        for i in 0..(SCAN_BATCH + 1) {
            store
                .set(&format!("authz:spawned:{i}"), "x", ttl)
                .await
                .unwrap();
        }

        let task = {
            let store = store.clone();
            tokio::spawn(async move { store.delete_prefix("authz:spawned:").await })
        };
        assert_eq!(task.await.unwrap().unwrap(), (SCAN_BATCH + 1) as u64);
    }

    #[tokio::test]
    async fn delete_prefix_on_empty_store_is_zero() {
        let store = InMemoryCacheStore::new();
        assert_eq!(store.delete_prefix("authz:").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn overwrite_refreshes_value_and_ttl() {
        let store = InMemoryCacheStore::new();
        store.set("k", "old", Duration::ZERO).await.unwrap();
        store.set("k", "new", Duration::from_secs(60)).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("new".to_string()));
    }
}
