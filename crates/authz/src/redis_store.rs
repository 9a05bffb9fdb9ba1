//! Redis-backed cache store (optional).
//!
//! Used when the gateway runs as multiple instances and invalidation must
//! reach all of them. Prefix deletion is a cursor-based SCAN with batched
//! DEL, never a single unbounded operation.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;

use crate::CacheStoreError;
use crate::store::{CacheStore, SCAN_BATCH};

/// Cache store on a shared redis instance.
#[derive(Clone)]
pub struct RedisCacheStore {
    conn: redis::aio::MultiplexedConnection,
}

impl RedisCacheStore {
    /// Connect eagerly; the connection lifecycle belongs to process startup,
    /// not to the first cache access.
    pub async fn connect(url: &str) -> Result<Self, CacheStoreError> {
        let client = redis::Client::open(url)
            .map_err(|e| CacheStoreError::Unavailable(e.to_string()))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| CacheStoreError::Unavailable(e.to_string()))?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError> {
        let mut conn = self.conn.clone();
        conn.get(key)
            .await
            .map_err(|e| CacheStoreError::Unavailable(e.to_string()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheStoreError> {
        let mut conn = self.conn.clone();
        let seconds = ttl.as_secs().max(1);
        let _: () = conn
            .set_ex(key, value, seconds)
            .await
            .map_err(|e| CacheStoreError::Unavailable(e.to_string()))?;
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64, CacheStoreError> {
        let mut conn = self.conn.clone();
        let pattern = format!("{prefix}*");
        let mut cursor: u64 = 0;
        let mut deleted: u64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(|e| CacheStoreError::Unavailable(e.to_string()))?;

            if !keys.is_empty() {
                let removed: u64 = conn
                    .del(keys)
                    .await
                    .map_err(|e| CacheStoreError::Unavailable(e.to_string()))?;
                deleted += removed;
            }

            cursor = next;
            if cursor == 0 {
                return Ok(deleted);
            }
        }
    }
}
