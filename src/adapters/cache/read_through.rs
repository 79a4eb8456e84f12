//! TTL read-through slot shared by the cache decorators.
//!
//! Every write bumps a counter before invalidating. A load whose fetch
//! overlapped a write never leaves its result behind in the cache.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use crate::domain::errors::DomainResult;

pub(crate) struct ReadThrough<V> {
    entries: Cache<&'static str, Arc<V>>,
    writes: AtomicU64,
}

impl<V: Clone + Send + Sync + 'static> ReadThrough<V> {
    pub(crate) fn new(ttl: Duration, max_capacity: u64) -> Self {
        Self {
            entries: Cache::builder().max_capacity(max_capacity).time_to_live(ttl).build(),
            writes: AtomicU64::new(0),
        }
    }

    /// Cached value for `key`, loading and storing it on a miss.
    pub(crate) async fn get_or_load<F, Fut>(&self, key: &'static str, load: F) -> DomainResult<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = DomainResult<V>>,
    {
        if let Some(cached) = self.entries.get(key).await {
            tracing::debug!(key, "cache hit");
            return Ok((*cached).clone());
        }

        tracing::debug!(key, "cache miss");
        let seen = self.writes.load(Ordering::SeqCst);
        let value = load().await?;
        if self.writes.load(Ordering::SeqCst) != seen {
            tracing::debug!(key, "write during load, result not cached");
            return Ok(value);
        }

        self.entries.insert(key, Arc::new(value.clone())).await;
        // A write that landed between the check and the insert
        if self.writes.load(Ordering::SeqCst) != seen {
            self.entries.invalidate(key).await;
        }
        Ok(value)
    }

    pub(crate) async fn invalidate(&self, key: &'static str) {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.entries.invalidate(key).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::DomainError;

    fn slot() -> ReadThrough<Vec<i64>> {
        ReadThrough::new(Duration::from_secs(60), 10)
    }

    #[tokio::test]
    async fn test_second_read_is_served_from_cache() {
        let slot = slot();
        assert_eq!(slot.get_or_load("k", || async { Ok(vec![1]) }).await.unwrap(), vec![1]);
        assert_eq!(slot.get_or_load("k", || async { Ok(vec![2]) }).await.unwrap(), vec![1]);

        slot.invalidate("k").await;
        assert_eq!(slot.get_or_load("k", || async { Ok(vec![3]) }).await.unwrap(), vec![3]);
    }

    #[tokio::test]
    async fn test_failed_load_is_not_cached() {
        let slot = slot();
        let err = slot
            .get_or_load("k", || async { Err(DomainError::DatabaseError("down".into())) })
            .await;
        assert!(err.is_err());
        assert_eq!(slot.get_or_load("k", || async { Ok(vec![4]) }).await.unwrap(), vec![4]);
    }

    #[tokio::test]
    async fn test_load_overlapping_a_write_is_dropped() {
        let slot = slot();
        let stale = slot
            .get_or_load("k", || async {
                slot.invalidate("k").await;
                Ok(vec![1])
            })
            .await
            .unwrap();
        assert_eq!(stale, vec![1]);

        assert_eq!(slot.get_or_load("k", || async { Ok(vec![2]) }).await.unwrap(), vec![2]);
    }
}
