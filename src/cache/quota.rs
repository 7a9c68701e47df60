//! Byte quota estimation over the key/value store

use std::sync::Arc;

use serde::Serialize;

use crate::errors::StoreResult;
use crate::store::{accounted_bytes, KeyValueStore};

/// Usage snapshot derived from the estimator
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub record_count: usize,
    pub used_bytes: u64,
    pub ceiling_bytes: u64,
}

/// Measures current usage of the local persisted store.
///
/// Walks every key/value pair and sums `2 x (key_len + value_len)`, an
/// overestimate that makes eviction trigger early rather than late.
/// O(n) in stored keys; it only runs before writes, not on every read.
/// No running total is cached: the store is re-walked on each call so
/// restarts cannot leave a stale figure behind.
#[derive(Clone)]
pub struct QuotaEstimator {
    store: Arc<dyn KeyValueStore>,
}

impl QuotaEstimator {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn estimate_used_bytes(&self) -> StoreResult<u64> {
        let mut total = 0u64;
        for key in self.store.keys().await? {
            let value_len = self
                .store
                .get(&key)
                .await?
                .map(|v| v.len())
                .unwrap_or(0);
            total += accounted_bytes(&key, value_len);
        }
        Ok(total)
    }

    pub async fn stats(&self, ceiling_bytes: u64) -> StoreResult<CacheStats> {
        Ok(CacheStats {
            record_count: self.store.total_entries().await?,
            used_bytes: self.estimate_used_bytes().await?,
            ceiling_bytes,
        })
    }
}
