//! Oldest-first eviction of cached images
//!
//! Frees bytes by deleting the oldest non-preserved cached images until a
//! target is met. Age comes from the timestamp embedded in the record's own
//! key, not from storage metadata, since the underlying store does not
//! expose write-time ordering. Best-effort: eviction never fails, it only
//! frees less than asked.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::quota::QuotaEstimator;
use crate::config::CacheConfig;
use crate::errors::StoreResult;
use crate::models::cached_image::{parse_created_at_ms, CachedImageRecord};
use crate::store::{accounted_bytes, KeyValueStore};

#[derive(Clone)]
pub struct EvictionManager {
    store: Arc<dyn KeyValueStore>,
    estimator: QuotaEstimator,
    config: CacheConfig,
}

impl EvictionManager {
    pub fn new(store: Arc<dyn KeyValueStore>, config: CacheConfig) -> Self {
        let estimator = QuotaEstimator::new(store.clone());
        Self {
            store,
            estimator,
            config,
        }
    }

    /// Delete oldest non-preserved cached images until at least
    /// `required_bytes` of accounted usage has been freed, or candidates run
    /// out. Never fails.
    pub async fn ensure_space(&self, required_bytes: u64, preserve_keys: &HashSet<String>) {
        match self.evict_oldest(required_bytes, preserve_keys).await {
            Ok(freed) => {
                debug!(
                    "Eviction freed {} bytes (requested {})",
                    freed, required_bytes
                );
            }
            Err(e) => warn!("Eviction pass failed, continuing: {}", e),
        }
    }

    /// Ambient housekeeping: when usage exceeds the configured threshold of
    /// the ceiling, keep only the N most recent non-preserved cached images
    /// and delete the rest. Never fails.
    pub async fn housekeep(&self, preserve_keys: &HashSet<String>) {
        if let Err(e) = self.housekeep_inner(preserve_keys).await {
            warn!("Housekeeping pass failed, continuing: {}", e);
        }
    }

    async fn housekeep_inner(&self, preserve_keys: &HashSet<String>) -> StoreResult<()> {
        let used = self.estimator.estimate_used_bytes().await?;
        let threshold =
            (self.config.quota_ceiling_bytes as f64 * self.config.housekeeping_threshold) as u64;
        if used <= threshold {
            return Ok(());
        }

        let mut candidates = self.candidates(preserve_keys).await?;
        // newest first, then drop everything past the keep window
        candidates.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms));
        let stale = candidates
            .split_off(candidates.len().min(self.config.housekeeping_keep_recent));

        debug!(
            "Housekeeping: usage {} over threshold {}, deleting {} stale records",
            used,
            threshold,
            stale.len()
        );
        for record in stale {
            self.store.remove(&record.key).await?;
        }
        Ok(())
    }

    async fn evict_oldest(
        &self,
        required_bytes: u64,
        preserve_keys: &HashSet<String>,
    ) -> StoreResult<u64> {
        let mut candidates = self.candidates(preserve_keys).await?;
        candidates.sort_by(|a, b| {
            a.created_at_ms
                .cmp(&b.created_at_ms)
                .then_with(|| a.key.cmp(&b.key))
        });

        let mut freed = 0u64;
        for record in candidates {
            if freed >= required_bytes {
                break;
            }
            self.store.remove(&record.key).await?;
            freed += accounted_bytes(&record.key, record.size_bytes as usize);
            debug!("Evicted cached image '{}' ({} bytes)", record.key, record.size_bytes);
        }
        Ok(freed)
    }

    /// Enumerate cached-image records outside the preserve set
    async fn candidates(&self, preserve_keys: &HashSet<String>) -> StoreResult<Vec<CachedImageRecord>> {
        let mut records = Vec::new();
        for key in self.store.keys().await? {
            if preserve_keys.contains(&key) {
                continue;
            }
            let Some(created_at_ms) = parse_created_at_ms(&key) else {
                continue;
            };
            let size_bytes = self
                .store
                .get(&key)
                .await?
                .map(|v| v.len() as u64)
                .unwrap_or(0);
            records.push(CachedImageRecord {
                key,
                size_bytes,
                created_at_ms,
            });
        }
        Ok(records)
    }
}
