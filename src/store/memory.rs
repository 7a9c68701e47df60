//! In-memory key/value store
//!
//! Primary backing store for tests and for single-session embedding. Honors
//! the same byte ceiling semantics as the file store so quota behavior can
//! be exercised without touching disk.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{accounted_bytes, KeyValueStore};
use crate::errors::{StoreError, StoreResult};

#[derive(Debug, Clone)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    ceiling_bytes: Option<u64>,
}

impl MemoryStore {
    /// Unbounded store
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ceiling_bytes: None,
        }
    }

    /// Store that rejects writes past `ceiling_bytes` of accounted usage
    pub fn bounded(ceiling_bytes: u64) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ceiling_bytes: Some(ceiling_bytes),
        }
    }

    fn used_bytes(entries: &HashMap<String, Vec<u8>>) -> u64 {
        entries
            .iter()
            .map(|(k, v)| accounted_bytes(k, v.len()))
            .sum()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        let mut entries = self.entries.write().await;
        if let Some(ceiling) = self.ceiling_bytes {
            let existing = entries
                .get(key)
                .map(|v| accounted_bytes(key, v.len()))
                .unwrap_or(0);
            let attempted = accounted_bytes(key, value.len());
            let prospective = Self::used_bytes(&entries) - existing + attempted;
            if prospective > ceiling {
                return Err(StoreError::QuotaExceeded {
                    attempted_bytes: attempted,
                });
            }
        }
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.entries.read().await.keys().cloned().collect())
    }

    async fn total_entries(&self) -> StoreResult<usize> {
        Ok(self.entries.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_roundtrip_and_remove() {
        let store = MemoryStore::new();
        store.set("a", b"hello").await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some(b"hello".to_vec()));
        assert_eq!(store.total_entries().await.unwrap(), 1);

        store.remove("a").await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), None);
        // removing again is not an error
        store.remove("a").await.unwrap();
    }

    #[tokio::test]
    async fn test_ceiling_rejects_oversized_write() {
        let store = MemoryStore::bounded(100);
        // accounted: 2 * (1 + 60) = 122 > 100
        let err = store.set("k", &[0u8; 60]).await.unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded { .. }));

        // accounted: 2 * (1 + 40) = 82 fits
        store.set("k", &[0u8; 40]).await.unwrap();
        // replacing the same key with a same-size value also fits
        store.set("k", &[1u8; 40]).await.unwrap();
    }
}
