//! Single-file JSON key/value store
//!
//! Persists the whole store as one JSON document with base64-encoded values
//! and rewrites it atomically (temp file + rename) on every mutation. This
//! matches the collection-level read-modify-write model of the rest of the
//! crate: there are no partial writes for a reader to observe.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::warn;

use super::{accounted_bytes, KeyValueStore};
use crate::errors::{StoreError, StoreResult};

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    ceiling_bytes: Option<u64>,
}

impl JsonFileStore {
    /// Open (or create) a store at `path`. A corrupt document is treated as
    /// an empty store rather than an error.
    pub async fn open(path: PathBuf, ceiling_bytes: Option<u64>) -> StoreResult<Self> {
        let entries = match fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<HashMap<String, String>>(&bytes) {
                Ok(encoded) => encoded
                    .into_iter()
                    .filter_map(|(k, v)| match BASE64.decode(&v) {
                        Ok(decoded) => Some((k, decoded)),
                        Err(_) => {
                            warn!("Dropping undecodable value for key '{}'", k);
                            None
                        }
                    })
                    .collect(),
                Err(e) => {
                    warn!("Store document at {:?} is corrupt, starting empty: {}", path, e);
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(StoreError::Io(e)),
        };

        Ok(Self {
            path,
            entries: Arc::new(RwLock::new(entries)),
            ceiling_bytes,
        })
    }

    fn used_bytes(entries: &HashMap<String, Vec<u8>>) -> u64 {
        entries
            .iter()
            .map(|(k, v)| accounted_bytes(k, v.len()))
            .sum()
    }

    async fn persist(&self, entries: &HashMap<String, Vec<u8>>) -> StoreResult<()> {
        let encoded: HashMap<&str, String> = entries
            .iter()
            .map(|(k, v)| (k.as_str(), BASE64.encode(v)))
            .collect();
        let document = serde_json::to_vec(&encoded).map_err(|e| StoreError::Unavailable {
            message: format!("failed to serialize store document: {e}"),
        })?;

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &document).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
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
        self.persist(&entries).await
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        let mut entries = self.entries.write().await;
        if entries.remove(key).is_some() {
            self.persist(&entries).await?;
        }
        Ok(())
    }

    async fn keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.entries.read().await.keys().cloned().collect())
    }

    async fn total_entries(&self) -> StoreResult<usize> {
        Ok(self.entries.read().await.len())
    }
}
