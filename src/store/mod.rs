//! Local persisted key/value store abstraction
//!
//! The backing store is assumed to be non-transactional and bounded: writes
//! can fail with [`StoreError::QuotaExceeded`], and every logical mutation of
//! a collection is a full read-modify-write of one document. Two
//! implementations ship with the crate: an in-memory store and a single-file
//! JSON store.

pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::errors::StoreResult;

/// Byte accounting used by the quota estimator and the in-crate stores.
///
/// `2 x (key_len + value_len)`: UTF-16-equivalent accounting, an
/// overestimate that makes eviction trigger early rather than late.
pub fn accounted_bytes(key: &str, value_len: usize) -> u64 {
    2 * (key.len() as u64 + value_len as u64)
}

/// Abstract bounded key/value store
///
/// Methods are async so the backing store can be swapped (file, browser
/// storage bridge, test double) without touching the callers.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Replaces the value under `key`. Fails with
    /// [`StoreError::QuotaExceeded`](crate::errors::StoreError::QuotaExceeded)
    /// when the write would push the store past its byte ceiling.
    async fn set(&self, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> StoreResult<()>;

    async fn keys(&self) -> StoreResult<Vec<String>>;

    async fn total_entries(&self) -> StoreResult<usize>;
}
