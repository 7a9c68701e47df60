//! Device session identity
//!
//! Initialized lazily on first use, persisted once, stable for the device's
//! lifetime. Used both as the author tag for new submissions and as the
//! voter identity for likes. Explicitly scoped (passed around, not ambient
//! global state) so tests can run multiple simulated sessions in isolation.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::errors::PersistenceResult;
use crate::store::KeyValueStore;

pub const SESSION_KEY: &str = "session/identity";

/// Opaque per-device voter/author id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone)]
pub struct SessionIdentity {
    store: Arc<dyn KeyValueStore>,
}

impl SessionIdentity {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Return the stable session id, generating and persisting one on first
    /// use. An unreadable persisted id is replaced rather than propagated.
    pub async fn current(&self) -> PersistenceResult<SessionId> {
        if let Some(bytes) = self.store.get(SESSION_KEY).await? {
            if let Ok(id) = String::from_utf8(bytes) {
                if !id.is_empty() {
                    return Ok(SessionId(id));
                }
            }
        }

        let id = Uuid::new_v4().to_string();
        self.store.set(SESSION_KEY, id.as_bytes()).await?;
        debug!("Initialized new session identity");
        Ok(SessionId(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_identity_is_stable_across_calls() {
        let store = Arc::new(MemoryStore::new());
        let identity = SessionIdentity::new(store.clone());

        let first = identity.current().await.unwrap();
        let second = identity.current().await.unwrap();
        assert_eq!(first, second);

        // and across a fresh handle over the same store
        let other_handle = SessionIdentity::new(store);
        assert_eq!(other_handle.current().await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_two_stores_get_distinct_identities() {
        let a = SessionIdentity::new(Arc::new(MemoryStore::new()));
        let b = SessionIdentity::new(Arc::new(MemoryStore::new()));
        assert_ne!(a.current().await.unwrap(), b.current().await.unwrap());
    }
}
