//! CRUD over locally persisted contribution entries and liked-id sets
//!
//! The whole collection lives under one key and every mutation is a full
//! read-modify-write of that document; the backing store has no atomic
//! primitives, so mutators re-read the latest collection immediately before
//! writing instead of holding a snapshot across an await boundary. A corrupt
//! payload is treated as an empty collection, never as a fatal error.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::errors::PersistenceResult;
use crate::models::ContributionEntry;
use crate::session::SessionId;
use crate::store::KeyValueStore;

pub const COLLECTION_KEY: &str = "contributions/v1";

fn my_likes_key(session: &SessionId) -> String {
    format!("likes/{session}")
}

#[derive(Clone)]
pub struct LocalContributionStore {
    store: Arc<dyn KeyValueStore>,
}

impl LocalContributionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// All locally known entries, most-recent-first (ties broken by id
    /// ascending for determinism). Never fails: an empty, corrupt, or
    /// unreadable store yields an empty sequence.
    pub async fn list(&self) -> Vec<ContributionEntry> {
        let mut entries = self.read_collection().await;
        sort_for_display(&mut entries);
        entries
    }

    /// Insert or replace one entry by id
    pub async fn upsert(&self, entry: ContributionEntry) -> PersistenceResult<()> {
        let mut entries = self.read_collection().await;
        match entries.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
        self.write_collection(&entries).await
    }

    /// Replace the whole collection (used by the synchronizer's merge)
    pub async fn replace_all(&self, entries: Vec<ContributionEntry>) -> PersistenceResult<()> {
        self.write_collection(&entries).await
    }

    /// Remove an entry and any cached images it owns
    pub async fn remove(&self, id: &str) -> PersistenceResult<()> {
        let entries = self.read_collection().await;
        let (removed, kept): (Vec<_>, Vec<_>) = entries.into_iter().partition(|e| e.id == id);
        self.write_collection(&kept).await?;

        for entry in removed {
            for key in entry.owned_image_keys() {
                debug!("Removing cached image '{}' owned by entry '{}'", key, id);
                self.store.remove(&key).await?;
            }
        }
        Ok(())
    }

    /// Flip `session`'s vote on `id`, adjusting the like count by one
    /// (clamped at zero) and recording the vote in the session's own likes
    /// set so repeat toggles stay idempotent. An id that only exists
    /// remotely gets a minimal shadow entry rather than an error.
    pub async fn toggle_like(
        &self,
        id: &str,
        session: &SessionId,
    ) -> PersistenceResult<ContributionEntry> {
        let mut entries = self.read_collection().await;
        let idx = match entries.iter().position(|e| e.id == id) {
            Some(idx) => idx,
            None => {
                debug!("Synthesizing shadow entry for remote-only id '{}'", id);
                entries.push(ContributionEntry::shadow(id));
                entries.len() - 1
            }
        };

        let mut my_likes = self.my_likes(session).await;
        let liking = !my_likes.contains(id);

        let entry = &mut entries[idx];
        if liking {
            my_likes.insert(id.to_string());
            entry.liked_by_session_ids.insert(session.as_str().to_string());
            entry.like_count += 1;
        } else {
            my_likes.remove(id);
            entry.liked_by_session_ids.remove(session.as_str());
            entry.like_count = entry.like_count.saturating_sub(1);
        }
        let updated = entry.clone();

        self.write_collection(&entries).await?;
        self.write_my_likes(session, &my_likes).await?;
        Ok(updated)
    }

    /// Overwrite an entry's like state with remote-reported data, except the
    /// current session's own membership, which stays locally authoritative.
    pub async fn apply_remote_like_state(
        &self,
        id: &str,
        like_count: u32,
        liked_by: Vec<String>,
        session: &SessionId,
        session_has_liked: bool,
    ) -> PersistenceResult<ContributionEntry> {
        let mut entries = self.read_collection().await;
        let idx = match entries.iter().position(|e| e.id == id) {
            Some(idx) => idx,
            None => {
                entries.push(ContributionEntry::shadow(id));
                entries.len() - 1
            }
        };

        let entry = &mut entries[idx];
        entry.like_count = like_count;
        entry.liked_by_session_ids = liked_by.into_iter().collect();
        if session_has_liked {
            entry
                .liked_by_session_ids
                .insert(session.as_str().to_string());
        } else {
            entry.liked_by_session_ids.remove(session.as_str());
        }
        let updated = entry.clone();

        self.write_collection(&entries).await?;
        Ok(updated)
    }

    /// The session-scoped "my likes" set. Corrupt or unreadable data yields
    /// an empty set.
    pub async fn my_likes(&self, session: &SessionId) -> BTreeSet<String> {
        match self.store.get(&my_likes_key(session)).await {
            Ok(Some(bytes)) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!("Corrupt likes set for session {}, treating as empty: {}", session, e);
                BTreeSet::new()
            }),
            Ok(None) => BTreeSet::new(),
            Err(e) => {
                warn!("Failed to read likes set, treating as empty: {}", e);
                BTreeSet::new()
            }
        }
    }

    pub async fn is_liked(&self, id: &str, session: &SessionId) -> bool {
        self.my_likes(session).await.contains(id)
    }

    async fn read_collection(&self) -> Vec<ContributionEntry> {
        match self.store.get(COLLECTION_KEY).await {
            Ok(Some(bytes)) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!("Corrupt contribution collection, treating as empty: {}", e);
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to read contribution collection, treating as empty: {}", e);
                Vec::new()
            }
        }
    }

    async fn write_collection(&self, entries: &[ContributionEntry]) -> PersistenceResult<()> {
        let bytes = serde_json::to_vec(entries)?;
        self.store.set(COLLECTION_KEY, &bytes).await?;
        Ok(())
    }

    async fn write_my_likes(
        &self,
        session: &SessionId,
        likes: &BTreeSet<String>,
    ) -> PersistenceResult<()> {
        let bytes = serde_json::to_vec(likes)?;
        self.store.set(&my_likes_key(session), &bytes).await?;
        Ok(())
    }
}

/// `created_at` descending, ties broken by `id` ascending
pub fn sort_for_display(entries: &mut [ContributionEntry]) {
    entries.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContributionKind, Moderation};
    use crate::store::MemoryStore;
    use chrono::{TimeZone, Utc};

    fn entry(id: &str, hour: u32) -> ContributionEntry {
        ContributionEntry {
            id: id.to_string(),
            kind: ContributionKind::Testimonial {
                content: format!("contenu {id}"),
            },
            display_name: "Test".to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 6, 21, hour, 0, 0).unwrap(),
            moderation: Moderation::pending(),
            like_count: 0,
            liked_by_session_ids: BTreeSet::new(),
            context: None,
            origin: Default::default(),
        }
    }

    fn store() -> (Arc<MemoryStore>, LocalContributionStore) {
        let kv = Arc::new(MemoryStore::new());
        let local = LocalContributionStore::new(kv.clone());
        (kv, local)
    }

    #[tokio::test]
    async fn test_list_orders_most_recent_first_with_id_tiebreak() {
        let (_, local) = store();
        local.upsert(entry("b", 10)).await.unwrap();
        local.upsert(entry("a", 10)).await.unwrap();
        local.upsert(entry("c", 12)).await.unwrap();

        let ids: Vec<_> = local.list().await.into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn test_corrupt_collection_is_empty_not_fatal() {
        let (kv, local) = store();
        kv.set(COLLECTION_KEY, b"{{{corrupt").await.unwrap();
        assert!(local.list().await.is_empty());

        // and the store recovers on the next write
        local.upsert(entry("a", 9)).await.unwrap();
        assert_eq!(local.list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let (_, local) = store();
        local.upsert(entry("a", 9)).await.unwrap();
        let mut changed = entry("a", 9);
        changed.display_name = "Nouvelle".to_string();
        local.upsert(changed).await.unwrap();

        let entries = local.list().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].display_name, "Nouvelle");
    }

    #[tokio::test]
    async fn test_remove_deletes_owned_cached_images() {
        let (kv, local) = store();
        kv.set("img/1000/x", b"jpegbytes").await.unwrap();
        kv.set("thumb/1000/x", b"thumbbytes").await.unwrap();

        let mut photo = entry("p", 9);
        photo.kind = ContributionKind::Photo {
            image_ref: "img/1000/x".to_string(),
            thumbnail_ref: Some("thumb/1000/x".to_string()),
            description: None,
        };
        local.upsert(photo).await.unwrap();

        local.remove("p").await.unwrap();
        assert!(local.list().await.is_empty());
        assert_eq!(kv.get("img/1000/x").await.unwrap(), None);
        assert_eq!(kv.get("thumb/1000/x").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_toggle_like_is_idempotent_per_session() {
        let (_, local) = store();
        local.upsert(entry("a", 9)).await.unwrap();
        let session = SessionId::new("s1");

        let liked = local.toggle_like("a", &session).await.unwrap();
        assert_eq!(liked.like_count, 1);
        assert!(liked.liked_by(&session));
        assert!(local.is_liked("a", &session).await);

        let unliked = local.toggle_like("a", &session).await.unwrap();
        assert_eq!(unliked.like_count, 0);
        assert!(!unliked.liked_by(&session));
        assert!(!local.is_liked("a", &session).await);
    }

    #[tokio::test]
    async fn test_two_sessions_vote_independently() {
        let (_, local) = store();
        local.upsert(entry("a", 9)).await.unwrap();
        let s1 = SessionId::new("s1");
        let s2 = SessionId::new("s2");

        local.toggle_like("a", &s1).await.unwrap();
        let after_s2 = local.toggle_like("a", &s2).await.unwrap();
        assert_eq!(after_s2.like_count, 2);

        assert!(local.is_liked("a", &s1).await);
        assert!(local.is_liked("a", &s2).await);

        let after_unlike = local.toggle_like("a", &s1).await.unwrap();
        assert_eq!(after_unlike.like_count, 1);
        assert!(!local.is_liked("a", &s1).await);
        assert!(local.is_liked("a", &s2).await);
    }

    #[tokio::test]
    async fn test_toggle_like_on_unknown_id_creates_shadow() {
        let (_, local) = store();
        let session = SessionId::new("s1");

        let shadow = local.toggle_like("ledger-7", &session).await.unwrap();
        assert_eq!(shadow.id, "ledger-7");
        assert_eq!(shadow.like_count, 1);
        assert_eq!(local.list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_like_count_clamps_at_zero() {
        let (_, local) = store();
        // remote-reported state without our vote
        let session = SessionId::new("s1");
        local
            .apply_remote_like_state("a", 0, vec![], &session, false)
            .await
            .unwrap();

        // like then unlike twice via two different sets of state
        local.toggle_like("a", &session).await.unwrap();
        local.toggle_like("a", &session).await.unwrap();
        let entries = local.list().await;
        assert_eq!(entries[0].like_count, 0);
    }

    #[tokio::test]
    async fn test_apply_remote_like_state_keeps_own_membership() {
        let (_, local) = store();
        local.upsert(entry("a", 9)).await.unwrap();
        let session = SessionId::new("me");
        local.toggle_like("a", &session).await.unwrap();

        // remote reports 5 likes from others and does not know about us yet
        let updated = local
            .apply_remote_like_state(
                "a",
                5,
                vec!["x".to_string(), "y".to_string()],
                &session,
                true,
            )
            .await
            .unwrap();

        assert_eq!(updated.like_count, 5);
        assert!(updated.liked_by(&session));
        assert!(updated.liked_by_session_ids.contains("x"));
    }
}
