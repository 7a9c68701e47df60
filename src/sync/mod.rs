//! Multi-source contribution synchronization
//!
//! Merges the local collection with the remote durable snapshot and the
//! remote mutable ledger into one deduplicated, ordered result set. Remote
//! failures always degrade: a missing source is treated as empty, and when
//! both sources are empty the gallery falls back entirely to local data so
//! a transient outage never blanks it.

pub mod ledger;

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::errors::PersistenceResult;
use crate::models::{ContributionEntry, ContributionView, Origin};
use crate::remote::{LedgerSource, SnapshotSource};
use crate::repositories::contribution::sort_for_display;
use crate::repositories::LocalContributionStore;
use crate::session::SessionIdentity;
use crate::sync::ledger::entry_from_ledger_item;

#[derive(Clone)]
pub struct ContributionSynchronizer {
    local: LocalContributionStore,
    snapshot: Arc<dyn SnapshotSource>,
    ledger: Arc<dyn LedgerSource>,
    identity: SessionIdentity,
}

impl ContributionSynchronizer {
    pub fn new(
        local: LocalContributionStore,
        snapshot: Arc<dyn SnapshotSource>,
        ledger: Arc<dyn LedgerSource>,
        identity: SessionIdentity,
    ) -> Self {
        Self {
            local,
            snapshot,
            ledger,
            identity,
        }
    }

    /// Merge remote and local knowledge into the displayed collection.
    ///
    /// Snapshot entries are the base; ledger entries not already present by
    /// id are appended. A non-empty remote union replaces the local
    /// collection (superseding stale local copies of remotely confirmed
    /// entries) while local-only drafts not yet confirmed remotely stay
    /// visible. Idempotent: unchanged sources yield identical results.
    pub async fn fetch_merged(&self) -> PersistenceResult<Vec<ContributionView>> {
        let snapshot_entries = match self.snapshot.fetch().await {
            Ok(raw) => raw.into_iter().map(|e| e.into_entry()).collect(),
            Err(e) => {
                warn!("Snapshot source unavailable, treating as empty: {}", e);
                Vec::new()
            }
        };

        let ledger_entries: Vec<ContributionEntry> = match self.ledger.fetch_items().await {
            Ok(items) => items
                .iter()
                .filter_map(|item| match entry_from_ledger_item(item) {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        debug!("Skipping unparseable ledger item {}: {}", item.number, e);
                        None
                    }
                })
                .collect(),
            Err(e) => {
                warn!("Ledger source unavailable, treating as empty: {}", e);
                Vec::new()
            }
        };

        let mut union = snapshot_entries;
        let mut seen: HashSet<String> = union.iter().map(|e| e.id.clone()).collect();
        for entry in ledger_entries {
            if seen.insert(entry.id.clone()) {
                union.push(entry);
            }
        }

        let mut merged = if union.is_empty() {
            // both remotes empty or unreachable: never blank the gallery
            self.local.list().await
        } else {
            // only locally-authored entries survive as drafts; an entry of
            // remote origin that the remotes no longer report was deleted
            // there and is dropped here too
            let confirmed: HashSet<&str> = union.iter().map(|e| e.id.as_str()).collect();
            let drafts: Vec<ContributionEntry> = self
                .local
                .list()
                .await
                .into_iter()
                .filter(|e| e.origin == Origin::Local && !confirmed.contains(e.id.as_str()))
                .collect();

            let mut merged = union;
            merged.extend(drafts);
            self.local.replace_all(merged.clone()).await?;
            merged
        };

        sort_for_display(&mut merged);

        let session = self.identity.current().await?;
        let my_likes = self.local.my_likes(&session).await;
        Ok(merged
            .into_iter()
            .map(|entry| ContributionView {
                is_liked_by_current_session: my_likes.contains(&entry.id),
                entry,
            })
            .collect())
    }
}
