//! Optimistic like toggling with best-effort remote reconciliation
//!
//! The local flip happens first and is what the caller renders immediately.
//! For ledger-backed entries a like push follows; when its acknowledgment
//! disagrees with the optimistic count, the remote count and voter list
//! overwrite the local entry, except the current session's own membership,
//! which stays locally authoritative. A failed push is logged and swallowed:
//! the next merge re-derives the best available view anyway.

use std::sync::Arc;

use tracing::debug;

use crate::errors::PersistenceResult;
use crate::models::ContributionView;
use crate::remote::{LedgerSource, LikeAction};
use crate::repositories::LocalContributionStore;
use crate::session::SessionIdentity;
use crate::sync::ledger::ledger_item_number;

#[derive(Clone)]
pub struct LikeReconciler {
    local: LocalContributionStore,
    ledger: Arc<dyn LedgerSource>,
    identity: SessionIdentity,
}

impl LikeReconciler {
    pub fn new(
        local: LocalContributionStore,
        ledger: Arc<dyn LedgerSource>,
        identity: SessionIdentity,
    ) -> Self {
        Self {
            local,
            ledger,
            identity,
        }
    }

    /// Flip the current session's vote on `id`
    pub async fn toggle(&self, id: &str) -> PersistenceResult<ContributionView> {
        let session = self.identity.current().await?;
        let was_liked = self.local.is_liked(id, &session).await;
        let action = if was_liked {
            LikeAction::Unlike
        } else {
            LikeAction::Like
        };

        let mut entry = self.local.toggle_like(id, &session).await?;

        if let Some(item_number) = ledger_item_number(id) {
            match self.ledger.push_like(item_number, &session, action).await {
                Ok(ack) => {
                    // re-read the current vote state rather than trusting the
                    // pre-push snapshot; another toggle may have landed
                    let session_has_liked = self.local.is_liked(id, &session).await;
                    entry = self
                        .local
                        .apply_remote_like_state(
                            id,
                            ack.like_count,
                            ack.liked_by,
                            &session,
                            session_has_liked,
                        )
                        .await?;
                }
                Err(e) => {
                    debug!(
                        "Like push for '{}' failed, keeping optimistic state: {}",
                        id, e
                    );
                }
            }
        }

        let is_liked = self.local.is_liked(id, &session).await;
        Ok(ContributionView {
            entry,
            is_liked_by_current_session: is_liked,
        })
    }
}
