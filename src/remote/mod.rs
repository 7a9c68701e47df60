//! Remote source seams
//!
//! The two remote stores are collaborator interfaces: a read-only durable
//! snapshot and a mutable item-by-item ledger. Transport mechanics (HTTP,
//! timeouts, auth) belong to the surrounding system; this crate treats "no
//! response" identically to explicit failure.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::RemoteUnavailable;
use crate::models::{ContributionEntry, ContributionKind, Moderation, ModerationStatus, Origin};
use crate::session::SessionId;

/// One entry of the remote durable snapshot, a point-in-time export of
/// approved contributions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSnapshotEntry {
    pub id: String,
    pub kind: ContributionKind,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default = "approved")]
    pub moderation_status: ModerationStatus,
    pub moderated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub like_count: u32,
    #[serde(default)]
    pub liked_by: Vec<String>,
}

fn approved() -> ModerationStatus {
    ModerationStatus::Approved
}

impl RawSnapshotEntry {
    pub fn into_entry(self) -> ContributionEntry {
        ContributionEntry {
            id: self.id,
            kind: self.kind,
            display_name: self
                .display_name
                .unwrap_or_else(|| crate::config::defaults::DEFAULT_DISPLAY_NAME.to_string()),
            created_at: self.created_at,
            moderation: Moderation {
                status: self.moderation_status,
                moderated_at: self.moderated_at,
            },
            like_count: self.like_count,
            liked_by_session_ids: self.liked_by.into_iter().collect(),
            context: None,
            origin: Origin::RemoteSnapshot,
        }
    }
}

/// One mutable ledger item. The body is semi-structured text with labeled
/// fields, parsed defensively by the synchronizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLedgerItem {
    /// The ledger's own item number; local ids are derived from it
    pub number: u64,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Like toggle direction pushed to the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeAction {
    Like,
    Unlike,
}

/// The ledger's response to a like push
#[derive(Debug, Clone)]
pub struct LikeAck {
    pub like_count: u32,
    pub liked_by: Vec<String>,
}

/// Remote durable snapshot source. Read-only, point-in-time.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<RawSnapshotEntry>, RemoteUnavailable>;
}

/// Remote mutable ledger
#[async_trait]
pub trait LedgerSource: Send + Sync {
    async fn fetch_items(&self) -> Result<Vec<RawLedgerItem>, RemoteUnavailable>;

    /// Best-effort like propagation, keyed by the ledger's own item number
    async fn push_like(
        &self,
        item_number: u64,
        session: &SessionId,
        action: LikeAction,
    ) -> Result<LikeAck, RemoteUnavailable>;
}
