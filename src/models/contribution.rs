//! Contribution entry model
//!
//! A contribution is either a photo (image + thumbnail cache keys, optional
//! description) or a testimonial (free text). Entries are persisted locally
//! as one JSON collection and merged against two remote sources; the
//! `origin` field decides which unconfirmed entries survive a merge as
//! drafts and is never sent remotely.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::config::defaults::DEFAULT_DISPLAY_NAME;
use crate::session::SessionId;

/// Moderation status state machine: `Pending -> Approved | Rejected`
///
/// A local submission always starts `Pending`; transitions are applied only
/// by data arriving from the remote sources during synchronization, never by
/// local user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationStatus {
    Pending,
    Approved,
    Rejected,
}

/// Moderation state carried on every entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Moderation {
    pub status: ModerationStatus,
    pub moderated_at: Option<DateTime<Utc>>,
}

impl Moderation {
    pub fn pending() -> Self {
        Self {
            status: ModerationStatus::Pending,
            moderated_at: None,
        }
    }
}

/// What a contribution was submitted about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextKind {
    Event,
    Location,
}

/// Optional association set at submission time by the surrounding app.
/// Treated as opaque metadata by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionContext {
    pub kind: ContextKind,
    pub id: String,
}

/// Which source an entry was last seen from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    #[default]
    Local,
    RemoteSnapshot,
    RemoteLedger,
}

/// Contribution payload variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContributionKind {
    Photo {
        /// Cache key or remote URI of the full image; non-empty once persisted
        image_ref: String,
        thumbnail_ref: Option<String>,
        description: Option<String>,
    },
    Testimonial {
        content: String,
    },
}

/// One contribution as persisted locally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionEntry {
    /// Unique within the merged result set. Ledger-sourced ids are derived
    /// deterministically (`ledger-<n>`) so merge can dedup by equality.
    pub id: String,
    pub kind: ContributionKind,
    #[serde(default = "default_display_name")]
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub moderation: Moderation,
    #[serde(default)]
    pub like_count: u32,
    #[serde(default)]
    pub liked_by_session_ids: BTreeSet<String>,
    #[serde(default)]
    pub context: Option<ContributionContext>,
    #[serde(default)]
    pub origin: Origin,
}

fn default_display_name() -> String {
    DEFAULT_DISPLAY_NAME.to_string()
}

impl ContributionEntry {
    /// Minimal locally-synthesized entry, created so a local-only operation
    /// (a like on a remote-only id) has something to mutate.
    pub fn shadow(id: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: ContributionKind::Testimonial {
                content: String::new(),
            },
            display_name: default_display_name(),
            created_at: Utc::now(),
            moderation: Moderation::pending(),
            like_count: 0,
            liked_by_session_ids: BTreeSet::new(),
            context: None,
            origin: Origin::RemoteLedger,
        }
    }

    /// Cache keys of the images this entry owns, if any.
    /// Remote URIs are not cache keys and are excluded.
    pub fn owned_image_keys(&self) -> Vec<String> {
        match &self.kind {
            ContributionKind::Photo {
                image_ref,
                thumbnail_ref,
                ..
            } => {
                let mut keys = Vec::new();
                if crate::models::cached_image::is_cached_image_key(image_ref) {
                    keys.push(image_ref.clone());
                }
                if let Some(thumb) = thumbnail_ref {
                    if crate::models::cached_image::is_cached_image_key(thumb) {
                        keys.push(thumb.clone());
                    }
                }
                keys
            }
            ContributionKind::Testimonial { .. } => Vec::new(),
        }
    }

    /// Whether the given session has liked this entry according to the
    /// entry's own voter set
    pub fn liked_by(&self, session: &SessionId) -> bool {
        self.liked_by_session_ids.contains(session.as_str())
    }
}

/// An entry as returned to the caller, tagged with the current device's vote
/// state. The tag always comes from the local "my likes" set, never from the
/// remote-reported voter list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributionView {
    #[serde(flatten)]
    pub entry: ContributionEntry,
    pub is_liked_by_current_session: bool,
}
