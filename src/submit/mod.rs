//! Submission pipeline
//!
//! A photo submission flows transcode -> ensure space -> persist; when the
//! write still hits the quota after one eviction pass, one more attempt is
//! made at the last-chance compression rung before the submission is
//! rejected with a storage-exhausted error. A submission is never silently
//! dropped and never partially written: either the entry and its images all
//! land, or nothing does. Testimonials skip the image stages entirely.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::EvictionManager;
use crate::config::defaults::{DEFAULT_DISPLAY_NAME, SPACE_HEADROOM_FACTOR};
use crate::config::Config;
use crate::errors::{PersistenceError, StoreError, SubmissionError, SubmissionResult};
use crate::models::cached_image::{image_key, thumbnail_key};
use crate::models::{
    ContributionContext, ContributionEntry, ContributionKind, Moderation,
};
use crate::repositories::LocalContributionStore;
use crate::store::{accounted_bytes, KeyValueStore};
use crate::transcode::{EncodedImage, ImageTranscoder, LAST_CHANCE_RUNG};

fn headroom(estimated_bytes: u64) -> u64 {
    (estimated_bytes as f64 * SPACE_HEADROOM_FACTOR) as u64
}

/// What the caller submits
#[derive(Debug, Clone)]
pub struct NewContribution {
    pub kind: NewContributionKind,
    pub display_name: Option<String>,
    /// Opaque association supplied by the surrounding app's context enricher
    pub context: Option<ContributionContext>,
}

#[derive(Debug, Clone)]
pub enum NewContributionKind {
    Photo {
        bytes: Vec<u8>,
        description: Option<String>,
    },
    Testimonial {
        content: String,
    },
}

#[derive(Clone)]
pub struct SubmissionService {
    store: Arc<dyn KeyValueStore>,
    local: LocalContributionStore,
    transcoder: ImageTranscoder,
    eviction: EvictionManager,
}

impl SubmissionService {
    pub fn new(store: Arc<dyn KeyValueStore>, config: &Config) -> Self {
        Self {
            local: LocalContributionStore::new(store.clone()),
            transcoder: ImageTranscoder::new(config.transcode.clone()),
            eviction: EvictionManager::new(store.clone(), config.cache.clone()),
            store,
        }
    }

    /// Persist a new contribution locally. On success the entry is
    /// immediately visible in `list()` with a pending moderation status,
    /// even if remote sync never happens.
    pub async fn submit(&self, new: NewContribution) -> SubmissionResult<ContributionEntry> {
        let created_at = Utc::now();
        let display_name = new
            .display_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string());

        let kind = match new.kind {
            NewContributionKind::Testimonial { content } => {
                ContributionKind::Testimonial { content }
            }
            NewContributionKind::Photo { bytes, description } => {
                let encoded = self.transcoder.transcode(&bytes).await?;
                let thumb = self.transcoder.thumbnail(&bytes).await?;
                let img_key = image_key(created_at);
                let thumb_key = thumbnail_key(created_at);
                self.persist_images(&bytes, &img_key, &encoded, &thumb_key, &thumb)
                    .await?;
                ContributionKind::Photo {
                    image_ref: img_key,
                    thumbnail_ref: Some(thumb_key),
                    description,
                }
            }
        };

        let entry = ContributionEntry {
            id: Uuid::new_v4().to_string(),
            kind,
            display_name,
            created_at,
            moderation: Moderation::pending(),
            like_count: 0,
            liked_by_session_ids: Default::default(),
            context: new.context,
            origin: Default::default(),
        };

        self.persist_entry(&entry).await?;

        debug!("Persisted submission '{}' ({})", entry.id, entry.display_name);
        Ok(entry)
    }

    /// Write the entry document, answering a quota hit with one eviction
    /// pass (the entry's own images are preserved; the collection, likes,
    /// and session keys are never eviction candidates). A quota that still
    /// holds after eviction is storage exhaustion, not store unavailability.
    async fn persist_entry(&self, entry: &ContributionEntry) -> SubmissionResult<()> {
        let first = self.local.upsert(entry.clone()).await;
        let attempted_bytes = match first {
            Ok(()) => return Ok(()),
            Err(PersistenceError::QuotaExceeded { attempted_bytes }) => attempted_bytes,
            Err(e) => {
                self.rollback_images(entry).await;
                return Err(e.into());
            }
        };

        debug!("Entry write hit quota, evicting {} bytes", attempted_bytes);
        let preserve: HashSet<String> = entry.owned_image_keys().into_iter().collect();
        self.eviction
            .ensure_space(headroom(attempted_bytes), &preserve)
            .await;

        match self.local.upsert(entry.clone()).await {
            Ok(()) => Ok(()),
            Err(PersistenceError::QuotaExceeded { attempted_bytes }) => {
                self.rollback_images(entry).await;
                Err(SubmissionError::StorageExhausted {
                    required_bytes: attempted_bytes,
                })
            }
            Err(e) => {
                self.rollback_images(entry).await;
                Err(e.into())
            }
        }
    }

    /// Roll back the images so no orphaned cache records remain
    async fn rollback_images(&self, entry: &ContributionEntry) {
        for key in entry.owned_image_keys() {
            let _ = self.store.remove(&key).await;
        }
    }

    /// Write the encoded image and its thumbnail, evicting and degrading as
    /// needed: first attempt as-is, then one eviction pass, then the
    /// last-chance rung after another eviction pass.
    async fn persist_images(
        &self,
        raw: &[u8],
        img_key: &str,
        encoded: &EncodedImage,
        thumb_key: &str,
        thumb: &EncodedImage,
    ) -> SubmissionResult<()> {
        let preserve: HashSet<String> =
            [img_key.to_string(), thumb_key.to_string()].into();
        let required = headroom(
            accounted_bytes(img_key, encoded.bytes.len())
                + accounted_bytes(thumb_key, thumb.bytes.len()),
        );

        if self.try_write_pair(img_key, encoded, thumb_key, thumb).await? {
            return Ok(());
        }
        debug!("Submission write hit quota, evicting {} bytes", required);
        self.eviction.ensure_space(required, &preserve).await;
        if self.try_write_pair(img_key, encoded, thumb_key, thumb).await? {
            return Ok(());
        }

        // last-chance rung: re-encode aggressively, free the smaller target
        warn!("Eviction did not free enough space, trying last-chance compression");
        let degraded = self.transcoder.transcode_at(raw, LAST_CHANCE_RUNG).await?;
        let required = headroom(
            accounted_bytes(img_key, degraded.bytes.len())
                + accounted_bytes(thumb_key, thumb.bytes.len()),
        );
        self.eviction.ensure_space(required, &preserve).await;
        if self.try_write_pair(img_key, &degraded, thumb_key, thumb).await? {
            return Ok(());
        }

        Err(SubmissionError::StorageExhausted {
            required_bytes: required,
        })
    }

    /// One write attempt for both records. `Ok(false)` means the quota was
    /// hit; anything already written is rolled back so no partial state
    /// survives an attempt.
    async fn try_write_pair(
        &self,
        img_key: &str,
        image: &EncodedImage,
        thumb_key: &str,
        thumb: &EncodedImage,
    ) -> SubmissionResult<bool> {
        match self.store.set(img_key, &image.bytes).await {
            Ok(()) => {}
            Err(StoreError::QuotaExceeded { .. }) => return Ok(false),
            Err(e) => return Err(SubmissionError::Persistence(e.into())),
        }
        match self.store.set(thumb_key, &thumb.bytes).await {
            Ok(()) => Ok(true),
            Err(StoreError::QuotaExceeded { .. }) => {
                let _ = self.store.remove(img_key).await;
                Ok(false)
            }
            Err(e) => {
                let _ = self.store.remove(img_key).await;
                Err(SubmissionError::Persistence(e.into()))
            }
        }
    }
}
