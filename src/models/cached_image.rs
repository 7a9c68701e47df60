//! Cached image records and their key scheme
//!
//! Encoded images live in the key/value store under keys that embed their
//! creation timestamp, because the underlying store does not expose
//! write-time ordering. Eviction parses age out of the key itself.
//!
//! Key scheme: `img/<millis>/<uuid>` and `thumb/<millis>/<uuid>`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub const IMAGE_KEY_PREFIX: &str = "img/";
pub const THUMBNAIL_KEY_PREFIX: &str = "thumb/";

/// One encoded image as seen by the quota estimator and the eviction manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedImageRecord {
    pub key: String,
    pub size_bytes: u64,
    pub created_at_ms: i64,
}

/// Build a cache key for a full-size encoded image
pub fn image_key(created_at: DateTime<Utc>) -> String {
    format!(
        "{}{}/{}",
        IMAGE_KEY_PREFIX,
        created_at.timestamp_millis(),
        Uuid::new_v4()
    )
}

/// Build a cache key for a thumbnail
pub fn thumbnail_key(created_at: DateTime<Utc>) -> String {
    format!(
        "{}{}/{}",
        THUMBNAIL_KEY_PREFIX,
        created_at.timestamp_millis(),
        Uuid::new_v4()
    )
}

/// Whether a store key belongs to the cached-image namespace
pub fn is_cached_image_key(key: &str) -> bool {
    key.starts_with(IMAGE_KEY_PREFIX) || key.starts_with(THUMBNAIL_KEY_PREFIX)
}

/// Parse the creation timestamp embedded in a cached-image key.
/// Returns `None` for keys outside the scheme; those are never evicted.
pub fn parse_created_at_ms(key: &str) -> Option<i64> {
    if !is_cached_image_key(key) {
        return None;
    }
    key.split('/').nth(1)?.parse::<i64>().ok()
}
