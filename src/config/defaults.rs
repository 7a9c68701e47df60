/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
// Cache quota defaults
pub const DEFAULT_QUOTA_CEILING_BYTES: u64 = 5 * 1024 * 1024; // 5 MiB
pub const DEFAULT_HOUSEKEEPING_THRESHOLD: f64 = 0.8;
pub const DEFAULT_HOUSEKEEPING_KEEP_RECENT: usize = 5;

// Eviction asks for this multiple of the estimated write size, leaving
// headroom for the entry document that follows the image writes
pub const SPACE_HEADROOM_FACTOR: f64 = 1.4;

// Transcoder defaults
pub const DEFAULT_SOFT_LIMIT_BYTES: u64 = 800 * 1024; // 800 KiB
pub const DEFAULT_THUMBNAIL_MAX_DIMENSION: u32 = 256;
pub const DEFAULT_THUMBNAIL_QUALITY: u8 = 60;

// Submission defaults
pub const DEFAULT_DISPLAY_NAME: &str = "Visiteur anonyme";
