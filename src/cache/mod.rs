//! Byte quota accounting and domain-specific eviction
//!
//! Not a general-purpose cache: the only content is contribution images, and
//! the eviction policy is "preserve newest, by creation timestamp".

pub mod eviction;
pub mod quota;

pub use eviction::EvictionManager;
pub use quota::{CacheStats, QuotaEstimator};
