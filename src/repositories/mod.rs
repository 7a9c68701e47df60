//! Local data access over the key/value store

pub mod contribution;

pub use contribution::LocalContributionStore;
