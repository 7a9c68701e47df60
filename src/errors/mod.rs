//! Centralized error handling for the gallery sync core.
//!
//! The taxonomy follows the user-visibility rules of the submission flow:
//! decode and storage-exhaustion failures propagate to the submitting caller,
//! persistence failures are fatal for the current operation only, and remote
//! failures are always absorbed behind a documented fallback.

pub mod types;

pub use types::*;

/// Convenience type alias for submission results
pub type SubmissionResult<T> = Result<T, SubmissionError>;

/// Convenience type alias for local persistence results
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Convenience type alias for key/value store results
pub type StoreResult<T> = Result<T, StoreError>;
