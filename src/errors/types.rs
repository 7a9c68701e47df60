//! Error type definitions for the gallery sync core
//!
//! This module defines all error types used throughout the crate, providing
//! a hierarchical error system that makes debugging and error handling more
//! straightforward.

use thiserror::Error;

/// Errors surfaced to the caller of a submission
///
/// These are the only user-visible failures in the crate: an unreadable
/// image, or a quota that cannot be freed even after eviction and the
/// last-chance compression rung.
#[derive(Error, Debug)]
pub enum SubmissionError {
    /// The input bytes could not be decoded (or re-encoded) as an image
    #[error("Image decode failed: {reason}")]
    Decode { reason: String },

    /// The quota could not be freed even after eviction and last-chance compression
    #[error("Storage exhausted: {required_bytes} bytes could not be freed")]
    StorageExhausted { required_bytes: u64 },

    /// The local store itself failed
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Local persistence failures
///
/// Fatal for the current operation only, never for the application. Corrupt
/// payloads are not represented here; they are treated as empty collections
/// by the readers.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// The underlying key/value store is unavailable
    #[error("Local store unavailable: {message}")]
    StoreUnavailable { message: String },

    /// The write would exceed the store's byte ceiling. Retryable: the
    /// submission pipeline answers it with an eviction pass.
    #[error("Quota exceeded: write of {attempted_bytes} bytes rejected")]
    QuotaExceeded { attempted_bytes: u64 },

    /// A persisted payload could not be serialized
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from the underlying key/value store
#[derive(Error, Debug)]
pub enum StoreError {
    /// The write would exceed the store's byte ceiling
    #[error("Quota exceeded: write of {attempted_bytes} bytes rejected")]
    QuotaExceeded { attempted_bytes: u64 },

    /// The store cannot be reached at all
    #[error("Store unavailable: {message}")]
    Unavailable { message: String },

    /// I/O failure in a file-backed store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A remote source could not be read or written
///
/// Never fatal: the synchronizer and the like reconciler always degrade to
/// their documented fallbacks when they see this.
#[derive(Error, Debug)]
#[error("Remote {service} unavailable: {reason}")]
pub struct RemoteUnavailable {
    pub service: String,
    pub reason: String,
}

impl RemoteUnavailable {
    pub fn new<S: Into<String>, R: Into<String>>(service: S, reason: R) -> Self {
        Self {
            service: service.into(),
            reason: reason.into(),
        }
    }
}

/// A ledger item body could not be parsed into a contribution
///
/// Parse failures never propagate past the synchronizer's item-skip policy.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// No recognizable content type label in the body
    #[error("Ledger item has no recognizable content type")]
    MissingContentType,

    /// A photo item without an image reference cannot be displayed
    #[error("Photo ledger item has no image reference")]
    MissingImageRef,
}

impl From<StoreError> for PersistenceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::QuotaExceeded { attempted_bytes } => {
                PersistenceError::QuotaExceeded { attempted_bytes }
            }
            StoreError::Unavailable { message } => PersistenceError::StoreUnavailable { message },
            StoreError::Io(e) => PersistenceError::StoreUnavailable {
                message: e.to_string(),
            },
        }
    }
}

impl SubmissionError {
    /// Create a decode error with a custom reason
    pub fn decode<S: Into<String>>(reason: S) -> Self {
        Self::Decode {
            reason: reason.into(),
        }
    }
}
