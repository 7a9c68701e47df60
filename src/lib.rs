//! Bounded local media cache and multi-source contribution synchronizer.
//!
//! This crate implements the storage core behind a community contribution
//! gallery: user-submitted photos and testimonials are persisted into a
//! byte-quota-limited key/value store, degraded and evicted to stay under
//! quota, and reconciled against two remote sources (a durable snapshot and
//! a mutable ledger) into one deduplicated view. Like toggles are applied
//! optimistically and propagated to the ledger on a best-effort basis.

pub mod cache;
pub mod config;
pub mod errors;
pub mod likes;
pub mod models;
pub mod remote;
pub mod repositories;
pub mod session;
pub mod store;
pub mod submit;
pub mod sync;
pub mod transcode;
