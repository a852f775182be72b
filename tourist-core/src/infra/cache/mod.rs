//! On-disk cache infra.
//!
//! This module provides a typed facade around `cacache` for integrity-checked
//! blob storage used by the durable store backend.

pub mod photo_blob_store;

pub use photo_blob_store::*;
