//! Infrastructure adapters: HTTP image downloads and the on-disk blob cache.

pub mod cache;
pub mod fetch;
