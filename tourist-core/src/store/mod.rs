//! Durable pin/photo store.
//!
//! All mutation flows through [`SyncCoordinator::commit`] (the write view).
//! Readers take [`SyncCoordinator::observe`] snapshots (the read view), which
//! only ever reflect fully persisted commits.

pub mod backend;
pub mod error;
pub mod ports;
pub mod state;
pub mod sync;

pub use backend::{CacacheBackend, MANIFEST_KEY, MemoryBackend, StoreBackend};
pub use error::StoreError;
pub use ports::{PhotoStore, PinStore};
pub use state::{Mutation, StoreSnapshot, StoreState};
pub use sync::{CommitReceipt, SyncCoordinator};
