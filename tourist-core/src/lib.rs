//! # Tourist Core
//!
//! Pin and photo acquisition cache for Virtual Tourist.
//!
//! ## Overview
//!
//! A pin is a user-placed coordinate. Each pin owns a set of photos fetched
//! from the Flickr photo-search API for a bounding box around it. This crate
//! decides how that set is acquired, stored, refreshed and evicted:
//!
//! - [`providers`]: the remote photo search client
//! - [`infra`]: image downloads and the content-addressed blob store
//! - [`store`]: durable pin/photo collections behind a write view and a read
//!   view
//! - [`acquisition`]: probe, acquire and refresh with per-pin exclusivity
//! - [`lifecycle`]: the inbound-event façade that ties the pieces together
//! - [`events`]: in-process broadcast of outbound notifications
//!
//! ## Examples
//!
//! ```no_run
//! use std::{sync::Arc, time::Duration};
//!
//! use tourist_core::{
//!     acquisition::{AcquisitionSettings, PhotoAcquisitionService, SharedRng},
//!     events::EventBus,
//!     infra::fetch::HttpImageFetcher,
//!     lifecycle::PinLifecycle,
//!     providers::flickr::{FlickrSearchClient, FlickrSettings},
//!     store::{MemoryBackend, SyncCoordinator},
//! };
//! use tourist_model::Coordinate;
//!
//! async fn place() -> tourist_core::Result<()> {
//!     let bus = Arc::new(EventBus::new(256));
//!     let store = Arc::new(
//!         SyncCoordinator::open(Arc::new(MemoryBackend::new()), bus.clone())
//!             .await?,
//!     );
//!     let search = Arc::new(FlickrSearchClient::new(
//!         FlickrSettings::with_api_key("key"),
//!     )?);
//!     let fetcher =
//!         Arc::new(HttpImageFetcher::new(Duration::from_secs(30))?);
//!     let acquisition = PhotoAcquisitionService::new(
//!         search,
//!         fetcher,
//!         store.clone(),
//!         bus.clone(),
//!         SharedRng::from_os_rng(),
//!         AcquisitionSettings::default(),
//!     );
//!     let lifecycle = PinLifecycle::new(acquisition, store);
//!
//!     let placed = lifecycle
//!         .place_pin(Coordinate::new(39.8283, -98.5795)?)
//!         .await?;
//!     println!(
//!         "pin {} acquired {} photos",
//!         placed.pin_id,
//!         placed.outcome.success_count()
//!     );
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

/// Photo acquisition: probe, acquire, refresh
pub mod acquisition;

/// Error types and error handling utilities
pub mod error;

/// Outbound notification fan-out
pub mod events;

/// Downloads and on-disk blob storage
pub mod infra;

/// Inbound event handling for pins and photos
pub mod lifecycle;

/// External photo search providers
pub mod providers;

/// Durable pin/photo store and the read/write view coordinator
pub mod store;

pub use error::{Result, TouristError};
