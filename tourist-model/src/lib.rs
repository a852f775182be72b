//! Core data model definitions shared across Virtual Tourist crates.
//!
//! Everything here is plain data: identifiers, coordinates, the durable
//! `Pin` / `Photo` records and the inbound/outbound event vocabulary. The
//! behaviour that moves these records around lives in `tourist-core`.

pub mod error;
pub mod events;
pub mod geo;
pub mod ids;
pub mod photo;
pub mod pin;

pub use error::{ModelError, Result as ModelResult};
pub use events::{
    ChangeKind, EntityKind, InboundEvent, StoreChange, TouristEvent,
};
pub use geo::{BoundingBox, Coordinate, LATITUDE_RANGE, LONGITUDE_RANGE};
pub use ids::{PhotoID, PinID};
pub use photo::{Photo, UNTITLED_PHOTO};
pub use pin::Pin;
