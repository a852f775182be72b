//! Photo acquisition for pins.
//!
//! A run searches the pin's bounding box once, samples distinct results from
//! the first page, downloads and commits each one best-effort, and reports
//! progress as an ordered event stream ending in exactly one terminal event.

pub mod in_flight;
pub mod run;
pub mod sampling;
pub mod service;

pub use in_flight::{InFlightGuard, InFlightPins};
pub use run::{AcquisitionEvent, AcquisitionOutcome, AcquisitionRun};
pub use sampling::SharedRng;
pub use service::{
    AcquisitionError, AcquisitionSettings, ItemFailure, PhotoAcquisitionService,
    ProbeResult,
};
