//! Configuration for Virtual Tourist.
//!
//! Loads [`TouristConfig`] from files, inline JSON and the environment,
//! validates it, and wires the core services from it. The
//! `virtual-tourist` binary is a thin command line on top.

pub mod loader;
pub mod models;
pub mod validation;
pub mod wiring;

pub use loader::{ConfigLoad, ConfigSource, EnvConfig};
pub use models::{AcquisitionConfig, FlickrConfig, StoreConfig, TouristConfig};
pub use validation::ConfigError;
pub use wiring::TouristApp;
