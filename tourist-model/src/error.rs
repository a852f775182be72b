use std::fmt::{self, Display};

/// Errors produced by model constructors and validation routines.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    InvalidCoordinate { latitude: f64, longitude: f64 },
    InvalidId(String),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::InvalidCoordinate {
                latitude,
                longitude,
            } => write!(
                f,
                "invalid coordinate: latitude {latitude} must be within \
                 -90..=90 and longitude {longitude} within -180..=180"
            ),
            ModelError::InvalidId(msg) => write!(f, "invalid id: {msg}"),
        }
    }
}

impl std::error::Error for ModelError {}

pub type Result<T> = std::result::Result<T, ModelError>;
