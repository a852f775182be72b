use thiserror::Error;
use tourist_model::{Coordinate, ModelError};

use crate::{
    acquisition::AcquisitionError, infra::fetch::FetchError,
    providers::flickr::SearchError, store::StoreError,
};

#[derive(Error, Debug)]
pub enum TouristError {
    #[error("Invalid input: {0}")]
    Model(#[from] ModelError),

    #[error("Photo search failed: {0}")]
    Search(#[from] SearchError),

    #[error("Image download failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Acquisition error: {0}")]
    Acquisition(#[from] AcquisitionError),

    #[error("Pin at {coordinate} was rejected: {reason}")]
    PinRejected {
        coordinate: Coordinate,
        reason: String,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TouristError {
    /// One sentence suitable for an alert shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            TouristError::Model(err) => {
                format!("That location is not usable: {err}.")
            }
            TouristError::Search(SearchError::NoResults) => {
                "No photos were found for these coordinates.".to_string()
            }
            TouristError::Search(err) => {
                format!("Could not search for photos: {err}.")
            }
            TouristError::Fetch(err) => {
                format!("Could not download a photo: {err}.")
            }
            TouristError::Store(err) => {
                format!("Could not save your changes: {err}.")
            }
            TouristError::Acquisition(AcquisitionError::InProgress(_)) => {
                "Photos for this pin are still loading; try again when they \
                 finish."
                    .to_string()
            }
            TouristError::Acquisition(err) => {
                format!("Could not load photos for this pin: {err}.")
            }
            TouristError::PinRejected { reason, .. } => {
                format!("The pin could not be placed: {reason}.")
            }
            TouristError::Internal(msg) => {
                format!("Something went wrong: {msg}.")
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, TouristError>;
