use thiserror::Error;
use tourist_model::{EntityKind, PinID};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Could not save to the store: {0}")]
    Save(String),

    #[error("Could not load the store: {0}")]
    Load(String),

    #[error("{entity:?} {id} was not found")]
    NotFound { entity: EntityKind, id: Uuid },

    #[error("{entity:?} {id} already exists")]
    AlreadyExists { entity: EntityKind, id: Uuid },

    #[error("Pin {0} does not exist")]
    UnknownPin(PinID),

    #[error("Invalid record: {0}")]
    Invalid(String),
}
