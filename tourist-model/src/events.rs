use crate::{
    geo::Coordinate,
    ids::{PhotoID, PinID},
};

/// Requests originating from the interactive layer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum InboundEvent {
    PinPlaced { coordinate: Coordinate },
    PinDeleteRequested { pin_id: PinID },
    AllPinsClearRequested,
    RefreshRequested { pin_id: PinID },
    PhotoRemoveRequested { photo_id: PhotoID },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EntityKind {
    Pin,
    Photo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ChangeKind {
    Inserted,
    Deleted,
}

/// A single committed change to the durable store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StoreChange {
    pub entity: EntityKind,
    pub change: ChangeKind,
    pub id: uuid::Uuid,
}

impl StoreChange {
    pub fn pin(change: ChangeKind, id: PinID) -> Self {
        Self {
            entity: EntityKind::Pin,
            change,
            id: id.to_uuid(),
        }
    }

    pub fn photo(change: ChangeKind, id: PhotoID) -> Self {
        Self {
            entity: EntityKind::Photo,
            change,
            id: id.to_uuid(),
        }
    }
}

/// Notifications emitted by the core for observers.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum TouristEvent {
    PinValidated {
        pin_id: PinID,
    },
    PinRejected {
        coordinate: Coordinate,
        reason: String,
    },
    PhotoAcquired {
        pin_id: PinID,
        photo_id: PhotoID,
    },
    AcquisitionFailed {
        pin_id: PinID,
        index: usize,
        reason: String,
    },
    AcquisitionComplete {
        pin_id: PinID,
        success_count: usize,
        failure_count: usize,
    },
    AcquisitionAborted {
        pin_id: PinID,
        reason: String,
    },
    StoreChanged(StoreChange),
}

impl TouristEvent {
    /// Pin the event concerns, if any. Store changes for photos carry only
    /// the photo id.
    pub fn pin_id(&self) -> Option<PinID> {
        match self {
            TouristEvent::PinValidated { pin_id }
            | TouristEvent::PhotoAcquired { pin_id, .. }
            | TouristEvent::AcquisitionFailed { pin_id, .. }
            | TouristEvent::AcquisitionComplete { pin_id, .. }
            | TouristEvent::AcquisitionAborted { pin_id, .. } => Some(*pin_id),
            TouristEvent::StoreChanged(change)
                if change.entity == EntityKind::Pin =>
            {
                Some(PinID(change.id))
            }
            TouristEvent::PinRejected { .. }
            | TouristEvent::StoreChanged(_) => None,
        }
    }
}
