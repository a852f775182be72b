use chrono::{DateTime, Utc};

use crate::{geo::Coordinate, ids::PinID};

/// A user-placed geographic marker. Owns its photos; see `Photo::pin_id`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pin {
    id: PinID,
    coordinate: Coordinate,
    created_at: DateTime<Utc>,
}

impl Pin {
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            id: PinID::new(),
            coordinate,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> PinID {
        self.id
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    pub fn latitude(&self) -> f64 {
        self.coordinate.latitude()
    }

    pub fn longitude(&self) -> f64 {
        self.coordinate.longitude()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
