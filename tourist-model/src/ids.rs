use std::str::FromStr;

use uuid::Uuid;

use crate::error::ModelError;

/// Strongly typed ID for map pins
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PinID(pub Uuid);

impl Default for PinID {
    fn default() -> Self {
        Self::new()
    }
}

impl PinID {
    pub fn new() -> Self {
        PinID(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn to_uuid(&self) -> Uuid {
        self.0
    }
}

impl AsRef<Uuid> for PinID {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl FromStr for PinID {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ModelError::InvalidId(
                "pin id cannot be empty".to_string(),
            ));
        }
        Uuid::parse_str(trimmed)
            .map(PinID)
            .map_err(|err| ModelError::InvalidId(format!("{trimmed}: {err}")))
    }
}

impl std::fmt::Display for PinID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strongly typed ID for photos owned by a pin
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PhotoID(pub Uuid);

impl Default for PhotoID {
    fn default() -> Self {
        Self::new()
    }
}

impl PhotoID {
    pub fn new() -> Self {
        PhotoID(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn to_uuid(&self) -> Uuid {
        self.0
    }
}

impl AsRef<Uuid> for PhotoID {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl FromStr for PhotoID {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ModelError::InvalidId(
                "photo id cannot be empty".to_string(),
            ));
        }
        Uuid::parse_str(trimmed)
            .map(PhotoID)
            .map_err(|err| ModelError::InvalidId(format!("{trimmed}: {err}")))
    }
}

impl std::fmt::Display for PhotoID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_id_parses_hyphenated_uuid() {
        let id: PinID = "01234567-89ab-cdef-0123-456789abcdef".parse().unwrap();
        assert_eq!(id.to_string(), "01234567-89ab-cdef-0123-456789abcdef");
    }

    #[test]
    fn empty_photo_id_is_rejected() {
        let err = "  ".parse::<PhotoID>().unwrap_err();
        assert!(matches!(err, ModelError::InvalidId(_)));
    }
}
