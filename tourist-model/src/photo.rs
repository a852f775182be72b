use std::fmt;

use chrono::{DateTime, Utc};

use crate::ids::{PhotoID, PinID};

/// Title shown for photos whose remote title is blank.
pub const UNTITLED_PHOTO: &str = "[untitled]";

/// A downloaded image attached to exactly one pin.
///
/// A photo is only ever constructed from bytes that were actually fetched,
/// so `image` is never empty for a committed record.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Photo {
    pub id: PhotoID,
    pub pin_id: PinID,
    pub title: String,
    /// Remote location the bytes were downloaded from.
    pub source_url: String,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub image: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

impl Photo {
    pub fn new(
        pin_id: PinID,
        title: impl Into<String>,
        source_url: impl Into<String>,
        image: Vec<u8>,
    ) -> Self {
        Self {
            id: PhotoID::new(),
            pin_id,
            title: title.into(),
            source_url: source_url.into(),
            image,
            created_at: Utc::now(),
        }
    }

    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            UNTITLED_PHOTO
        } else {
            &self.title
        }
    }

    pub fn byte_len(&self) -> usize {
        self.image.len()
    }
}

impl fmt::Debug for Photo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Photo")
            .field("id", &self.id)
            .field("pin_id", &self.pin_id)
            .field("title", &self.title)
            .field("source_url", &self.source_url)
            .field("image_len", &self.image.len())
            .field("created_at", &self.created_at)
            .finish()
    }
}
