use std::{collections::BTreeMap, sync::Arc};

use tourist_model::{
    ChangeKind, EntityKind, Photo, PhotoID, Pin, PinID, StoreChange,
};

use super::StoreError;

/// Committed contents of both durable collections.
///
/// Photos sit behind `Arc` so staging a commit clones pointers, not image
/// bytes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreState {
    pins: BTreeMap<PinID, Pin>,
    photos: BTreeMap<PhotoID, Arc<Photo>>,
}

impl StoreState {
    pub fn from_parts(
        pins: impl IntoIterator<Item = Pin>,
        photos: impl IntoIterator<Item = Photo>,
    ) -> Self {
        Self {
            pins: pins.into_iter().map(|pin| (pin.id(), pin)).collect(),
            photos: photos
                .into_iter()
                .map(|photo| (photo.id, Arc::new(photo)))
                .collect(),
        }
    }

    pub fn pin(&self, id: PinID) -> Option<&Pin> {
        self.pins.get(&id)
    }

    pub fn pins(&self) -> impl Iterator<Item = &Pin> {
        self.pins.values()
    }

    pub fn pin_count(&self) -> usize {
        self.pins.len()
    }

    pub fn photo(&self, id: PhotoID) -> Option<&Arc<Photo>> {
        self.photos.get(&id)
    }

    pub fn photos(&self) -> impl Iterator<Item = &Arc<Photo>> {
        self.photos.values()
    }

    pub fn photos_for(&self, pin: PinID) -> impl Iterator<Item = &Arc<Photo>> {
        self.photos.values().filter(move |photo| photo.pin_id == pin)
    }

    pub fn photo_count(&self) -> usize {
        self.photos.len()
    }

    fn remove_photos_of(
        &mut self,
        pin: PinID,
        changes: &mut Vec<StoreChange>,
    ) {
        self.photos.retain(|id, photo| {
            let keep = photo.pin_id != pin;
            if !keep {
                changes.push(StoreChange::photo(ChangeKind::Deleted, *id));
            }
            keep
        });
    }
}

/// A change requested through the write view.
#[derive(Debug, Clone)]
pub enum Mutation {
    InsertPin(Pin),
    /// Deletes the pin and every photo it owns.
    DeletePin(PinID),
    /// Deletes the pin only while it owns no photo; otherwise a no-op.
    DeletePinIfEmpty(PinID),
    ClearPins,
    InsertPhoto(Photo),
    RemovePhoto(PhotoID),
    /// Deletes every photo owned by the pin, keeping the pin.
    EvictPhotos(PinID),
}

impl Mutation {
    /// Apply to `state`, returning the resulting change set. On error `state`
    /// may be partially modified; callers apply to a staged copy.
    pub fn apply(
        self,
        state: &mut StoreState,
    ) -> Result<Vec<StoreChange>, StoreError> {
        let mut changes = Vec::new();

        match self {
            Mutation::InsertPin(pin) => {
                let id = pin.id();
                if state.pins.contains_key(&id) {
                    return Err(StoreError::AlreadyExists {
                        entity: EntityKind::Pin,
                        id: id.to_uuid(),
                    });
                }
                state.pins.insert(id, pin);
                changes.push(StoreChange::pin(ChangeKind::Inserted, id));
            }
            Mutation::DeletePin(id) => {
                if state.pins.remove(&id).is_none() {
                    return Err(StoreError::NotFound {
                        entity: EntityKind::Pin,
                        id: id.to_uuid(),
                    });
                }
                state.remove_photos_of(id, &mut changes);
                changes.push(StoreChange::pin(ChangeKind::Deleted, id));
            }
            Mutation::DeletePinIfEmpty(id) => {
                if !state.pins.contains_key(&id) {
                    return Err(StoreError::NotFound {
                        entity: EntityKind::Pin,
                        id: id.to_uuid(),
                    });
                }
                if state.photos_for(id).next().is_none() {
                    state.pins.remove(&id);
                    changes.push(StoreChange::pin(ChangeKind::Deleted, id));
                }
            }
            Mutation::ClearPins => {
                changes.extend(state.photos.keys().map(|id| {
                    StoreChange::photo(ChangeKind::Deleted, *id)
                }));
                changes.extend(
                    state
                        .pins
                        .keys()
                        .map(|id| StoreChange::pin(ChangeKind::Deleted, *id)),
                );
                state.photos.clear();
                state.pins.clear();
            }
            Mutation::InsertPhoto(photo) => {
                if !state.pins.contains_key(&photo.pin_id) {
                    return Err(StoreError::UnknownPin(photo.pin_id));
                }
                if photo.image.is_empty() {
                    return Err(StoreError::Invalid(format!(
                        "photo {} has no image data",
                        photo.id
                    )));
                }
                if state.photos.contains_key(&photo.id) {
                    return Err(StoreError::AlreadyExists {
                        entity: EntityKind::Photo,
                        id: photo.id.to_uuid(),
                    });
                }
                let id = photo.id;
                state.photos.insert(id, Arc::new(photo));
                changes.push(StoreChange::photo(ChangeKind::Inserted, id));
            }
            Mutation::RemovePhoto(id) => {
                if state.photos.remove(&id).is_none() {
                    return Err(StoreError::NotFound {
                        entity: EntityKind::Photo,
                        id: id.to_uuid(),
                    });
                }
                changes.push(StoreChange::photo(ChangeKind::Deleted, id));
            }
            Mutation::EvictPhotos(pin) => {
                if !state.pins.contains_key(&pin) {
                    return Err(StoreError::UnknownPin(pin));
                }
                state.remove_photos_of(pin, &mut changes);
            }
        }

        Ok(changes)
    }
}

/// Immutable, versioned view of committed state handed to readers.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub version: u64,
    pub state: StoreState,
}

impl std::ops::Deref for StoreSnapshot {
    type Target = StoreState;

    fn deref(&self) -> &Self::Target {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tourist_model::Coordinate;

    fn pin() -> Pin {
        Pin::new(Coordinate::new(48.8566, 2.3522).unwrap())
    }

    fn photo(pin: &Pin) -> Photo {
        Photo::new(
            pin.id(),
            "Seine",
            "https://example.test/p.jpg",
            vec![0xff, 0xd8],
        )
    }

    #[test]
    fn delete_pin_cascades_to_its_photos_only() {
        let (a, b) = (pin(), pin());
        let mut state = StoreState::from_parts(
            [a.clone(), b.clone()],
            [photo(&a), photo(&a), photo(&b)],
        );

        let changes = Mutation::DeletePin(a.id()).apply(&mut state).unwrap();

        assert_eq!(changes.len(), 3);
        assert_eq!(
            changes.last(),
            Some(&StoreChange::pin(ChangeKind::Deleted, a.id()))
        );
        assert_eq!(state.photos_for(a.id()).count(), 0);
        assert_eq!(state.photos_for(b.id()).count(), 1);
        assert!(state.pin(a.id()).is_none());
    }

    #[test]
    fn photo_requires_existing_pin_and_bytes() {
        let owner = pin();
        let mut state = StoreState::default();

        let orphan = photo(&owner);
        assert!(matches!(
            Mutation::InsertPhoto(orphan).apply(&mut state),
            Err(StoreError::UnknownPin(id)) if id == owner.id()
        ));

        Mutation::InsertPin(owner.clone()).apply(&mut state).unwrap();
        let mut empty = photo(&owner);
        empty.image.clear();
        assert!(matches!(
            Mutation::InsertPhoto(empty).apply(&mut state),
            Err(StoreError::Invalid(_))
        ));
    }

    #[test]
    fn evict_keeps_pin_and_reports_each_photo() {
        let owner = pin();
        let mut state =
            StoreState::from_parts(
                [owner.clone()],
                [photo(&owner), photo(&owner)],
            );

        let changes =
            Mutation::EvictPhotos(owner.id()).apply(&mut state).unwrap();

        assert_eq!(changes.len(), 2);
        assert!(changes.iter().all(|c| c.entity == EntityKind::Photo));
        assert!(state.pin(owner.id()).is_some());
        assert_eq!(state.photo_count(), 0);
    }

    #[test]
    fn delete_if_empty_spares_pins_that_own_photos() {
        let (full, empty) = (pin(), pin());
        let mut state = StoreState::from_parts(
            [full.clone(), empty.clone()],
            [photo(&full)],
        );

        let kept = Mutation::DeletePinIfEmpty(full.id())
            .apply(&mut state)
            .unwrap();
        assert!(kept.is_empty());
        assert!(state.pin(full.id()).is_some());
        assert_eq!(state.photos_for(full.id()).count(), 1);

        let removed = Mutation::DeletePinIfEmpty(empty.id())
            .apply(&mut state)
            .unwrap();
        assert_eq!(
            removed,
            vec![StoreChange::pin(ChangeKind::Deleted, empty.id())]
        );
        assert!(state.pin(empty.id()).is_none());
    }
}
