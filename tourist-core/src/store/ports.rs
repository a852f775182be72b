use std::sync::Arc;

use async_trait::async_trait;
use tourist_model::{Photo, PhotoID, Pin, PinID};

use super::{CommitReceipt, Mutation, StoreError, SyncCoordinator};

/// System of record for where the user has dropped pins.
///
/// Reads come from the latest committed snapshot; writes are commits.
#[async_trait]
pub trait PinStore: Send + Sync {
    fn pin(&self, id: PinID) -> Option<Pin>;
    fn pins(&self) -> Vec<Pin>;

    async fn insert_pin(&self, pin: Pin) -> Result<CommitReceipt, StoreError>;
    /// Deletes the pin together with all of its photos.
    async fn delete_pin(&self, id: PinID) -> Result<CommitReceipt, StoreError>;
    async fn clear_pins(&self) -> Result<CommitReceipt, StoreError>;
}

/// System of record for the photos attached to each pin.
#[async_trait]
pub trait PhotoStore: Send + Sync {
    fn photo(&self, id: PhotoID) -> Option<Arc<Photo>>;
    fn photos_for(&self, pin: PinID) -> Vec<Arc<Photo>>;

    async fn insert_photo(
        &self,
        photo: Photo,
    ) -> Result<CommitReceipt, StoreError>;
    async fn remove_photo(
        &self,
        id: PhotoID,
    ) -> Result<CommitReceipt, StoreError>;
    /// Removes every photo of `pin` in a single commit.
    async fn evict_photos(
        &self,
        pin: PinID,
    ) -> Result<CommitReceipt, StoreError>;
}

#[async_trait]
impl PinStore for SyncCoordinator {
    fn pin(&self, id: PinID) -> Option<Pin> {
        self.observe().pin(id).cloned()
    }

    fn pins(&self) -> Vec<Pin> {
        self.observe().pins().cloned().collect()
    }

    async fn insert_pin(&self, pin: Pin) -> Result<CommitReceipt, StoreError> {
        self.commit(Mutation::InsertPin(pin)).await
    }

    async fn delete_pin(&self, id: PinID) -> Result<CommitReceipt, StoreError> {
        self.commit(Mutation::DeletePin(id)).await
    }

    async fn clear_pins(&self) -> Result<CommitReceipt, StoreError> {
        self.commit(Mutation::ClearPins).await
    }
}

#[async_trait]
impl PhotoStore for SyncCoordinator {
    fn photo(&self, id: PhotoID) -> Option<Arc<Photo>> {
        self.observe().photo(id).cloned()
    }

    fn photos_for(&self, pin: PinID) -> Vec<Arc<Photo>> {
        self.observe().photos_for(pin).cloned().collect()
    }

    async fn insert_photo(
        &self,
        photo: Photo,
    ) -> Result<CommitReceipt, StoreError> {
        self.commit(Mutation::InsertPhoto(photo)).await
    }

    async fn remove_photo(
        &self,
        id: PhotoID,
    ) -> Result<CommitReceipt, StoreError> {
        self.commit(Mutation::RemovePhoto(id)).await
    }

    async fn evict_photos(
        &self,
        pin: PinID,
    ) -> Result<CommitReceipt, StoreError> {
        self.commit(Mutation::EvictPhotos(pin)).await
    }
}
