use std::sync::Arc;

use tourist_model::{
    Coordinate, InboundEvent, PhotoID, Pin, PinID, TouristEvent,
};
use tracing::{info, warn};

use crate::{
    acquisition::{AcquisitionOutcome, PhotoAcquisitionService},
    error::{Result, TouristError},
    providers::flickr::SearchError,
    store::{CommitReceipt, Mutation, SyncCoordinator},
};

/// A pin that passed the probe and went through its first acquisition.
///
/// When the acquisition left it empty the pin may already be gone again,
/// depending on `delete_empty_pins`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedPin {
    pub pin_id: PinID,
    pub outcome: AcquisitionOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleOutcome {
    Placed(PlacedPin),
    Refreshed {
        pin_id: PinID,
        outcome: AcquisitionOutcome,
    },
    PinDeleted(CommitReceipt),
    PinsCleared(CommitReceipt),
    PhotoRemoved(CommitReceipt),
}

/// Turns inbound requests into probes, commits and acquisition runs.
#[derive(Debug, Clone)]
pub struct PinLifecycle {
    acquisition: PhotoAcquisitionService,
    store: Arc<SyncCoordinator>,
}

impl PinLifecycle {
    pub fn new(
        acquisition: PhotoAcquisitionService,
        store: Arc<SyncCoordinator>,
    ) -> Self {
        Self { acquisition, store }
    }

    pub fn acquisition(&self) -> &PhotoAcquisitionService {
        &self.acquisition
    }

    pub fn store(&self) -> &Arc<SyncCoordinator> {
        &self.store
    }

    pub async fn handle(
        &self,
        event: InboundEvent,
    ) -> Result<LifecycleOutcome> {
        match event {
            InboundEvent::PinPlaced { coordinate } => {
                self.place_pin(coordinate).await.map(LifecycleOutcome::Placed)
            }
            InboundEvent::PinDeleteRequested { pin_id } => {
                self.delete_pin(pin_id).await.map(LifecycleOutcome::PinDeleted)
            }
            InboundEvent::AllPinsClearRequested => {
                self.clear_pins().await.map(LifecycleOutcome::PinsCleared)
            }
            InboundEvent::RefreshRequested { pin_id } => {
                let outcome = self.refresh(pin_id).await?;
                Ok(LifecycleOutcome::Refreshed { pin_id, outcome })
            }
            InboundEvent::PhotoRemoveRequested { photo_id } => self
                .remove_photo(photo_id)
                .await
                .map(LifecycleOutcome::PhotoRemoved),
        }
    }

    /// Probe the location, keep the pin only if the search finds photos,
    /// then run its first acquisition to completion.
    pub async fn place_pin(&self, coordinate: Coordinate) -> Result<PlacedPin> {
        let pin = Pin::new(coordinate);
        let pin_id = pin.id();

        let probe = match self.acquisition.probe(&pin).await {
            Ok(probe) => probe,
            Err(err) => {
                let err = TouristError::from(err);
                self.reject(coordinate, err.to_string());
                return Err(err);
            }
        };
        if !probe.has_results {
            let reason = SearchError::NoResults.to_string();
            self.reject(coordinate, reason.clone());
            return Err(TouristError::PinRejected { coordinate, reason });
        }

        self.store.commit(Mutation::InsertPin(pin)).await?;
        self.publish(TouristEvent::PinValidated { pin_id });
        info!("[lifecycle] placed pin {} at {}", pin_id, coordinate);

        let run = match self
            .acquisition
            .acquire(pin_id, self.acquisition.settings().photos_per_pin)
        {
            Ok(run) => run,
            Err(err) => {
                self.rollback(pin_id).await;
                return Err(err.into());
            }
        };

        let outcome = run.finish().await;
        Ok(PlacedPin { pin_id, outcome })
    }

    pub async fn delete_pin(&self, pin_id: PinID) -> Result<CommitReceipt> {
        let receipt = self.store.commit(Mutation::DeletePin(pin_id)).await?;
        info!(
            "[lifecycle] deleted pin {} ({} changes)",
            pin_id,
            receipt.changes.len()
        );
        Ok(receipt)
    }

    pub async fn clear_pins(&self) -> Result<CommitReceipt> {
        let receipt = self.store.commit(Mutation::ClearPins).await?;
        info!(
            "[lifecycle] cleared all pins ({} changes)",
            receipt.changes.len()
        );
        Ok(receipt)
    }

    /// Replace the pin's photos and wait for the new set.
    pub async fn refresh(&self, pin_id: PinID) -> Result<AcquisitionOutcome> {
        let run = self
            .acquisition
            .refresh(pin_id, self.acquisition.settings().photos_per_pin)
            .await?;
        Ok(run.finish().await)
    }

    pub async fn remove_photo(
        &self,
        photo_id: PhotoID,
    ) -> Result<CommitReceipt> {
        Ok(self.store.commit(Mutation::RemovePhoto(photo_id)).await?)
    }

    fn reject(&self, coordinate: Coordinate, reason: String) {
        info!("[lifecycle] rejected pin at {}: {}", coordinate, reason);
        self.publish(TouristEvent::PinRejected { coordinate, reason });
    }

    async fn rollback(&self, pin_id: PinID) {
        if let Err(err) = self.store.commit(Mutation::DeletePin(pin_id)).await {
            warn!("[lifecycle] rollback of pin {} failed: {}", pin_id, err);
        }
    }

    fn publish(&self, event: TouristEvent) {
        self.acquisition.bus().publish(event);
    }
}
