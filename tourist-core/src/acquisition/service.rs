use std::{fmt, sync::Arc};

use futures::{StreamExt, stream};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tourist_model::{BoundingBox, Photo, PhotoID, Pin, PinID};
use tracing::{Instrument, debug, info, info_span, warn};

use super::{
    AcquisitionEvent, AcquisitionOutcome, AcquisitionRun, InFlightGuard,
    InFlightPins, SharedRng,
};
use crate::{
    events::EventBus,
    infra::fetch::{FetchError, ImageFetcher},
    providers::flickr::{PhotoSearchClient, SearchError, SearchHit},
    store::{Mutation, StoreError, SyncCoordinator},
};

pub const DEFAULT_PHOTOS_PER_PIN: usize = 10;
pub const DEFAULT_DOWNLOAD_CONCURRENCY: usize = 4;
pub const DEFAULT_HALF_WIDTH: f64 = 1.0;
pub const DEFAULT_HALF_HEIGHT: f64 = 1.0;

#[derive(Debug, thiserror::Error)]
pub enum AcquisitionError {
    #[error("An acquisition for pin {0} is already running")]
    InProgress(PinID),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Pin {0} does not exist")]
    UnknownPin(PinID),
}

/// Why a single selected entry did not become a photo.
#[derive(Debug, thiserror::Error)]
pub enum ItemFailure {
    #[error("download failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("commit failed: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AcquisitionSettings {
    /// Photos requested when a pin is placed or refreshed.
    pub photos_per_pin: usize,
    pub download_concurrency: usize,
    /// Longitude degrees on either side of the pin.
    pub half_width: f64,
    /// Latitude degrees on either side of the pin.
    pub half_height: f64,
    /// Remove the pin when a failed run leaves it without a photo.
    pub delete_empty_pins: bool,
}

impl Default for AcquisitionSettings {
    fn default() -> Self {
        Self {
            photos_per_pin: DEFAULT_PHOTOS_PER_PIN,
            download_concurrency: DEFAULT_DOWNLOAD_CONCURRENCY,
            half_width: DEFAULT_HALF_WIDTH,
            half_height: DEFAULT_HALF_HEIGHT,
            delete_empty_pins: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResult {
    pub has_results: bool,
}

/// Probes, acquires and refreshes photos for pins.
///
/// At most one run is live per pin; runs for different pins proceed
/// independently. Cloning is cheap and clones share the in-flight set.
#[derive(Clone)]
pub struct PhotoAcquisitionService {
    search: Arc<dyn PhotoSearchClient>,
    fetcher: Arc<dyn ImageFetcher>,
    store: Arc<SyncCoordinator>,
    bus: Arc<EventBus>,
    rng: SharedRng,
    in_flight: InFlightPins,
    settings: Arc<AcquisitionSettings>,
}

impl fmt::Debug for PhotoAcquisitionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhotoAcquisitionService")
            .field("in_flight", &self.in_flight.len())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl PhotoAcquisitionService {
    pub fn new(
        search: Arc<dyn PhotoSearchClient>,
        fetcher: Arc<dyn ImageFetcher>,
        store: Arc<SyncCoordinator>,
        bus: Arc<EventBus>,
        rng: SharedRng,
        settings: AcquisitionSettings,
    ) -> Self {
        Self {
            search,
            fetcher,
            store,
            bus,
            rng,
            in_flight: InFlightPins::new(),
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &AcquisitionSettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<SyncCoordinator> {
        &self.store
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn is_acquiring(&self, pin_id: PinID) -> bool {
        self.in_flight.contains(pin_id)
    }

    pub fn bbox_for(&self, pin: &Pin) -> BoundingBox {
        BoundingBox::around(
            pin.coordinate(),
            self.settings.half_width,
            self.settings.half_height,
        )
    }

    /// One search around `pin`; nothing is downloaded or stored.
    pub async fn probe(
        &self,
        pin: &Pin,
    ) -> Result<ProbeResult, AcquisitionError> {
        let bbox = self.bbox_for(pin);
        match self.search.search(&bbox, None).await {
            Ok(page) => {
                debug!(
                    "[probe] {} hits for {} (pages={})",
                    page.photos.len(),
                    pin.coordinate(),
                    page.capped_pages()
                );
                Ok(ProbeResult { has_results: true })
            }
            Err(SearchError::NoResults) => {
                debug!("[probe] no results for {}", pin.coordinate());
                Ok(ProbeResult { has_results: false })
            }
            Err(err) => {
                warn!(
                    "[probe] search failed for {}: {}",
                    pin.coordinate(),
                    err
                );
                Err(err.into())
            }
        }
    }

    /// Start a run that adds up to `count` photos to the pin.
    pub fn acquire(
        &self,
        pin_id: PinID,
        count: usize,
    ) -> Result<AcquisitionRun, AcquisitionError> {
        let guard = self.claim(pin_id)?;
        let pin = self.existing_pin(pin_id)?;
        Ok(self.spawn_run(pin, count, guard))
    }

    /// Replace the pin's photos with a fresh selection.
    ///
    /// The current photos are evicted in one commit before any download
    /// starts. If that commit fails nothing changes and no run starts.
    pub async fn refresh(
        &self,
        pin_id: PinID,
        count: usize,
    ) -> Result<AcquisitionRun, AcquisitionError> {
        let guard = self.claim(pin_id)?;
        let pin = self.existing_pin(pin_id)?;

        let receipt = self.store.commit(Mutation::EvictPhotos(pin_id)).await?;
        info!(
            "[refresh] evicted {} photos from pin {}",
            receipt.changes.len(),
            pin_id
        );

        Ok(self.spawn_run(pin, count, guard))
    }

    fn claim(&self, pin_id: PinID) -> Result<InFlightGuard, AcquisitionError> {
        self.in_flight.try_claim(pin_id).ok_or_else(|| {
            debug!("[acquire] pin {} already has a run", pin_id);
            AcquisitionError::InProgress(pin_id)
        })
    }

    fn existing_pin(&self, pin_id: PinID) -> Result<Pin, AcquisitionError> {
        self.store
            .observe()
            .pin(pin_id)
            .cloned()
            .ok_or(AcquisitionError::UnknownPin(pin_id))
    }

    fn spawn_run(
        &self,
        pin: Pin,
        count: usize,
        guard: InFlightGuard,
    ) -> AcquisitionRun {
        let pin_id = pin.id();
        let (tx, rx) = mpsc::unbounded_channel();
        let span = info_span!("acquire", pin = %pin_id, count);
        let service = self.clone();
        let task = tokio::spawn(
            async move { service.run(pin, count, tx, guard).await }
                .instrument(span),
        );
        AcquisitionRun::new(pin_id, UnboundedReceiverStream::new(rx), task)
    }

    async fn run(
        self,
        pin: Pin,
        count: usize,
        tx: mpsc::UnboundedSender<AcquisitionEvent>,
        guard: InFlightGuard,
    ) -> AcquisitionOutcome {
        let pin_id = pin.id();
        let bbox = self.bbox_for(&pin);

        let outcome = match self.search.search(&bbox, None).await {
            Ok(page) => {
                let picks = self.rng.sample_indices(page.photos.len(), count);
                info!(
                    "[acquire] bbox={} pool={} total={} pages={} selected={}",
                    bbox,
                    page.photos.len(),
                    page.total,
                    page.capped_pages(),
                    picks.len()
                );
                let selected = picks
                    .into_iter()
                    .map(|index| (index, page.photos[index].clone()))
                    .collect();
                self.download_selected(pin_id, selected, &tx).await
            }
            Err(err) => {
                warn!(
                    "[acquire] search failed (retryable: {}): {}",
                    err.is_retryable(),
                    err
                );
                AcquisitionOutcome::Aborted {
                    reason: err.to_string(),
                }
            }
        };

        if outcome.is_failure() && self.settings.delete_empty_pins {
            self.remove_empty_pin(pin_id).await;
        }

        drop(guard);
        self.emit(pin_id, &tx, outcome.terminal_event());
        info!(
            "[acquire] finished: success={}, failure={}",
            outcome.success_count(),
            outcome.failure_count()
        );
        outcome
    }

    async fn download_selected(
        &self,
        pin_id: PinID,
        selected: Vec<(usize, SearchHit)>,
        tx: &mpsc::UnboundedSender<AcquisitionEvent>,
    ) -> AcquisitionOutcome {
        let concurrency = self.settings.download_concurrency.max(1);
        let mut results = stream::iter(selected)
            .map(|(index, hit)| {
                let service = self.clone();
                async move { (index, service.acquire_one(pin_id, hit).await) }
            })
            .buffer_unordered(concurrency);

        let mut photo_ids = Vec::new();
        let mut failure_count = 0;
        while let Some((index, result)) = results.next().await {
            match result {
                Ok(photo_id) => {
                    photo_ids.push(photo_id);
                    self.emit(
                        pin_id,
                        tx,
                        AcquisitionEvent::PhotoAcquired { photo_id, index },
                    );
                }
                Err(err) => {
                    failure_count += 1;
                    warn!("[acquire] entry {} failed: {}", index, err);
                    self.emit(
                        pin_id,
                        tx,
                        AcquisitionEvent::AcquisitionFailed {
                            index,
                            reason: err.to_string(),
                        },
                    );
                }
            }
        }

        AcquisitionOutcome::Complete {
            success_count: photo_ids.len(),
            failure_count,
            photo_ids,
        }
    }

    async fn acquire_one(
        &self,
        pin_id: PinID,
        hit: SearchHit,
    ) -> Result<PhotoID, ItemFailure> {
        let bytes = self.fetcher.fetch(&hit.image_url).await?;
        let photo = Photo::new(pin_id, hit.title, hit.image_url, bytes);
        let photo_id = photo.id;
        debug!(
            "[acquire] downloaded {} bytes for photo {}",
            photo.byte_len(),
            photo_id
        );
        self.store.commit(Mutation::InsertPhoto(photo)).await?;
        Ok(photo_id)
    }

    async fn remove_empty_pin(&self, pin_id: PinID) {
        match self.store.commit(Mutation::DeletePinIfEmpty(pin_id)).await {
            Ok(receipt) if receipt.changes.is_empty() => {
                debug!("[acquire] pin {} still has photos, keeping it", pin_id);
            }
            Ok(_) => info!("[acquire] removed pin {} without photos", pin_id),
            Err(StoreError::NotFound { .. }) => {
                debug!("[acquire] pin {} already removed", pin_id);
            }
            Err(err) => {
                warn!(
                    "[acquire] could not remove empty pin {}: {}",
                    pin_id, err
                );
            }
        }
    }

    fn emit(
        &self,
        pin_id: PinID,
        tx: &mpsc::UnboundedSender<AcquisitionEvent>,
        event: AcquisitionEvent,
    ) {
        self.bus.publish(event.clone().into_tourist_event(pin_id));
        // The run keeps going when nobody polls its handle.
        let _ = tx.send(event);
    }
}
