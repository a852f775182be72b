use std::sync::Arc;

use anyhow::Context;
use tourist_core::{
    acquisition::{PhotoAcquisitionService, SharedRng},
    events::EventBus,
    infra::fetch::HttpImageFetcher,
    lifecycle::PinLifecycle,
    providers::flickr::FlickrSearchClient,
    store::{StoreBackend, SyncCoordinator, backend::cacache_backend},
};
use tracing::info;

use crate::models::TouristConfig;

const EVENT_BUS_CAPACITY: usize = 1024;

/// Core services built from one configuration.
#[derive(Debug, Clone)]
pub struct TouristApp {
    pub bus: Arc<EventBus>,
    pub store: Arc<SyncCoordinator>,
    pub lifecycle: PinLifecycle,
}

impl TouristApp {
    /// Open the durable store under `store.root` and connect the HTTP
    /// search client and image fetcher.
    pub async fn build(config: &TouristConfig) -> anyhow::Result<Self> {
        let backend = cacache_backend(config.store.root.clone());
        Self::build_with_backend(config, backend).await
    }

    pub async fn build_with_backend(
        config: &TouristConfig,
        backend: Arc<dyn StoreBackend>,
    ) -> anyhow::Result<Self> {
        let bus = Arc::new(EventBus::new(EVENT_BUS_CAPACITY));
        let store = Arc::new(
            SyncCoordinator::open(backend, bus.clone())
                .await
                .with_context(|| {
                    format!(
                        "failed to open store at {}",
                        config.store.root.display()
                    )
                })?,
        );

        let search = Arc::new(
            FlickrSearchClient::new(config.flickr.search_settings())
                .context("failed to build search client")?,
        );
        let fetcher = Arc::new(
            HttpImageFetcher::new(config.flickr.timeout())
                .context("failed to build image fetcher")?,
        );
        let rng = match config.acquisition.seed {
            Some(seed) => {
                info!("[wiring] photo selection seeded with {}", seed);
                SharedRng::seeded(seed)
            }
            None => SharedRng::from_os_rng(),
        };

        let acquisition = PhotoAcquisitionService::new(
            search,
            fetcher,
            store.clone(),
            bus.clone(),
            rng,
            config.acquisition_settings(),
        );
        let lifecycle = PinLifecycle::new(acquisition, store.clone());

        Ok(Self {
            bus,
            store,
            lifecycle,
        })
    }
}
