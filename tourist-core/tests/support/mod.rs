//! Shared fakes and wiring for core integration tests.
#![allow(dead_code)]

use std::{
    collections::HashSet,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use anyhow::Result;
use async_trait::async_trait;
use tourist_core::{
    acquisition::{AcquisitionSettings, PhotoAcquisitionService, SharedRng},
    events::EventBus,
    infra::fetch::{FetchError, ImageFetcher},
    lifecycle::PinLifecycle,
    providers::flickr::{PhotoSearchClient, SearchError, SearchHit, SearchPage},
    store::{MemoryBackend, Mutation, SyncCoordinator},
};
use tourist_model::{BoundingBox, Coordinate, Photo, PhotoID, Pin};

pub const TEST_SEED: u64 = 0x5eed;

pub fn hits(count: usize) -> Vec<SearchHit> {
    (0..count)
        .map(|i| SearchHit {
            title: format!("photo {i}"),
            image_url: image_url(i),
        })
        .collect()
}

pub fn image_url(index: usize) -> String {
    format!("https://photos.test/{index}.jpg")
}

pub fn tokyo() -> Coordinate {
    Coordinate::new(35.6762, 139.6503).expect("valid coordinate")
}

pub fn lisbon() -> Coordinate {
    Coordinate::new(38.7223, -9.1393).expect("valid coordinate")
}

#[derive(Debug, Clone)]
pub enum SearchScript {
    Hits(Vec<SearchHit>),
    NoResults,
    Offline,
}

/// Answers every search with the scripted response and records the boxes.
#[derive(Debug)]
pub struct ScriptedSearch {
    script: Mutex<SearchScript>,
    calls: Mutex<Vec<(BoundingBox, Option<u32>)>>,
}

impl ScriptedSearch {
    pub fn new(script: SearchScript) -> Self {
        Self {
            script: Mutex::new(script),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set(&self, script: SearchScript) {
        *self.script.lock().unwrap() = script;
    }

    pub fn calls(&self) -> Vec<(BoundingBox, Option<u32>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PhotoSearchClient for ScriptedSearch {
    async fn search(
        &self,
        bbox: &BoundingBox,
        page: Option<u32>,
    ) -> Result<SearchPage, SearchError> {
        self.calls.lock().unwrap().push((*bbox, page));
        match self.script.lock().unwrap().clone() {
            SearchScript::Hits(photos) if photos.is_empty() => {
                Err(SearchError::NoResults)
            }
            SearchScript::Hits(photos) => Ok(SearchPage {
                page: 1,
                pages: 120,
                total: photos.len() as u64 * 120,
                photos,
            }),
            SearchScript::NoResults => Err(SearchError::NoResults),
            SearchScript::Offline => {
                Err(SearchError::Network("connection refused".into()))
            }
        }
    }
}

/// Serves the URL's own bytes; URLs marked broken fail with a network error.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    broken: Mutex<HashSet<String>>,
    fail_all: Mutex<bool>,
    fetched: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let fetcher = Self::default();
        *fetcher.fail_all.lock().unwrap() = true;
        fetcher
    }

    pub fn break_url(&self, url: impl Into<String>) {
        self.broken.lock().unwrap().insert(url.into());
    }

    pub fn fetched(&self) -> usize {
        self.fetched.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.fetched.fetch_add(1, Ordering::SeqCst);
        let broken = self.broken.lock().unwrap().contains(url);
        if *self.fail_all.lock().unwrap() || broken {
            return Err(FetchError::Network(format!("GET {url}: timed out")));
        }
        Ok(url.as_bytes().to_vec())
    }
}

/// Everything a test needs, wired over a memory backend.
#[derive(Debug)]
pub struct Harness {
    pub backend: Arc<MemoryBackend>,
    pub bus: Arc<EventBus>,
    pub store: Arc<SyncCoordinator>,
    pub search: Arc<ScriptedSearch>,
    pub fetcher: Arc<ScriptedFetcher>,
    pub service: PhotoAcquisitionService,
    pub lifecycle: PinLifecycle,
}

impl Harness {
    pub async fn with_hits(count: usize) -> Result<Self> {
        Self::build(
            ScriptedSearch::new(SearchScript::Hits(hits(count))),
            ScriptedFetcher::new(),
            AcquisitionSettings::default(),
            TEST_SEED,
        )
        .await
    }

    pub async fn build(
        search: ScriptedSearch,
        fetcher: ScriptedFetcher,
        settings: AcquisitionSettings,
        seed: u64,
    ) -> Result<Self> {
        let backend = Arc::new(MemoryBackend::new());
        let bus = Arc::new(EventBus::new(256));
        let store = Arc::new(
            SyncCoordinator::open(backend.clone(), bus.clone()).await?,
        );
        let search = Arc::new(search);
        let fetcher = Arc::new(fetcher);
        let service = PhotoAcquisitionService::new(
            search.clone(),
            fetcher.clone(),
            store.clone(),
            bus.clone(),
            SharedRng::seeded(seed),
            settings,
        );
        let lifecycle = PinLifecycle::new(service.clone(), store.clone());

        Ok(Self {
            backend,
            bus,
            store,
            search,
            fetcher,
            service,
            lifecycle,
        })
    }

    /// Insert a pin directly, bypassing the probe.
    pub async fn seed_pin(&self, coordinate: Coordinate) -> Result<Pin> {
        let pin = Pin::new(coordinate);
        self.store.commit(Mutation::InsertPin(pin.clone())).await?;
        Ok(pin)
    }

    pub async fn seed_photos(
        &self,
        pin: &Pin,
        count: usize,
    ) -> Result<Vec<PhotoID>> {
        let mut ids = Vec::with_capacity(count);
        for i in 0..count {
            let photo = Photo::new(
                pin.id(),
                format!("old {i}"),
                format!("https://old.test/{i}.jpg"),
                vec![i as u8; 8],
            );
            ids.push(photo.id);
            self.store.commit(Mutation::InsertPhoto(photo)).await?;
        }
        Ok(ids)
    }

    pub fn photo_ids_for(&self, pin: &Pin) -> HashSet<PhotoID> {
        self.store
            .observe()
            .photos_for(pin.id())
            .map(|photo| photo.id)
            .collect()
    }
}
