use std::{
    collections::{HashMap, HashSet},
    fmt,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

use async_trait::async_trait;
use cacache::Integrity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tourist_model::{Photo, PhotoID, Pin, PinID};
use tracing::{debug, info, warn};

use super::{StoreError, StoreState};
use crate::infra::cache::{PhotoBlobStore, PhotoCacheRoot};

/// Durable persistence for the whole store state.
///
/// `persist` must be all-or-nothing from the point of view of the next
/// `load`: either the new state is durable or the previous one still is.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    async fn load(&self) -> Result<StoreState, StoreError>;
    async fn persist(&self, state: &StoreState) -> Result<(), StoreError>;
}

/// Volatile backend. Persist failures can be switched on to exercise
/// rollback paths.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: std::sync::Mutex<StoreState>,
    fail_persist: AtomicBool,
    persist_count: AtomicU64,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: StoreState) -> Self {
        Self {
            state: std::sync::Mutex::new(state),
            ..Self::default()
        }
    }

    pub fn set_fail_persist(&self, fail: bool) {
        self.fail_persist.store(fail, Ordering::SeqCst);
    }

    pub fn persist_count(&self) -> u64 {
        self.persist_count.load(Ordering::SeqCst)
    }

    /// What the next `load` would return.
    pub fn durable_state(&self) -> StoreState {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl StoreBackend for MemoryBackend {
    async fn load(&self) -> Result<StoreState, StoreError> {
        Ok(self.durable_state())
    }

    async fn persist(&self, state: &StoreState) -> Result<(), StoreError> {
        if self.fail_persist.load(Ordering::SeqCst) {
            return Err(StoreError::Save(
                "memory backend configured to fail".to_string(),
            ));
        }
        *self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = state.clone();
        self.persist_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub const MANIFEST_KEY: &str = "virtual-tourist/store/v1";
const MANIFEST_FORMAT: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoreManifest {
    format: u32,
    pins: Vec<Pin>,
    photos: Vec<ManifestPhoto>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ManifestPhoto {
    id: PhotoID,
    pin_id: PinID,
    title: String,
    source_url: String,
    created_at: DateTime<Utc>,
    integrity: String,
}

impl ManifestPhoto {
    fn describe(photo: &Photo, integrity: &Integrity) -> Self {
        Self {
            id: photo.id,
            pin_id: photo.pin_id,
            title: photo.title.clone(),
            source_url: photo.source_url.clone(),
            created_at: photo.created_at,
            integrity: integrity.to_string(),
        }
    }

    fn into_photo(self, image: Vec<u8>) -> Photo {
        Photo {
            id: self.id,
            pin_id: self.pin_id,
            title: self.title,
            source_url: self.source_url,
            image,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Default)]
struct WrittenBlobs {
    by_photo: HashMap<PhotoID, Integrity>,
    manifest: Option<Integrity>,
}

/// Durable backend on top of `cacache`.
///
/// Photo bytes are content-addressed blobs; pins and photo metadata live in a
/// JSON manifest under [`MANIFEST_KEY`]. A commit writes any new blobs, then
/// the manifest, and only then drops blobs the new manifest no longer
/// references. A crash between steps leaves unreferenced blobs behind, never
/// a manifest pointing at missing bytes.
pub struct CacacheBackend {
    blobs: PhotoBlobStore,
    written: Mutex<WrittenBlobs>,
}

impl fmt::Debug for CacacheBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacacheBackend")
            .field("root", self.blobs.root())
            .finish()
    }
}

impl CacacheBackend {
    pub fn new(root: PathBuf) -> Self {
        Self {
            blobs: PhotoBlobStore::new(PhotoCacheRoot::new(root)),
            written: Mutex::new(WrittenBlobs::default()),
        }
    }

    pub fn blob_store(&self) -> &PhotoBlobStore {
        &self.blobs
    }
}

fn parse_integrity(raw: &str) -> Result<Integrity, StoreError> {
    raw.parse::<Integrity>().map_err(|err| {
        StoreError::Load(format!(
            "manifest holds invalid integrity {raw}: {err}"
        ))
    })
}

#[async_trait]
impl StoreBackend for CacacheBackend {
    async fn load(&self) -> Result<StoreState, StoreError> {
        let mut written = self.written.lock().await;

        let Some(raw) = self.blobs.read_entry(MANIFEST_KEY).await? else {
            info!(
                "[store] no manifest under {:?}; starting empty",
                self.blobs.root()
            );
            *written = WrittenBlobs::default();
            return Ok(StoreState::default());
        };

        let manifest: StoreManifest = serde_json::from_slice(&raw)
            .map_err(|err| {
                StoreError::Load(format!("corrupt manifest: {err}"))
            })?;
        if manifest.format != MANIFEST_FORMAT {
            return Err(StoreError::Load(format!(
                "unsupported manifest format {}",
                manifest.format
            )));
        }

        let mut by_photo = HashMap::with_capacity(manifest.photos.len());
        let mut photos = Vec::with_capacity(manifest.photos.len());
        for entry in manifest.photos {
            let integrity = parse_integrity(&entry.integrity)?;
            let image = self.blobs.read_hash(&integrity).await?;
            by_photo.insert(entry.id, integrity);
            photos.push(entry.into_photo(image));
        }

        info!(
            "[store] loaded {} pins and {} photos",
            manifest.pins.len(),
            photos.len()
        );

        *written = WrittenBlobs {
            by_photo,
            manifest: Some(cacache::Integrity::from(&raw)),
        };
        Ok(StoreState::from_parts(manifest.pins, photos))
    }

    async fn persist(&self, state: &StoreState) -> Result<(), StoreError> {
        let mut written = self.written.lock().await;

        let mut by_photo = HashMap::with_capacity(state.photo_count());
        let mut entries = Vec::with_capacity(state.photo_count());
        for photo in state.photos() {
            let integrity = match written.by_photo.get(&photo.id) {
                Some(existing) => existing.clone(),
                None => self.blobs.write_hash(&photo.image).await?.integrity,
            };
            entries.push(ManifestPhoto::describe(photo, &integrity));
            by_photo.insert(photo.id, integrity);
        }

        let manifest = StoreManifest {
            format: MANIFEST_FORMAT,
            pins: state.pins().cloned().collect(),
            photos: entries,
        };
        let raw = serde_json::to_vec(&manifest)
            .map_err(|err| {
                StoreError::Save(format!("encode manifest: {err}"))
            })?;
        let stored = self.blobs.write_entry(MANIFEST_KEY, &raw).await?;

        // The new manifest is durable; anything it no longer references can go.
        let live: HashSet<String> =
            by_photo.values().map(|i| i.to_string()).collect();
        let mut dropped: HashSet<String> = HashSet::new();
        for integrity in written.by_photo.values() {
            let key = integrity.to_string();
            if !live.contains(&key) && dropped.insert(key) {
                if let Err(err) = self.blobs.remove_hash(integrity).await {
                    warn!(
                        "[store] failed to remove unreferenced blob: {}",
                        err
                    );
                }
            }
        }
        if let Some(previous) = written.manifest.take()
            && previous != stored.integrity
            && let Err(err) = self.blobs.remove_hash(&previous).await
        {
            warn!("[store] failed to remove previous manifest: {}", err);
        }

        debug!(
            "[store] persisted manifest: pins={}, photos={}, bytes={}, \
             dropped_blobs={}",
            manifest.pins.len(),
            manifest.photos.len(),
            stored.byte_len,
            dropped.len()
        );

        *written = WrittenBlobs {
            by_photo,
            manifest: Some(stored.integrity),
        };
        Ok(())
    }
}

/// Convenience for wiring code that picks a backend at runtime.
pub fn cacache_backend(root: PathBuf) -> Arc<dyn StoreBackend> {
    Arc::new(CacacheBackend::new(root))
}
