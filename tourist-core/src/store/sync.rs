use std::{any::type_name_of_val, fmt, sync::Arc};

use tokio::sync::{Mutex, watch};
use tourist_model::{StoreChange, TouristEvent};
use tracing::{debug, error, info};

use super::{Mutation, StoreBackend, StoreError, StoreSnapshot, StoreState};
use crate::events::EventBus;

/// Result of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReceipt {
    /// Read-view version that first contains this commit.
    pub version: u64,
    pub changes: Vec<StoreChange>,
}

#[derive(Debug)]
struct WriteView {
    state: StoreState,
    version: u64,
}

/// Reconciles background writes with foreground reads.
///
/// The write view is the only place state changes. A commit is staged on a
/// copy, persisted through the backend, and only then swapped in and
/// published to the read view as a new snapshot. Readers never see a staged
/// or half-persisted state, and never wait for a commit in progress.
///
/// The read view is never edited directly: each publish replaces it
/// wholesale with the write view's state, so the write view always wins.
pub struct SyncCoordinator {
    backend: Arc<dyn StoreBackend>,
    write_view: Mutex<WriteView>,
    read_view: watch::Sender<Arc<StoreSnapshot>>,
    bus: Arc<EventBus>,
}

impl fmt::Debug for SyncCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.observe();
        f.debug_struct("SyncCoordinator")
            .field("backend", &type_name_of_val(self.backend.as_ref()))
            .field("version", &snapshot.version)
            .field("pins", &snapshot.pin_count())
            .field("photos", &snapshot.photo_count())
            .field("readers", &self.read_view.receiver_count())
            .finish()
    }
}

impl SyncCoordinator {
    /// Load the durable state and open both views on it.
    pub async fn open(
        backend: Arc<dyn StoreBackend>,
        bus: Arc<EventBus>,
    ) -> Result<Self, StoreError> {
        let state = backend.load().await?;
        info!(
            "[sync] opened store: pins={}, photos={}",
            state.pin_count(),
            state.photo_count()
        );

        let snapshot = Arc::new(StoreSnapshot {
            version: 0,
            state: state.clone(),
        });
        let (read_view, _) = watch::channel(snapshot);

        Ok(Self {
            backend,
            write_view: Mutex::new(WriteView { state, version: 0 }),
            read_view,
            bus,
        })
    }

    /// Latest fully committed snapshot.
    pub fn observe(&self) -> Arc<StoreSnapshot> {
        self.read_view.borrow().clone()
    }

    /// Receiver that is notified whenever a new snapshot is published.
    pub fn subscribe(&self) -> watch::Receiver<Arc<StoreSnapshot>> {
        self.read_view.subscribe()
    }

    pub async fn commit(
        &self,
        mutation: Mutation,
    ) -> Result<CommitReceipt, StoreError> {
        let label = mutation_label(&mutation);
        let mut write_view = self.write_view.lock().await;

        let mut staged = write_view.state.clone();
        let changes = mutation.apply(&mut staged)?;

        if changes.is_empty() {
            debug!("[sync] {} produced no changes", label);
            return Ok(CommitReceipt {
                version: write_view.version,
                changes,
            });
        }

        if let Err(err) = self.backend.persist(&staged).await {
            error!("[sync] {} failed to persist: {}", label, err);
            return Err(match err {
                StoreError::Save(_) => err,
                other => StoreError::Save(other.to_string()),
            });
        }

        write_view.state = staged;
        write_view.version += 1;
        let version = write_view.version;
        self.publish_locked(&write_view);
        drop(write_view);

        debug!(
            "[sync] committed {}: version={}, changes={}",
            label,
            version,
            changes.len()
        );
        for change in &changes {
            self.bus.publish(TouristEvent::StoreChanged(*change));
        }

        Ok(CommitReceipt { version, changes })
    }

    /// Discard in-memory state and re-read both views from the backend.
    pub async fn reload_read_view(&self) -> Result<u64, StoreError> {
        let mut write_view = self.write_view.lock().await;
        write_view.state = self.backend.load().await?;
        write_view.version += 1;
        self.publish_locked(&write_view);
        info!("[sync] reloaded from backend: version={}", write_view.version);
        Ok(write_view.version)
    }

    fn publish_locked(&self, write_view: &WriteView) {
        self.read_view.send_replace(Arc::new(StoreSnapshot {
            version: write_view.version,
            state: write_view.state.clone(),
        }));
    }
}

fn mutation_label(mutation: &Mutation) -> String {
    match mutation {
        Mutation::InsertPin(pin) => format!("insert pin {}", pin.id()),
        Mutation::DeletePin(id) => format!("delete pin {id}"),
        Mutation::DeletePinIfEmpty(id) => format!("delete pin {id} if empty"),
        Mutation::ClearPins => "clear pins".to_string(),
        Mutation::InsertPhoto(photo) => {
            format!("insert photo {} for pin {}", photo.id, photo.pin_id)
        }
        Mutation::RemovePhoto(id) => format!("remove photo {id}"),
        Mutation::EvictPhotos(id) => format!("evict photos of pin {id}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBackend;
    use tourist_model::{Coordinate, EntityKind, Photo, Pin};

    async fn open() -> (Arc<MemoryBackend>, SyncCoordinator) {
        let backend = Arc::new(MemoryBackend::new());
        let coordinator =
            SyncCoordinator::open(backend.clone(), Arc::new(EventBus::new(64)))
                .await
                .expect("open");
        (backend, coordinator)
    }

    fn pin() -> Pin {
        Pin::new(Coordinate::new(35.6762, 139.6503).unwrap())
    }

    #[tokio::test]
    async fn commit_publishes_new_snapshot_version() {
        let (backend, store) = open().await;
        let before = store.observe();
        let mut rx = store.subscribe();

        let pin = pin();
        let receipt =
            store.commit(Mutation::InsertPin(pin.clone())).await.unwrap();

        assert_eq!(receipt.version, 1);
        assert!(rx.has_changed().unwrap());
        assert_eq!(store.observe().version, 1);
        assert!(store.observe().pin(pin.id()).is_some());
        assert!(before.pin(pin.id()).is_none(), "old snapshots are immutable");
        assert_eq!(backend.persist_count(), 1);
    }

    #[tokio::test]
    async fn failed_persist_leaves_both_views_untouched() {
        let (backend, store) = open().await;
        let pin = pin();
        store.commit(Mutation::InsertPin(pin.clone())).await.unwrap();
        store
            .commit(Mutation::InsertPhoto(Photo::new(
                pin.id(),
                "Shibuya",
                "https://example.test/s.jpg",
                vec![1, 2, 3],
            )))
            .await
            .unwrap();

        backend.set_fail_persist(true);
        let err = store
            .commit(Mutation::EvictPhotos(pin.id()))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Save(_)));

        assert_eq!(store.observe().photos_for(pin.id()).count(), 1);
        assert_eq!(backend.durable_state().photos_for(pin.id()).count(), 1);

        backend.set_fail_persist(false);
        let receipt =
            store.commit(Mutation::EvictPhotos(pin.id())).await.unwrap();
        assert_eq!(receipt.changes.len(), 1);
        assert_eq!(receipt.changes[0].entity, EntityKind::Photo);
    }

    #[tokio::test]
    async fn empty_change_set_skips_persist() {
        let (backend, store) = open().await;
        let pin = pin();
        store.commit(Mutation::InsertPin(pin.clone())).await.unwrap();

        let receipt =
            store.commit(Mutation::EvictPhotos(pin.id())).await.unwrap();
        assert!(receipt.changes.is_empty());
        assert_eq!(receipt.version, 1);
        assert_eq!(backend.persist_count(), 1);
    }

    #[tokio::test]
    async fn reload_replaces_read_view_with_durable_state() {
        let backend = Arc::new(MemoryBackend::new());
        let bus = Arc::new(EventBus::new(8));
        let store = SyncCoordinator::open(backend.clone(), bus).await.unwrap();

        // Something else wrote to the durable store behind our back.
        let outside = pin();
        backend
            .persist(&StoreState::from_parts([outside.clone()], []))
            .await
            .unwrap();
        assert!(store.observe().pin(outside.id()).is_none());

        let version = store.reload_read_view().await.unwrap();
        assert_eq!(version, 1);
        assert!(store.observe().pin(outside.id()).is_some());
    }

    #[tokio::test]
    async fn commits_broadcast_store_changes() {
        let backend = Arc::new(MemoryBackend::new());
        let bus = Arc::new(EventBus::new(8));
        let mut events = bus.subscribe();
        let store = SyncCoordinator::open(backend, bus.clone()).await.unwrap();

        let pin = pin();
        store.commit(Mutation::InsertPin(pin.clone())).await.unwrap();

        match events.recv().await.unwrap() {
            TouristEvent::StoreChanged(change) => {
                assert_eq!(change.entity, EntityKind::Pin);
                assert_eq!(change.id, pin.id().to_uuid());
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}
