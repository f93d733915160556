//! Library service: keeps the index fresh and answers lookups.
//!
//! A read on a stale index first tries the on-disk snapshot, then drains the
//! track source. A successful drain is persisted as the new snapshot.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};

use crate::error::{LibraryError, SnapshotError, SourceError};
use crate::index::LibraryIndex;
use crate::snapshot::SnapshotStore;
use crate::source::{PageCursor, TrackSource};
use crate::types::{LibraryTrack, TrackId};

/// File name of the snapshot inside the cache directory.
pub const DEFAULT_SNAPSHOT_NAME: &str = "library.json";

/// Lifecycle of the service's index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// The index has expired or was never built.
    Stale,
    /// Loading the on-disk snapshot.
    RestoringFromSnapshot,
    /// Draining the track source.
    RebuildingFromSource,
    /// The index is within its lifetime.
    Fresh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Refresh {
    IfStale,
    FromSource,
}

struct Shared {
    source: Arc<dyn TrackSource>,
    snapshots: SnapshotStore,
    lifetime: Duration,
    index: RwLock<LibraryIndex>,
    // Some while a refresh is running.
    phase: Mutex<Option<ServiceState>>,
    rebuild_lock: tokio::sync::Mutex<()>,
}

/// Clears the refresh phase when dropped.
struct PhaseGuard<'a> {
    phase: &'a Mutex<Option<ServiceState>>,
}

impl<'a> PhaseGuard<'a> {
    fn new(phase: &'a Mutex<Option<ServiceState>>) -> Self {
        Self { phase }
    }

    fn set(&self, state: ServiceState) {
        *self.phase.lock() = Some(state);
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        *self.phase.lock() = None;
    }
}

impl Shared {
    async fn refresh(&self, mode: Refresh) -> Result<(), LibraryError> {
        let _rebuild = self.rebuild_lock.lock().await;

        // Whoever held the lock before us may already have refreshed.
        if mode == Refresh::IfStale && self.index.read().is_fresh() {
            return Ok(());
        }

        let phase = PhaseGuard::new(&self.phase);

        if mode == Refresh::IfStale {
            phase.set(ServiceState::RestoringFromSnapshot);
            if let Some(index) = self.restore().await {
                *self.index.write() = index;
                return Ok(());
            }
        }

        phase.set(ServiceState::RebuildingFromSource);
        let index = match self.drain_source().await {
            Ok(index) => index,
            Err(e) => {
                log::error!("Failed to rebuild library index: {}", e);
                return Err(e.into());
            }
        };
        let snapshot = index.to_snapshot();
        *self.index.write() = index;
        drop(phase);

        match self.snapshots.write(&snapshot).await {
            Ok(()) => log::info!("Saved library snapshot to {:?}", self.snapshots.path()),
            Err(e) => log::warn!(
                "Failed to save library snapshot to {:?}: {}",
                self.snapshots.path(),
                e
            ),
        }
        Ok(())
    }

    async fn restore(&self) -> Option<LibraryIndex> {
        match self.snapshots.read_unexpired(Utc::now()).await {
            Ok(snapshot) => {
                let index = LibraryIndex::from_snapshot(snapshot);
                log::info!(
                    "Restored library index of {} tracks from {:?}",
                    index.len(),
                    self.snapshots.path()
                );
                Some(index)
            }
            Err(SnapshotError::NotFound(path)) => {
                log::debug!("No library snapshot at {:?}", path);
                None
            }
            Err(e) => {
                log::info!("Ignoring library snapshot: {}", e);
                None
            }
        }
    }

    async fn drain_source(&self) -> Result<LibraryIndex, SourceError> {
        log::info!("Rebuilding library index...");
        let mut index = LibraryIndex::new();
        let mut cursor: Option<PageCursor> = None;

        loop {
            let page = self.source.fetch_page(cursor.as_ref()).await?;
            match page.total {
                Some(total) => log::info!("Built {}/{} tracks...", page.offset, total),
                None => log::info!("Built {} tracks...", index.len()),
            }
            for track in page.tracks {
                index.index_track(track);
            }
            match page.next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        index.mark_fresh(self.lifetime);
        log::info!("Successfully built library index of {} tracks.", index.len());
        Ok(index)
    }
}

/// Shared handle to a self-refreshing [`LibraryIndex`].
///
/// Cloning is cheap; clones share the same index. At most one refresh runs at
/// a time. A refresh runs on its own task, so a caller that stops waiting does
/// not cancel it.
#[derive(Clone)]
pub struct LibraryService {
    shared: Arc<Shared>,
}

impl LibraryService {
    /// Create a service with an empty, stale index.
    pub fn new(
        source: Arc<dyn TrackSource>,
        snapshots: SnapshotStore,
        lifetime: Duration,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                source,
                snapshots,
                lifetime,
                index: RwLock::new(LibraryIndex::new()),
                phase: Mutex::new(None),
                rebuild_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Create a service and bring its index up to date.
    pub async fn open(
        source: Arc<dyn TrackSource>,
        snapshots: SnapshotStore,
        lifetime: Duration,
    ) -> Result<Self, LibraryError> {
        let service = Self::new(source, snapshots, lifetime);
        service.ensure_ready().await?;
        Ok(service)
    }

    /// Refresh the index if it is stale.
    pub async fn ensure_ready(&self) -> Result<(), LibraryError> {
        if self.shared.index.read().is_fresh() {
            return Ok(());
        }
        self.spawn_refresh(Refresh::IfStale).await
    }

    /// Drain the source and replace the index, ignoring both the current
    /// index and the snapshot.
    pub async fn rebuild_from_source(&self) -> Result<(), LibraryError> {
        self.spawn_refresh(Refresh::FromSource).await
    }

    async fn spawn_refresh(&self, mode: Refresh) -> Result<(), LibraryError> {
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move { shared.refresh(mode).await }).await?
    }

    /// Look up a saved track by ID, refreshing the index first if stale.
    pub async fn get_by_id(&self, id: &TrackId) -> Result<Option<LibraryTrack>, LibraryError> {
        self.ensure_ready().await?;
        Ok(self.shared.index.read().get(id).cloned())
    }

    /// All saved tracks with the same song name, album name and set of
    /// artists, refreshing the index first if stale.
    pub async fn find_matching<S: AsRef<str>>(
        &self,
        name: &str,
        album: &str,
        artists: &[S],
    ) -> Result<Vec<LibraryTrack>, LibraryError> {
        self.ensure_ready().await?;
        Ok(self
            .shared
            .index
            .read()
            .find_matching(name, album, artists)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn state(&self) -> ServiceState {
        if let Some(phase) = *self.shared.phase.lock() {
            return phase;
        }
        if self.shared.index.read().is_fresh() {
            ServiceState::Fresh
        } else {
            ServiceState::Stale
        }
    }

    /// Number of tracks currently indexed. Never refreshes.
    pub fn track_count(&self) -> usize {
        self.shared.index.read().len()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.shared.index.read().expires_at()
    }

    /// Composite keys held by the index's search tree.
    pub fn dump_tree(&self) -> HashSet<String> {
        self.shared.index.read().dump_tree()
    }
}
