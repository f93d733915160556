//! On-disk JSON snapshot of the library index.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;
use crate::types::LibraryTrack;

/// Persisted form of a [`LibraryIndex`](crate::LibraryIndex).
///
/// The prefix tree is not stored; it is rebuilt from `tracks` on restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibrarySnapshot {
    /// Instant after which the snapshot must not be used.
    pub expiration: DateTime<Utc>,
    /// Every indexed track.
    pub tracks: Vec<LibraryTrack>,
}

impl LibrarySnapshot {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiration
    }
}

/// Reads and writes a single snapshot file.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Store at `<dir>/<file_name>`.
    pub fn new<P: AsRef<Path>>(dir: P, file_name: &str) -> Self {
        Self {
            path: dir.as_ref().join(file_name),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and decode the snapshot.
    pub async fn read(&self) -> Result<LibrarySnapshot, SnapshotError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SnapshotError::NotFound(self.path.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Read the snapshot, rejecting it if it has expired at `now`.
    pub async fn read_unexpired(
        &self,
        now: DateTime<Utc>,
    ) -> Result<LibrarySnapshot, SnapshotError> {
        let snapshot = self.read().await?;
        if snapshot.is_expired_at(now) {
            return Err(SnapshotError::Expired(snapshot.expiration));
        }
        Ok(snapshot)
    }

    /// Write the snapshot, creating the containing directory if needed.
    ///
    /// The file is written next to its final path and renamed into place so a
    /// crash mid-write never leaves a truncated snapshot behind.
    pub async fn write(&self, snapshot: &LibrarySnapshot) -> Result<(), SnapshotError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let content = serde_json::to_vec_pretty(snapshot)?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, content).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}
