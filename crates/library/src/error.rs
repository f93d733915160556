//! Error types for the library crate.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors reported by a [`TrackSource`](crate::TrackSource).
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Source I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode source data: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid page cursor: {0}")]
    InvalidCursor(String),

    #[error("Source request failed: {0}")]
    Request(String),
}

/// Errors reading or writing a library snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("No snapshot at {}", .0.display())]
    NotFound(PathBuf),

    #[error("Snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode snapshot: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Snapshot expired at {0}")]
    Expired(DateTime<Utc>),
}

/// Errors surfaced by [`LibraryService`](crate::LibraryService) reads.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Library rebuild failed: {0}")]
    Source(#[from] SourceError),

    #[error("Library rebuild task failed: {0}")]
    RebuildTask(#[from] tokio::task::JoinError),
}
