//! Potentials Library
//!
//! In-process index over a user's saved-track library.
//!
//! # Features
//!
//! - Exact lookup by track ID
//! - Song/album/artist lookup, pre-filtered by a prefix tree of composite keys
//! - Rebuild from a paginated track source
//! - JSON snapshot persistence with whole-library expiry
//! - Lazy refresh with at most one rebuild in flight

pub mod error;
pub mod index;
pub mod key;
pub mod prefix_tree;
pub mod service;
pub mod snapshot;
pub mod source;

mod types;

// Re-export main types
pub use error::{LibraryError, SnapshotError, SourceError};
pub use index::LibraryIndex;
pub use key::composite_key;
pub use prefix_tree::PrefixTree;
pub use service::{LibraryService, ServiceState, DEFAULT_SNAPSHOT_NAME};
pub use snapshot::{LibrarySnapshot, SnapshotStore};
pub use source::{ExportFileSource, MemorySource, Page, PageCursor, TrackSource};
pub use types::{LibraryTrack, TrackId};
