//! Paginated track sources the index is rebuilt from.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::SourceError;
use crate::types::LibraryTrack;

/// Opaque position of the next page in a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor(pub String);

impl fmt::Display for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One page of saved tracks.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub tracks: Vec<LibraryTrack>,
    /// Cursor for the following page, `None` once the source is drained.
    pub next: Option<PageCursor>,
    /// Offset of the first track of this page.
    pub offset: usize,
    /// Total number of tracks in the source, if known.
    pub total: Option<usize>,
}

/// A paginated listing of the user's saved tracks.
#[async_trait]
pub trait TrackSource: Send + Sync {
    /// Fetch the page at `cursor`, or the first page when `cursor` is `None`.
    async fn fetch_page(&self, cursor: Option<&PageCursor>) -> Result<Page, SourceError>;
}

fn parse_offset(cursor: Option<&PageCursor>) -> Result<usize, SourceError> {
    match cursor {
        None => Ok(0),
        Some(c) => c
            .0
            .parse()
            .map_err(|_| SourceError::InvalidCursor(c.0.clone())),
    }
}

fn slice_page(
    tracks: &[LibraryTrack],
    cursor: Option<&PageCursor>,
    page_size: usize,
) -> Result<Page, SourceError> {
    let offset = parse_offset(cursor)?;
    if offset > tracks.len() {
        return Err(SourceError::InvalidCursor(offset.to_string()));
    }
    let end = (offset + page_size).min(tracks.len());
    let next = (end < tracks.len()).then(|| PageCursor(end.to_string()));

    Ok(Page {
        tracks: tracks[offset..end].to_vec(),
        next,
        offset,
        total: Some(tracks.len()),
    })
}

/// Serves a fixed list of tracks in pages.
#[derive(Debug, Clone)]
pub struct MemorySource {
    tracks: Vec<LibraryTrack>,
    page_size: usize,
}

impl MemorySource {
    pub fn new(tracks: Vec<LibraryTrack>, page_size: usize) -> Self {
        Self {
            tracks,
            page_size: page_size.max(1),
        }
    }
}

#[async_trait]
impl TrackSource for MemorySource {
    async fn fetch_page(&self, cursor: Option<&PageCursor>) -> Result<Page, SourceError> {
        slice_page(&self.tracks, cursor, self.page_size)
    }
}

/// Serves a JSON export of the library (an array of tracks) in pages.
///
/// The file is read and parsed when a drain starts (a fetch without a
/// cursor). Later pages of that drain are cut from the parsed copy, so every
/// page of one drain comes from the same export.
#[derive(Debug)]
pub struct ExportFileSource {
    path: PathBuf,
    page_size: usize,
    parsed: Mutex<Option<Arc<Vec<LibraryTrack>>>>,
}

impl ExportFileSource {
    pub fn new<P: AsRef<Path>>(path: P, page_size: usize) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            page_size: page_size.max(1),
            parsed: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Arc<Vec<LibraryTrack>>, SourceError> {
        let bytes = tokio::fs::read(&self.path).await?;
        let tracks: Arc<Vec<LibraryTrack>> = Arc::new(serde_json::from_slice(&bytes)?);
        *self.parsed.lock() = Some(tracks.clone());
        Ok(tracks)
    }
}

#[async_trait]
impl TrackSource for ExportFileSource {
    async fn fetch_page(&self, cursor: Option<&PageCursor>) -> Result<Page, SourceError> {
        let cached = match cursor {
            None => None,
            Some(_) => self.parsed.lock().clone(),
        };
        let tracks = match cached {
            Some(tracks) => tracks,
            None => self.load().await?,
        };
        slice_page(&tracks, cursor, self.page_size)
    }
}
