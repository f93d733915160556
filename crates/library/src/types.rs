//! Core library types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable identifier of a track on the streaming service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub String);

impl TrackId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TrackId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TrackId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A saved track in the user's library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryTrack {
    /// Service track ID.
    pub id: TrackId,
    /// Song name.
    pub name: String,
    /// Album name.
    pub album: String,
    /// Artist names, in the order the service returned them.
    #[serde(default)]
    pub artists: Vec<String>,
    /// When the track was saved to the library.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
}

impl LibraryTrack {
    /// Create a new track with required fields.
    pub fn new(
        id: impl Into<TrackId>,
        name: impl Into<String>,
        album: impl Into<String>,
        artists: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            album: album.into(),
            artists,
            added_at: None,
        }
    }

    /// Artist names joined for display.
    pub fn artist_line(&self) -> String {
        self.artists.join(", ")
    }
}
