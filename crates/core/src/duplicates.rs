//! Finds candidate tracks that are already in the saved library.

use potentials_library::{LibraryError, LibraryService, LibraryTrack};

use crate::config::DuplicatesConfig;

/// How a candidate was matched against the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// The library holds the same track ID.
    Id,
    /// The library holds a track with the same song, album and artists.
    Attributes,
}

/// A candidate track that already exists in the library.
#[derive(Debug, Clone)]
pub struct Duplicate {
    pub candidate: LibraryTrack,
    pub kind: MatchKind,
    /// Library tracks the candidate matched.
    pub matches: Vec<LibraryTrack>,
}

/// Checks candidate tracks against a [`LibraryService`].
pub struct DuplicateFinder {
    library: LibraryService,
    config: DuplicatesConfig,
}

impl DuplicateFinder {
    pub fn new(library: LibraryService, config: DuplicatesConfig) -> Self {
        Self { library, config }
    }

    /// Every candidate already present in the library, in candidate order.
    ///
    /// An ID match always counts. Attribute matching is only tried when the
    /// finder is aggressive.
    pub async fn find(
        &self,
        candidates: &[LibraryTrack],
    ) -> Result<Vec<Duplicate>, LibraryError> {
        let mut duplicates = Vec::new();

        for candidate in candidates {
            if let Some(saved) = self.library.get_by_id(&candidate.id).await? {
                duplicates.push(Duplicate {
                    candidate: candidate.clone(),
                    kind: MatchKind::Id,
                    matches: vec![saved],
                });
                continue;
            }

            if self.config.aggressive {
                let matches = self
                    .library
                    .find_matching(&candidate.name, &candidate.album, &candidate.artists)
                    .await?;
                if !matches.is_empty() {
                    duplicates.push(Duplicate {
                        candidate: candidate.clone(),
                        kind: MatchKind::Attributes,
                        matches,
                    });
                }
            }
        }

        log::debug!(
            "Found {} duplicates among {} candidates",
            duplicates.len(),
            candidates.len()
        );
        Ok(duplicates)
    }
}

/// Human-readable summary: `name, artists, on album, Track ID: id`.
pub fn describe_track(track: &LibraryTrack) -> String {
    format!(
        "{}, {}, on {}, Track ID: {}",
        track.name,
        track.artist_line(),
        track.album,
        track.id
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use potentials_library::{MemorySource, SnapshotStore, DEFAULT_SNAPSHOT_NAME};
    use tempfile::TempDir;

    use super::*;

    fn track(id: &str, name: &str, album: &str, artists: &[&str]) -> LibraryTrack {
        LibraryTrack::new(
            id,
            name,
            album,
            artists.iter().map(|a| a.to_string()).collect(),
        )
    }

    fn library(temp_dir: &TempDir) -> LibraryService {
        let saved = vec![
            track("1", "Song A", "X", &["Bob", "Ann"]),
            track("2", "Song B", "Y", &["Cee"]),
        ];
        LibraryService::new(
            Arc::new(MemorySource::new(saved, 1)),
            SnapshotStore::new(temp_dir.path(), DEFAULT_SNAPSHOT_NAME),
            Duration::from_secs(60),
        )
    }

    fn candidates() -> Vec<LibraryTrack> {
        vec![
            track("1", "Song A", "X", &["Bob", "Ann"]),
            // re-release of "1" under a new ID, artists reordered
            track("7", "Song A", "X", &["Ann", "Bob"]),
            track("8", "Song C", "Z", &["Dee"]),
        ]
    }

    #[tokio::test]
    async fn test_id_only_when_not_aggressive() {
        let temp_dir = TempDir::new().unwrap();
        let finder = DuplicateFinder::new(library(&temp_dir), DuplicatesConfig::default());

        let duplicates = finder.find(&candidates()).await.unwrap();
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].candidate.id.as_str(), "1");
        assert_eq!(duplicates[0].kind, MatchKind::Id);
    }

    #[tokio::test]
    async fn test_aggressive_matches_attributes() {
        let temp_dir = TempDir::new().unwrap();
        let finder =
            DuplicateFinder::new(library(&temp_dir), DuplicatesConfig { aggressive: true });

        let duplicates = finder.find(&candidates()).await.unwrap();
        assert_eq!(duplicates.len(), 2);
        assert_eq!(duplicates[1].candidate.id.as_str(), "7");
        assert_eq!(duplicates[1].kind, MatchKind::Attributes);
        assert_eq!(duplicates[1].matches[0].id.as_str(), "1");
    }

    #[test]
    fn test_describe_track() {
        let t = track("1", "Song A", "X", &["Bob", "Ann"]);
        assert_eq!(describe_track(&t), "Song A, Bob, Ann, on X, Track ID: 1");
    }
}
