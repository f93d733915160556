//! In-memory index over the saved-track library.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::key::composite_key;
use crate::prefix_tree::PrefixTree;
use crate::snapshot::LibrarySnapshot;
use crate::types::{LibraryTrack, TrackId};

/// Cache of every track in the library.
///
/// Freshness is a property of the whole index: once `expires_at` passes the
/// index must be rebuilt from scratch. There is no per-track eviction.
#[derive(Debug, Clone)]
pub struct LibraryIndex {
    tracks_by_id: HashMap<TrackId, LibraryTrack>,
    // Append-only. Overwritten tracks leave their old key behind.
    search_tree: PrefixTree,
    expires_at: DateTime<Utc>,
}

impl Default for LibraryIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl LibraryIndex {
    /// Create an empty, stale index.
    pub fn new() -> Self {
        Self {
            tracks_by_id: HashMap::new(),
            search_tree: PrefixTree::new(),
            expires_at: DateTime::<Utc>::MIN_UTC,
        }
    }

    /// Restore an index from a snapshot. The index expires when the snapshot
    /// does.
    pub fn from_snapshot(snapshot: LibrarySnapshot) -> Self {
        let mut index = Self::new();
        for track in snapshot.tracks {
            index.index_track(track);
        }
        index.expires_at = snapshot.expiration;
        index
    }

    /// Persisted form of this index.
    pub fn to_snapshot(&self) -> LibrarySnapshot {
        let mut tracks: Vec<LibraryTrack> = self.tracks_by_id.values().cloned().collect();
        tracks.sort_by(|a, b| a.id.cmp(&b.id));
        LibrarySnapshot {
            expiration: self.expires_at,
            tracks,
        }
    }

    /// Insert or replace a track under its ID and add its composite key to
    /// the search tree.
    pub fn index_track(&mut self, track: LibraryTrack) {
        self.search_tree
            .insert(&composite_key(&track.name, &track.album, &track.artists));
        self.tracks_by_id.insert(track.id.clone(), track);
    }

    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Utc::now())
    }

    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Start a new freshness window of `lifetime` from now.
    pub fn mark_fresh(&mut self, lifetime: Duration) {
        self.mark_fresh_at(Utc::now(), lifetime);
    }

    pub fn mark_fresh_at(&mut self, now: DateTime<Utc>, lifetime: Duration) {
        self.expires_at = TimeDelta::from_std(lifetime)
            .ok()
            .and_then(|delta| now.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Look up a track by ID.
    pub fn get(&self, id: &TrackId) -> Option<&LibraryTrack> {
        self.tracks_by_id.get(id)
    }

    /// All tracks with exactly this song name, album name and set of artists.
    ///
    /// The search tree rejects keys that were never indexed without touching
    /// the tracks. A tree hit only means a matching key may exist, so every
    /// track is then compared field by field.
    pub fn find_matching<S: AsRef<str>>(
        &self,
        name: &str,
        album: &str,
        artists: &[S],
    ) -> Vec<&LibraryTrack> {
        if !self.search_tree.contains(&composite_key(name, album, artists)) {
            return Vec::new();
        }

        let wanted: HashSet<&str> = artists.iter().map(AsRef::as_ref).collect();
        self.tracks_by_id
            .values()
            .filter(|t| t.name == name && t.album == album)
            .filter(|t| t.artists.iter().map(String::as_str).collect::<HashSet<_>>() == wanted)
            .collect()
    }

    /// Iterate over all indexed tracks.
    pub fn tracks(&self) -> impl Iterator<Item = &LibraryTrack> {
        self.tracks_by_id.values()
    }

    pub fn len(&self) -> usize {
        self.tracks_by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks_by_id.is_empty()
    }

    /// Every composite key path stored in the search tree.
    pub fn dump_tree(&self) -> HashSet<String> {
        self.search_tree.words()
    }

    pub fn search_tree(&self) -> &PrefixTree {
        &self.search_tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str, name: &str, album: &str, artists: &[&str]) -> LibraryTrack {
        LibraryTrack::new(
            id,
            name,
            album,
            artists.iter().map(|a| a.to_string()).collect(),
        )
    }

    fn ids(tracks: &[&LibraryTrack]) -> Vec<String> {
        let mut ids: Vec<String> = tracks.iter().map(|t| t.id.to_string()).collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_new_index_is_empty_and_stale() {
        let index = LibraryIndex::new();
        assert!(index.is_empty());
        assert!(!index.is_fresh());
        assert!(index.get(&TrackId::from("1")).is_none());
        assert!(index.find_matching("a", "b", &["c"]).is_empty());
    }

    #[test]
    fn test_get_after_index() {
        let mut index = LibraryIndex::new();
        let t = track("1", "Song A", "X", &["Bob"]);
        index.index_track(t.clone());
        assert_eq!(index.get(&TrackId::from("1")), Some(&t));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_overwrite_keeps_old_key_in_tree() {
        let mut index = LibraryIndex::new();
        index.index_track(track("1", "Old", "Album", &["Ann"]));
        let replacement = track("1", "New", "Album", &["Ann"]);
        index.index_track(replacement.clone());

        assert_eq!(index.get(&TrackId::from("1")), Some(&replacement));
        assert_eq!(index.len(), 1);
        assert!(index.search_tree().contains("OldAlbumAnn"));
        assert!(index.search_tree().contains("NewAlbumAnn"));
        // the old key still passes the tree but no track matches it
        assert!(index.find_matching("Old", "Album", &["Ann"]).is_empty());
    }

    #[test]
    fn test_find_matching_ignores_artist_order() {
        let mut index = LibraryIndex::new();
        index.index_track(track("1", "Song A", "X", &["Bob", "Ann"]));
        index.index_track(track("2", "Song A", "X", &["Ann", "Bob"]));
        index.index_track(track("3", "Song A", "Y", &["Ann", "Bob"]));

        let matches = index.find_matching("Song A", "X", &["Bob", "Ann"]);
        assert_eq!(ids(&matches), vec!["1", "2"]);
    }

    #[test]
    fn test_find_matching_rejects_unknown_key() {
        let mut index = LibraryIndex::new();
        index.index_track(track("1", "Song A", "X", &["Bob"]));
        assert!(index.find_matching("Song B", "X", &["Bob"]).is_empty());
        assert!(index.find_matching("Song A", "X", &["Bobby"]).is_empty());
    }

    #[test]
    fn test_find_matching_field_collision_is_not_a_match() {
        let mut index = LibraryIndex::new();
        index.index_track(track("1", "AB", "C", &["D"]));

        // "A" + "BC" + "D" is in the tree but the fields differ
        assert!(index.search_tree().contains(&composite_key("A", "BC", &["D"])));
        assert!(index.find_matching("A", "BC", &["D"]).is_empty());
        assert_eq!(ids(&index.find_matching("AB", "C", &["D"])), vec!["1"]);
    }

    #[test]
    fn test_find_matching_prefix_of_key_is_not_a_match() {
        let mut index = LibraryIndex::new();
        index.index_track(track("1", "Song", "Album", &["Ann", "Bob"]));
        // "SongAlbumAnn" is a prefix path of the stored key
        assert!(index.find_matching("Song", "Album", &["Ann"]).is_empty());
    }

    #[test]
    fn test_repeated_artist_is_part_of_key() {
        let mut index = LibraryIndex::new();
        index.index_track(track("1", "S", "A", &["Ann", "Ann", "Bob"]));

        // "SAAnnBob" never reaches the scan, the tree only holds "SAAnnAnnBob"
        assert!(index.find_matching("S", "A", &["Ann", "Bob"]).is_empty());
        assert_eq!(
            ids(&index.find_matching("S", "A", &["Bob", "Ann", "Ann"])),
            vec!["1"]
        );
    }

    #[test]
    fn test_find_matching_is_case_sensitive() {
        let mut index = LibraryIndex::new();
        index.index_track(track("1", "Song", "Album", &["Ann"]));
        assert!(index.find_matching("song", "Album", &["Ann"]).is_empty());
    }

    #[test]
    fn test_freshness_window() {
        let mut index = LibraryIndex::new();
        let now = Utc::now();
        index.mark_fresh_at(now, Duration::from_secs(60));

        assert!(index.is_fresh_at(now));
        assert!(index.is_fresh_at(now + TimeDelta::seconds(59)));
        assert!(!index.is_fresh_at(now + TimeDelta::seconds(60)));
        assert!(!index.is_fresh_at(now + TimeDelta::hours(1)));
    }

    #[test]
    fn test_zero_lifetime_is_immediately_stale() {
        let mut index = LibraryIndex::new();
        index.mark_fresh(Duration::ZERO);
        assert!(!index.is_fresh());
    }

    #[test]
    fn test_huge_lifetime_saturates() {
        let mut index = LibraryIndex::new();
        index.mark_fresh(Duration::MAX);
        assert_eq!(index.expires_at(), DateTime::<Utc>::MAX_UTC);
        assert!(index.is_fresh());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut index = LibraryIndex::new();
        for i in 0..20 {
            index.index_track(track(
                &i.to_string(),
                &format!("Song {}", i),
                "Album",
                &["Ann", "Bob"],
            ));
        }
        index.mark_fresh(Duration::from_secs(3600));

        let restored = LibraryIndex::from_snapshot(index.to_snapshot());
        assert_eq!(restored.len(), 20);
        assert_eq!(restored.expires_at(), index.expires_at());
        assert!(restored.is_fresh());
        for t in index.tracks() {
            assert_eq!(restored.get(&t.id), Some(t));
        }
        assert_eq!(restored.dump_tree(), index.dump_tree());
    }
}
