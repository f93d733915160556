//! Composite search keys for song/album/artist lookup.

/// Build the search key `[name][album][artists...]` with the artists in
/// ascending order and no delimiter between fields.
///
/// Artist order on the service is not meaningful, so the same recording
/// fetched with a reordered artist list yields the same key. Fields are not
/// delimited, so `("AB", "C")` and `("A", "BC")` collide; callers must confirm
/// a key hit against the actual fields.
pub fn composite_key<S: AsRef<str>>(name: &str, album: &str, artists: &[S]) -> String {
    let mut sorted: Vec<&str> = artists.iter().map(AsRef::as_ref).collect();
    sorted.sort_unstable();

    let mut key = String::with_capacity(
        name.len() + album.len() + sorted.iter().map(|a| a.len()).sum::<usize>(),
    );
    key.push_str(name);
    key.push_str(album);
    for artist in sorted {
        key.push_str(artist);
    }
    key
}
