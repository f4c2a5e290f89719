/// Maps a free-text artist label to its lookup key: lowercase, then trim.
///
/// Total and idempotent. Two labels with the same key are the same artist.
pub fn normalize(name: &str) -> String {
  name.to_lowercase().trim().to_string()
}

/// `true` when both labels resolve to the same artist.
pub fn same_artist(a: &str, b: &str) -> bool {
  normalize(a) == normalize(b)
}
