use std::collections::BTreeMap;

use crate::domain::{Artist, ArtistKey, ChangeLog, Show, ShowId};

/// In-memory Artist and Show collections for one session, plus the change log.
///
/// Persistence lives in [`crate::services::catalog_service::CatalogService`];
/// this type only owns the data and the invariants that hold between them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityStore {
  pub(crate) artists: BTreeMap<ArtistKey, Artist>,
  pub(crate) shows: Vec<Show>,
  pub(crate) log: ChangeLog,
}

impl EntityStore {
  /// Builds a store from loose collections. Later artists with a repeated key
  /// are folded into the first one.
  pub fn new(artists: Vec<Artist>, shows: Vec<Show>, log: ChangeLog) -> Self {
    let mut by_key: BTreeMap<ArtistKey, Artist> = BTreeMap::new();
    for artist in artists {
      match by_key.get_mut(&artist.key) {
        Some(existing) => {
          tracing::warn!(key = %artist.key, "duplicate artist key, folding into first entry");
          existing.connection_count = existing.connection_count.max(artist.connection_count);
        }
        None => {
          by_key.insert(artist.key.clone(), artist);
        }
      }
    }

    let mut shows = shows;
    shows.sort_by_key(|s| s.id);
    Self { artists: by_key, shows, log }
  }

  pub fn get_artist(&self, key: &ArtistKey) -> Option<&Artist> {
    self.artists.get(key)
  }

  /// Lookup by any spelling of the name.
  pub fn find_artist(&self, name: &str) -> Option<&Artist> {
    self.artists.get(&ArtistKey::from_name(name))
  }

  pub fn contains_artist(&self, key: &ArtistKey) -> bool {
    self.artists.contains_key(key)
  }

  /// Artists ordered by key.
  pub fn all_artists(&self) -> impl Iterator<Item = &Artist> {
    self.artists.values()
  }

  pub fn artist_count(&self) -> usize {
    self.artists.len()
  }

  pub fn all_shows(&self) -> &[Show] {
    &self.shows
  }

  pub fn show(&self, id: ShowId) -> Option<&Show> {
    self.shows.binary_search_by_key(&id, |s| s.id).ok().map(|idx| &self.shows[idx])
  }

  pub(crate) fn show_mut(&mut self, id: ShowId) -> Option<&mut Show> {
    match self.shows.binary_search_by_key(&id, |s| s.id) {
      Ok(idx) => Some(&mut self.shows[idx]),
      Err(_) => None,
    }
  }

  /// Shows whose lineup mentions `key`.
  pub fn shows_with(&self, key: &ArtistKey) -> impl Iterator<Item = &Show> {
    self.shows.iter().filter(move |s| s.references(key))
  }

  /// Referenced names that do not resolve to any artist. Non-empty only
  /// between a Delete and the next full recomputation.
  pub fn dangling_references(&self) -> Vec<(ShowId, String)> {
    self
      .shows
      .iter()
      .flat_map(|show| show.artists.iter().map(move |name| (show.id, name)))
      .filter(|(_, name)| {
        let key = ArtistKey::from_name(name);
        !key.is_empty() && !self.artists.contains_key(&key)
      })
      .map(|(id, name)| (id, name.clone()))
      .collect()
  }

  pub fn change_log(&self) -> &ChangeLog {
    &self.log
  }

  pub(crate) fn insert_artist(&mut self, artist: Artist) -> Option<Artist> {
    self.artists.insert(artist.key.clone(), artist)
  }

  pub(crate) fn remove_artist(&mut self, key: &ArtistKey) -> Option<Artist> {
    self.artists.remove(key)
  }

  pub(crate) fn artist_mut(&mut self, key: &ArtistKey) -> Option<&mut Artist> {
    self.artists.get_mut(key)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn shows_are_kept_sorted_for_lookup() {
    let store = EntityStore::new(
      vec![],
      vec![Show::new(ShowId::new(2), "b"), Show::new(ShowId::new(0), "a"), Show::new(ShowId::new(5), "c")],
      ChangeLog::default(),
    );
    assert_eq!(store.show(ShowId::new(5)).map(|s| s.title.as_str()), Some("c"));
    assert!(store.show(ShowId::new(3)).is_none());
  }

  #[test]
  fn repeated_keys_fold_into_first() {
    let mut dup = Artist::new("ECHO");
    dup.connection_count = 4;
    let store = EntityStore::new(vec![Artist::new("Echo"), dup], vec![], ChangeLog::default());
    assert_eq!(store.artist_count(), 1);
    let echo = store.find_artist("echo").unwrap();
    assert_eq!(echo.display_name, "Echo");
    assert_eq!(echo.connection_count, 4);
  }

  #[test]
  fn dangling_references_are_reported() {
    let show = Show::new(ShowId::new(0), "x").with_artists(["Echo", "Ghost"]);
    let store = EntityStore::new(vec![Artist::new("Echo")], vec![show], ChangeLog::default());
    assert_eq!(store.dangling_references(), vec![(ShowId::new(0), "Ghost".to_string())]);
  }
}
