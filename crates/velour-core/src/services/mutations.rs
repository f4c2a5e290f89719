use crate::domain::{Artist, ArtistKey, Mutation, ShowId};
use crate::errors::ValidationError;
use crate::services::entity_store::EntityStore;
use crate::services::propagation::propagate_identity;

/// Change to a single show's lineup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShowArtistChange {
  Add(String),
  Remove(String),
}

/// An operator action. Each command is validated in full before the store
/// is touched, so a rejected command leaves no trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
  /// Rename an artist. `key`, when given, must be the normalized form of
  /// `display_name`.
  Edit { artist: ArtistKey, display_name: String, key: Option<String> },
  /// `target` survives and absorbs `source`; `source` is removed.
  Merge { source: ArtistKey, target: ArtistKey },
  /// Stage new identities carrying a full copy of `source`'s stats.
  Split { source: ArtistKey, names: Vec<String> },
  Delete { artist: ArtistKey },
  EditShow { show: ShowId, change: ShowArtistChange },
}

impl EntityStore {
  /// Applies one command in memory: entity updates plus cross-reference
  /// propagation. Recomputation, logging and flushing are the caller's job.
  pub fn apply(&mut self, command: Command) -> Result<Mutation, ValidationError> {
    let mutation = match command {
      Command::Edit { artist, display_name, key } => self.apply_edit(&artist, &display_name, key.as_deref()),
      Command::Merge { source, target } => self.apply_merge(&source, &target),
      Command::Split { source, names } => self.apply_split(&source, &names),
      Command::Delete { artist } => self.apply_delete(&artist),
      Command::EditShow { show, change } => self.apply_show_edit(show, change),
    }?;
    self.release_staged(&mutation);
    Ok(mutation)
  }

  /// A staged artist goes back to tracking its shows once a later change
  /// names it: renamed, merged into, or added to or removed from a show.
  fn release_staged(&mut self, mutation: &Mutation) {
    let keys: Vec<ArtistKey> = match mutation {
      Mutation::Edit { updated, .. } => vec![updated.key.clone()],
      Mutation::Merge { target, .. } => vec![target.key.clone()],
      Mutation::ShowEdit { original, updated, .. } => {
        let before = original.referenced_keys();
        let after = updated.referenced_keys();
        let added = after.iter().filter(|k| !before.contains(k));
        let removed = before.iter().filter(|k| !after.contains(k));
        added.chain(removed).cloned().collect()
      }
      Mutation::Split { .. } | Mutation::Delete { .. } => Vec::new(),
    };

    for key in keys {
      if let Some(artist) = self.artist_mut(&key).filter(|a| a.staged) {
        artist.staged = false;
        tracing::debug!(artist = %key, "staged artist released");
      }
    }
  }

  fn apply_edit(
    &mut self,
    key: &ArtistKey,
    display_name: &str,
    new_key: Option<&str>,
  ) -> Result<Mutation, ValidationError> {
    let name = display_name.trim();
    if name.is_empty() {
      return Err(ValidationError::EmptyName);
    }
    if !self.contains_artist(key) {
      return Err(ValidationError::SourceNotFound(key.clone()));
    }

    let derived = ArtistKey::from_name(name);
    if let Some(requested) = new_key {
      if ArtistKey::from_name(requested) != derived {
        return Err(ValidationError::KeyMismatch { key: requested.to_string(), display_name: name.to_string() });
      }
    }
    if &derived != key && self.contains_artist(&derived) {
      return Err(ValidationError::DuplicateName(derived));
    }

    let Some(original) = self.remove_artist(key) else {
      return Err(ValidationError::SourceNotFound(key.clone()));
    };
    let mut updated = original.clone();
    updated.display_name = name.to_string();
    updated.key = derived;
    self.insert_artist(updated.clone());

    let p = propagate_identity(&mut self.shows, key, name);
    tracing::debug!(from = %key, to = %updated.key, shows = p.shows_touched, "rename propagated");

    Ok(Mutation::Edit { original, updated })
  }

  fn apply_merge(&mut self, source: &ArtistKey, target: &ArtistKey) -> Result<Mutation, ValidationError> {
    if source == target {
      return Err(ValidationError::SameEntity(source.clone()));
    }
    if !self.contains_artist(source) {
      return Err(ValidationError::SourceNotFound(source.clone()));
    }
    if !self.contains_artist(target) {
      return Err(ValidationError::TargetNotFound(target.clone()));
    }

    let Some(absorbed) = self.remove_artist(source) else {
      return Err(ValidationError::SourceNotFound(source.clone()));
    };
    let Some(survivor) = self.artist_mut(target) else {
      return Err(ValidationError::TargetNotFound(target.clone()));
    };
    let target_before = survivor.clone();
    survivor.stats.absorb(&absorbed.stats);
    // Placeholder until the graph is rebuilt: not a recount.
    survivor.connection_count = survivor.connection_count.max(absorbed.connection_count);
    let merged = survivor.clone();

    let p = propagate_identity(&mut self.shows, source, &merged.display_name);
    tracing::debug!(
      source = %source,
      target = %target,
      shows = p.shows_touched,
      collapsed = p.duplicates_collapsed,
      "merge propagated"
    );

    Ok(Mutation::Merge { source: absorbed, target_before, target: merged })
  }

  fn apply_split(&mut self, source: &ArtistKey, names: &[String]) -> Result<Mutation, ValidationError> {
    let Some(original) = self.get_artist(source).cloned() else {
      return Err(ValidationError::SourceNotFound(source.clone()));
    };

    let mut wanted: Vec<(ArtistKey, &str)> = Vec::new();
    let mut named_source = false;
    for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
      let key = ArtistKey::from_name(name);
      if &key == source {
        tracing::warn!(source = %source, "split target names the source itself, skipped");
        named_source = true;
        continue;
      }
      if !wanted.iter().any(|(k, _)| k == &key) {
        wanted.push((key, name));
      }
    }
    if wanted.is_empty() {
      return Err(if named_source { ValidationError::SameEntity(source.clone()) } else { ValidationError::EmptyName });
    }

    let mut created = Vec::new();
    let mut absorbed = Vec::new();
    for (key, name) in wanted {
      match self.artist_mut(&key) {
        Some(existing) => {
          let before = existing.clone();
          existing.stats.absorb(&original.stats);
          existing.staged = true;
          absorbed.push((before, existing.clone()));
        }
        None => {
          let mut artist = Artist::new(name).with_stats(original.stats.clone());
          artist.staged = true;
          created.push(artist.clone());
          self.insert_artist(artist);
        }
      }
    }

    tracing::warn!(
      source = %source,
      created = created.len(),
      absorbed = absorbed.len(),
      "split copies stats only; shows still reference the source and must be reassigned by hand"
    );

    Ok(Mutation::Split { source: original, created, absorbed })
  }

  fn apply_delete(&mut self, key: &ArtistKey) -> Result<Mutation, ValidationError> {
    let Some(artist) = self.remove_artist(key) else {
      return Err(ValidationError::SourceNotFound(key.clone()));
    };
    let still_referenced = self.shows_with(key).count();
    if still_referenced > 0 {
      tracing::info!(key = %key, shows = still_referenced, "deleted artist is still referenced by shows");
    }
    Ok(Mutation::Delete { artist })
  }

  fn apply_show_edit(&mut self, id: ShowId, change: ShowArtistChange) -> Result<Mutation, ValidationError> {
    let Some(show) = self.show(id) else {
      return Err(ValidationError::ShowNotFound(id));
    };
    let original = show.clone();

    match change {
      ShowArtistChange::Add(name) => {
        let name = name.trim();
        if name.is_empty() {
          return Err(ValidationError::EmptyName);
        }
        let key = ArtistKey::from_name(name);
        if original.references(&key) {
          return Err(ValidationError::DuplicateName(key));
        }

        // A name that collides with a registered artist resolves to it.
        let (reference, staged) = match self.get_artist(&key) {
          Some(existing) => (existing.display_name.clone(), None),
          None => {
            let artist = Artist::new(name);
            self.insert_artist(artist.clone());
            (artist.display_name.clone(), Some(artist))
          }
        };

        let Some(show) = self.show_mut(id) else {
          return Err(ValidationError::ShowNotFound(id));
        };
        show.artists.push(reference);
        let updated = show.clone();
        Ok(Mutation::ShowEdit { show_id: id, original, updated, staged })
      }
      ShowArtistChange::Remove(name) => {
        let key = ArtistKey::from_name(&name);
        if key.is_empty() {
          return Err(ValidationError::EmptyName);
        }
        if !original.references(&key) {
          return Err(ValidationError::NotReferenced { show: id, key });
        }

        let Some(show) = self.show_mut(id) else {
          return Err(ValidationError::ShowNotFound(id));
        };
        show.artists.retain(|n| !key.matches(n));
        let updated = show.clone();
        Ok(Mutation::ShowEdit { show_id: id, original, updated, staged: None })
      }
    }
  }

  /// Replaces the after-state artists in `mutation` with their current
  /// version, so the log records what the registry holds after recomputation.
  pub(crate) fn refresh_after_state(&self, mutation: &mut Mutation) {
    let current = |artist: &mut Artist| {
      if let Some(now) = self.get_artist(&artist.key) {
        *artist = now.clone();
      }
    };
    match mutation {
      Mutation::Edit { updated, .. } => current(updated),
      Mutation::Merge { target, .. } => current(target),
      Mutation::Split { created, absorbed, .. } => {
        created.iter_mut().for_each(current);
        absorbed.iter_mut().for_each(|(_, after)| current(after));
      }
      Mutation::Delete { .. } => {}
      Mutation::ShowEdit { staged, .. } => {
        if let Some(artist) = staged {
          current(artist);
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{ChangeLog, Show};

  fn key(name: &str) -> ArtistKey {
    ArtistKey::from_name(name)
  }

  fn store() -> EntityStore {
    let shows = vec![
      Show::new(ShowId::new(0), "a").with_year(2019).with_artists(["Neon trees", "Echo"]),
      Show::new(ShowId::new(1), "b").with_year(2020).with_artists(["Echo", "Shake"]),
    ];
    let mut store =
      EntityStore::new(vec![Artist::new("neon trees"), Artist::new("Echo"), Artist::new("Shake")], shows, ChangeLog::default());
    store.recompute_stats(crate::services::recompute::RecomputeScope::Full);
    store
  }

  #[test]
  fn edit_rejects_empty_name_without_mutating() {
    let mut s = store();
    let before = s.clone();
    let err = s
      .apply(Command::Edit { artist: key("echo"), display_name: "  ".into(), key: None })
      .unwrap_err();
    assert_eq!(err, ValidationError::EmptyName);
    assert_eq!(s, before);
  }

  #[test]
  fn edit_renames_and_propagates() {
    let mut s = store();
    let m = s
      .apply(Command::Edit { artist: key("neon trees"), display_name: "Neon Trees".into(), key: None })
      .unwrap();
    assert!(matches!(m, Mutation::Edit { .. }));
    assert_eq!(s.find_artist("neon trees").unwrap().display_name, "Neon Trees");
    assert_eq!(s.show(ShowId::new(0)).unwrap().artists[0], "Neon Trees");
  }

  #[test]
  fn edit_to_existing_key_is_a_duplicate() {
    let mut s = store();
    let err = s
      .apply(Command::Edit { artist: key("echo"), display_name: "SHAKE".into(), key: None })
      .unwrap_err();
    assert_eq!(err, ValidationError::DuplicateName(key("shake")));
  }

  #[test]
  fn edit_key_must_match_display_name() {
    let mut s = store();
    let err = s
      .apply(Command::Edit { artist: key("echo"), display_name: "Echo Echo".into(), key: Some("echo".into()) })
      .unwrap_err();
    assert!(matches!(err, ValidationError::KeyMismatch { .. }));
  }

  #[test]
  fn merge_preconditions() {
    let mut s = store();
    assert_eq!(
      s.apply(Command::Merge { source: key("echo"), target: key("echo") }).unwrap_err(),
      ValidationError::SameEntity(key("echo"))
    );
    assert_eq!(
      s.apply(Command::Merge { source: key("nobody"), target: key("echo") }).unwrap_err(),
      ValidationError::SourceNotFound(key("nobody"))
    );
    assert_eq!(
      s.apply(Command::Merge { source: key("echo"), target: key("nobody") }).unwrap_err(),
      ValidationError::TargetNotFound(key("nobody"))
    );
  }

  #[test]
  fn merge_keeps_target_and_max_connections() {
    let mut s = store();
    s.artist_mut(&key("echo")).unwrap().connection_count = 7;
    s.artist_mut(&key("shake")).unwrap().connection_count = 3;

    s.apply(Command::Merge { source: key("echo"), target: key("shake") }).unwrap();

    assert!(s.get_artist(&key("echo")).is_none());
    let shake = s.get_artist(&key("shake")).unwrap();
    assert_eq!(shake.connection_count, 7);
    assert_eq!(shake.total_shows(), 3);
    assert_eq!(s.show(ShowId::new(1)).unwrap().artists, vec!["Shake"]);
    assert!(s.shows_with(&key("echo")).next().is_none());
  }

  #[test]
  fn split_stages_copies_and_merges_into_existing() {
    let mut s = store();
    let m = s
      .apply(Command::Split { source: key("echo"), names: vec!["Echo One".into(), " ".into(), "shake".into()] })
      .unwrap();

    let Mutation::Split { created, absorbed, .. } = m else { panic!("expected split") };
    assert_eq!(created.len(), 1);
    assert_eq!(absorbed.len(), 1);

    let echo_one = s.find_artist("echo one").unwrap();
    assert!(echo_one.staged);
    assert_eq!(echo_one.total_shows(), 2);
    assert_eq!(s.find_artist("shake").unwrap().total_shows(), 3);
    assert_eq!(s.find_artist("echo").unwrap().total_shows(), 2);
  }

  #[test]
  fn split_needs_a_name_and_a_different_identity() {
    let mut s = store();
    assert_eq!(
      s.apply(Command::Split { source: key("echo"), names: vec!["".into()] }).unwrap_err(),
      ValidationError::EmptyName
    );
    assert_eq!(
      s.apply(Command::Split { source: key("echo"), names: vec!["ECHO".into()] }).unwrap_err(),
      ValidationError::SameEntity(key("echo"))
    );
  }

  #[test]
  fn split_skips_the_source_among_valid_names() {
    let mut s = store();
    let m = s
      .apply(Command::Split { source: key("echo"), names: vec!["Echo".into(), "Echo Two".into()] })
      .unwrap();

    let Mutation::Split { created, absorbed, .. } = m else { panic!("expected split") };
    assert_eq!(created.iter().map(|a| a.key.clone()).collect::<Vec<_>>(), vec![key("echo two")]);
    assert!(absorbed.is_empty());
    assert_eq!(s.find_artist("echo").unwrap().total_shows(), 2);
  }

  #[test]
  fn naming_a_staged_artist_releases_it() {
    let mut s = store();
    s.apply(Command::Split { source: key("echo"), names: vec!["shake".into(), "Echo Two".into()] }).unwrap();
    assert!(s.find_artist("shake").unwrap().staged);

    // Unrelated change: both stay staged.
    s.apply(Command::Edit { artist: key("neon trees"), display_name: "Neon Trees".into(), key: None }).unwrap();
    assert!(s.find_artist("shake").unwrap().staged);

    s.apply(Command::EditShow { show: ShowId::new(0), change: ShowArtistChange::Add("Shake".into()) }).unwrap();
    assert!(!s.find_artist("shake").unwrap().staged);
    assert!(s.find_artist("echo two").unwrap().staged);

    s.apply(Command::Merge { source: key("neon trees"), target: key("echo two") }).unwrap();
    assert!(!s.find_artist("echo two").unwrap().staged);
  }

  #[test]
  fn delete_leaves_show_references() {
    let mut s = store();
    s.apply(Command::Delete { artist: key("shake") }).unwrap();
    assert!(s.find_artist("shake").is_none());
    assert_eq!(s.show(ShowId::new(1)).unwrap().artists, vec!["Echo", "Shake"]);
    assert_eq!(
      s.apply(Command::Delete { artist: key("shake") }).unwrap_err(),
      ValidationError::SourceNotFound(key("shake"))
    );
  }

  #[test]
  fn show_add_stages_unknown_names_and_resolves_known_ones() {
    let mut s = store();
    let m = s
      .apply(Command::EditShow { show: ShowId::new(1), change: ShowArtistChange::Add("Fictionist".into()) })
      .unwrap();
    assert!(matches!(m, Mutation::ShowEdit { staged: Some(_), .. }));
    assert!(s.find_artist("fictionist").is_some());

    s.apply(Command::EditShow { show: ShowId::new(1), change: ShowArtistChange::Add("NEON TREES".into()) })
      .unwrap();
    assert_eq!(s.show(ShowId::new(1)).unwrap().artists, vec!["Echo", "Shake", "Fictionist", "neon trees"]);

    let err = s
      .apply(Command::EditShow { show: ShowId::new(1), change: ShowArtistChange::Add("echo".into()) })
      .unwrap_err();
    assert_eq!(err, ValidationError::DuplicateName(key("echo")));
  }

  #[test]
  fn show_remove_requires_a_reference() {
    let mut s = store();
    s.apply(Command::EditShow { show: ShowId::new(0), change: ShowArtistChange::Remove("ECHO".into()) })
      .unwrap();
    assert_eq!(s.show(ShowId::new(0)).unwrap().artists, vec!["Neon trees"]);

    let err = s
      .apply(Command::EditShow { show: ShowId::new(0), change: ShowArtistChange::Remove("Echo".into()) })
      .unwrap_err();
    assert!(matches!(err, ValidationError::NotReferenced { .. }));
    assert_eq!(
      s.apply(Command::EditShow { show: ShowId::new(9), change: ShowArtistChange::Remove("Echo".into()) })
        .unwrap_err(),
      ValidationError::ShowNotFound(ShowId::new(9))
    );
  }
}
