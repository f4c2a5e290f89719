use std::collections::BTreeMap;

use crate::domain::{AggregateStats, Artist, ArtistKey, Show};
use crate::services::entity_store::EntityStore;

/// Derives every artist's aggregate stats from the show collection.
///
/// Shows without a usable year are skipped entirely. A show counts once per
/// artist even if the lineup repeats the name.
pub fn recompute(shows: &[Show]) -> BTreeMap<ArtistKey, AggregateStats> {
  let mut stats: BTreeMap<ArtistKey, AggregateStats> = BTreeMap::new();

  for show in shows {
    let Some(year) = show.stats_year() else {
      continue;
    };
    for key in show.referenced_keys() {
      stats.entry(key).or_default().record_show(year);
    }
  }

  stats
}

/// How far a recomputation pass reaches into the artist registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecomputeScope {
  /// Refresh existing, non-staged artists. Run after every mutation.
  Existing,
  /// Refresh every artist, clear staged flags and re-create an artist for
  /// every referenced name that has none.
  Full,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecomputeReport {
  /// Artists whose stats changed.
  pub changed: usize,
  /// Artists that are no longer referenced by any dated show.
  pub unreferenced: usize,
  /// Staged artists left untouched.
  pub staged_kept: usize,
  /// Artists re-created from dangling show references.
  pub synthesized: Vec<ArtistKey>,
}

impl EntityStore {
  /// Applies [`recompute`] to the registry. Never deletes an artist.
  pub fn recompute_stats(&mut self, scope: RecomputeScope) -> RecomputeReport {
    let mut fresh = recompute(&self.shows);
    let mut report = RecomputeReport::default();

    if scope == RecomputeScope::Full {
      for show in &self.shows {
        for name in &show.artists {
          let key = ArtistKey::from_name(name);
          if key.is_empty() || self.artists.contains_key(&key) {
            continue;
          }
          let artist = Artist::new(name);
          tracing::debug!(key = %artist.key, show = %show.id, "re-creating artist from show reference");
          report.synthesized.push(artist.key.clone());
          self.artists.insert(artist.key.clone(), artist);
        }
      }
    }

    for artist in self.artists.values_mut() {
      if artist.staged && scope == RecomputeScope::Existing {
        report.staged_kept += 1;
        continue;
      }
      artist.staged = false;

      let stats = fresh.remove(&artist.key).unwrap_or_default();
      if stats.is_empty() {
        report.unreferenced += 1;
      }
      if artist.stats != stats {
        report.changed += 1;
        artist.stats = stats;
      }
    }

    report
  }
}
