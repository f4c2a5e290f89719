use crate::domain::{ArtistKey, Show};

/// What a propagation pass changed in the show collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Propagation {
  pub shows_touched: usize,
  pub references_rewritten: usize,
  pub duplicates_collapsed: usize,
}

/// Rewrites every lineup entry that normalizes to `old_key` into
/// `new_display_name`, then collapses duplicate entries in the touched shows.
///
/// Matching is by key, so "Neon trees" follows a rename of "neon trees".
pub fn propagate_identity(shows: &mut [Show], old_key: &ArtistKey, new_display_name: &str) -> Propagation {
  let mut result = Propagation::default();

  for show in shows.iter_mut() {
    let mut rewritten = 0;
    for name in show.artists.iter_mut() {
      if old_key.matches(name) {
        if name != new_display_name {
          *name = new_display_name.to_string();
        }
        rewritten += 1;
      }
    }
    if rewritten == 0 {
      continue;
    }

    let before = show.artists.len();
    show.dedup_artists();

    result.shows_touched += 1;
    result.references_rewritten += rewritten;
    result.duplicates_collapsed += before - show.artists.len();
  }

  result
}
