use velour_core::domain::{ArtistKey, Show};
use velour_core::ports::{ArtistDetector, KnownArtists};

use crate::config::ScannerConfig;
use crate::lineup::parse_lineup;

/// Detector de artistas para el escaneo masivo.
///
/// Combina dos fuentes: nombres ya registrados que aparecen en el título o
/// la descripción, y la lista de artistas del título cuando tiene formato
/// de cartel ("Headliner w/ A, B & C").
#[derive(Debug, Clone, Default)]
pub struct LineupDetector {
  config: ScannerConfig,
}

impl LineupDetector {
  pub fn new(config: ScannerConfig) -> Self {
    Self { config }
  }

  pub fn config(&self) -> &ScannerConfig {
    &self.config
  }

  fn is_skipped(&self, show: &Show) -> bool {
    let title = show.title.to_lowercase();
    self.config.skip_keywords.iter().any(|k| title.contains(&k.to_lowercase()))
  }
}

fn is_boundary(c: Option<char>) -> bool {
  c.is_none_or(|c| !c.is_alphanumeric())
}

/// Busca `needle` como palabra completa y, si aparece, borra esa zona del
/// texto para que un nombre más corto no vuelva a coincidir dentro de ella.
fn take_word(haystack: &mut String, needle: &str) -> bool {
  let mut found = None;
  for (start, _) in haystack.match_indices(needle) {
    let end = start + needle.len();
    if is_boundary(haystack[..start].chars().next_back()) && is_boundary(haystack[end..].chars().next()) {
      found = Some((start, end));
      break;
    }
  }
  match found {
    Some((start, end)) => {
      haystack.replace_range(start..end, &" ".repeat(end - start));
      true
    }
    None => false,
  }
}

impl ArtistDetector for LineupDetector {
  fn detect(&self, show: &Show, known: &KnownArtists) -> Vec<String> {
    if self.is_skipped(show) {
      return Vec::new();
    }

    let mut names: Vec<String> = Vec::new();
    let mut keys: Vec<ArtistKey> = Vec::new();
    let mut push = |key: ArtistKey, name: String| {
      if !key.is_empty() && !show.references(&key) && !keys.contains(&key) {
        keys.push(key);
        names.push(name);
      }
    };

    // Más largos primero: "the moth & the flame" antes que "the moth".
    let mut text = format!("{} {}", show.title, show.description).to_lowercase();
    for (key, display_name) in known.iter() {
      if key.as_str().chars().count() >= self.config.min_name_len && take_word(&mut text, key.as_str()) {
        push(key.clone(), display_name.to_string());
      }
    }

    if self.config.parse_titles {
      for name in parse_lineup(&show.title, &self.config.generic_terms) {
        let key = ArtistKey::from_name(&name);
        let name = known.display_name(&key).map(str::to_string).unwrap_or(name);
        push(key, name);
      }
    }

    if !names.is_empty() {
      tracing::trace!(show = %show.id, found = names.len(), "artists detected");
    }
    names
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use velour_core::domain::{Artist, ShowId};

  fn known(names: &[&str]) -> KnownArtists {
    let artists: Vec<Artist> = names.iter().map(|n| Artist::new(n)).collect();
    KnownArtists::from_artists(&artists)
  }

  #[test]
  fn known_names_match_whole_words_longest_first() {
    let detector = LineupDetector::default();
    let show = Show::new(ShowId::new(0), "The Moth & The Flame album party");
    let found = detector.detect(&show, &known(&["The Moth", "The Moth & The Flame", "Moth"]));
    assert_eq!(found, vec!["The Moth & The Flame"]);
  }

  #[test]
  fn words_inside_other_words_do_not_match() {
    let detector = LineupDetector::default();
    let show = Show::new(ShowId::new(0), "Echoes of spring");
    assert!(detector.detect(&show, &known(&["Echo"])).is_empty());
  }

  #[test]
  fn lineup_titles_propose_new_names_and_reuse_known_spelling() {
    let detector = LineupDetector::default();
    let show = Show::new(ShowId::new(0), "(rock) 8pm» NEON TREES w/ Fictionist, Echo").with_artists(["Echo"]);
    let found = detector.detect(&show, &known(&["Neon Trees"]));
    assert_eq!(found, vec!["Neon Trees", "Fictionist"]);
  }

  #[test]
  fn skip_keywords_suppress_detection() {
    let detector = LineupDetector::default();
    let show = Show::new(ShowId::new(0), "Open Mic w/ Echo, Shake");
    assert!(detector.detect(&show, &known(&["Echo"])).is_empty());
  }

  #[test]
  fn short_known_names_are_ignored() {
    let detector = LineupDetector::new(ScannerConfig { parse_titles: false, ..ScannerConfig::default() });
    let show = Show::new(ShowId::new(0), "DJ Q at the bar");
    assert!(detector.detect(&show, &known(&["Q"])).is_empty());
  }
}
