use crate::domain::{Artist, ArtistKey, Show};

/// Índice de artistas conocidos que se pasa al detector.
///
/// Ordenado por longitud de clave descendente, para que "the moth & the
/// flame" gane frente a "the moth" cuando ambos aparecen en un título.
#[derive(Debug, Clone, Default)]
pub struct KnownArtists {
  entries: Vec<(ArtistKey, String)>,
}

impl KnownArtists {
  pub fn from_artists<'a, I>(artists: I) -> Self
  where
    I: IntoIterator<Item = &'a Artist>,
  {
    let mut entries: Vec<(ArtistKey, String)> =
      artists.into_iter().map(|a| (a.key.clone(), a.display_name.clone())).collect();
    entries.sort_by(|(a, _), (b, _)| b.as_str().len().cmp(&a.as_str().len()).then_with(|| a.cmp(b)));
    Self { entries }
  }

  pub fn iter(&self) -> impl Iterator<Item = (&ArtistKey, &str)> {
    self.entries.iter().map(|(k, n)| (k, n.as_str()))
  }

  pub fn display_name(&self, key: &ArtistKey) -> Option<&str> {
    self.entries.iter().find(|(k, _)| k == key).map(|(_, n)| n.as_str())
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

/// Puerto de auto-detección de artistas en un show.
///
/// Devuelve nombres candidatos que el show todavía no referencia; el
/// escaneo masivo los añade con `EditShow`.
pub trait ArtistDetector {
  fn detect(&self, show: &Show, known: &KnownArtists) -> Vec<String>;
}
