use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::ids::{ArtistKey, ShowId};
use crate::services::normalize::normalize;

/// Un show del archivo de la sala.
///
/// `artists` guarda nombres tal como se escribieron; pueden referirse a
/// artistas que aún no existen en el registro hasta el próximo recálculo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Show {
  pub id: ShowId,
  pub date: Option<NaiveDate>,
  pub year: Option<i32>,
  pub title: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub genre: String,
  #[serde(default)]
  pub artists: Vec<String>,
}

impl Show {
  pub fn new(id: ShowId, title: &str) -> Self {
    Show {
      id,
      date: None,
      year: None,
      title: title.to_string(),
      description: String::new(),
      genre: String::new(),
      artists: Vec::new(),
    }
  }

  /// Fija la fecha y deriva el año de ella.
  pub fn with_date(mut self, date: NaiveDate) -> Self {
    self.year = Some(date.year());
    self.date = Some(date);
    self
  }

  pub fn with_year(mut self, year: i32) -> Self {
    self.year = Some(year);
    self
  }

  pub fn with_artists<I, S>(mut self, names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.artists = names.into_iter().map(Into::into).collect();
    self
  }

  /// Año usable para estadísticas: el de la fecha si existe, si no el campo `year`.
  pub fn stats_year(&self) -> Option<i32> {
    self.date.map(|d| d.year()).or(self.year)
  }

  /// `true` si algún nombre de la lista normaliza a `key`.
  pub fn references(&self, key: &ArtistKey) -> bool {
    self.artists.iter().any(|name| key.matches(name))
  }

  /// Claves referenciadas, sin repetir, en orden de aparición.
  pub fn referenced_keys(&self) -> Vec<ArtistKey> {
    let mut keys: Vec<ArtistKey> = Vec::with_capacity(self.artists.len());
    for name in &self.artists {
      let key = ArtistKey::from_name(name);
      if !key.is_empty() && !keys.contains(&key) {
        keys.push(key);
      }
    }
    keys
  }

  /// Elimina referencias repetidas (por clave) y vacías; conserva la primera.
  pub fn dedup_artists(&mut self) -> bool {
    let before = self.artists.len();
    let mut seen: Vec<String> = Vec::with_capacity(before);
    self.artists.retain(|name| {
      let key = normalize(name);
      if key.is_empty() || seen.contains(&key) {
        return false;
      }
      seen.push(key);
      true
    });
    self.artists.len() != before
  }
}
