use serde::{Deserialize, Serialize};
use std::fmt;

use crate::services::normalize::normalize;

/// Clave canónica de un artista (nombre en minúsculas y sin espacios en los extremos).
///
/// Es el único mecanismo de identidad: dos nombres con la misma clave son el
/// mismo artista. No existe un id sustituto.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtistKey(String);

impl ArtistKey {
  /// Deriva la clave a partir de un nombre libre.
  pub fn from_name(name: &str) -> Self {
    ArtistKey(normalize(name))
  }

  /// Devuelve la clave como `&str`.
  pub fn as_str(&self) -> &str {
    &self.0
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// `true` si `name` normaliza a esta clave.
  pub fn matches(&self, name: &str) -> bool {
    normalize(name) == self.0
  }
}

impl From<&str> for ArtistKey {
  fn from(name: &str) -> Self {
    ArtistKey::from_name(name)
  }
}

impl From<ArtistKey> for String {
  fn from(key: ArtistKey) -> Self {
    key.0
  }
}

impl AsRef<str> for ArtistKey {
  fn as_ref(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for ArtistKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.0.fmt(f)
  }
}

/// Índice estable de un show dentro de la colección.
///
/// Los shows no tienen clave natural; el índice se asigna al importar y no se
/// reutiliza.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShowId(u32);

impl ShowId {
  pub fn new(index: u32) -> Self {
    ShowId(index)
  }

  pub fn index(&self) -> u32 {
    self.0
  }
}

impl From<u32> for ShowId {
  fn from(index: u32) -> Self {
    ShowId(index)
  }
}

impl fmt::Display for ShowId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{}", self.0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn key_is_derived_from_display_name() {
    let key = ArtistKey::from_name("  Neon Trees ");
    assert_eq!(key.as_str(), "neon trees");
    assert!(key.matches("NEON TREES"));
    assert!(!key.matches("Neon Tree"));
  }

  #[test]
  fn keys_serialize_as_plain_strings() {
    let key = ArtistKey::from_name("Echo");
    assert_eq!(serde_json::to_string(&key).unwrap(), "\"echo\"");
    assert_eq!(serde_json::to_string(&ShowId::new(7)).unwrap(), "7");
  }
}
