use serde::{Deserialize, Serialize};
use velour_config::{ConfigBackend, ConfigError, TomlConfigBackend};

use crate::ScannerError;

pub const SECTION: &str = "scanner";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ScannerConfig {
  /// Shows por bloque del escaneo masivo (un flush por bloque).
  #[serde(default = "default_chunk_size")]
  pub chunk_size: usize,

  /// Longitud mínima de un nombre conocido para buscarlo en títulos.
  #[serde(default = "default_min_name_len")]
  pub min_name_len: usize,

  /// Partir títulos tipo "Headliner w/ A, B & C" en nombres.
  #[serde(default = "default_parse_titles")]
  pub parse_titles: bool,

  /// Títulos que no son conciertos (open mic, prom, ...).
  #[serde(default = "default_skip_keywords")]
  pub skip_keywords: Vec<String>,

  /// Palabras que delatan que un fragmento no es un artista.
  #[serde(default = "default_generic_terms")]
  pub generic_terms: Vec<String>,
}

fn default_chunk_size() -> usize {
  velour_core::services::bulk_scan::DEFAULT_CHUNK_SIZE
}

fn default_min_name_len() -> usize {
  3
}

fn default_parse_titles() -> bool {
  true
}

fn default_skip_keywords() -> Vec<String> {
  ["open-mic", "open mic", "prom", "dance", "festival"].map(String::from).to_vec()
}

fn default_generic_terms() -> Vec<String> {
  ["cabaret", "velour", "showcase", "night", "release", "cd", "ep", "tba", "tbd", "featuring"].map(String::from).to_vec()
}

impl Default for ScannerConfig {
  fn default() -> Self {
    ScannerConfig {
      chunk_size: default_chunk_size(),
      min_name_len: default_min_name_len(),
      parse_titles: default_parse_titles(),
      skip_keywords: default_skip_keywords(),
      generic_terms: default_generic_terms(),
    }
  }
}

impl ScannerConfig {
  pub fn load() -> Result<Self, ScannerError> {
    Self::load_from(velour_config::config_backend()?)
  }

  pub fn load_from(backend: &TomlConfigBackend) -> Result<Self, ScannerError> {
    let cfg: Self = backend.load_or_init(SECTION)?;
    cfg.validate()?;
    Ok(cfg)
  }

  pub fn save_to(&self, backend: &TomlConfigBackend) -> Result<(), ConfigError> {
    backend.save_section(SECTION, self)
  }

  pub fn validate(&self) -> Result<(), ScannerError> {
    if self.chunk_size == 0 {
      return Err(ScannerError::InvalidConfig("chunk_size must be at least 1".into()));
    }
    if self.min_name_len == 0 {
      return Err(ScannerError::InvalidConfig("min_name_len must be at least 1".into()));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn partial_section_fills_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("velour.toml");
    std::fs::write(&path, "[scanner]\nchunk_size = 10\n").unwrap();

    let cfg = ScannerConfig::load_from(&TomlConfigBackend::at(&path)).unwrap();
    assert_eq!(cfg.chunk_size, 10);
    assert!(cfg.parse_titles);
    assert!(cfg.skip_keywords.iter().any(|k| k == "open mic"));
  }

  #[test]
  fn zero_chunk_size_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("velour.toml");
    std::fs::write(&path, "[scanner]\nchunk_size = 0\n").unwrap();
    assert!(matches!(ScannerConfig::load_from(&TomlConfigBackend::at(&path)), Err(ScannerError::InvalidConfig(_))));
  }
}
