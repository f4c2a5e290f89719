use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use velour_config::{ConfigError, TomlConfigBackend};

pub const SECTION: &str = "storage";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StorageConfig {
  pub db_path: PathBuf,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub journal_mode: Option<String>,
  /// Límite total de bytes del snapshot; sin límite si falta.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub quota_bytes: Option<u64>,
}

impl Default for StorageConfig {
  fn default() -> Self {
    let db_path = velour_config::paths().map(|p| p.snapshot_db()).unwrap_or_else(|_| PathBuf::from("snapshot.db"));
    StorageConfig { db_path, journal_mode: Some("WAL".to_string()), quota_bytes: None }
  }
}

impl StorageConfig {
  /// Carga `[storage]` del backend global, escribiendo los valores por defecto si falta.
  pub fn load() -> Result<Self, ConfigError> {
    Self::load_from(velour_config::config_backend()?)
  }

  pub fn load_from(backend: &TomlConfigBackend) -> Result<Self, ConfigError> {
    backend.load_or_init(SECTION)
  }

  pub fn save_to(&self, backend: &TomlConfigBackend) -> Result<(), ConfigError> {
    use velour_config::ConfigBackend;
    backend.save_section(SECTION, self)
  }
}
