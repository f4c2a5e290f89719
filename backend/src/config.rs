use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use velour_config::{ConfigBackend, ConfigError, TomlConfigBackend};

pub const SECTION: &str = "source";

/// Sección `[source]`: los CSV autoritativos y el directorio de exportación.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SourceConfig {
  pub artists_csv: PathBuf,
  pub shows_csv: PathBuf,
  pub export_dir: PathBuf,
}

impl Default for SourceConfig {
  fn default() -> Self {
    match velour_config::paths() {
      Ok(paths) => SourceConfig {
        artists_csv: paths.data_dir.join("artists.csv"),
        shows_csv: paths.data_dir.join("shows.csv"),
        export_dir: paths.export_dir(),
      },
      Err(_) => SourceConfig {
        artists_csv: PathBuf::from("artists.csv"),
        shows_csv: PathBuf::from("shows.csv"),
        export_dir: PathBuf::from("export"),
      },
    }
  }
}

impl SourceConfig {
  pub fn load_from(backend: &TomlConfigBackend) -> Result<Self, ConfigError> {
    backend.load_or_init(SECTION)
  }

  pub fn save_to(&self, backend: &TomlConfigBackend) -> Result<(), ConfigError> {
    backend.save_section(SECTION, self)
  }

  /// Override from the command line; `None` keeps the configured path.
  pub fn with_overrides(mut self, artists_csv: Option<PathBuf>, shows_csv: Option<PathBuf>) -> Self {
    if let Some(path) = artists_csv {
      self.artists_csv = path;
    }
    if let Some(path) = shows_csv {
      self.shows_csv = path;
    }
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_section_is_written_back() {
    let dir = tempfile::tempdir().unwrap();
    let backend = TomlConfigBackend::at(dir.path().join("velour.toml"));

    let cfg = SourceConfig::load_from(&backend).unwrap();
    let on_disk = std::fs::read_to_string(backend.config_file()).unwrap();
    assert!(on_disk.contains("[source]"));
    assert_eq!(SourceConfig::load_from(&backend).unwrap(), cfg);
  }

  #[test]
  fn overrides_replace_only_given_paths() {
    let cfg = SourceConfig {
      artists_csv: "a.csv".into(),
      shows_csv: "s.csv".into(),
      export_dir: "out".into(),
    }
    .with_overrides(None, Some("other.csv".into()));

    assert_eq!(cfg.artists_csv, PathBuf::from("a.csv"));
    assert_eq!(cfg.shows_csv, PathBuf::from("other.csv"));
  }

  #[test]
  fn edits_survive_a_reload() {
    let dir = tempfile::tempdir().unwrap();
    let backend = TomlConfigBackend::at(dir.path().join("velour.toml"));
    let cfg = SourceConfig {
      artists_csv: dir.path().join("artists.csv"),
      shows_csv: dir.path().join("shows.csv"),
      export_dir: dir.path().join("out"),
    };

    cfg.save_to(&backend).unwrap();
    assert_eq!(SourceConfig::load_from(&backend).unwrap(), cfg);
  }
}
