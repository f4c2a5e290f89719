use crate::paths::{ConfigError, VelourPaths};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

// toml_edit para escribir secciones preservando comentarios del usuario
use toml_edit::{DocumentMut, Item};

pub trait ConfigBackend {
  fn load_section<T: DeserializeOwned>(&self, section: &str) -> Result<T, ConfigError>;
  fn save_section<T: Serialize>(&self, section: &str, value: &T) -> Result<(), ConfigError>;
}

pub struct TomlConfigBackend {
  config_file: PathBuf,
}

impl TomlConfigBackend {
  pub fn new(paths: &VelourPaths) -> Self {
    Self { config_file: paths.config_file() }
  }

  /// Backend sobre un archivo concreto (tests, `--config`).
  pub fn at(config_file: impl Into<PathBuf>) -> Self {
    Self { config_file: config_file.into() }
  }

  pub fn config_file(&self) -> &Path {
    &self.config_file
  }

  fn read_value(&self) -> Result<Option<toml::Value>, ConfigError> {
    match fs::read_to_string(&self.config_file) {
      Ok(content) => Ok(Some(toml::from_str(&content)?)),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  fn decode<T: DeserializeOwned>(section: &str, table: &toml::Value) -> Result<T, ConfigError> {
    table.clone().try_into().map_err(|e| ConfigError::Other(format!("decode section [{section}]: {e}")))
  }

  pub fn load_section_with_default<T>(&self, section: &str) -> Result<T, ConfigError>
  where
    T: DeserializeOwned + Default,
  {
    match self.read_value()?.as_ref().and_then(|v| v.get(section)) {
      Some(table) => Self::decode(section, table),
      None => Ok(T::default()),
    }
  }

  /// Carga la sección; si falta, escribe los valores por defecto para que el
  /// operador los vea en el archivo.
  pub fn load_or_init<T>(&self, section: &str) -> Result<T, ConfigError>
  where
    T: DeserializeOwned + Serialize + Default,
  {
    if let Some(table) = self.read_value()?.as_ref().and_then(|v| v.get(section)) {
      return Self::decode(section, table);
    }

    let value = T::default();
    self.save_section(section, &value)?;
    tracing::info!(section, path = %self.config_file.display(), "wrote default config section");
    Ok(value)
  }
}

impl ConfigBackend for TomlConfigBackend {
  fn load_section<T: DeserializeOwned>(&self, section: &str) -> Result<T, ConfigError> {
    let value = self
      .read_value()?
      .ok_or_else(|| ConfigError::Other(format!("config file {:?} not found", self.config_file)))?;

    let table = value
      .get(section)
      .ok_or_else(|| ConfigError::Other(format!("missing section [{section}] in {:?}", self.config_file)))?;

    Self::decode(section, table)
  }

  fn save_section<T: Serialize>(&self, section: &str, value: &T) -> Result<(), ConfigError> {
    // 1) Documento actual, o uno vacío si no existe.
    let mut doc: DocumentMut = match fs::read_to_string(&self.config_file) {
      Ok(content) => {
        content.parse::<DocumentMut>().map_err(|e| ConfigError::Other(format!("parse toml_edit doc: {e}")))?
      }
      Err(e) if e.kind() == ErrorKind::NotFound => DocumentMut::new(),
      Err(e) => return Err(e.into()),
    };

    // 2) La sección se serializa con `toml` y se re-parsea como tabla sin cabecera.
    let section_str =
      toml::to_string(value).map_err(|e| ConfigError::Other(format!("encode section [{section}]: {e}")))?;
    let section_item: Item = section_str
      .parse::<DocumentMut>()
      .map_err(|e| ConfigError::Other(format!("parse section as doc: {e}")))?
      .into_item();

    // 3) Reemplazo en la raíz; el resto del documento queda intacto.
    doc[section] = section_item;

    velour_fs::atomic_write_str(&self.config_file, &doc.to_string())?;
    Ok(())
  }
}
