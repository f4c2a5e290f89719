use crate::domain::{Artist, Show};
use crate::errors::CoreError;

/// Colecciones leídas de la fuente autoritativa.
///
/// `warnings` recoge las filas descartadas (errores de parseo no fatales).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceData {
  pub artists: Vec<Artist>,
  pub shows: Vec<Show>,
  pub warnings: Vec<String>,
}

/// Puerto de la fuente autoritativa (los archivos exportados por el scraper).
///
/// El núcleo recurre a ella cuando el snapshot falta o es inválido, y en el
/// reset al original.
pub trait ShowSource {
  fn load(&self) -> Result<SourceData, CoreError>;
}

/// Fuente fija en memoria.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
  data: SourceData,
}

impl InMemorySource {
  pub fn new(artists: Vec<Artist>, shows: Vec<Show>) -> Self {
    Self { data: SourceData { artists, shows, warnings: Vec::new() } }
  }
}

impl ShowSource for InMemorySource {
  fn load(&self) -> Result<SourceData, CoreError> {
    Ok(self.data.clone())
  }
}
