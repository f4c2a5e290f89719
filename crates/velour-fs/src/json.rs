use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use velour_core::domain::{ChangeRecord, GraphSnapshot};

use crate::FsError;
use crate::io::atomic_write;

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, FsError> {
  let text = std::fs::read_to_string(path)?;
  serde_json::from_str(&text).map_err(|e| FsError::Json { path: path.to_path_buf(), source: e })
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), FsError> {
  let mut text =
    serde_json::to_string_pretty(value).map_err(|e| FsError::Json { path: path.to_path_buf(), source: e })?;
  text.push('\n');
  atomic_write(path, text.as_bytes())?;
  Ok(())
}

pub fn read_graph(path: &Path) -> Result<GraphSnapshot, FsError> {
  read_json(path)
}

pub fn write_graph(path: &Path, graph: &GraphSnapshot) -> Result<(), FsError> {
  write_json(path, graph)
}

/// Exported change log: a JSON array of records tagged by `type`.
pub fn write_change_log(path: &Path, records: &[ChangeRecord]) -> Result<(), FsError> {
  write_json(path, records)
}

pub fn read_change_log(path: &Path) -> Result<Vec<ChangeRecord>, FsError> {
  read_json(path)
}
