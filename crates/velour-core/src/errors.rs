// crates/velour-core/src/errors.rs
use thiserror::Error;

use crate::domain::ids::{ArtistKey, ShowId};

/// Precondición incumplida de una operación. Nunca muta el estado.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("artist name is empty")]
  EmptyName,

  #[error("artist '{0}' not found")]
  SourceNotFound(ArtistKey),

  #[error("target artist '{0}' not found")]
  TargetNotFound(ArtistKey),

  #[error("show {0} not found")]
  ShowNotFound(ShowId),

  #[error("'{0}' refers to the same artist")]
  SameEntity(ArtistKey),

  #[error("artist '{0}' already exists")]
  DuplicateName(ArtistKey),

  #[error("key '{key}' does not match display name '{display_name}'")]
  KeyMismatch { key: String, display_name: String },

  #[error("show {show} does not reference '{key}'")]
  NotReferenced { show: ShowId, key: ArtistKey },
}

/// Error genérico del núcleo.
///
/// Las capas superiores (CLI, etc.) deberían mapear este error a mensajes
/// de usuario o logs. Ninguno es fatal para el proceso.
#[derive(Debug, Error)]
pub enum CoreError {
  #[error(transparent)]
  Validation(#[from] ValidationError),

  #[error("parse error: {0}")]
  Parse(String),

  #[error("storage quota exceeded: {needed} bytes needed, {limit} allowed")]
  StorageQuota { needed: u64, limit: u64 },

  #[error("repository error: {0}")]
  Repository(String),

  #[error("source error: {0}")]
  Source(String),

  #[error("not found")]
  NotFound,
}

impl CoreError {
  pub fn is_validation(&self) -> bool {
    matches!(self, CoreError::Validation(_))
  }
}
