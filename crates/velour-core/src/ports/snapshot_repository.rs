use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::errors::CoreError;

/// Los tres slots del snapshot persistente.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SnapshotSlot {
  Artists,
  Shows,
  ChangeLog,
}

impl SnapshotSlot {
  pub const ALL: [SnapshotSlot; 3] = [SnapshotSlot::Artists, SnapshotSlot::Shows, SnapshotSlot::ChangeLog];

  /// Nombre estable del slot en el almacenamiento.
  pub fn name(&self) -> &'static str {
    match self {
      SnapshotSlot::Artists => "artists-collection",
      SnapshotSlot::Shows => "shows-collection",
      SnapshotSlot::ChangeLog => "change-log",
    }
  }

  pub fn from_name(name: &str) -> Option<Self> {
    SnapshotSlot::ALL.into_iter().find(|slot| slot.name() == name)
  }
}

impl fmt::Display for SnapshotSlot {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Contenido serializado de un slot, listo para escribirse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotWrite {
  pub slot: SnapshotSlot,
  pub payload: String,
}

impl SlotWrite {
  pub fn byte_len(&self) -> u64 {
    self.payload.len() as u64
  }
}

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
  #[error("entity not found")]
  NotFound,
  #[error("storage error: {0}")]
  Storage(String),
  #[error("quota exceeded: {needed} bytes needed, {limit} allowed")]
  QuotaExceeded { needed: u64, limit: u64 },
}

impl From<RepoError> for CoreError {
  fn from(err: RepoError) -> Self {
    match err {
      RepoError::NotFound => CoreError::NotFound,
      RepoError::Storage(msg) => CoreError::Repository(msg),
      RepoError::QuotaExceeded { needed, limit } => CoreError::StorageQuota { needed, limit },
    }
  }
}

/// Puerto de persistencia del snapshot.
///
/// `commit` es todo-o-nada: o se escriben todos los slots o ninguno.
/// Un slot ausente significa "cargar desde la fuente", no "colección vacía".
pub trait SnapshotRepository {
  fn read_slot(&self, slot: SnapshotSlot) -> Result<Option<String>, RepoError>;
  fn commit(&self, writes: &[SlotWrite]) -> Result<(), RepoError>;
  fn clear(&self) -> Result<(), RepoError>;
}

/// Repositorio en memoria. Los clones comparten el mismo contenido.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotRepository {
  slots: Rc<RefCell<BTreeMap<SnapshotSlot, String>>>,
  quota: Rc<Cell<Option<u64>>>,
  commits: Rc<Cell<usize>>,
}

impl MemorySnapshotRepository {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_quota(limit: u64) -> Self {
    let repo = Self::default();
    repo.set_quota(Some(limit));
    repo
  }

  pub fn set_quota(&self, limit: Option<u64>) {
    self.quota.set(limit);
  }

  /// Escribe un slot sin pasar por `commit` (para simular datos corruptos).
  pub fn put_raw(&self, slot: SnapshotSlot, payload: &str) {
    self.slots.borrow_mut().insert(slot, payload.to_string());
  }

  pub fn raw(&self, slot: SnapshotSlot) -> Option<String> {
    self.slots.borrow().get(&slot).cloned()
  }

  pub fn commit_count(&self) -> usize {
    self.commits.get()
  }
}

impl SnapshotRepository for MemorySnapshotRepository {
  fn read_slot(&self, slot: SnapshotSlot) -> Result<Option<String>, RepoError> {
    Ok(self.slots.borrow().get(&slot).cloned())
  }

  fn commit(&self, writes: &[SlotWrite]) -> Result<(), RepoError> {
    if let Some(limit) = self.quota.get() {
      let needed: u64 = writes.iter().map(SlotWrite::byte_len).sum();
      if needed > limit {
        return Err(RepoError::QuotaExceeded { needed, limit });
      }
    }

    let mut slots = self.slots.borrow_mut();
    for write in writes {
      slots.insert(write.slot, write.payload.clone());
    }
    self.commits.set(self.commits.get() + 1);
    Ok(())
  }

  fn clear(&self) -> Result<(), RepoError> {
    self.slots.borrow_mut().clear();
    Ok(())
  }
}
