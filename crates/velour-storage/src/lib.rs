pub mod config;
pub mod models;
pub mod schema;

use std::cell::RefCell;
use std::path::Path;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use thiserror::Error;

use velour_core::ports::{RepoError, SlotWrite, SnapshotRepository, SnapshotSlot};

pub use crate::config::StorageConfig;
use crate::models::{NewSlotRow, SlotRow};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const JOURNAL_MODES: [&str; 6] = ["DELETE", "TRUNCATE", "PERSIST", "MEMORY", "WAL", "OFF"];

#[derive(Debug, Error)]
pub enum StorageError {
  #[error("database error: {0}")]
  Diesel(#[from] diesel::result::Error),
  #[error("connection error: {0}")]
  Connection(#[from] diesel::ConnectionError),
  #[error("migration error: {0}")]
  Migration(String),
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
  #[error("unsupported journal mode '{0}'")]
  JournalMode(String),
  #[error("quota exceeded: {needed} bytes needed, {limit} allowed")]
  Quota { needed: u64, limit: u64 },
}

impl From<StorageError> for RepoError {
  fn from(err: StorageError) -> Self {
    match err {
      StorageError::Quota { needed, limit } => RepoError::QuotaExceeded { needed, limit },
      StorageError::Diesel(diesel::result::Error::NotFound) => RepoError::NotFound,
      other => RepoError::Storage(other.to_string()),
    }
  }
}

/// Snapshot repository on a single SQLite table, one row per slot.
///
/// A commit is one transaction: the quota check and every upsert succeed
/// together or the table is left as it was.
pub struct SqliteSnapshotRepository {
  conn: RefCell<SqliteConnection>,
  quota: Option<u64>,
}

impl SqliteSnapshotRepository {
  pub fn open(config: &StorageConfig) -> Result<Self, StorageError> {
    if let Some(parent) = config.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
      std::fs::create_dir_all(parent)?;
    }
    let repo = Self::establish(&config.db_path.to_string_lossy(), config.quota_bytes)?;
    if let Some(mode) = &config.journal_mode {
      repo.set_journal_mode(mode)?;
    }
    tracing::debug!(path = %config.db_path.display(), quota = ?config.quota_bytes, "snapshot database opened");
    Ok(repo)
  }

  pub fn open_path(path: &Path) -> Result<Self, StorageError> {
    Self::open(&StorageConfig { db_path: path.to_path_buf(), journal_mode: None, quota_bytes: None })
  }

  /// Private in-memory database.
  pub fn in_memory(quota: Option<u64>) -> Result<Self, StorageError> {
    Self::establish(":memory:", quota)
  }

  fn establish(database_url: &str, quota: Option<u64>) -> Result<Self, StorageError> {
    let mut conn = SqliteConnection::establish(database_url)?;
    conn.run_pending_migrations(MIGRATIONS).map_err(|e| StorageError::Migration(e.to_string()))?;
    Ok(Self { conn: RefCell::new(conn), quota })
  }

  fn set_journal_mode(&self, mode: &str) -> Result<(), StorageError> {
    let mode = mode.trim().to_ascii_uppercase();
    if !JOURNAL_MODES.contains(&mode.as_str()) {
      return Err(StorageError::JournalMode(mode));
    }
    self.conn.borrow_mut().batch_execute(&format!("PRAGMA journal_mode = {mode};"))?;
    Ok(())
  }

  pub fn quota(&self) -> Option<u64> {
    self.quota
  }

  /// Bytes currently stored across all slots.
  pub fn stored_bytes(&self) -> Result<u64, StorageError> {
    use crate::schema::snapshot_slots::dsl::*;

    let mut conn = self.conn.borrow_mut();
    let sizes: Vec<i64> = snapshot_slots.select(byte_len).load(&mut *conn)?;
    Ok(sizes.into_iter().map(|n| n.max(0) as u64).sum())
  }

  fn commit_rows(&self, writes: &[SlotWrite]) -> Result<(), StorageError> {
    use crate::schema::snapshot_slots::dsl::*;

    let now = chrono::Utc::now().to_rfc3339();
    let quota = self.quota;
    let mut conn = self.conn.borrow_mut();

    conn.transaction::<_, StorageError, _>(|conn| {
      if let Some(limit) = quota {
        let written: Vec<&str> = writes.iter().map(|w| w.slot.name()).collect();
        let kept: Vec<i64> = snapshot_slots.filter(slot.ne_all(written)).select(byte_len).load(conn)?;
        let needed = kept.into_iter().map(|n| n.max(0) as u64).sum::<u64>()
          + writes.iter().map(SlotWrite::byte_len).sum::<u64>();
        if needed > limit {
          return Err(StorageError::Quota { needed, limit });
        }
      }

      for write in writes {
        let size = i64::try_from(write.byte_len()).unwrap_or(i64::MAX);
        let row = NewSlotRow { slot: write.slot.name(), payload: &write.payload, byte_len: size, updated_at: now.clone() };
        diesel::insert_into(snapshot_slots)
          .values(&row)
          .on_conflict(slot)
          .do_update()
          .set((payload.eq(&write.payload), byte_len.eq(size), updated_at.eq(&now)))
          .execute(conn)?;
      }
      Ok(())
    })
  }

  /// Slot rows with their metadata, ordered by slot name.
  pub fn slots(&self) -> Result<Vec<SlotRow>, StorageError> {
    use crate::schema::snapshot_slots::dsl::*;

    let mut conn = self.conn.borrow_mut();
    Ok(snapshot_slots.order(slot.asc()).select(SlotRow::as_select()).load(&mut *conn)?)
  }
}

impl SnapshotRepository for SqliteSnapshotRepository {
  fn read_slot(&self, wanted: SnapshotSlot) -> Result<Option<String>, RepoError> {
    use crate::schema::snapshot_slots::dsl::*;

    let mut conn = self.conn.borrow_mut();
    let row = snapshot_slots
      .filter(slot.eq(wanted.name()))
      .select(payload)
      .first::<String>(&mut *conn)
      .optional()
      .map_err(StorageError::from)?;
    Ok(row)
  }

  fn commit(&self, writes: &[SlotWrite]) -> Result<(), RepoError> {
    self.commit_rows(writes)?;
    tracing::debug!(slots = writes.len(), "snapshot committed");
    Ok(())
  }

  fn clear(&self) -> Result<(), RepoError> {
    use crate::schema::snapshot_slots::dsl::*;

    let mut conn = self.conn.borrow_mut();
    diesel::delete(snapshot_slots).execute(&mut *conn).map_err(StorageError::from)?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn write(slot: SnapshotSlot, payload: &str) -> SlotWrite {
    SlotWrite { slot, payload: payload.to_string() }
  }

  #[test]
  fn commit_then_read() {
    let repo = SqliteSnapshotRepository::in_memory(None).unwrap();
    assert_eq!(repo.read_slot(SnapshotSlot::Artists).unwrap(), None);

    repo.commit(&[write(SnapshotSlot::Artists, "[]"), write(SnapshotSlot::Shows, "[1]")]).unwrap();
    repo.commit(&[write(SnapshotSlot::Artists, "[2]")]).unwrap();

    assert_eq!(repo.read_slot(SnapshotSlot::Artists).unwrap().as_deref(), Some("[2]"));
    assert_eq!(repo.read_slot(SnapshotSlot::Shows).unwrap().as_deref(), Some("[1]"));
    assert_eq!(repo.stored_bytes().unwrap(), 6);
    assert_eq!(repo.slots().unwrap().len(), 2);
  }

  #[test]
  fn quota_rejects_whole_commit() {
    let repo = SqliteSnapshotRepository::in_memory(Some(10)).unwrap();
    repo.commit(&[write(SnapshotSlot::ChangeLog, "[]")]).unwrap();

    let err = repo
      .commit(&[write(SnapshotSlot::Artists, "[1,2,3]"), write(SnapshotSlot::Shows, "[4]")])
      .unwrap_err();
    assert!(matches!(err, RepoError::QuotaExceeded { needed: 12, limit: 10 }));
    assert_eq!(repo.read_slot(SnapshotSlot::Artists).unwrap(), None);
    assert_eq!(repo.read_slot(SnapshotSlot::ChangeLog).unwrap().as_deref(), Some("[]"));
  }

  #[test]
  fn clear_removes_every_slot() {
    let repo = SqliteSnapshotRepository::in_memory(None).unwrap();
    repo.commit(&[write(SnapshotSlot::Shows, "[]")]).unwrap();
    repo.clear().unwrap();
    assert_eq!(repo.read_slot(SnapshotSlot::Shows).unwrap(), None);
  }

  #[test]
  fn file_database_persists_across_opens() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = StorageConfig {
      db_path: dir.path().join("data").join("snapshot.db"),
      journal_mode: Some("wal".into()),
      quota_bytes: None,
    };

    SqliteSnapshotRepository::open(&cfg).unwrap().commit(&[write(SnapshotSlot::Artists, "[]")]).unwrap();
    let reopened = SqliteSnapshotRepository::open(&cfg).unwrap();
    assert_eq!(reopened.read_slot(SnapshotSlot::Artists).unwrap().as_deref(), Some("[]"));
  }

  #[test]
  fn unknown_journal_mode_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = StorageConfig {
      db_path: dir.path().join("s.db"),
      journal_mode: Some("WAL; DROP TABLE snapshot_slots".into()),
      quota_bytes: None,
    };
    assert!(matches!(SqliteSnapshotRepository::open(&cfg), Err(StorageError::JournalMode(_))));
  }
}
