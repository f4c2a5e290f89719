use crate::domain::{Artist, ArtistKey, ChangeLog, ChangeRecord, Mutation, Show, ShowId};
use crate::errors::{CoreError, ValidationError};
use crate::ports::{ShowSource, SnapshotRepository, SnapshotSlot};
use crate::services::entity_store::EntityStore;
use crate::services::mutations::{Command, ShowArtistChange};
use crate::services::recompute::{RecomputeReport, RecomputeScope};
use crate::services::snapshot;

/// Result of writing the snapshot after a change.
#[derive(Debug)]
pub enum FlushStatus {
  Saved,
  /// The in-memory state is updated and exportable; only persistence failed.
  Failed(CoreError),
}

impl FlushStatus {
  pub fn is_saved(&self) -> bool {
    matches!(self, FlushStatus::Saved)
  }
}

/// Result of one committed mutation.
#[derive(Debug)]
pub struct Outcome {
  pub record: ChangeRecord,
  pub recompute: RecomputeReport,
  pub flush: FlushStatus,
}

/// Result of [`CatalogService::apply_batch`]. `flush` is `None` when no
/// command in the batch was accepted.
#[derive(Debug, Default)]
pub struct BatchOutcome {
  pub records: Vec<ChangeRecord>,
  /// Index of the rejected command in the batch, and why.
  pub rejected: Vec<(usize, ValidationError)>,
  pub recompute: RecomputeReport,
  pub flush: Option<FlushStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOrigin {
  Snapshot,
  Source,
}

#[derive(Debug)]
pub struct LoadReport {
  pub origin: LoadOrigin,
  pub artists: usize,
  pub shows: usize,
  pub log_records: usize,
  /// Rows the source dropped while parsing.
  pub warnings: Vec<String>,
  /// Set when the load wrote a fresh snapshot.
  pub flush: Option<FlushStatus>,
}

/// Session façade: owns the entity store and drives every mutation through
/// apply, propagation, recomputation, log append and flush.
pub struct CatalogService<R, S>
where
  R: SnapshotRepository,
  S: ShowSource,
{
  repo: R,
  source: S,
  store: EntityStore,
}

impl<R, S> CatalogService<R, S>
where
  R: SnapshotRepository,
  S: ShowSource,
{
  /// The store starts empty; call [`Self::load`] before use.
  pub fn new(repo: R, source: S) -> Self {
    Self { repo, source, store: EntityStore::default() }
  }

  // -------- LOAD / FLUSH --------

  /// Loads the persisted snapshot, or falls back to the authoritative source
  /// when the artists or shows slot is missing or invalid.
  pub fn load(&mut self) -> Result<LoadReport, CoreError> {
    if let Some(store) = self.read_snapshot() {
      self.store = store;
      let report = LoadReport {
        origin: LoadOrigin::Snapshot,
        artists: self.store.artist_count(),
        shows: self.store.all_shows().len(),
        log_records: self.store.change_log().len(),
        warnings: Vec::new(),
        flush: None,
      };
      tracing::info!(artists = report.artists, shows = report.shows, log = report.log_records, "snapshot loaded");
      return Ok(report);
    }

    self.load_from_source(ChangeLog::default())
  }

  /// Replaces the session with the authoritative source and clears the
  /// change log.
  pub fn reset_to_original(&mut self) -> Result<LoadReport, CoreError> {
    let dropped = self.store.change_log().len();
    let report = self.load_from_source(ChangeLog::default())?;
    tracing::info!(dropped_records = dropped, "reset to original source");
    Ok(report)
  }

  fn load_from_source(&mut self, log: ChangeLog) -> Result<LoadReport, CoreError> {
    let data = self.source.load()?;
    for warning in &data.warnings {
      tracing::warn!(%warning, "source row dropped");
    }

    let mut store = EntityStore::new(data.artists, data.shows, log);
    let recompute = store.recompute_stats(RecomputeScope::Full);
    self.store = store;

    let flush = self.flush_status();
    let report = LoadReport {
      origin: LoadOrigin::Source,
      artists: self.store.artist_count(),
      shows: self.store.all_shows().len(),
      log_records: self.store.change_log().len(),
      warnings: data.warnings,
      flush: Some(flush),
    };
    tracing::info!(
      artists = report.artists,
      shows = report.shows,
      synthesized = recompute.synthesized.len(),
      "loaded from source"
    );
    Ok(report)
  }

  fn read_snapshot(&self) -> Option<EntityStore> {
    let artists = match snapshot::decode_artists(&self.read_slot(SnapshotSlot::Artists)?) {
      Ok(artists) => artists,
      Err(e) => {
        tracing::warn!(error = %e, "artists slot invalid, treating snapshot as absent");
        return None;
      }
    };
    let shows = match snapshot::decode_shows(&self.read_slot(SnapshotSlot::Shows)?) {
      Ok(shows) => shows,
      Err(e) => {
        tracing::warn!(error = %e, "shows slot invalid, treating snapshot as absent");
        return None;
      }
    };
    let log = match self.read_slot(SnapshotSlot::ChangeLog).map(|p| snapshot::decode_change_log(&p)) {
      Some(Ok(log)) => log,
      Some(Err(e)) => {
        tracing::warn!(error = %e, "change log slot invalid, starting an empty log");
        ChangeLog::default()
      }
      None => ChangeLog::default(),
    };

    Some(EntityStore::new(artists, shows, log))
  }

  fn read_slot(&self, slot: SnapshotSlot) -> Option<String> {
    match self.repo.read_slot(slot) {
      Ok(payload) => payload,
      Err(e) => {
        tracing::warn!(%slot, error = %e, "snapshot slot unreadable");
        None
      }
    }
  }

  /// Writes all three slots in one commit, or none of them.
  pub fn flush(&self) -> Result<(), CoreError> {
    let writes = snapshot::encode_store(&self.store)?;
    let bytes: u64 = writes.iter().map(|w| w.byte_len()).sum();
    self.repo.commit(&writes)?;
    tracing::debug!(bytes, "snapshot flushed");
    Ok(())
  }

  fn flush_status(&self) -> FlushStatus {
    match self.flush() {
      Ok(()) => FlushStatus::Saved,
      Err(e) => {
        tracing::warn!(error = %e, "snapshot not saved; changes are kept in memory, export to keep them");
        FlushStatus::Failed(e)
      }
    }
  }

  // -------- QUERY (read) --------

  pub fn store(&self) -> &EntityStore {
    &self.store
  }

  pub fn get_artist(&self, key: &ArtistKey) -> Option<&Artist> {
    self.store.get_artist(key)
  }

  pub fn all_artists(&self) -> impl Iterator<Item = &Artist> {
    self.store.all_artists()
  }

  pub fn all_shows(&self) -> &[Show] {
    self.store.all_shows()
  }

  pub fn change_log(&self) -> &ChangeLog {
    self.store.change_log()
  }

  // -------- COMMAND (write) --------

  /// Applies one command end to end. A validation error leaves the session
  /// and the snapshot untouched.
  pub fn execute(&mut self, command: Command) -> Result<Outcome, ValidationError> {
    let mut mutation = self.store.apply(command)?;
    let recompute = self.store.recompute_stats(RecomputeScope::Existing);
    self.store.refresh_after_state(&mut mutation);
    let record = self.append(mutation);
    let flush = self.flush_status();
    Ok(Outcome { record, recompute, flush })
  }

  pub fn edit_artist(&mut self, artist: &str, display_name: &str) -> Result<Outcome, ValidationError> {
    self.execute(Command::Edit {
      artist: ArtistKey::from_name(artist),
      display_name: display_name.to_string(),
      key: None,
    })
  }

  /// Merges `source` into `target`; `target` keeps its identity.
  pub fn merge_artists(&mut self, source: &str, target: &str) -> Result<Outcome, ValidationError> {
    self.execute(Command::Merge { source: ArtistKey::from_name(source), target: ArtistKey::from_name(target) })
  }

  pub fn split_artist(&mut self, source: &str, names: &[&str]) -> Result<Outcome, ValidationError> {
    self.execute(Command::Split {
      source: ArtistKey::from_name(source),
      names: names.iter().map(|n| n.to_string()).collect(),
    })
  }

  pub fn delete_artist(&mut self, artist: &str) -> Result<Outcome, ValidationError> {
    self.execute(Command::Delete { artist: ArtistKey::from_name(artist) })
  }

  pub fn edit_show_artists(&mut self, show: ShowId, change: ShowArtistChange) -> Result<Outcome, ValidationError> {
    self.execute(Command::EditShow { show, change })
  }

  /// Applies many commands with a single recomputation and a single flush.
  /// Rejected commands are skipped and reported.
  pub fn apply_batch(&mut self, commands: Vec<Command>) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    let mut applied = Vec::new();

    for (idx, command) in commands.into_iter().enumerate() {
      match self.store.apply(command) {
        Ok(mutation) => applied.push(mutation),
        Err(e) => {
          tracing::debug!(idx, error = %e, "batch command rejected");
          outcome.rejected.push((idx, e));
        }
      }
    }
    if applied.is_empty() {
      return outcome;
    }

    outcome.recompute = self.store.recompute_stats(RecomputeScope::Existing);
    for mut mutation in applied {
      self.store.refresh_after_state(&mut mutation);
      outcome.records.push(self.append(mutation));
    }
    outcome.flush = Some(self.flush_status());
    outcome
  }

  /// Full pass: resurrects dangling references and releases staged artists.
  pub fn recompute_all(&mut self) -> (RecomputeReport, FlushStatus) {
    let report = self.store.recompute_stats(RecomputeScope::Full);
    tracing::info!(
      changed = report.changed,
      unreferenced = report.unreferenced,
      synthesized = report.synthesized.len(),
      "full recomputation"
    );
    (report, self.flush_status())
  }

  fn append(&mut self, mutation: Mutation) -> ChangeRecord {
    let record = self.store.log.append(mutation).clone();
    tracing::info!(seq = record.seq, kind = ?record.kind(), subject = %record.mutation.subject(), "mutation committed");
    record
  }
}
