use tokio_util::sync::CancellationToken;

use crate::domain::ShowId;
use crate::ports::{ArtistDetector, KnownArtists, ProgressReporter, ScanProgress, ShowSource, SnapshotRepository};
use crate::services::catalog_service::CatalogService;
use crate::services::mutations::{Command, ShowArtistChange};

pub const DEFAULT_CHUNK_SIZE: usize = 50;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
  pub shows_scanned: usize,
  pub chunks_committed: usize,
  pub names_added: usize,
  pub rejected: usize,
  /// Chunks whose changes stayed in memory because the flush failed.
  pub flush_failures: usize,
  pub cancelled: bool,
}

/// Auto-detection of artist names over the whole show collection.
///
/// Shows are processed in chunks; each chunk is one batch of `EditShow` adds
/// followed by one flush, so stopping between chunks always leaves a
/// consistent, persisted state.
pub struct BulkScan<D: ArtistDetector> {
  detector: D,
  chunk_size: usize,
}

impl<D: ArtistDetector> BulkScan<D> {
  pub fn new(detector: D) -> Self {
    Self { detector, chunk_size: DEFAULT_CHUNK_SIZE }
  }

  pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
    self.chunk_size = chunk_size.max(1);
    self
  }

  pub async fn run<R, S, P>(
    &self,
    catalog: &mut CatalogService<R, S>,
    reporter: &P,
    cancel: &CancellationToken,
  ) -> ScanSummary
  where
    R: SnapshotRepository,
    S: ShowSource,
    P: ProgressReporter,
  {
    let ids: Vec<ShowId> = catalog.all_shows().iter().map(|s| s.id).collect();
    let total = ids.len();
    let mut summary = ScanSummary::default();
    reporter.start(total).await;

    for (chunk_idx, chunk) in ids.chunks(self.chunk_size).enumerate() {
      if cancel.is_cancelled() {
        tracing::info!(chunk = chunk_idx, "bulk scan cancelled");
        summary.cancelled = true;
        break;
      }

      // Re-read the registry each chunk so names added earlier are matched.
      let known = KnownArtists::from_artists(catalog.all_artists());
      let mut commands = Vec::new();
      let mut requested = Vec::new();
      for id in chunk {
        let Some(show) = catalog.store().show(*id) else {
          continue;
        };
        for name in self.detector.detect(show, &known) {
          requested.push(*id);
          commands.push(Command::EditShow { show: *id, change: ShowArtistChange::Add(name) });
        }
      }

      let outcome = catalog.apply_batch(commands);

      summary.shows_scanned += chunk.len();
      summary.names_added += outcome.records.len();
      summary.rejected += outcome.rejected.len();
      if matches!(outcome.flush, Some(ref f) if !f.is_saved()) {
        summary.flush_failures += 1;
      }
      summary.chunks_committed += 1;

      for (idx, error) in &outcome.rejected {
        if let Some(show) = requested.get(*idx) {
          reporter.on_error(*show, &error.to_string()).await;
        }
      }
      reporter
        .on_chunk(ScanProgress {
          chunk: chunk_idx + 1,
          shows_done: summary.shows_scanned,
          shows_total: total,
          names_added: summary.names_added,
        })
        .await;

      tokio::task::yield_now().await;
    }

    tracing::info!(
      shows = summary.shows_scanned,
      chunks = summary.chunks_committed,
      added = summary.names_added,
      cancelled = summary.cancelled,
      "bulk scan finished"
    );
    reporter.finish(&summary).await;
    summary
  }
}
