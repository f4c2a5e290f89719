use async_trait::async_trait;
use velour_core::domain::ShowId;
use velour_core::ports::{ProgressReporter, ScanProgress};
use velour_core::services::ScanSummary;

/// A `ProgressReporter` that turns scan events into tracing lines on stderr.
#[derive(Clone, Debug, Default)]
pub struct LogReporter;

impl LogReporter {
  pub fn new() -> Self {
    Self
  }
}

#[async_trait]
impl ProgressReporter for LogReporter {
  async fn start(&self, total_shows: usize) {
    tracing::info!(total_shows, "scan started");
  }

  async fn on_chunk(&self, progress: ScanProgress) {
    tracing::info!(
      chunk = progress.chunk,
      done = progress.shows_done,
      total = progress.shows_total,
      added = progress.names_added,
      "chunk committed"
    );
  }

  async fn on_error(&self, show: ShowId, error: &str) {
    tracing::warn!(%show, error, "name rejected");
  }

  async fn finish(&self, summary: &ScanSummary) {
    if summary.flush_failures > 0 {
      tracing::warn!(failed_chunks = summary.flush_failures, "some chunks were not persisted");
    }
    tracing::info!(cancelled = summary.cancelled, "scan finished");
  }
}
