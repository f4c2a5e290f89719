use async_trait::async_trait;

use crate::domain::ShowId;
use crate::services::bulk_scan::ScanSummary;

/// Avance de un escaneo masivo tras confirmar un bloque.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanProgress {
  pub chunk: usize,
  pub shows_done: usize,
  pub shows_total: usize,
  pub names_added: usize,
}

// Puerto de progreso del escaneo.
// La capa de presentación (CLI, UI) lo implementa para informar al operador.
#[async_trait]
pub trait ProgressReporter: Send + Sync + Clone {
  async fn start(&self, total_shows: usize);
  async fn on_chunk(&self, progress: ScanProgress);
  async fn on_error(&self, show: ShowId, error: &str);
  async fn finish(&self, summary: &ScanSummary);
}

/// Reporter que descarta todos los eventos.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentReporter;

#[async_trait]
impl ProgressReporter for SilentReporter {
  async fn start(&self, _total_shows: usize) {}
  async fn on_chunk(&self, _progress: ScanProgress) {}
  async fn on_error(&self, _show: ShowId, _error: &str) {}
  async fn finish(&self, _summary: &ScanSummary) {}
}
