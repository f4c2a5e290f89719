mod cli;
mod commands;
mod config;
mod infrastructure;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use velour_config::TomlConfigBackend;
use velour_core::services::CatalogService;
use velour_fs::CsvSource;
use velour_scanner::ScannerConfig;
use velour_storage::{SqliteSnapshotRepository, StorageConfig};

pub use cli::{Cli, Commands};
pub use config::SourceConfig;

/// Type alias to simplify the generic signature of the service.
type Catalog = CatalogService<SqliteSnapshotRepository, CsvSource>;

/// Everything a command needs: the session plus the config sections it reads.
pub struct App {
  catalog: Catalog,
  source: SourceConfig,
  scanner: ScannerConfig,
}

fn init_tracing() {
  // stdout queda para la salida de los comandos.
  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    .init();
}

pub async fn run() -> Result<()> {
  init_tracing();
  let cli = Cli::parse();

  let explicit;
  let backend: &TomlConfigBackend = match &cli.config {
    Some(path) => {
      explicit = TomlConfigBackend::at(path);
      &explicit
    }
    None => velour_config::config_backend().context("failed to resolve the config directory")?,
  };
  tracing::debug!(config = %backend.config_file().display(), "using config");

  // --- Wiring ---

  // 1. Snapshot repository (SQLite).
  let storage = StorageConfig::load_from(backend).context("failed to read [storage]")?;
  let repo = SqliteSnapshotRepository::open(&storage)
    .with_context(|| format!("failed to open snapshot db {}", storage.db_path.display()))?;

  // 2. Authoritative source (CSV).
  let source =
    SourceConfig::load_from(backend).context("failed to read [source]")?.with_overrides(cli.artists_csv, cli.shows_csv);
  let csv = CsvSource::new(&source.artists_csv, &source.shows_csv);

  // 3. Detector settings for `scan`.
  let scanner = ScannerConfig::load_from(backend).context("failed to read [scanner]")?;

  let mut app = App { catalog: CatalogService::new(repo, csv), source, scanner };
  commands::dispatch(cli.command, &mut app).await
}
