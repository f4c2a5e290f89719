use std::path::{Path, PathBuf};

use velour_core::CoreError;
use velour_core::ports::{ShowSource, SourceData};

use crate::FsError;
use crate::tabular::{read_artists_file, read_shows_file};

/// Authoritative source backed by the scraper's exported CSV files.
///
/// The shows file is required. A missing artists file is tolerated: the full
/// recomputation that follows a source load rebuilds the registry from shows.
#[derive(Debug, Clone)]
pub struct CsvSource {
  artists_csv: PathBuf,
  shows_csv: PathBuf,
}

impl CsvSource {
  pub fn new(artists_csv: impl Into<PathBuf>, shows_csv: impl Into<PathBuf>) -> Self {
    Self { artists_csv: artists_csv.into(), shows_csv: shows_csv.into() }
  }

  pub fn artists_csv(&self) -> &Path {
    &self.artists_csv
  }

  pub fn shows_csv(&self) -> &Path {
    &self.shows_csv
  }
}

fn map_fs_error(path: &Path, err: FsError) -> CoreError {
  CoreError::Source(format!("{}: {err}", path.display()))
}

impl ShowSource for CsvSource {
  fn load(&self) -> Result<SourceData, CoreError> {
    let shows = read_shows_file(&self.shows_csv).map_err(|e| map_fs_error(&self.shows_csv, e))?;

    let artists = if self.artists_csv.exists() {
      read_artists_file(&self.artists_csv).map_err(|e| map_fs_error(&self.artists_csv, e))?
    } else {
      tracing::warn!(path = %self.artists_csv.display(), "artists file missing, registry will be rebuilt from shows");
      Default::default()
    };

    tracing::info!(
      artists = artists.rows.len(),
      shows = shows.rows.len(),
      dropped = artists.warnings.len() + shows.warnings.len(),
      "source files read"
    );

    let mut warnings = artists.warnings;
    warnings.extend(shows.warnings);
    Ok(SourceData { artists: artists.rows, shows: shows.rows, warnings })
  }
}
