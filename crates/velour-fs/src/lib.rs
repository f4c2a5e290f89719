use std::path::PathBuf;

use thiserror::Error;

pub mod io;
pub mod json;
pub mod source;
pub mod tabular;

pub use io::{atomic_write, atomic_write_str};
pub use source::CsvSource;
pub use tabular::{Parsed, read_artists_file, read_shows_file, write_artists_file, write_shows_file};

#[derive(Debug, Error)]
pub enum FsError {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("invalid json in {}: {source}", path.display())]
  Json { path: PathBuf, source: serde_json::Error },
}
