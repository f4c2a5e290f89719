pub mod config;
pub mod detector;
pub mod lineup;

use thiserror::Error;

pub use config::ScannerConfig;
pub use detector::LineupDetector;

#[derive(Debug, Error)]
pub enum ScannerError {
  #[error("config error: {0}")]
  Config(#[from] velour_config::ConfigError),

  #[error("invalid scanner config: {0}")]
  InvalidConfig(String),
}
