mod backend;
mod paths;

pub use backend::{ConfigBackend, TomlConfigBackend};
pub use paths::{BASE_DIR_ENV, ConfigError, VelourPaths};

use once_cell::sync::OnceCell;

// Paths del proceso (portable / sistema), resueltos una sola vez.
static PATHS: OnceCell<VelourPaths> = OnceCell::new();

// Backend de config sobre `PATHS`.
static CONFIG_BACKEND: OnceCell<TomlConfigBackend> = OnceCell::new();

pub fn paths() -> Result<&'static VelourPaths, ConfigError> {
  PATHS.get_or_try_init(VelourPaths::detect)
}

pub fn config_backend() -> Result<&'static TomlConfigBackend, ConfigError> {
  CONFIG_BACKEND.get_or_try_init(|| Ok(TomlConfigBackend::new(paths()?)))
}
