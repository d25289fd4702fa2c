//! Runtime server settings.

use std::path::{Path, PathBuf};

use factgraph_api::UserAccount;
use factgraph_core::provenance::{Organization, Source};
use serde::Deserialize;

/// Deserialised from `config.toml` layered under `FACTGRAPH_*` variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:          String,
  pub port:          u16,
  pub store_path:    PathBuf,
  #[serde(default)]
  pub users:         Vec<UserAccount>,
  /// Seeded at start-up; existing rows are left untouched.
  #[serde(default)]
  pub organizations: Vec<Organization>,
  #[serde(default)]
  pub sources:       Vec<Source>,
}

impl ServerConfig {
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("FACTGRAPH"))
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String {
    format!("{}:{}", self.host, self.port)
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
