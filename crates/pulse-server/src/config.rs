//! Server configuration: an optional TOML file layered with `PULSE_`
//! environment variables.

use std::path::{Path, PathBuf};

use ::config::{
  Config, ConfigBuilder, Environment, File, builder::DefaultState,
};
use anyhow::Context as _;
use pulse_core::QueryConfig;
use serde::Deserialize;

/// Runtime configuration, deserialised from `pulse.toml`.
///
/// Nested keys use a double underscore in the environment, e.g.
/// `PULSE_QUERY__CACHE_TTL_SECS=60`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  pub query:      QueryConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".into(),
      port:       8000,
      store_path: PathBuf::from("pulse.db"),
      query:      QueryConfig::default(),
    }
  }
}

impl ServerConfig {
  /// Load from `path` (which may be absent) and the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    Self::from_builder(
      Config::builder().add_source(File::from(path).required(false)),
    )
  }

  fn from_builder(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<Self> {
    builder
      .add_source(
        Environment::with_prefix("PULSE")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()
      .context("failed to read config file")?
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// The store path with a leading `~` expanded to the home directory.
  pub fn store_path(&self) -> PathBuf {
    let s = self.store_path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/")
      && let Ok(home) = std::env::var("HOME")
    {
      return PathBuf::from(home).join(rest);
    }
    self.store_path.clone()
  }
}
