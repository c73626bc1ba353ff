use std::path::PathBuf;

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::error::Result;

/// Where the SQLite store lives and which script seeds it.
///
/// Read from the `[store]` table of `sqlobject.toml` (optional) and from
/// `SQLOBJECT__STORE__*` environment variables, the latter winning.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct StoreConfig {
    /// Database file. Absent means an in-memory store.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// SQL script run when the store is opened and on every reset.
    #[serde(default)]
    pub seed: Option<PathBuf>,
}

impl StoreConfig {
    pub fn load() -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name("sqlobject.toml").required(false))
            .add_source(Environment::with_prefix("SQLOBJECT").separator("__"))
            .build()?;
        Self::from_settings(&settings)
    }
    pub fn from_toml(toml: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        Self::from_settings(&settings)
    }
    fn from_settings(settings: &Config) -> Result<Self> {
        // a missing [store] table just means defaults
        match settings.get::<Self>("store") {
            Ok(config) => Ok(config),
            Err(config::ConfigError::NotFound(_)) => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }
}
