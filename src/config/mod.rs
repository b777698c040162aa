//! Configuration management.
//!
//! Settings are merged from the following sources, later ones overriding
//! earlier ones:
//! 1. Default values (hardcoded)
//! 2. Config file named by `CONFIG_PATH`
//! 3. Config file passed to [`WatchIndexSettings::load`]
//! 4. Environment variables prefixed `WATCH_INDEX__` (highest priority)
//!
//! List values (`index_by`, `ignore_fields`) may be given in the environment
//! as comma separated strings.

mod watcher;
pub use watcher::*;


use std::env;
use std::fmt::Debug;
use std::path::PathBuf;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct LogConfig {
    /// Directory for the log file. Logs go to stderr when unset.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct WatchIndexSettings {
    #[serde(default)]
    pub watcher: WatcherConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl WatchIndexSettings {
    /// Loads and validates settings.
    ///
    /// # Arguments
    /// * `path` - Optional config file applied on top of `CONFIG_PATH`
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("WATCH_INDEX")
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("watcher.index_by")
                .with_list_parse_key("watcher.ignore_fields"),
        );

        let settings: Self = builder.build()?.try_deserialize()?;
        settings.validate()
    }

    pub fn validate(self) -> Result<Self> {
        self.watcher.validate()?;
        Ok(self)
    }
}
