use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// strftime format for event timestamps, epoch seconds by default
    pub time_format: String,
    pub prompt: String,
    /// events buffered for the printer before producers have to wait
    pub event_buffer: usize,
    pub dispatcher: DispatcherConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DispatcherConfig {
    /// longest the dispatcher sleeps without being woken by a new request
    pub idle_wait_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            time_format: "%s".to_string(),
            prompt: "Alarm> ".to_string(),
            event_buffer: 64,
            dispatcher: DispatcherConfig::default(),
        }
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self { idle_wait_ms: 500 }
    }
}

impl DispatcherConfig {
    #[must_use]
    pub const fn idle_wait(&self) -> Duration {
        Duration::from_millis(self.idle_wait_ms)
    }
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// Fails if the file can't be read or isn't valid TOML for a config.
    pub fn load(path: &Path) -> Result<Self> {
        let config = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&config)?)
    }

    /// Loads `path`, or falls back to the defaults when nothing is there.
    ///
    /// # Errors
    /// Fails if an existing file can't be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            log::info!("no config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// # Errors
    /// Fails if the config can't be serialized or the file can't be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let config = toml::to_string(self)?;
        let io_error = |source: std::io::Error| Error::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(io_error)?;
        }
        std::fs::write(path, config).map_err(io_error)
    }

    /// # Errors
    /// Returns [`Error::NoConfigDir`] when no home directory is known.
    pub fn config_path() -> Result<PathBuf> {
        let mut path = directories::ProjectDirs::from("", "", "periodic_alarms")
            .ok_or(Error::NoConfigDir)?
            .config_dir()
            .to_path_buf();
        path.push("config.toml");
        Ok(path)
    }
}
