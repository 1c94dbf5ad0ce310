use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::sensors::CollisionStrategy;

const CONFIG_DIR: &str = ".kanban";
const CONFIG_FILE: &str = "config.toml";
const DEFAULT_STORE_FILE: &str = "boards.json";

/// Upper bound accepted for the sync debounce window.
pub const MAX_DEBOUNCE_MS: u64 = 10_000;

/// Top-level project configuration loaded from `.kanban/config.toml`.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct ProjectConfig {
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub sensors: SensorConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

impl ProjectConfig {
    /// Load configuration from a working directory, falling back to defaults
    /// when no config file exists.
    ///
    /// # Errors
    /// Returns an error when the file cannot be read, parsed or validated.
    pub fn from_workdir(workdir: impl AsRef<Path>) -> Result<Self> {
        let config_path = workdir.as_ref().join(CONFIG_DIR).join(CONFIG_FILE);
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        Self::parse(&contents).with_context(|| format!("failed to parse {}", config_path.display()))
    }

    /// Parse and validate configuration text.
    ///
    /// # Errors
    /// Returns an error on malformed TOML or out-of-range values.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Absolute location of the board database for `workdir`.
    #[must_use]
    pub fn store_path(&self, workdir: impl AsRef<Path>) -> PathBuf {
        let path = self.store.path.as_deref().map_or_else(
            || Path::new(CONFIG_DIR).join(DEFAULT_STORE_FILE),
            Path::to_path_buf,
        );
        if path.is_absolute() {
            path
        } else {
            workdir.as_ref().join(path)
        }
    }

    fn validate(&self) -> Result<()> {
        if self.sync.debounce_ms > MAX_DEBOUNCE_MS {
            bail!(
                "sync.debounce_ms must be at most {MAX_DEBOUNCE_MS} (got {})",
                self.sync.debounce_ms
            );
        }
        if self.sensors.touch_tolerance == 0 {
            bail!("sensors.touch_tolerance must be greater than zero");
        }
        Ok(())
    }
}

/// Debounce settings for remote writes.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct SyncConfig {
    /// Quiet period before a batch is written, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl SyncConfig {
    /// Debounce window as a [`Duration`].
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

const fn default_debounce_ms() -> u64 {
    300
}

/// Activation constraints and hit-testing for gesture sensors.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SensorConfig {
    /// Cells the pointer must travel before a press becomes a drag.
    pub pointer_distance: u16,
    /// Hold time before a touch press becomes a drag.
    pub touch_delay_ms: u64,
    /// Cells a touch may wander during the hold before it is abandoned.
    pub touch_tolerance: u16,
    /// Drop-target resolution strategy.
    pub collision: CollisionStrategy,
}

impl SensorConfig {
    /// Touch hold time as a [`Duration`].
    #[must_use]
    pub const fn touch_delay(&self) -> Duration {
        Duration::from_millis(self.touch_delay_ms)
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            pointer_distance: 1,
            touch_delay_ms: 250,
            touch_tolerance: 5,
            collision: CollisionStrategy::default(),
        }
    }
}

/// Board database location.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct StoreConfig {
    /// Database file; relative paths resolve against the working directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}
