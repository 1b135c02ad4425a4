//! Configuration file support for Trainer.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/trainer/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub history: HistoryConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub cues: CueConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Workout history configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_max_items")]
    pub max_items: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_items: default_max_items(),
        }
    }
}

/// Workout runner configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineConfig {
    /// Length of one tick in milliseconds (used by the timer driver)
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,

    /// Insert `rest_between_exercise` rest slots when a workout has none
    #[serde(default)]
    pub insert_rest: bool,

    /// Whether finishing a rest slot counts towards `exercises_done`
    #[serde(default = "default_count_rest")]
    pub count_rest: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_millis: default_tick_millis(),
            insert_rest: false,
            count_rest: default_count_rest(),
        }
    }
}

/// Audio cue timing configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CueConfig {
    #[serde(default = "default_about_to_complete_secs")]
    pub about_to_complete_secs: u32,

    #[serde(default = "default_next_up_delay_ms")]
    pub next_up_delay_ms: u64,

    #[serde(default = "default_next_up_exercise_delay_ms")]
    pub next_up_exercise_delay_ms: u64,
}

impl Default for CueConfig {
    fn default() -> Self {
        Self {
            about_to_complete_secs: default_about_to_complete_secs(),
            next_up_delay_ms: default_next_up_delay_ms(),
            next_up_exercise_delay_ms: default_next_up_exercise_delay_ms(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        PathBuf::from(home).join(".local/share")
    });
    base.join("trainer")
}

fn default_max_items() -> usize {
    20
}

fn default_tick_millis() -> u64 {
    1000
}

fn default_count_rest() -> bool {
    true
}

fn default_about_to_complete_secs() -> u32 {
    3
}

fn default_next_up_delay_ms() -> u64 {
    2000
}

fn default_next_up_exercise_delay_ms() -> u64 {
    3000
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.check()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(".config")
        });
        base.join("trainer").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    fn check(&self) -> Result<()> {
        if self.history.max_items == 0 {
            return Err(Error::Config("history.max_items must be at least 1".into()));
        }
        if self.engine.tick_millis == 0 {
            return Err(Error::Config("engine.tick_millis must be at least 1".into()));
        }
        Ok(())
    }
}
