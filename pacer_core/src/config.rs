//! Configuration file support for Pacer.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/pacer/config.toml`.

use crate::blocks::BlockPolicy;
use crate::ticker::TickConfig;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub audio: AudioConfig,
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

/// Session engine parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Length of one engine second, in milliseconds
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,

    #[serde(default = "default_rest_seconds")]
    pub default_rest_seconds: u32,

    #[serde(default = "default_min_generated_sets")]
    pub min_generated_sets: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_millis: default_tick_millis(),
            default_rest_seconds: default_rest_seconds(),
            min_generated_sets: default_min_generated_sets(),
        }
    }
}

/// Cue and speech output
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AudioConfig {
    #[serde(default)]
    pub muted: bool,

    #[serde(default = "default_announce")]
    pub announce: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            muted: false,
            announce: default_announce(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pacer")
}

fn default_tick_millis() -> u64 {
    1000
}

fn default_rest_seconds() -> u32 {
    30
}

fn default_min_generated_sets() -> u32 {
    3
}

fn default_announce() -> bool {
    true
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pacer")
            .join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.engine.tick_millis == 0 {
            return Err(Error::Config("engine.tick_millis must be at least 1".into()));
        }
        Ok(())
    }

    /// Defaulting policy for the block model
    pub fn block_policy(&self) -> BlockPolicy {
        BlockPolicy {
            min_generated_sets: self.engine.min_generated_sets,
            default_rest_seconds: self.engine.default_rest_seconds,
        }
    }

    pub fn tick_config(&self) -> TickConfig {
        TickConfig {
            period: Duration::from_millis(self.engine.tick_millis.max(1)),
        }
    }

    /// Session log inside the data directory
    pub fn sessions_path(&self) -> PathBuf {
        self.data.data_dir.join(crate::store::SESSIONS_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.engine.tick_millis, 1000);
        assert_eq!(config.block_policy(), BlockPolicy::default());
        assert!(!config.audio.muted);
        assert!(config.audio.announce);
        assert!(config.sessions_path().ends_with("pacer/sessions.jsonl"));
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("pacer").join("config.toml");

        let mut config = Config::default();
        config.engine.min_generated_sets = 2;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.engine.min_generated_sets, 2);
        assert_eq!(loaded.data.data_dir, config.data.data_dir);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[engine]
tick_millis = 250

[audio]
muted = true
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.tick_config().period, Duration::from_millis(250));
        assert_eq!(config.engine.default_rest_seconds, 30); // default
        assert!(config.audio.muted);
        assert!(config.audio.announce); // default
    }

    #[test]
    fn test_zero_tick_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[engine]\ntick_millis = 0\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }
}
