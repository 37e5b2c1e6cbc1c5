use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}, str::FromStr};
use tracing::Level;

use crate::subject::{FailurePolicy, WeatherStation};

/// A single reading to replay through a station.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub temperature: f64,
    pub humidity: f64,
    /// Readings without pressure go through the sea-level overload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
}

impl Reading {
    pub const fn new(temperature: f64, humidity: f64, pressure: Option<f64>) -> Self {
        Self { temperature, humidity, pressure }
    }

    /// Record this reading on `station`, notifying its observers.
    pub fn apply(&self, station: &mut WeatherStation) -> Result<()> {
        match self.pressure {
            Some(pressure) => station.set_measurements(self.temperature, self.humidity, pressure)?,
            None => station.set_measurements_at_sea_level(self.temperature, self.humidity)?,
        }
        Ok(())
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    /// One of "trace", "debug", "info", "warn", "error".
    pub log_level: String,

    pub failure_policy: FailurePolicy,

    /// Example TOML:
    /// [[readings]]
    /// temperature = 25.0
    /// humidity = 65.0
    /// pressure = 1013.0
    pub readings: Vec<Reading>,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            failure_policy: FailurePolicy::default(),
            readings: vec![
                Reading::new(25.0, 65.0, Some(1013.0)),
                Reading::new(22.5, 70.0, None),
                Reading::new(28.3, 55.0, Some(1009.8)),
            ],
        }
    }
}

impl StationConfig {
    /// Parse `log_level` into a `tracing` level.
    pub fn tracing_level(&self) -> Result<Level> {
        Level::from_str(&self.log_level).map_err(|_| {
            anyhow!(
                "Invalid log level '{}'. Expected one of: trace, debug, info, warn, error.",
                self.log_level
            )
        })
    }

    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let cfg: StationConfig = toml::from_str(contents)?;
        cfg.tracing_level()?;
        Ok(cfg)
    }

    /// Write the config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, self.to_toml()?)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-station", "weather-station")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
