use anyhow::{Context, Result, anyhow};
use chrono::{Datelike, NaiveDate};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::forecast::DEFAULT_WINDOW_DAYS;
use crate::model::YearRange;

/// First year of the historical record requested by default.
pub const DEFAULT_START_YEAR: i32 = 1994;

/// Historical year range. An unset `end_year` means the current year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub start_year: i32,
    pub end_year: Option<i32>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { start_year: DEFAULT_START_YEAR, end_year: None }
    }
}

impl HistoryConfig {
    /// Effective range for a request made on `today`.
    pub fn year_range(&self, today: NaiveDate) -> Result<YearRange> {
        let end = self.end_year.unwrap_or_else(|| today.year());
        if self.start_year > end {
            return Err(anyhow!(
                "Invalid history range: start year {} is after end year {}.\n\
                 Hint: run `climate configure` to fix the year range.",
                self.start_year,
                end
            ));
        }
        Ok(YearRange { start: self.start_year, end })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Forecast coverage in days after today, inclusive.
    pub window_days: u32,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self { window_days: DEFAULT_WINDOW_DAYS }
    }
}

/// Per-request timeouts, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub history_secs: u64,
    pub forecast_secs: u64,
    pub air_quality_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { history_secs: 30, forecast_secs: 10, air_quality_secs: 10 }
    }
}

impl TimeoutConfig {
    pub fn history(&self) -> Duration {
        Duration::from_secs(self.history_secs)
    }

    pub fn forecast(&self) -> Duration {
        Duration::from_secs(self.forecast_secs)
    }

    pub fn air_quality(&self) -> Duration {
        Duration::from_secs(self.air_quality_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub history_url: String,
    pub forecast_url: String,
    pub air_quality_url: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            history_url: "https://power.larc.nasa.gov/api/temporal/daily/point".to_string(),
            forecast_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            air_quality_url: "https://air-quality-api.open-meteo.com/v1/air-quality".to_string(),
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// [history]
/// start_year = 1994
///
/// [timeouts]
/// history_secs = 30
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub history: HistoryConfig,
    pub forecast: ForecastConfig,
    pub timeouts: TimeoutConfig,
    pub endpoints: EndpointConfig,
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(contents)?;
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "climate-outlook", "climate-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
