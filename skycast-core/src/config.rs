use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_ENDPOINT: &str = "https://weather-app-backend-g5xy.onrender.com";
pub const DEFAULT_ICON_HOST: &str = "https://openweathermap.org/img/wn";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Sizes of the favorites list and the two forecast panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum number of pinned cities.
    pub favorites_capacity: usize,
    /// Number of forecast entries shown in the hourly strip.
    pub hourly_window: usize,
    /// Maximum number of weekday groups in the weekly list.
    pub weekly_days: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self { favorites_capacity: 3, hourly_window: 8, weekly_days: 7 }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// endpoint = "https://weather-app-backend-g5xy.onrender.com"
/// icon_host = "https://openweathermap.org/img/wn"
///
/// [limits]
/// favorites_capacity = 3
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the weather backend; `/weather` is appended.
    pub endpoint: String,

    /// Base URL icon codes are resolved against.
    pub icon_host: String,

    pub request_timeout_secs: u64,

    /// Overrides the platform data directory for the favorites file.
    pub favorites_file: Option<PathBuf>,

    pub limits: Limits,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            icon_host: DEFAULT_ICON_HOST.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            favorites_file: None,
            limits: Limits::default(),
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        cfg.validate()?;
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Where favorites are persisted: the configured override, else the platform data dir.
    pub fn favorites_file_path(&self) -> Result<PathBuf> {
        match &self.favorites_file {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.data_dir().join("storage.json")),
        }
    }

    /// Full URL of the weather lookup route.
    pub fn weather_url(&self) -> String {
        format!("{}/weather", self.endpoint.trim_end_matches('/'))
    }

    fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(anyhow!("Config field `endpoint` must not be empty"));
        }
        if self.request_timeout_secs == 0 {
            return Err(anyhow!("Config field `request_timeout_secs` must be at least 1"));
        }
        if self.limits.favorites_capacity == 0 {
            return Err(anyhow!("Config field `limits.favorites_capacity` must be at least 1"));
        }
        Ok(())
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "skycast", "skycast")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}
