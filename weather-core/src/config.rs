use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::provider::QueryParams;

/// Environment variable that takes precedence over the stored API key.
pub const API_KEY_ENV: &str = "WEATHER_NOW_API_KEY";

pub const DEFAULT_UNIT: &str = "c";
pub const DEFAULT_LANGUAGE: &str = "zh-Hans";

/// Fixed parameters every fetch is made with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryConfig {
    /// Credential passed to the weather service on every request.
    pub api_key: String,
    /// Temperature unit understood by the service (`"c"` or `"f"`).
    pub unit: String,
    /// Language for condition text and location paths.
    pub language: String,
    /// Drop results of a fetch once a newer one has been started.
    ///
    /// Off by default: concurrent fetches race and the last one to complete
    /// wins, even if it was requested first.
    pub discard_superseded: bool,
}

impl QueryConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Parameters for one fetch of `location`.
    pub fn params_for(&self, location: &str) -> QueryParams {
        QueryParams {
            api_key: self.api_key.clone(),
            unit: self.unit.clone(),
            language: self.language.clone(),
            location: location.to_string(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            unit: DEFAULT_UNIT.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            discard_superseded: false,
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// unit = "c"
/// language = "zh-Hans"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    pub api_key: Option<String>,
    pub unit: Option<String>,
    pub language: Option<String>,
    /// Override for the weather service URL.
    pub endpoint: Option<String>,
    #[serde(default)]
    pub discard_superseded: bool,
}

impl Config {
    /// Build the controller configuration, preferring the API key from the
    /// environment over the one on disk.
    pub fn query_config(&self) -> Result<QueryConfig> {
        let api_key = env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| self.api_key.clone())
            .ok_or_else(|| {
                anyhow!(
                    "No API key configured.\n\
                     Hint: run `weather configure` or set {API_KEY_ENV}."
                )
            })?;

        Ok(QueryConfig {
            api_key,
            unit: self.unit.clone().unwrap_or_else(|| DEFAULT_UNIT.to_string()),
            language: self
                .language
                .clone()
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            discard_superseded: self.discard_superseded,
        })
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
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

    /// Path to the saved-locations file.
    pub fn locations_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.data_dir().join("locations.json"))
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "weather-now", "weather-cli")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}
