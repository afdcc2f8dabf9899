//! Runtime configuration.
//!
//! Values come from a TOML file (by default
//! `<config dir>/codebreaker/config.toml`), then command-line overrides are
//! applied on top. Every field has a default, so partial files are fine.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const CONFIG_DIR: &str = "codebreaker";
const CONFIG_FILE: &str = "config.toml";

pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "google/gemini-2.0-flash-lite-preview-02-05:free";
pub const DEFAULT_API_KEY_ENV: &str = "OPENROUTER_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Who the player is up against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OpponentKind {
    #[default]
    Exhaustive,
    Oracle,
    /// No opponent: crack the computer's code alone.
    Practice,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub opponent: OpponentKind,
    /// Seed for secrets and tie-breaks; random when absent.
    pub seed: Option<u64>,
    pub oracle: OracleSettings,
}

/// Connection settings for the language-model oracle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleSettings {
    pub api_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub temperature: f32,
    /// Fall back to exhaustive search when the oracle is unavailable.
    pub fallback: bool,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_secs: 30,
            temperature: 0.7,
            fallback: true,
        }
    }
}

impl OracleSettings {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// API key from the configured environment variable, if set and non-empty.
    #[must_use]
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

pub fn parse_config(data: &str) -> Result<Config, ConfigError> {
    Ok(toml::from_str(data)?)
}

/// Load the config from `path`, or from the default location.
///
/// An explicit path must exist; a missing default file yields defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let (path, required) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => match default_config_path() {
            Some(p) => (p, false),
            None => return Ok(Config::default()),
        },
    };

    match fs::read_to_string(&path) {
        Ok(data) => parse_config(&data),
        Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("no config at {}, using defaults", path.display());
            Ok(Config::default())
        }
        Err(source) => Err(ConfigError::Io { path, source }),
    }
}
