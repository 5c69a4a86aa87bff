use crate::driver::TrailingUnitPolicy;
use serde::Deserialize;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

pub const ENV_STEP_DELAY_MS: &str = "LOXPAD_STEP_DELAY_MS";
pub const ENV_TRAILING: &str = "LOXPAD_TRAILING";
pub const ENV_LOG: &str = "LOXPAD_LOG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid value for {name}: {message}")]
    Env { name: &'static str, message: String },
}

/// Settings read from an optional TOML file, then overlaid by `LOXPAD_*`
/// environment variables.
///
/// ```toml
/// [step]
/// delay_ms = 250
/// trailing = "drop"
///
/// [log]
/// filter = "loxpad=debug"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub step: StepConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StepConfig {
    pub delay_ms: u64,
    pub trailing: TrailingUnitPolicy,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            delay_ms: 500,
            trailing: TrailingUnitPolicy::Report,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "warn".to_string(),
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Reads `path` if given, then applies the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            None => Self::default(),
        };
        config.with_env(|name| std::env::var(name).ok())
    }

    /// Overlays environment values, which take precedence over the file.
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_STEP_DELAY_MS) {
            self.step.delay_ms = value.trim().parse().map_err(|e| ConfigError::Env {
                name: ENV_STEP_DELAY_MS,
                message: format!("{e}"),
            })?;
        }
        if let Some(value) = lookup(ENV_TRAILING) {
            self.step.trailing = value.trim().parse().map_err(|message| ConfigError::Env {
                name: ENV_TRAILING,
                message,
            })?;
        }
        if let Some(value) = lookup(ENV_LOG) {
            self.log.filter = value;
        }
        Ok(self)
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step.delay_ms)
    }
}
