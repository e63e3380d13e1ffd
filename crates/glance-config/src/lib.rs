use std::env;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use glance_types::RegionError;
use serde::Serialize;

use self::analyzer::AnalyzerConfig;
use self::capture::CaptureConfig;
use self::hotkey::HotkeyConfig;
use self::logging::LogConfig;
use self::notify::NotifyConfig;
use self::pipeline::PipelineConfig;

pub mod analyzer;
pub mod capture;
pub mod hotkey;
pub mod logging;
pub mod notify;
pub mod pipeline;

/// Process-wide settings, read once at startup and shared behind an `Arc`
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub analyzer: AnalyzerConfig,
    pub capture: CaptureConfig,
    pub hotkey: HotkeyConfig,
    pub log: LogConfig,
    pub notify: NotifyConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required setting {key}")]
    Missing { key: &'static str },

    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid {key}: {source}")]
    Region {
        key: &'static str,
        #[source]
        source: RegionError,
    },

    #[error("failed to load env file {path}: {reason}")]
    EnvFile { path: String, reason: String },
}

impl Config {
    /// Load `.env` (if present) and build the config from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv()
            && !e.not_found()
        {
            return Err(ConfigError::EnvFile {
                path: ".env".to_string(),
                reason: e.to_string(),
            });
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Config::from_env`] but with an explicit env file, which must exist
    pub fn from_env_file(path: &Path) -> Result<Self, ConfigError> {
        dotenvy::from_path(path).map_err(|e| ConfigError::EnvFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Lookup(&lookup);

        let config = Config {
            analyzer: AnalyzerConfig::from_lookup(&env)?,
            capture: CaptureConfig::from_lookup(&env)?,
            hotkey: HotkeyConfig::from_lookup(&env)?,
            log: LogConfig::from_lookup(&env),
            notify: NotifyConfig::from_lookup(&env),
            pipeline: PipelineConfig::from_lookup(&env)?,
        };
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.capture
            .region
            .validate()
            .map_err(|source| ConfigError::Region {
                key: capture::CAPTURE_BBOX,
                source,
            })?;
        self.hotkey.validate()?;
        self.pipeline.validate()?;
        Ok(())
    }
}

/// Key lookup shared by the section loaders
pub(crate) struct Lookup<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Lookup<'_> {
    /// Value for `key`, trimmed, with empty strings treated as unset
    pub(crate) fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    pub(crate) fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.get(key).ok_or(ConfigError::Missing { key })
    }

    pub(crate) fn parse_or<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.get(key) {
            Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
                key,
                reason: e.to_string(),
                value,
            }),
            None => Ok(default),
        }
    }

    pub(crate) fn flag_or(&self, key: &'static str, default: bool) -> Result<bool, ConfigError> {
        match self.get(key) {
            Some(value) => parse_flag(&value).ok_or_else(|| ConfigError::Invalid {
                key,
                value,
                reason: "expected true/false, yes/no, on/off or 1/0".to_string(),
            }),
            None => Ok(default),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
