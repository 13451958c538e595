//! Environment-driven configuration.
//!
//! Everything has a default except the remote credentials, which are only
//! needed when `HABIT_STORAGE=remote`.

use crate::errors::StoreError;
use crate::labels::LabelTable;
use crate::models::{ChartStyle, Period};
use std::{env, path::PathBuf};
use thiserror::Error;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_PATH: &str = "data/habits.json";
const DEFAULT_REMOTE_PATH: &str = "habits.json";
const DEFAULT_API_BASE: &str = "https://api.github.com";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub storage: StorageConfig,
    pub default_period: Period,
    pub chart_style: ChartStyle,
    pub labels: LabelTable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Local { path: PathBuf },
    Remote(RemoteConfig),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub token: Option<String>,
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub path: String,
    pub branch: Option<String>,
    pub api_base: String,
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            token: None,
            owner: None,
            repo: None,
            path: DEFAULT_REMOTE_PATH.to_string(),
            branch: None,
            api_base: DEFAULT_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl RemoteConfig {
    pub fn validate(&self) -> Result<(), StoreError> {
        let missing: Vec<&str> = [
            ("token", &self.token),
            ("owner", &self.owner),
            ("repo", &self.repo),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(StoreError::ConfigurationMissing(format!(
                "remote storage needs {}",
                missing.join(", ")
            )))
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| invalid("PORT", e))?,
            None => DEFAULT_PORT,
        };

        let storage = match get("HABIT_STORAGE").as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("local") => StorageConfig::Local {
                path: get("HABIT_DATA_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH)),
            },
            Some("remote") => StorageConfig::Remote(RemoteConfig {
                token: get("HABIT_REMOTE_TOKEN"),
                owner: get("HABIT_REMOTE_OWNER"),
                repo: get("HABIT_REMOTE_REPO"),
                path: get("HABIT_REMOTE_PATH").unwrap_or_else(|| DEFAULT_REMOTE_PATH.to_string()),
                branch: get("HABIT_REMOTE_BRANCH"),
                api_base: get("HABIT_REMOTE_API").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
                timeout_secs: match get("HABIT_REMOTE_TIMEOUT_SECS") {
                    Some(raw) => match raw.parse::<u64>() {
                        Ok(0) => {
                            return Err(invalid(
                                "HABIT_REMOTE_TIMEOUT_SECS",
                                "timeout must be at least one second",
                            ));
                        }
                        Ok(secs) => secs,
                        Err(e) => return Err(invalid("HABIT_REMOTE_TIMEOUT_SECS", e)),
                    },
                    None => DEFAULT_TIMEOUT_SECS,
                },
            }),
            Some(other) => {
                return Err(invalid(
                    "HABIT_STORAGE",
                    format!("expected 'local' or 'remote', got '{other}'"),
                ));
            }
        };

        let default_period = match get("HABIT_PERIOD") {
            Some(raw) => raw.parse::<Period>().map_err(|e| invalid("HABIT_PERIOD", e))?,
            None => Period::default(),
        };

        let chart_style = match get("HABIT_CHART_STYLE") {
            Some(raw) => raw
                .parse::<ChartStyle>()
                .map_err(|e| invalid("HABIT_CHART_STYLE", e))?,
            None => ChartStyle::default(),
        };

        let labels = match get("HABIT_LABELS") {
            Some(raw) => LabelTable::default()
                .with_overrides(&raw)
                .map_err(|e| invalid("HABIT_LABELS", e))?,
            None => LabelTable::default(),
        };

        Ok(Self {
            port,
            storage,
            default_period,
            chart_style,
            labels,
        })
    }
}

fn invalid(key: &'static str, err: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        key,
        message: err.to_string(),
    }
}
