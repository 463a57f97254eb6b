//! Configuration for the reminder daemon.
//!
//! This module handles parsing configuration from environment variables.
//!
//! # Environment Variables
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `HEALTHYHABITS_API_URL` | No | - | Backend base URL (e.g., `https://host/api`); enables the API source |
//! | `HEALTHYHABITS_API_TOKEN` | With API URL | - | Bearer token for the backend |
//! | `HEALTHYHABITS_HABITS_FILE` | No | `~/.healthyhabits/habits.json` | Habit list file, used when no API URL is set |
//! | `HEALTHYHABITS_REFRESH_INTERVAL_SECS` | No | 300 | Seconds between API refreshes |
//! | `HEALTHYHABITS_POLL_INTERVAL_SECS` | No | 60 | Seconds between reminder checks |
//! | `HEALTHYHABITS_AUTO_DISMISS_SECS` | No | 8 | Seconds a reminder stays open |
//! | `HEALTHYHABITS_WEBHOOK_URL` | No | - | Deliver reminders to this URL instead of the terminal |
//! | `HEALTHYHABITS_DEVICE_ID` | No | hostname | Device identifier sent with webhook reminders |
//!
//! # Example
//!
//! ```no_run
//! use healthyhabits_reminders::config::Config;
//!
//! let config = Config::from_env().expect("Failed to load configuration");
//! println!("Polling every {:?}", config.poll_interval);
//! ```

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use directories::BaseDirs;
use thiserror::Error;

use crate::notifier::DEFAULT_AUTO_DISMISS_SECS;
use crate::scheduler::{SchedulerConfig, DEFAULT_POLL_INTERVAL_SECS};
use crate::source::api::DEFAULT_REFRESH_INTERVAL_SECS;

/// Default data directory name relative to home.
const DEFAULT_DATA_DIR: &str = ".healthyhabits";

/// Default habit file name inside the data directory.
const DEFAULT_HABITS_FILE: &str = "habits.json";

/// Errors that can occur during configuration parsing.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Environment variable has an invalid value.
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to determine home directory.
    #[error("failed to determine home directory")]
    NoHomeDirectory,
}

/// Where the habit list comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HabitSourceConfig {
    /// The HealthyHabits backend.
    Api {
        /// Base URL, without the `/habits` suffix.
        url: String,
        /// Bearer token.
        token: String,
    },
    /// A local JSON file.
    File(PathBuf),
}

/// Configuration for the reminder daemon.
#[derive(Debug, Clone)]
pub struct Config {
    /// Habit list source.
    pub habit_source: HabitSourceConfig,

    /// Time between API refreshes. Unused by the file source.
    pub refresh_interval: Duration,

    /// Time between reminder checks.
    pub poll_interval: Duration,

    /// How long a reminder stays open if not dismissed.
    pub auto_dismiss: Duration,

    /// Optional webhook for delivering reminders.
    /// If `None`, reminders are printed to the terminal.
    pub webhook_url: Option<String>,

    /// Identifies this device in webhook payloads.
    pub device_id: String,
}

impl Config {
    /// Creates a new `Config` by parsing environment variables.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if:
    /// - `HEALTHYHABITS_API_URL` is set but `HEALTHYHABITS_API_TOKEN` is not
    /// - an interval is not a positive integer
    /// - the home directory cannot be determined (needed for the default habit file)
    pub fn from_env() -> Result<Self, ConfigError> {
        let habit_source = match non_empty_var("HEALTHYHABITS_API_URL") {
            Some(url) => {
                let token = non_empty_var("HEALTHYHABITS_API_TOKEN").ok_or_else(|| {
                    ConfigError::MissingEnvVar("HEALTHYHABITS_API_TOKEN".to_string())
                })?;
                HabitSourceConfig::Api { url, token }
            }
            None => {
                let path = match non_empty_var("HEALTHYHABITS_HABITS_FILE") {
                    Some(path) => PathBuf::from(path),
                    None => default_habits_file()?,
                };
                HabitSourceConfig::File(path)
            }
        };

        let refresh_interval = parse_secs(
            "HEALTHYHABITS_REFRESH_INTERVAL_SECS",
            DEFAULT_REFRESH_INTERVAL_SECS,
        )?;
        let poll_interval =
            parse_secs("HEALTHYHABITS_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)?;
        let auto_dismiss =
            parse_secs("HEALTHYHABITS_AUTO_DISMISS_SECS", DEFAULT_AUTO_DISMISS_SECS)?;

        let webhook_url = non_empty_var("HEALTHYHABITS_WEBHOOK_URL");
        let device_id = non_empty_var("HEALTHYHABITS_DEVICE_ID").unwrap_or_else(get_hostname);

        Ok(Self {
            habit_source,
            refresh_interval,
            poll_interval,
            auto_dismiss,
            webhook_url,
            device_id,
        })
    }

    /// Scheduler timing taken from this configuration.
    #[must_use]
    pub fn scheduler(&self) -> SchedulerConfig {
        SchedulerConfig {
            poll_interval: self.poll_interval,
            auto_dismiss: self.auto_dismiss,
        }
    }
}

/// `~/.healthyhabits/habits.json`.
///
/// # Errors
///
/// Returns `ConfigError::NoHomeDirectory` if there is no home directory.
pub fn default_habits_file() -> Result<PathBuf, ConfigError> {
    let base_dirs = BaseDirs::new().ok_or(ConfigError::NoHomeDirectory)?;
    Ok(base_dirs
        .home_dir()
        .join(DEFAULT_DATA_DIR)
        .join(DEFAULT_HABITS_FILE))
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

/// Parses a whole number of seconds, which must be at least 1.
fn parse_secs(key: &str, default: u64) -> Result<Duration, ConfigError> {
    let Some(val) = non_empty_var(key) else {
        return Ok(Duration::from_secs(default));
    };

    let secs = val.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("expected positive integer, got '{val}'"),
    })?;
    if secs == 0 {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "must be at least 1 second".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

/// Gets the system hostname, falling back to "unknown" if it cannot be determined.
fn get_hostname() -> String {
    gethostname::gethostname()
        .into_string()
        .unwrap_or_else(|_| "unknown".to_string())
}
