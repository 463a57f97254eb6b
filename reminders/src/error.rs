//! Error types for the HealthyHabits reminder daemon.
//!
//! Each subsystem has its own error enum ([`ConfigError`], [`SourceError`],
//! [`PlatformError`]); [`ReminderError`] wraps them for callers that drive the
//! whole daemon.

use thiserror::Error;

use crate::config::ConfigError;
use crate::platform::PlatformError;
use crate::source::SourceError;

/// Errors that can occur while running the reminder daemon.
///
/// # Examples
///
/// ```no_run
/// use healthyhabits_reminders::error::Result;
/// use healthyhabits_reminders::types::HabitReminder;
///
/// fn load() -> Result<Vec<HabitReminder>> {
///     let contents = std::fs::read_to_string("habits.json")?;
///     Ok(serde_json::from_str(&contents)?)
/// }
/// ```
#[derive(Error, Debug)]
pub enum ReminderError {
    /// Configuration-related error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Loading or refreshing the habit list failed.
    #[error("habit source error: {0}")]
    Source(#[from] SourceError),

    /// The notification platform failed.
    #[error("notification error: {0}")]
    Platform(#[from] PlatformError),

    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized `Result` type for reminder operations.
pub type Result<T> = std::result::Result<T, ReminderError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PermissionState;

    #[test]
    fn config_error_display() {
        let err = ReminderError::Config(ConfigError::MissingEnvVar(
            "HEALTHYHABITS_API_TOKEN".to_string(),
        ));
        assert_eq!(
            err.to_string(),
            "configuration error: missing required environment variable: HEALTHYHABITS_API_TOKEN"
        );
    }

    #[test]
    fn platform_error_conversion() {
        let err: ReminderError = PlatformError::NotPermitted(PermissionState::Denied).into();
        assert!(matches!(err, ReminderError::Platform(_)));
        assert!(err.to_string().starts_with("notification error:"));
    }

    #[test]
    fn source_error_conversion() {
        let err: ReminderError = SourceError::AuthFailed.into();
        assert_eq!(
            err.to_string(),
            "habit source error: authentication failed: API token rejected"
        );
    }

    #[test]
    fn io_error_keeps_source_chain() {
        use std::error::Error;

        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: ReminderError = io_err.into();
        assert!(matches!(err, ReminderError::Io(_)));
        assert!(err.source().is_some());
    }

    #[test]
    fn json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{ invalid").unwrap_err();
        let err: ReminderError = json_err.into();
        assert!(err.to_string().contains("JSON error"));
    }
}
