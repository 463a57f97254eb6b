//! Habit list sources.
//!
//! A source owns the habit list and publishes every new version into a
//! [`tokio::sync::watch`] channel. The scheduler holds the receiving end and
//! reads the latest list on each tick; it never writes back.
//!
//! - [`ApiSource`]: polls the HealthyHabits backend (`GET {api}/habits`)
//! - [`FileSource`]: loads a JSON file and reloads it when it changes
//!
//! Both keep the last good list when a refresh fails.

use notify::RecommendedWatcher;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::types::HabitReminder;

pub mod api;
pub mod file;

pub use api::ApiSource;
pub use file::FileSource;

/// Errors that can occur while loading a habit list.
#[derive(Error, Debug)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend rejected the API token (401).
    #[error("authentication failed: API token rejected")]
    AuthFailed,

    /// The backend returned an unexpected status.
    #[error("server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// The habit list is not valid JSON or not an array.
    #[error("invalid habit list: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading the habit file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file watcher could not be set up.
    #[error("file watch error: {0}")]
    Watch(#[from] notify::Error),
}

/// Decodes a JSON array of habits.
///
/// Entries that cannot be decoded (for example, missing an `id`) are skipped
/// with a warning instead of rejecting the whole list.
///
/// # Errors
///
/// Returns `SourceError::Json` if the document is not a JSON array.
pub fn parse_habits(json: &str) -> Result<Vec<HabitReminder>, SourceError> {
    let entries: Vec<Value> = serde_json::from_str(json)?;
    let total = entries.len();

    let habits: Vec<HabitReminder> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value(entry) {
            Ok(habit) => Some(habit),
            Err(e) => {
                warn!(index, error = %e, "Skipping undecodable habit entry");
                None
            }
        })
        .collect();

    debug!(total, decoded = habits.len(), "Parsed habit list");
    Ok(habits)
}

/// Publishes `habits` unless it equals the current list.
///
/// Returns `true` when receivers were notified.
pub(crate) fn publish(tx: &watch::Sender<Vec<HabitReminder>>, habits: Vec<HabitReminder>) -> bool {
    tx.send_if_modified(|current| {
        if *current == habits {
            return false;
        }
        *current = habits;
        true
    })
}

/// Keeps a running source alive.
///
/// Dropping the handle stops the background task (and the file watcher, if
/// any), which closes the habit channel and stops the scheduler reading it.
#[derive(Debug)]
pub struct SourceHandle {
    task: JoinHandle<()>,
    _watcher: Option<RecommendedWatcher>,
}

impl SourceHandle {
    pub(crate) fn new(task: JoinHandle<()>, watcher: Option<RecommendedWatcher>) -> Self {
        Self {
            task,
            _watcher: watcher,
        }
    }

    /// Whether the source task is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for SourceHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;

    #[test]
    fn parse_habits_decodes_array() {
        let json = r#"[
            {"id": 1, "name": "Drink Water", "category": "hydration",
             "reminder_enabled": true, "reminder_time": "08:30:00", "today_done": false},
            {"id": 2, "name": "Read", "category": "reading"}
        ]"#;

        let habits = parse_habits(json).unwrap();
        assert_eq!(habits.len(), 2);
        assert_eq!(habits[0].category, Category::Hydration);
        assert!(!habits[1].reminder_enabled);
    }

    #[test]
    fn parse_habits_skips_bad_entries() {
        let json = r#"[{"name": "no id"}, {"id": "h2", "name": "Walk"}, 42]"#;

        let habits = parse_habits(json).unwrap();
        assert_eq!(habits.len(), 1);
        assert_eq!(habits[0].id.as_str(), "h2");
    }

    #[test]
    fn parse_habits_rejects_non_arrays() {
        assert!(matches!(
            parse_habits(r#"{"habits": []}"#),
            Err(SourceError::Json(_))
        ));
        assert!(parse_habits("not json").is_err());
    }

    #[test]
    fn publish_skips_identical_lists() {
        let habit = HabitReminder::new("h1", "Walk", Category::Fitness);
        let (tx, rx) = watch::channel(Vec::new());

        assert!(publish(&tx, vec![habit.clone()]));
        assert!(!publish(&tx, vec![habit]));
        assert_eq!(rx.borrow().len(), 1);
    }
}
