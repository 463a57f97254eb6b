//! HealthyHabits reminder daemon.
//!
//! This crate watches a user's habit list and raises one notification per
//! habit per day, at the minute the user chose for it.
//!
//! # Overview
//!
//! A habit source (the HealthyHabits API or a local JSON file) publishes the
//! current habit list. The scheduler wakes every poll interval, picks the
//! habits whose reminder minute is now, and hands them to a notification
//! platform. A fired-today set, cleared at local midnight, keeps each habit to
//! a single reminder per day.
//!
//! # Modules
//!
//! - [`types`]: Habit records, categories and reminder times
//! - [`evaluator`]: The due-set rule
//! - [`fired`]: Per-day record of habits already reminded
//! - [`notifier`]: Reminder messages and notification display
//! - [`permission`]: Notification permission, asked at most once
//! - [`platform`]: Notification platforms (terminal, webhook, recording)
//! - [`scheduler`]: Poll loop and midnight reset
//! - [`source`]: Habit list sources (API and file)
//! - [`clock`]: Wall-clock access and midnight arithmetic
//! - [`config`]: Configuration from environment variables
//! - [`error`]: Error types for daemon operations

pub mod clock;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod fired;
pub mod notifier;
pub mod permission;
pub mod platform;
pub mod scheduler;
pub mod source;
pub mod types;

pub use clock::{Clock, SimulatedClock, SystemClock};
pub use config::{Config, ConfigError, HabitSourceConfig};
pub use error::{ReminderError, Result};
pub use evaluator::{due_habits, eligibility, Eligibility};
pub use fired::FiredToday;
pub use notifier::{reminder_message, reminder_tag, Notifier, NOTIFICATION_TITLE};
pub use permission::PermissionGate;
pub use platform::{
    NotificationHandle, NotificationPlatform, NotificationRequest, PermissionState,
    PlatformError, RecordingPlatform, TerminalPlatform, WebhookPlatform,
};
pub use scheduler::{spawn, ReminderScheduler, SchedulerConfig, SchedulerHandle, TickOutcome};
pub use source::{ApiSource, FileSource, SourceError, SourceHandle};
pub use types::{Category, HabitId, HabitReminder, ReminderTime};
