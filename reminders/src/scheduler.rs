//! Habit reminder scheduler.
//!
//! The scheduler wakes on a fixed cadence (60 seconds by default), reads the
//! current habit list and fires a notification for every habit whose reminder
//! minute is now. A per-day [`FiredToday`] set keeps each habit to one
//! reminder per calendar day; it is cleared by a one-shot timer that re-arms
//! itself at every local midnight, and by the next poll that sees a new date
//! (after a suspend or a wall-clock step the timer may not have fired).
//!
//! # Architecture
//!
//! [`ReminderScheduler`] is the synchronous core: one [`tick`] evaluates the
//! full habit list and marks fired habits before returning, so there is no
//! window between "has it fired" and "mark fired".
//!
//! [`spawn`] drives the core from a single Tokio task that owns both timers:
//!
//! 1. The poll interval, whose first tick is one period after start
//! 2. The midnight sleep, recomputed from the calendar after every firing
//!
//! Dropping or shutting down the [`SchedulerHandle`] ends that task, which
//! cancels both timers together. The task also ends when the habit source
//! drops its end of the habit channel.
//!
//! [`tick`]: ReminderScheduler::tick
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio::sync::watch;
//! use healthyhabits_reminders::clock::SystemClock;
//! use healthyhabits_reminders::platform::TerminalPlatform;
//! use healthyhabits_reminders::scheduler::{spawn, SchedulerConfig};
//! use healthyhabits_reminders::types::{Category, HabitReminder};
//!
//! #[tokio::main]
//! async fn main() {
//!     let habits = vec![
//!         HabitReminder::new("h1", "Drink Water", Category::Hydration).with_reminder("08:30"),
//!     ];
//!     let (habits_tx, habits_rx) = watch::channel(habits);
//!
//!     let handle = spawn(
//!         SchedulerConfig::default(),
//!         Arc::new(TerminalPlatform::new()),
//!         Arc::new(SystemClock),
//!         habits_rx,
//!     );
//!
//!     // ... later, when reminders are no longer wanted
//!     handle.shutdown().await;
//!     drop(habits_tx);
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, TimeZone};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::clock::{duration_until_next_midnight, Clock};
use crate::evaluator::due_habits;
use crate::fired::FiredToday;
use crate::notifier::{Notifier, DEFAULT_AUTO_DISMISS_SECS};
use crate::permission::PermissionGate;
use crate::platform::{NotificationPlatform, PermissionState};
use crate::types::{HabitReminder, ReminderTime};

/// Default poll cadence in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Timing configuration for a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Time between due-set evaluations.
    pub poll_interval: Duration,
    /// How long a reminder stays on screen if not dismissed.
    pub auto_dismiss: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            auto_dismiss: Duration::from_secs(DEFAULT_AUTO_DISMISS_SECS),
        }
    }
}

/// Result of one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Permission is not granted; nothing was evaluated.
    NotPermitted,
    /// The habit list was evaluated.
    Evaluated {
        /// Habits found due this minute.
        due: usize,
        /// Notifications actually displayed.
        shown: usize,
    },
}

/// Synchronous scheduler core: the fired-today set and the notifier.
#[derive(Debug)]
pub struct ReminderScheduler {
    notifier: Notifier,
    fired: FiredToday,
}

impl ReminderScheduler {
    pub fn new(notifier: Notifier) -> Self {
        Self {
            notifier,
            fired: FiredToday::new(),
        }
    }

    /// Evaluates `habits` at `now` and fires every due reminder.
    ///
    /// Each due habit is marked fired before its notification is shown. A
    /// platform failure is logged and the habit stays marked, so a broken
    /// platform is not retried every tick for the rest of the minute.
    pub fn tick<Tz: TimeZone>(
        &mut self,
        habits: &[HabitReminder],
        now: &DateTime<Tz>,
    ) -> TickOutcome {
        if !self.notifier.gate().is_granted() {
            debug!("Notification permission not granted, skipping tick");
            return TickOutcome::NotPermitted;
        }

        let minute = ReminderTime::of(now);
        let due = due_habits(habits, minute, &self.fired);
        debug!(
            minute = %minute,
            habits = habits.len(),
            due = due.len(),
            "Evaluated reminders"
        );

        let mut shown = 0;
        for habit in &due {
            self.fired.mark(habit.id.clone());
            match self.notifier.notify(habit) {
                Ok(_) => shown += 1,
                Err(e) => {
                    warn!(habit_id = %habit.id, error = %e, "Failed to show reminder");
                }
            }
        }

        TickOutcome::Evaluated {
            due: due.len(),
            shown,
        }
    }

    /// Starts a new day: every habit may fire again.
    pub fn reset_day(&mut self) {
        let cleared = self.fired.len();
        self.fired.reset();
        info!(cleared, "Reset fired reminders for new day");
    }

    /// Habits already reminded today.
    #[must_use]
    pub fn fired(&self) -> &FiredToday {
        &self.fired
    }

    /// The permission gate used before every tick.
    #[must_use]
    pub fn gate(&self) -> &Arc<PermissionGate> {
        self.notifier.gate()
    }
}

/// Owner's handle to a running scheduler.
///
/// Dropping the handle aborts the scheduler task, cancelling the poll and
/// midnight timers. Use [`SchedulerHandle::shutdown`] to stop it and wait.
#[derive(Debug)]
pub struct SchedulerHandle {
    gate: Arc<PermissionGate>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Asks for notification permission if it has not been decided.
    ///
    /// Idempotent: never prompts more than once, never prompts after a denial.
    pub fn request_permission(&self) -> Option<PermissionState> {
        self.gate.request()
    }

    /// Whether the scheduler task is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stops the scheduler and waits for its task to exit.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    warn!(error = %e, "Scheduler task ended abnormally");
                }
            }
        }
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Starts a scheduler on the current Tokio runtime.
///
/// Asks for notification permission once, then polls `habits` every
/// `config.poll_interval`. The habit list is re-read on every tick, so changes
/// published by the owner apply from the next tick on.
///
/// # Panics
///
/// Panics if called outside a Tokio runtime.
pub fn spawn(
    config: SchedulerConfig,
    platform: Arc<dyn NotificationPlatform>,
    clock: Arc<dyn Clock>,
    habits: watch::Receiver<Vec<HabitReminder>>,
) -> SchedulerHandle {
    let gate = Arc::new(PermissionGate::new(platform));
    if let Some(state) = gate.request() {
        info!(permission = %state, "Notification permission checked");
    } else {
        warn!("Notifications are not supported, reminders disabled");
    }

    let scheduler = ReminderScheduler::new(Notifier::new(Arc::clone(&gate), config.auto_dismiss));
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let task = tokio::spawn(run_loop(
        scheduler,
        config.poll_interval,
        clock,
        habits,
        shutdown_rx,
    ));

    SchedulerHandle {
        gate,
        shutdown_tx: Some(shutdown_tx),
        task: Some(task),
    }
}

async fn run_loop(
    mut scheduler: ReminderScheduler,
    poll_interval: Duration,
    clock: Arc<dyn Clock>,
    mut habits: watch::Receiver<Vec<HabitReminder>>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let mut poll = time::interval_at(Instant::now() + poll_interval, poll_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let start = clock.now();
    let mut today: NaiveDate = start.date_naive();
    let midnight = time::sleep(duration_until_next_midnight(&start));
    tokio::pin!(midnight);

    info!(
        poll_secs = poll_interval.as_secs(),
        habits = habits.borrow().len(),
        "Reminder scheduler started"
    );

    loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                debug!("Shutdown requested");
                break;
            }

            _ = poll.tick() => {
                let now = clock.now();
                // The midnight sleep runs on the monotonic clock, which stalls
                // across suspend and ignores wall-clock steps.
                if now.date_naive() != today {
                    debug!(from = %today, to = %now.date_naive(), "Date changed between polls");
                    today = now.date_naive();
                    scheduler.reset_day();
                    midnight.as_mut().reset(Instant::now() + duration_until_next_midnight(&now));
                }
                poll_once(&mut scheduler, &habits, &now);
            }

            () = &mut midnight => {
                let now = clock.now();
                // A timer that fires a hair early must not reset the old day.
                if now.date_naive() != today {
                    today = now.date_naive();
                    scheduler.reset_day();
                }
                let delay = duration_until_next_midnight(&now);
                debug!(delay_ms = delay.as_millis(), "Midnight reset re-armed");
                midnight.as_mut().reset(Instant::now() + delay);
            }

            changed = habits.changed() => {
                if changed.is_err() {
                    info!("Habit source closed");
                    break;
                }
                debug!(habits = habits.borrow().len(), "Habit list updated");
            }
        }
    }

    info!("Reminder scheduler stopped");
}

fn poll_once<Tz: TimeZone>(
    scheduler: &mut ReminderScheduler,
    habits: &watch::Receiver<Vec<HabitReminder>>,
    now: &DateTime<Tz>,
) {
    let habits = habits.borrow();
    if let TickOutcome::Evaluated { due, shown } = scheduler.tick(&habits, now) {
        if due > 0 {
            info!(due, shown, at = %ReminderTime::of(now), "Reminders fired");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::RecordingPlatform;
    use crate::types::Category;
    use chrono::{NaiveDate, Utc};

    fn at(hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2026, 3, 10)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
            .and_utc()
    }

    fn scheduler(platform: &Arc<RecordingPlatform>) -> ReminderScheduler {
        let gate = PermissionGate::new(Arc::clone(platform) as Arc<dyn NotificationPlatform>);
        ReminderScheduler::new(Notifier::with_default_lifetime(Arc::new(gate)))
    }

    fn water() -> HabitReminder {
        HabitReminder::new("h1", "Drink Water", Category::Hydration).with_reminder("08:30:00")
    }

    #[test]
    fn tick_fires_due_habit_once() {
        let platform = Arc::new(RecordingPlatform::granted());
        let mut scheduler = scheduler(&platform);
        let habits = vec![water()];

        assert_eq!(
            scheduler.tick(&habits, &at(8, 30, 0)),
            TickOutcome::Evaluated { due: 1, shown: 1 }
        );
        assert_eq!(
            scheduler.tick(&habits, &at(8, 30, 40)),
            TickOutcome::Evaluated { due: 0, shown: 0 }
        );
        assert_eq!(platform.shown_count(), 1);
    }

    #[test]
    fn tick_without_permission_evaluates_nothing() {
        let platform = Arc::new(RecordingPlatform::with_permission(PermissionState::Denied));
        let mut scheduler = scheduler(&platform);

        assert_eq!(
            scheduler.tick(&[water()], &at(8, 30, 0)),
            TickOutcome::NotPermitted
        );
        assert!(scheduler.fired().is_empty());
    }

    #[test]
    fn platform_failure_still_marks_fired() {
        let platform = Arc::new(RecordingPlatform::granted());
        platform.fail_show(true);
        let mut scheduler = scheduler(&platform);

        assert_eq!(
            scheduler.tick(&[water()], &at(8, 30, 0)),
            TickOutcome::Evaluated { due: 1, shown: 0 }
        );
        assert_eq!(scheduler.fired().len(), 1);
    }

    #[test]
    fn reset_day_allows_firing_again() {
        let platform = Arc::new(RecordingPlatform::granted());
        let mut scheduler = scheduler(&platform);
        let habits = vec![water()];

        scheduler.tick(&habits, &at(8, 30, 0));
        scheduler.reset_day();
        scheduler.tick(&habits, &at(8, 30, 10));

        assert_eq!(platform.shown_count(), 2);
    }

    #[test]
    fn default_config_matches_reminder_cadence() {
        let config = SchedulerConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(config.auto_dismiss, Duration::from_secs(8));
    }
}
