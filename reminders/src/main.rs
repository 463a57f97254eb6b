//! HealthyHabits reminder daemon.
//!
//! # Commands
//!
//! - `healthyhabits-reminders run`: Start the reminder daemon
//! - `healthyhabits-reminders check`: Show which reminders would fire at a given minute
//!
//! # Environment Variables
//!
//! See the [`config`] module for available configuration options.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDateTime};
use clap::{Parser, Subcommand};
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use healthyhabits_reminders::clock::SystemClock;
use healthyhabits_reminders::config::{Config, HabitSourceConfig};
use healthyhabits_reminders::evaluator::eligibility;
use healthyhabits_reminders::fired::FiredToday;
use healthyhabits_reminders::notifier::Notifier;
use healthyhabits_reminders::permission::PermissionGate;
use healthyhabits_reminders::platform::{
    NotificationPlatform, RecordingPlatform, TerminalPlatform, WebhookPlatform,
};
use healthyhabits_reminders::scheduler::{self, ReminderScheduler, TickOutcome};
use healthyhabits_reminders::source::{ApiSource, FileSource, SourceHandle};
use healthyhabits_reminders::types::{HabitReminder, ReminderTime};

/// HealthyHabits reminder daemon.
///
/// Reminds you of your habits once a day, at the minute you picked for each.
#[derive(Parser, Debug)]
#[command(name = "healthyhabits-reminders")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "\
ENVIRONMENT VARIABLES:
    HEALTHYHABITS_API_URL               Backend URL, e.g. https://host/api (enables API source)
    HEALTHYHABITS_API_TOKEN             Bearer token (required with API URL)
    HEALTHYHABITS_HABITS_FILE           Habit file (default: ~/.healthyhabits/habits.json)
    HEALTHYHABITS_REFRESH_INTERVAL_SECS API refresh interval (default: 300)
    HEALTHYHABITS_POLL_INTERVAL_SECS    Reminder check interval (default: 60)
    HEALTHYHABITS_AUTO_DISMISS_SECS     Reminder lifetime (default: 8)
    HEALTHYHABITS_WEBHOOK_URL           Deliver reminders to a webhook
    HEALTHYHABITS_DEVICE_ID             Device identifier (default: hostname)

EXAMPLES:
    # Run against a local habit file
    healthyhabits-reminders run

    # Run against the backend
    export HEALTHYHABITS_API_URL=https://habits.example.com/api
    export HEALTHYHABITS_API_TOKEN=...
    healthyhabits-reminders run

    # See what would fire at 08:30
    healthyhabits-reminders check --habits habits.json --at 08:30
")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Start the reminder daemon.
    ///
    /// Runs until interrupted (Ctrl+C or SIGTERM).
    Run,

    /// Dry run: show which reminders would fire at one minute.
    ///
    /// Nothing is delivered; the reminders are printed instead.
    Check {
        /// Habit list file (JSON array).
        #[arg(long)]
        habits: PathBuf,

        /// Minute to evaluate, as HH:MM (default: now).
        #[arg(long)]
        at: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Check { habits, at } => run_check(&habits, at.as_deref()),
        Command::Run => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("Failed to create tokio runtime")?;

            runtime.block_on(run_daemon())
        }
    }
}

/// Runs the reminder daemon until a shutdown signal arrives.
async fn run_daemon() -> Result<()> {
    init_logging();

    info!("Starting HealthyHabits reminders");

    let config = Config::from_env().context("Failed to load configuration")?;

    info!(
        poll_secs = config.poll_interval.as_secs(),
        auto_dismiss_secs = config.auto_dismiss.as_secs(),
        device_id = %config.device_id,
        "Configuration loaded"
    );

    let platform: Arc<dyn NotificationPlatform> = match &config.webhook_url {
        Some(url) => {
            info!(url = %url, "Delivering reminders by webhook");
            Arc::new(
                WebhookPlatform::new(url.clone(), config.device_id.clone())
                    .context("Failed to create webhook client")?,
            )
        }
        None => {
            info!("Printing reminders to the terminal");
            Arc::new(TerminalPlatform::new())
        }
    };

    let (habits_tx, habits_rx) = watch::channel(Vec::new());
    let source = start_source(&config, habits_tx).context("Failed to start habit source")?;

    let handle = scheduler::spawn(
        config.scheduler(),
        platform,
        Arc::new(SystemClock),
        habits_rx,
    );

    wait_for_shutdown().await;
    info!("Shutdown signal received, stopping reminders");

    handle.shutdown().await;
    drop(source);

    info!("HealthyHabits reminders stopped");
    Ok(())
}

/// Starts the configured habit source.
fn start_source(
    config: &Config,
    habits_tx: watch::Sender<Vec<HabitReminder>>,
) -> healthyhabits_reminders::Result<SourceHandle> {
    match &config.habit_source {
        HabitSourceConfig::Api { url, token } => {
            let source = ApiSource::new(url, token.clone(), config.refresh_interval)?;
            Ok(source.spawn(habits_tx))
        }
        HabitSourceConfig::File(path) => {
            if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir)?;
            }
            Ok(FileSource::new(path).spawn(habits_tx)?)
        }
    }
}

/// Evaluates the due set once and prints what would be shown.
fn run_check(habits_path: &Path, at: Option<&str>) -> Result<()> {
    let habits = FileSource::new(habits_path)
        .load()
        .with_context(|| format!("Failed to load habits from {}", habits_path.display()))?;

    let now = match at {
        Some(raw) => {
            let Some(minute) = ReminderTime::parse_exact(raw) else {
                bail!("Invalid --at value '{raw}', expected HH:MM");
            };
            evaluation_instant(minute)
        }
        None => Local::now().naive_local(),
    }
    .and_utc();
    let minute = ReminderTime::of(&now);

    println!("Evaluating {} habit(s) at {minute}", habits.len());
    let fired = FiredToday::new();
    for habit in &habits {
        println!(
            "  {:<24} {:<8} {}",
            habit.name,
            habit.reminder_time.as_deref().unwrap_or("-"),
            eligibility(habit, minute, &fired)
        );
    }

    let platform = Arc::new(RecordingPlatform::granted());
    let gate = PermissionGate::new(Arc::clone(&platform) as Arc<dyn NotificationPlatform>);
    let mut scheduler = ReminderScheduler::new(Notifier::with_default_lifetime(Arc::new(gate)));

    if let TickOutcome::Evaluated { due, .. } = scheduler.tick(&habits, &now) {
        println!();
        println!("{due} reminder(s) would fire:");
    }
    for notification in platform.shown() {
        println!("  [{}] {}: {}", notification.tag, notification.title, notification.body);
    }

    Ok(())
}

/// Today's date at `minute`, as a naive local time.
fn evaluation_instant(minute: ReminderTime) -> NaiveDateTime {
    Local::now()
        .date_naive()
        .and_hms_opt(minute.hour(), minute.minute(), 0)
        .unwrap_or_else(|| Local::now().naive_local())
}

/// Initializes the tracing subscriber for logging.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .init();
}

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use healthyhabits_reminders::ReminderError;
    use tempfile::TempDir;

    fn file_config(path: PathBuf) -> Config {
        Config {
            habit_source: HabitSourceConfig::File(path),
            refresh_interval: Duration::from_secs(300),
            poll_interval: Duration::from_secs(60),
            auto_dismiss: Duration::from_secs(8),
            webhook_url: None,
            device_id: "test-device".to_string(),
        }
    }

    #[tokio::test]
    async fn start_source_creates_missing_habit_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("habits.json");
        let (tx, rx) = watch::channel(Vec::new());

        let handle = start_source(&file_config(path), tx).unwrap();

        assert!(dir.path().join("nested").is_dir());
        assert!(handle.is_running());
        assert!(rx.borrow().is_empty());
    }

    #[tokio::test]
    async fn start_source_reports_unusable_directory_as_io_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        let (tx, _rx) = watch::channel(Vec::new());

        let result = start_source(&file_config(blocker.join("habits.json")), tx);

        assert!(matches!(result, Err(ReminderError::Io(_))));
    }
}
