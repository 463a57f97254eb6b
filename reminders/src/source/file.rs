//! JSON file habit source.
//!
//! Loads a habit list from a JSON file and reloads it whenever the file
//! changes. The parent directory is watched rather than the file itself, so
//! editors that save by writing a temporary file and renaming it over the
//! original are picked up too.
//!
//! Bursts of file system events (one save often produces several) are
//! coalesced: a reload happens once no new event has arrived for the debounce
//! interval.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant};
use tracing::{debug, error, info, trace, warn};

use super::{parse_habits, publish, SourceError, SourceHandle};
use crate::types::HabitReminder;

/// Default quiet period before reloading after a change.
pub const DEFAULT_RELOAD_DEBOUNCE_MS: u64 = 200;

/// Habit source backed by a local JSON file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    debounce: Duration,
}

impl FileSource {
    /// Creates a source reading `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            debounce: Duration::from_millis(DEFAULT_RELOAD_DEBOUNCE_MS),
        }
    }

    /// Overrides the reload debounce interval.
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// The habit file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and decodes the habit file.
    ///
    /// A missing file is an empty habit list.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Io` if the file exists but cannot be read, or
    /// `SourceError::Json` if it is not a JSON array.
    pub fn load(&self) -> Result<Vec<HabitReminder>, SourceError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => parse_habits(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Habit file missing, using empty list");
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Loads the file, publishes it, and keeps publishing on every change.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial load fails or the parent directory
    /// cannot be watched (it must exist).
    pub fn spawn(self, tx: watch::Sender<Vec<HabitReminder>>) -> Result<SourceHandle, SourceError> {
        let initial = self.load()?;
        info!(
            path = %self.path.display(),
            habits = initial.len(),
            "Loaded habit file"
        );
        publish(&tx, initial);

        let (signal_tx, signal_rx) = mpsc::channel::<()>(16);
        let watcher = create_watcher(&self.path, signal_tx)?;

        let task = tokio::spawn(async move {
            run_reload_loop(self, signal_rx, tx).await;
        });

        Ok(SourceHandle::new(task, Some(watcher)))
    }

    fn reload(&self, tx: &watch::Sender<Vec<HabitReminder>>) {
        match self.load() {
            Ok(habits) => {
                let count = habits.len();
                if publish(tx, habits) {
                    info!(path = %self.path.display(), habits = count, "Habit file reloaded");
                }
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to reload habit file; keeping last known habits"
                );
            }
        }
    }
}

/// Watches the directory containing `path` and signals on changes to `path`.
fn create_watcher(path: &Path, signal_tx: mpsc::Sender<()>) -> Result<RecommendedWatcher, SourceError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = path.file_name().map(OsString::from).unwrap_or_default();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| handle_notify_event(res, &file_name, &signal_tx),
        Config::default(),
    )?;
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;

    debug!(dir = %dir.display(), "Watching habit file directory");
    Ok(watcher)
}

/// Filters raw notify events down to changes of the habit file.
///
/// Runs on the notify thread, so it only forwards a signal.
fn handle_notify_event(
    res: notify::Result<Event>,
    file_name: &OsString,
    signal_tx: &mpsc::Sender<()>,
) {
    let event = match res {
        Ok(event) => event,
        Err(e) => {
            error!(error = %e, "Habit file watcher error");
            return;
        }
    };

    if !matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) {
        return;
    }

    let touches_file = event
        .paths
        .iter()
        .any(|p| p.file_name() == Some(file_name.as_os_str()));
    if touches_file {
        trace!(kind = ?event.kind, "Habit file changed");
        // A full channel already has a reload pending.
        let _ = signal_tx.try_send(());
    }
}

/// Debounces change signals and reloads once they go quiet.
async fn run_reload_loop(
    source: FileSource,
    mut signal_rx: mpsc::Receiver<()>,
    tx: watch::Sender<Vec<HabitReminder>>,
) {
    let mut deadline: Option<Instant> = None;

    loop {
        tokio::select! {
            () = tx.closed() => {
                debug!("No habit receivers left, stopping file reloads");
                break;
            }

            signal = signal_rx.recv() => {
                match signal {
                    Some(()) => deadline = Some(Instant::now() + source.debounce),
                    None => break,
                }
            }

            () = async {
                match deadline {
                    Some(at) => time::sleep_until(at).await,
                    None => std::future::pending().await,
                }
            } => {
                deadline = None;
                source.reload(&tx);
            }
        }
    }
}
