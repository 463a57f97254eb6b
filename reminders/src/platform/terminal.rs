//! Terminal notification platform.
//!
//! Prints each reminder as a single line on stdout. Useful when the daemon runs
//! in a terminal multiplexer or under a service manager that captures output.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Local;
use tracing::{debug, warn};

use super::{
    NotificationHandle, NotificationPlatform, NotificationRequest, PermissionState, PlatformError,
};

/// Writes reminders to stdout. Permission is always granted.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPlatform;

impl TerminalPlatform {
    /// Creates a terminal platform.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Formats a notification as a single terminal line.
pub(crate) fn format_line(stamp: &str, request: &NotificationRequest) -> String {
    format!("[{stamp}] {}: {}", request.title, request.body)
}

impl NotificationPlatform for TerminalPlatform {
    fn permission(&self) -> PermissionState {
        PermissionState::Granted
    }

    fn request_permission(&self) -> PermissionState {
        PermissionState::Granted
    }

    fn show(
        &self,
        request: NotificationRequest,
    ) -> Result<Arc<dyn NotificationHandle>, PlatformError> {
        let stamp = Local::now().format("%H:%M").to_string();
        let line = format_line(&stamp, &request);

        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{line}").map_err(|e| PlatformError::Delivery(e.to_string()))?;
        if let Err(e) = stdout.flush() {
            warn!(error = %e, "Failed to flush stdout");
        }

        Ok(Arc::new(TerminalNotification {
            tag: request.tag,
            open: AtomicBool::new(true),
        }))
    }
}

/// A reminder line already printed to the terminal.
#[derive(Debug)]
struct TerminalNotification {
    tag: String,
    open: AtomicBool,
}

impl NotificationHandle for TerminalNotification {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    fn close(&self) {
        if self.open.swap(false, Ordering::AcqRel) {
            debug!(tag = %self.tag, "Terminal notification dismissed");
        }
    }
}
