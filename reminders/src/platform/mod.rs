//! Notification platform capability.
//!
//! The scheduler never talks to a concrete notification system. It is handed a
//! [`NotificationPlatform`] which answers permission queries and displays
//! notifications, so the due-set logic runs identically against a terminal, a
//! webhook, or the [`RecordingPlatform`] used by tests and dry runs.
//!
//! # Platforms
//!
//! - [`TerminalPlatform`]: prints reminders to stdout
//! - [`WebhookPlatform`]: POSTs reminders as JSON to an HTTP endpoint
//! - [`RecordingPlatform`]: in-memory fake that records every request

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

pub mod recording;
pub mod terminal;
pub mod webhook;

pub use recording::{RecordedNotification, RecordingPlatform};
pub use terminal::TerminalPlatform;
pub use webhook::{WebhookPayload, WebhookPlatform};

/// Permission to display notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    /// Notifications may be shown.
    Granted,
    /// The user refused; never prompt again automatically.
    Denied,
    /// The user has not decided yet.
    Default,
}

impl fmt::Display for PermissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Granted => f.write_str("granted"),
            Self::Denied => f.write_str("denied"),
            Self::Default => f.write_str("default"),
        }
    }
}

/// Errors raised by notification platforms.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// The platform has no notification support.
    #[error("notifications are not supported on this platform")]
    Unsupported,

    /// Permission to notify has not been granted.
    #[error("notification permission is {0}")]
    NotPermitted(PermissionState),

    /// The notification could not be handed to the platform.
    #[error("failed to deliver notification: {0}")]
    Delivery(String),
}

/// Callback invoked when the user clicks a notification.
pub type ClickHandler = Arc<dyn Fn(&dyn NotificationHandle) + Send + Sync>;

/// A request to display one notification.
#[derive(Clone)]
pub struct NotificationRequest {
    /// Notification title.
    pub title: String,
    /// Notification body text.
    pub body: String,
    /// De-duplication tag; platforms collapse notifications sharing a tag.
    pub tag: String,
    /// Whether the notification stays until the user interacts with it.
    pub require_interaction: bool,
    /// Invoked with the displayed notification when it is clicked.
    pub on_click: Option<ClickHandler>,
}

impl fmt::Debug for NotificationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationRequest")
            .field("title", &self.title)
            .field("body", &self.body)
            .field("tag", &self.tag)
            .field("require_interaction", &self.require_interaction)
            .field("on_click", &self.on_click.is_some())
            .finish()
    }
}

/// A notification that has been displayed.
pub trait NotificationHandle: Send + Sync {
    /// The de-duplication tag the notification was shown with.
    fn tag(&self) -> &str;

    /// Whether the notification is still on screen.
    fn is_open(&self) -> bool;

    /// Dismisses the notification. Closing twice is a no-op.
    fn close(&self);
}

/// A host notification system.
///
/// All methods are synchronous and must not block for long; delivery that
/// needs I/O should be handed off to a background task.
pub trait NotificationPlatform: Send + Sync + 'static {
    /// Whether the host can display notifications at all.
    fn is_supported(&self) -> bool {
        true
    }

    /// Current permission state.
    fn permission(&self) -> PermissionState;

    /// Prompts the user for permission and returns the outcome.
    fn request_permission(&self) -> PermissionState;

    /// Displays a notification.
    fn show(
        &self,
        request: NotificationRequest,
    ) -> Result<Arc<dyn NotificationHandle>, PlatformError>;

    /// Brings the application to the foreground.
    fn focus_app(&self) {}
}
