//! Reminder notifications.
//!
//! Turns a due habit into a [`NotificationRequest`]: a fixed title, a body
//! chosen by category, a per-habit de-duplication tag and a click handler that
//! focuses the application. Displayed notifications are dismissed
//! automatically after a fixed lifetime if the user has not closed them.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tracing::{debug, info};

use crate::permission::PermissionGate;
use crate::platform::{
    ClickHandler, NotificationHandle, NotificationPlatform, NotificationRequest, PermissionState,
    PlatformError,
};
use crate::types::{Category, HabitId, HabitReminder};

/// Title of every reminder notification.
pub const NOTIFICATION_TITLE: &str = "HealthyHabits Reminder 🌿";

/// Default notification lifetime in seconds.
pub const DEFAULT_AUTO_DISMISS_SECS: u64 = 8;

/// Composes the reminder body for a habit.
#[must_use]
pub fn reminder_message(category: Category, name: &str) -> String {
    match category {
        Category::Hydration => format!("💧 Time to {name}! Stay hydrated."),
        Category::Fitness => format!("🏃 Don't forget your {name} session!"),
        Category::Nutrition => format!("🥗 Time for {name}. Eat healthy!"),
        Category::Mindfulness => format!("🧘 Take a moment for {name}."),
        Category::Sleep => format!("😴 Time to wind down for {name}."),
        Category::Reading => format!("📚 Time to read! Don't skip {name}."),
        Category::Productivity => format!("⚡ Stay on track — time for {name}!"),
        Category::Social => format!("👥 Don't forget {name} today!"),
        Category::Other => format!("🔔 Reminder: Time for {name}!"),
    }
}

/// De-duplication tag for a habit's notifications.
#[must_use]
pub fn reminder_tag(id: &HabitId) -> String {
    format!("habit-{id}")
}

/// Shows reminder notifications through a permission-gated platform.
#[derive(Debug)]
pub struct Notifier {
    gate: Arc<PermissionGate>,
    auto_dismiss: Duration,
}

impl Notifier {
    /// Creates a notifier that dismisses notifications after `auto_dismiss`.
    pub fn new(gate: Arc<PermissionGate>, auto_dismiss: Duration) -> Self {
        Self { gate, auto_dismiss }
    }

    /// Creates a notifier with the default 8 second lifetime.
    pub fn with_default_lifetime(gate: Arc<PermissionGate>) -> Self {
        Self::new(gate, Duration::from_secs(DEFAULT_AUTO_DISMISS_SECS))
    }

    /// The gate this notifier consults before showing anything.
    #[must_use]
    pub fn gate(&self) -> &Arc<PermissionGate> {
        &self.gate
    }

    /// Builds the notification request for a habit.
    #[must_use]
    pub fn request_for(&self, habit: &HabitReminder) -> NotificationRequest {
        NotificationRequest {
            title: NOTIFICATION_TITLE.to_string(),
            body: reminder_message(habit.category, &habit.name),
            tag: reminder_tag(&habit.id),
            require_interaction: false,
            on_click: Some(focus_on_click(Arc::downgrade(self.gate.platform()))),
        }
    }

    /// Shows the reminder for `habit`.
    ///
    /// The returned handle is also scheduled for auto-dismissal when a Tokio
    /// runtime is available.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Unsupported` or `PlatformError::NotPermitted`
    /// when the gate is closed, or the platform's own error if display fails.
    pub fn notify(
        &self,
        habit: &HabitReminder,
    ) -> Result<Arc<dyn NotificationHandle>, PlatformError> {
        match self.gate.state() {
            None => return Err(PlatformError::Unsupported),
            Some(state) if state != PermissionState::Granted => {
                return Err(PlatformError::NotPermitted(state));
            }
            Some(_) => {}
        }

        let handle = self.gate.platform().show(self.request_for(habit))?;
        info!(
            habit_id = %habit.id,
            category = %habit.category,
            tag = %handle.tag(),
            "Reminder shown"
        );

        self.schedule_dismiss(Arc::clone(&handle));
        Ok(handle)
    }

    fn schedule_dismiss(&self, handle: Arc<dyn NotificationHandle>) {
        let lifetime = self.auto_dismiss;
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    tokio::time::sleep(lifetime).await;
                    if handle.is_open() {
                        handle.close();
                        debug!(tag = %handle.tag(), "Reminder auto-dismissed");
                    }
                });
            }
            Err(_) => {
                debug!(tag = %handle.tag(), "No runtime, auto-dismiss skipped");
            }
        }
    }
}

/// Click behaviour: bring the app forward, then dismiss the notification.
fn focus_on_click(platform: Weak<dyn NotificationPlatform>) -> ClickHandler {
    Arc::new(move |notification: &dyn NotificationHandle| {
        if let Some(platform) = platform.upgrade() {
            platform.focus_app();
        }
        notification.close();
    })
}
