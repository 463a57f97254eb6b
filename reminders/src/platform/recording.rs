//! In-memory notification platform.
//!
//! Records every permission prompt and notification instead of displaying
//! anything. Used by the `check` dry run and throughout the test suite.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{
    ClickHandler, NotificationHandle, NotificationPlatform, NotificationRequest, PermissionState,
    PlatformError,
};

/// A notification captured by [`RecordingPlatform`].
pub struct RecordedNotification {
    pub title: String,
    pub body: String,
    pub tag: String,
    pub require_interaction: bool,
    on_click: Option<ClickHandler>,
    open: AtomicBool,
}

impl std::fmt::Debug for RecordedNotification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordedNotification")
            .field("title", &self.title)
            .field("body", &self.body)
            .field("tag", &self.tag)
            .field("open", &self.is_open())
            .finish()
    }
}

impl NotificationHandle for RecordedNotification {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    fn close(&self) {
        self.open.store(false, Ordering::Release);
    }
}

#[derive(Debug)]
struct State {
    permission: PermissionState,
    prompt_outcome: PermissionState,
    shown: Vec<Arc<RecordedNotification>>,
}

/// Fake platform with scriptable permission behaviour.
#[derive(Debug)]
pub struct RecordingPlatform {
    supported: bool,
    fail_show: AtomicBool,
    state: Mutex<State>,
    prompts: AtomicUsize,
    focus_requests: AtomicUsize,
}

impl Default for RecordingPlatform {
    fn default() -> Self {
        Self::granted()
    }
}

impl RecordingPlatform {
    /// A platform where permission is already granted.
    #[must_use]
    pub fn granted() -> Self {
        Self::with_permission(PermissionState::Granted)
    }

    /// A platform starting in the given permission state.
    ///
    /// Prompting leaves the state unchanged unless [`Self::prompt_outcome`] is set.
    #[must_use]
    pub fn with_permission(permission: PermissionState) -> Self {
        Self {
            supported: true,
            fail_show: AtomicBool::new(false),
            state: Mutex::new(State {
                permission,
                prompt_outcome: permission,
                shown: Vec::new(),
            }),
            prompts: AtomicUsize::new(0),
            focus_requests: AtomicUsize::new(0),
        }
    }

    /// A platform without notification support.
    #[must_use]
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::with_permission(PermissionState::Default)
        }
    }

    /// Sets the state a permission prompt resolves to.
    #[must_use]
    pub fn prompt_outcome(self, outcome: PermissionState) -> Self {
        self.lock().prompt_outcome = outcome;
        self
    }

    /// Changes the current permission state, as if changed in host settings.
    pub fn set_permission(&self, permission: PermissionState) {
        self.lock().permission = permission;
    }

    /// Makes subsequent `show` calls fail.
    pub fn fail_show(&self, fail: bool) {
        self.fail_show.store(fail, Ordering::Release);
    }

    /// Number of permission prompts issued.
    #[must_use]
    pub fn prompt_count(&self) -> usize {
        self.prompts.load(Ordering::Acquire)
    }

    /// Number of times the application was asked to come to the foreground.
    #[must_use]
    pub fn focus_count(&self) -> usize {
        self.focus_requests.load(Ordering::Acquire)
    }

    /// All notifications shown so far, oldest first.
    #[must_use]
    pub fn shown(&self) -> Vec<Arc<RecordedNotification>> {
        self.lock().shown.clone()
    }

    /// Number of notifications shown so far.
    #[must_use]
    pub fn shown_count(&self) -> usize {
        self.lock().shown.len()
    }

    /// Simulates the user clicking the most recent notification with `tag`.
    ///
    /// Returns `false` if no such notification was shown.
    pub fn click(&self, tag: &str) -> bool {
        let target = self
            .lock()
            .shown
            .iter()
            .rev()
            .find(|n| n.tag == tag)
            .cloned();

        match target {
            Some(notification) => {
                if let Some(handler) = &notification.on_click {
                    handler(notification.as_ref());
                }
                true
            }
            None => false,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl NotificationPlatform for RecordingPlatform {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn permission(&self) -> PermissionState {
        self.lock().permission
    }

    fn request_permission(&self) -> PermissionState {
        self.prompts.fetch_add(1, Ordering::AcqRel);
        let mut state = self.lock();
        state.permission = state.prompt_outcome;
        state.permission
    }

    fn show(
        &self,
        request: NotificationRequest,
    ) -> Result<Arc<dyn NotificationHandle>, PlatformError> {
        if !self.supported {
            return Err(PlatformError::Unsupported);
        }
        if self.fail_show.load(Ordering::Acquire) {
            return Err(PlatformError::Delivery("scripted failure".to_string()));
        }

        let notification = Arc::new(RecordedNotification {
            title: request.title,
            body: request.body,
            tag: request.tag,
            require_interaction: request.require_interaction,
            on_click: request.on_click,
            open: AtomicBool::new(true),
        });
        let mut state = self.lock();
        // A new notification replaces an open one with the same tag.
        for previous in state.shown.iter().filter(|n| n.tag == notification.tag) {
            previous.close();
        }
        state.shown.push(Arc::clone(&notification));
        drop(state);

        Ok(notification as Arc<dyn NotificationHandle>)
    }

    fn focus_app(&self) {
        self.focus_requests.fetch_add(1, Ordering::AcqRel);
    }
}
