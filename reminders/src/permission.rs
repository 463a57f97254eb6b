//! Notification permission gate.
//!
//! Wraps a [`NotificationPlatform`] and guarantees the user is prompted at most
//! once per gate. The prompt outcome is not cached: every caller reads the
//! platform's live state, so a permission changed in host settings takes
//! effect on the next tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::platform::{NotificationPlatform, PermissionState};

/// Idempotent permission requester and query point.
pub struct PermissionGate {
    platform: Arc<dyn NotificationPlatform>,
    prompted: AtomicBool,
}

impl std::fmt::Debug for PermissionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionGate")
            .field("supported", &self.is_supported())
            .field("prompted", &self.prompted.load(Ordering::Acquire))
            .finish()
    }
}

impl PermissionGate {
    /// Creates a gate over `platform`. No prompt is issued until [`Self::request`].
    pub fn new(platform: Arc<dyn NotificationPlatform>) -> Self {
        Self {
            platform,
            prompted: AtomicBool::new(false),
        }
    }

    /// Whether the platform supports notifications at all.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.platform.is_supported()
    }

    /// Live permission state, or `None` when notifications are unsupported.
    #[must_use]
    pub fn state(&self) -> Option<PermissionState> {
        self.is_supported().then(|| self.platform.permission())
    }

    /// Whether a notification may be shown right now.
    #[must_use]
    pub fn is_granted(&self) -> bool {
        self.state() == Some(PermissionState::Granted)
    }

    /// Ensures the user has been asked for permission.
    ///
    /// - unsupported: does nothing and returns `None`
    /// - granted or denied: returns the state without prompting
    /// - undecided: prompts once; later calls never prompt again
    ///
    /// Safe to call any number of times.
    pub fn request(&self) -> Option<PermissionState> {
        let Some(state) = self.state() else {
            debug!("Notifications unsupported, skipping permission request");
            return None;
        };

        match state {
            PermissionState::Granted | PermissionState::Denied => Some(state),
            PermissionState::Default => {
                if self.prompted.swap(true, Ordering::AcqRel) {
                    return Some(state);
                }
                let outcome = self.platform.request_permission();
                info!(outcome = %outcome, "Notification permission requested");
                Some(outcome)
            }
        }
    }

    /// The platform behind this gate.
    #[must_use]
    pub fn platform(&self) -> &Arc<dyn NotificationPlatform> {
        &self.platform
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::RecordingPlatform;

    fn gate(platform: &Arc<RecordingPlatform>) -> PermissionGate {
        PermissionGate::new(Arc::clone(platform) as Arc<dyn NotificationPlatform>)
    }

    #[test]
    fn granted_platform_is_not_prompted() {
        let platform = Arc::new(RecordingPlatform::granted());
        let gate = gate(&platform);

        assert_eq!(gate.request(), Some(PermissionState::Granted));
        assert!(gate.is_granted());
        assert_eq!(platform.prompt_count(), 0);
    }

    #[test]
    fn denied_platform_is_never_reprompted() {
        let platform = Arc::new(RecordingPlatform::with_permission(PermissionState::Denied));
        let gate = gate(&platform);

        for _ in 0..3 {
            assert_eq!(gate.request(), Some(PermissionState::Denied));
        }
        assert!(!gate.is_granted());
        assert_eq!(platform.prompt_count(), 0);
    }

    #[test]
    fn undecided_platform_is_prompted_exactly_once() {
        let platform = Arc::new(RecordingPlatform::with_permission(PermissionState::Default));
        let gate = gate(&platform);

        assert_eq!(gate.request(), Some(PermissionState::Default));
        assert_eq!(gate.request(), Some(PermissionState::Default));
        assert_eq!(platform.prompt_count(), 1);
    }

    #[test]
    fn prompt_outcome_is_read_live() {
        let platform = Arc::new(
            RecordingPlatform::with_permission(PermissionState::Default)
                .prompt_outcome(PermissionState::Granted),
        );
        let gate = gate(&platform);
        assert!(!gate.is_granted());

        assert_eq!(gate.request(), Some(PermissionState::Granted));
        assert!(gate.is_granted());

        platform.set_permission(PermissionState::Denied);
        assert!(!gate.is_granted());
    }

    #[test]
    fn unsupported_platform_is_a_no_op() {
        let platform = Arc::new(RecordingPlatform::unsupported());
        let gate = gate(&platform);

        assert_eq!(gate.request(), None);
        assert_eq!(gate.state(), None);
        assert!(!gate.is_granted());
        assert_eq!(platform.prompt_count(), 0);
    }
}
