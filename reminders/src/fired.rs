//! Per-day record of reminders already fired.

use std::collections::HashSet;

use crate::types::HabitId;

/// Habits that have triggered a notification during the current local day.
///
/// Owned by the scheduler; cleared only by the midnight reset. Nothing is
/// persisted, so a restart starts the day with an empty set.
#[derive(Debug, Default)]
pub struct FiredToday {
    ids: HashSet<HabitId>,
}

impl FiredToday {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `id` has already fired today.
    #[must_use]
    pub fn contains(&self, id: &HabitId) -> bool {
        self.ids.contains(id)
    }

    /// Records that `id` fired. Returns `false` if it had already fired today.
    pub fn mark(&mut self, id: HabitId) -> bool {
        self.ids.insert(id)
    }

    /// Starts a new day, forgetting every fired habit.
    pub fn reset(&mut self) {
        self.ids = HashSet::new();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
