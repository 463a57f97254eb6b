//! Due-set evaluation.
//!
//! A habit is due when its reminder is enabled, its reminder time equals the
//! current minute exactly, it has not fired today, and it has not been
//! completed today. There is no tolerance window: a minute skipped by the
//! poller is a reminder missed for the day.

use std::fmt;

use crate::fired::FiredToday;
use crate::types::{HabitReminder, ReminderTime};

/// Why a habit is or is not due on a given tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Due,
    Disabled,
    /// `reminder_time` is missing or not a valid `HH:MM`.
    NoReminderTime,
    NotThisMinute,
    AlreadyFired,
    DoneToday,
}

impl fmt::Display for Eligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Due => "due",
            Self::Disabled => "reminder disabled",
            Self::NoReminderTime => "no valid reminder time",
            Self::NotThisMinute => "not this minute",
            Self::AlreadyFired => "already reminded today",
            Self::DoneToday => "already done today",
        };
        f.write_str(text)
    }
}

/// Classifies one habit at minute `now`.
#[must_use]
pub fn eligibility(habit: &HabitReminder, now: ReminderTime, fired: &FiredToday) -> Eligibility {
    if !habit.reminder_enabled {
        return Eligibility::Disabled;
    }
    let Some(at) = habit.reminder_at() else {
        return Eligibility::NoReminderTime;
    };
    if at != now {
        return Eligibility::NotThisMinute;
    }
    if fired.contains(&habit.id) {
        return Eligibility::AlreadyFired;
    }
    if habit.today_done {
        return Eligibility::DoneToday;
    }
    Eligibility::Due
}

/// Selects the habits due at minute `now`, preserving list order.
#[must_use]
pub fn due_habits<'a>(
    habits: &'a [HabitReminder],
    now: ReminderTime,
    fired: &FiredToday,
) -> Vec<&'a HabitReminder> {
    habits
        .iter()
        .filter(|habit| eligibility(habit, now, fired) == Eligibility::Due)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, HabitId};

    fn at(hour: u32, minute: u32) -> ReminderTime {
        ReminderTime::from_hm(hour, minute).unwrap()
    }

    fn water() -> HabitReminder {
        HabitReminder::new("h1", "Drink Water", Category::Hydration).with_reminder("08:30:00")
    }

    #[test]
    fn matching_minute_is_due() {
        let fired = FiredToday::new();
        assert_eq!(eligibility(&water(), at(8, 30), &fired), Eligibility::Due);
    }

    #[test]
    fn neighbouring_minutes_are_not_due() {
        let fired = FiredToday::new();
        assert_eq!(
            eligibility(&water(), at(8, 29), &fired),
            Eligibility::NotThisMinute
        );
        assert_eq!(
            eligibility(&water(), at(8, 31), &fired),
            Eligibility::NotThisMinute
        );
    }

    #[test]
    fn disabled_habit_is_never_due() {
        let mut habit = water();
        habit.reminder_enabled = false;
        let fired = FiredToday::new();

        assert_eq!(eligibility(&habit, at(8, 30), &fired), Eligibility::Disabled);
        assert_eq!(
            eligibility(&habit.clone().done_today(), at(8, 30), &fired),
            Eligibility::Disabled
        );
    }

    #[test]
    fn done_habit_is_not_due() {
        let fired = FiredToday::new();
        assert_eq!(
            eligibility(&water().done_today(), at(8, 30), &fired),
            Eligibility::DoneToday
        );
    }

    #[test]
    fn fired_habit_is_not_due_again() {
        let mut fired = FiredToday::new();
        fired.mark(HabitId::new("h1"));
        assert_eq!(
            eligibility(&water(), at(8, 30), &fired),
            Eligibility::AlreadyFired
        );
    }

    #[test]
    fn malformed_or_missing_time_is_excluded() {
        let fired = FiredToday::new();
        let mut habit = water();

        habit.reminder_time = None;
        assert_eq!(
            eligibility(&habit, at(8, 30), &fired),
            Eligibility::NoReminderTime
        );

        habit.reminder_time = Some("half past eight".to_string());
        assert_eq!(
            eligibility(&habit, at(8, 30), &fired),
            Eligibility::NoReminderTime
        );
    }

    #[test]
    fn due_habits_keeps_list_order() {
        let habits = vec![
            HabitReminder::new("a", "Stretch", Category::Fitness).with_reminder("09:00"),
            HabitReminder::new("b", "Journal", Category::Mindfulness).with_reminder("10:00"),
            HabitReminder::new("c", "Walk", Category::Fitness).with_reminder("09:00:30"),
        ];
        let fired = FiredToday::new();

        let due: Vec<_> = due_habits(&habits, at(9, 0), &fired)
            .into_iter()
            .map(|h| h.id.as_str())
            .collect();
        assert_eq!(due, vec!["a", "c"]);
    }
}
