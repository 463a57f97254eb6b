//! Habit reminder types.
//!
//! These are projections of the habit records served by the HealthyHabits
//! backend. Only the fields that matter for local reminders are decoded; every
//! other field of the backend payload is ignored.

use std::fmt;

use chrono::{DateTime, NaiveTime, TimeZone, Timelike};
use serde::{Deserialize, Deserializer, Serialize};

/// Opaque habit identifier.
///
/// The backend may send identifiers as JSON strings or numbers; both are
/// normalised to their string form so they compare and hash uniformly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawHabitId", into = "String")]
pub struct HabitId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawHabitId {
    Text(String),
    Number(serde_json::Number),
}

impl From<RawHabitId> for HabitId {
    fn from(raw: RawHabitId) -> Self {
        match raw {
            RawHabitId::Text(text) => Self(text),
            RawHabitId::Number(number) => Self(number.to_string()),
        }
    }
}

impl From<HabitId> for String {
    fn from(id: HabitId) -> Self {
        id.0
    }
}

impl HabitId {
    /// Creates an identifier from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Habit category, selecting the reminder message template.
///
/// Unknown or missing categories decode to [`Category::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Hydration,
    Fitness,
    Nutrition,
    Mindfulness,
    Sleep,
    Reading,
    Productivity,
    Social,
    #[default]
    Other,
}

impl Category {
    /// All categories, fallback last.
    pub const ALL: [Category; 9] = [
        Self::Hydration,
        Self::Fitness,
        Self::Nutrition,
        Self::Mindfulness,
        Self::Sleep,
        Self::Reading,
        Self::Productivity,
        Self::Social,
        Self::Other,
    ];

    /// Maps a backend category name to a category, falling back to `Other`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "hydration" => Self::Hydration,
            "fitness" => Self::Fitness,
            "nutrition" => Self::Nutrition,
            "mindfulness" => Self::Mindfulness,
            "sleep" => Self::Sleep,
            "reading" => Self::Reading,
            "productivity" => Self::Productivity,
            "social" => Self::Social,
            _ => Self::Other,
        }
    }

    /// Stable lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hydration => "hydration",
            Self::Fitness => "fitness",
            Self::Nutrition => "nutrition",
            Self::Mindfulness => "mindfulness",
            Self::Sleep => "sleep",
            Self::Reading => "reading",
            Self::Productivity => "productivity",
            Self::Social => "social",
            Self::Other => "other",
        }
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map_or(Self::Other, Self::from_name))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A wall-clock time of day at minute precision.
///
/// Seconds are always zero; comparisons are exact minute equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReminderTime(NaiveTime);

impl ReminderTime {
    /// Creates a reminder time, returning `None` for out-of-range values.
    #[must_use]
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    /// Parses the leading `HH:MM` of a stored reminder time.
    ///
    /// Accepts `"08:30"` and `"08:30:00"` alike; anything after the first five
    /// characters is ignored. Returns `None` unless those five characters are a
    /// zero-padded 24-hour time.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let hhmm = raw.get(..5)?;
        let well_formed = hhmm
            .bytes()
            .enumerate()
            .all(|(i, b)| if i == 2 { b == b':' } else { b.is_ascii_digit() });
        if !well_formed {
            return None;
        }

        let hour = hhmm[..2].parse().ok()?;
        let minute = hhmm[3..].parse().ok()?;
        Self::from_hm(hour, minute)
    }

    /// Parses exactly `HH:MM`, with nothing before or after it.
    ///
    /// For user input, where trailing text is a typo rather than seconds.
    #[must_use]
    pub fn parse_exact(raw: &str) -> Option<Self> {
        if raw.len() != 5 {
            return None;
        }
        Self::parse(raw)
    }

    /// Truncates a timestamp to its local hour and minute.
    #[must_use]
    pub fn of<Tz: TimeZone>(at: &DateTime<Tz>) -> Self {
        Self::of_time(at.time())
    }

    /// Truncates a naive time of day to its hour and minute.
    #[must_use]
    pub fn of_time(time: NaiveTime) -> Self {
        // hour() and minute() are always in range, so the fallback is unreachable.
        Self::from_hm(time.hour(), time.minute()).unwrap_or(Self(NaiveTime::MIN))
    }

    /// Hour of day (0-23).
    #[must_use]
    pub fn hour(self) -> u32 {
        self.0.hour()
    }

    /// Minute of hour (0-59).
    #[must_use]
    pub fn minute(self) -> u32 {
        self.0.minute()
    }
}

impl fmt::Display for ReminderTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// Reminder-relevant projection of a habit.
///
/// The list of these is owned by a habit source; the scheduler only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitReminder {
    /// Unique, stable habit identifier.
    pub id: HabitId,

    /// Display name interpolated into the reminder message.
    #[serde(default)]
    pub name: String,

    /// Category selecting the message template.
    #[serde(default)]
    pub category: Category,

    /// When false the habit is never evaluated for reminders.
    #[serde(default, deserialize_with = "false_if_null")]
    pub reminder_enabled: bool,

    /// Stored reminder time as sent by the backend (`"HH:MM"` or `"HH:MM:SS"`).
    #[serde(default)]
    pub reminder_time: Option<String>,

    /// Whether the habit has already been completed today.
    #[serde(default, deserialize_with = "false_if_null")]
    pub today_done: bool,
}

impl HabitReminder {
    /// Creates a habit with reminders disabled.
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: Category) -> Self {
        Self {
            id: HabitId::new(id),
            name: name.into(),
            category,
            reminder_enabled: false,
            reminder_time: None,
            today_done: false,
        }
    }

    /// Enables the reminder at the given stored time.
    #[must_use]
    pub fn with_reminder(mut self, time: impl Into<String>) -> Self {
        self.reminder_enabled = true;
        self.reminder_time = Some(time.into());
        self
    }

    /// Marks the habit as completed for today.
    #[must_use]
    pub fn done_today(mut self) -> Self {
        self.today_done = true;
        self
    }

    /// Parsed reminder time, or `None` when missing or malformed.
    #[must_use]
    pub fn reminder_at(&self) -> Option<ReminderTime> {
        self.reminder_time.as_deref().and_then(ReminderTime::parse)
    }
}

fn false_if_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    #[test]
    fn parse_exact_rejects_trailing_text() {
        assert_eq!(ReminderTime::parse_exact("08:30"), ReminderTime::from_hm(8, 30));
        assert_eq!(ReminderTime::parse_exact("08:30garbage"), None);
        assert_eq!(ReminderTime::parse_exact("08:30:00"), None);
        assert_eq!(ReminderTime::parse_exact("8:30"), None);
    }

    #[test]
    fn parse_accepts_minutes_and_seconds_forms() {
        assert_eq!(ReminderTime::parse("08:30"), ReminderTime::from_hm(8, 30));
        assert_eq!(ReminderTime::parse("08:30:00"), ReminderTime::from_hm(8, 30));
        assert_eq!(ReminderTime::parse("23:59:59"), ReminderTime::from_hm(23, 59));
    }

    #[test]
    fn parse_rejects_malformed_times() {
        for raw in ["", "8:30", "08-30", "24:00", "12:60", "ab:cd", "0830", "08:3"] {
            assert_eq!(ReminderTime::parse(raw), None, "accepted {raw:?}");
        }
    }

    #[test]
    fn parse_does_not_panic_on_multibyte_input() {
        assert_eq!(ReminderTime::parse("0é:30"), None);
        assert_eq!(ReminderTime::parse("💧💧"), None);
    }

    #[test]
    fn reminder_time_displays_zero_padded() {
        let time = ReminderTime::from_hm(8, 5).unwrap();
        assert_eq!(time.to_string(), "08:05");
    }

    #[test]
    fn reminder_time_of_truncates_seconds() {
        let at = NaiveDate::from_ymd_opt(2026, 3, 10)
            .unwrap()
            .and_hms_opt(8, 30, 59)
            .unwrap()
            .and_utc();
        assert_eq!(ReminderTime::of::<Utc>(&at), ReminderTime::from_hm(8, 30).unwrap());
    }

    #[test]
    fn category_falls_back_for_unknown_names() {
        assert_eq!(Category::from_name("hydration"), Category::Hydration);
        assert_eq!(Category::from_name("juggling"), Category::Other);
        assert_eq!(Category::from_name(""), Category::Other);
    }

    #[test]
    fn habit_decodes_backend_payload() {
        let json = r#"{
            "id": 42,
            "name": "Drink Water",
            "category": "hydration",
            "reminder_enabled": true,
            "reminder_time": "08:30:00",
            "today_done": false,
            "streak": 3,
            "target_value": 8
        }"#;

        let habit: HabitReminder = serde_json::from_str(json).unwrap();
        assert_eq!(habit.id.as_str(), "42");
        assert_eq!(habit.category, Category::Hydration);
        assert!(habit.reminder_enabled);
        assert_eq!(habit.reminder_at(), ReminderTime::from_hm(8, 30));
        assert!(!habit.today_done);
    }

    #[test]
    fn habit_tolerates_nulls_and_missing_fields() {
        let json = r#"{"id": "h9", "category": null, "reminder_enabled": null, "reminder_time": null}"#;

        let habit: HabitReminder = serde_json::from_str(json).unwrap();
        assert_eq!(habit.id, HabitId::new("h9"));
        assert_eq!(habit.name, "");
        assert_eq!(habit.category, Category::Other);
        assert!(!habit.reminder_enabled);
        assert!(!habit.today_done);
        assert_eq!(habit.reminder_at(), None);
    }

    #[test]
    fn habit_id_serializes_as_string() {
        let habit = HabitReminder::new("h1", "Read", Category::Reading);
        let value = serde_json::to_value(&habit).unwrap();
        assert_eq!(value["id"], "h1");
        assert_eq!(value["category"], "reading");
    }
}
