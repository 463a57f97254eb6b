//! Wall-clock access for the reminder scheduler.
//!
//! The scheduler never calls `Local::now()` directly; it reads time through a
//! [`Clock`] so that tests can drive it with simulated time.

use std::time::Duration;

use chrono::{DateTime, Local, NaiveDateTime, TimeDelta, TimeZone};
use tokio::time::Instant;

/// Source of the current local time.
pub trait Clock: Send + Sync + 'static {
    /// Returns the current local wall-clock time.
    fn now(&self) -> DateTime<Local>;
}

/// The host's system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A local clock that starts at a fixed wall-clock time and advances with
/// Tokio's clock.
///
/// Under a paused Tokio runtime (`start_paused = true`) the simulated wall
/// clock moves exactly as far as `tokio::time::advance` or auto-advance moves
/// the timers, so tick and midnight deadlines line up with the reported time.
#[derive(Debug, Clone)]
pub struct SimulatedClock {
    start: NaiveDateTime,
    origin: Instant,
}

impl SimulatedClock {
    /// Starts the clock at local time `start`.
    ///
    /// Must be called inside a Tokio runtime.
    #[must_use]
    pub fn starting_at(start: NaiveDateTime) -> Self {
        Self {
            start,
            origin: Instant::now(),
        }
    }

    /// The simulated local wall-clock time, without time zone resolution.
    #[must_use]
    pub fn naive_now(&self) -> NaiveDateTime {
        let elapsed = TimeDelta::from_std(self.origin.elapsed()).unwrap_or(TimeDelta::zero());
        self.start + elapsed
    }
}

impl Clock for SimulatedClock {
    fn now(&self) -> DateTime<Local> {
        first_valid_instant(&Local, self.naive_now()).unwrap_or_else(Local::now)
    }
}

/// Returns how long to wait from `now` until the start of the next calendar day.
///
/// The result is recomputed from the calendar every time, so days that are 23
/// or 25 hours long around daylight-saving transitions are handled. When
/// midnight itself does not exist in the zone (a DST gap at 00:00), the first
/// valid instant after it is used.
#[must_use]
pub fn duration_until_next_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> Duration {
    let tz = now.timezone();
    let Some(next_day) = now.date_naive().succ_opt() else {
        return Duration::ZERO;
    };

    let midnight = next_day.and_time(chrono::NaiveTime::MIN);
    let Some(next) = first_valid_instant(&tz, midnight) else {
        return Duration::ZERO;
    };

    next.signed_duration_since(now.clone())
        .to_std()
        .unwrap_or(Duration::ZERO)
}

/// Resolves a local datetime, stepping forward over a DST gap if needed.
fn first_valid_instant<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> Option<DateTime<Tz>> {
    // Gaps are at most a couple of hours; probe minute by minute for up to three.
    (0..=180).find_map(|minutes| {
        tz.from_local_datetime(&(local + TimeDelta::minutes(minutes)))
            .earliest()
    })
}
