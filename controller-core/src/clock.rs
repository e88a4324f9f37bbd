//! Wall-clock abstractions shared by firmware and host targets.
//!
//! The controller only ever needs whole seconds: sleep durations are compared
//! against windows measured in minutes and hours, and the retained timestamps
//! have to fit in 32-bit backup registers. [`EpochSeconds`] therefore wraps a
//! `u32` count of seconds since 1970-01-01, where zero doubles as the "never
//! recorded" marker. Calendar math is delegated to `chrono`.

use core::{fmt, time::Duration};

use chrono::{DateTime, Datelike, Month, NaiveDateTime, Timelike, Weekday};

/// Seconds since 1970-01-01T00:00:00 on the device's local wall clock.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct EpochSeconds(u32);

impl EpochSeconds {
    /// Marker for a timestamp that has never been recorded.
    pub const UNSET: Self = Self(0);

    /// Wraps a raw seconds count.
    #[must_use]
    pub const fn new(secs: u32) -> Self {
        Self(secs)
    }

    /// Returns the raw seconds count.
    #[must_use]
    pub const fn as_secs(self) -> u32 {
        self.0
    }

    /// Returns `true` when this timestamp was never recorded.
    #[must_use]
    pub const fn is_unset(self) -> bool {
        self.0 == 0
    }

    /// Signed number of seconds between `earlier` and `self`.
    ///
    /// Negative when the clock moved backwards between the two samples, which
    /// happens when a fallback time is applied after a failed sync.
    #[must_use]
    pub const fn seconds_since(self, earlier: Self) -> i64 {
        self.0 as i64 - earlier.0 as i64
    }

    /// Advances the timestamp by whole seconds of `duration`, saturating at the
    /// end of the representable range.
    #[must_use]
    pub fn saturating_add(self, duration: Duration) -> Self {
        let secs = u32::try_from(duration.as_secs()).unwrap_or(u32::MAX);
        Self(self.0.saturating_add(secs))
    }

    /// Calendar view of the timestamp.
    #[must_use]
    pub fn to_datetime(self) -> NaiveDateTime {
        DateTime::from_timestamp(i64::from(self.0), 0)
            .map(|utc| utc.naive_utc())
            .unwrap_or_default()
    }

    /// Converts calendar fields back to seconds.
    ///
    /// Returns `None` for times before 1970 or past the end of the `u32` range.
    #[must_use]
    pub fn from_datetime(datetime: NaiveDateTime) -> Option<Self> {
        u32::try_from(datetime.and_utc().timestamp()).ok().map(Self)
    }
}

impl fmt::Display for EpochSeconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let datetime = self.to_datetime();
        let month = u8::try_from(datetime.month())
            .ok()
            .and_then(|month| Month::try_from(month).ok())
            .map_or("?", |month| month.name());
        write!(
            f,
            "{}, {} {:02} {} {:02}:{:02}:{:02}",
            weekday_name(datetime.weekday()),
            month,
            datetime.day(),
            datetime.year(),
            datetime.hour(),
            datetime.minute(),
            datetime.second()
        )
    }
}

/// Full English weekday name; `chrono` only spells the short form without `alloc`.
const fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Outcome of the start-up time synchronization.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TimeSync {
    /// The external time source delivered a valid wall-clock time.
    Synchronized,
    /// Sync timed out; the clock was set to the contained fallback time.
    Fallback(EpochSeconds),
}

impl TimeSync {
    /// Returns `true` when the external source delivered the time.
    #[must_use]
    pub const fn is_synchronized(self) -> bool {
        matches!(self, TimeSync::Synchronized)
    }
}

/// Capability interface over the wall clock and its external time source.
pub trait ClockSource {
    /// Waits at most `timeout` for the wall clock to hold a trustworthy time.
    ///
    /// Returns `false` when the time source did not deliver before the
    /// deadline.
    fn sync_local_time(&mut self, timeout: Duration) -> bool;

    /// Reads the current wall-clock time.
    fn now(&mut self) -> EpochSeconds;

    /// Commits a new wall-clock time.
    fn set_time(&mut self, time: EpochSeconds);
}

/// Synchronizes the clock, committing `fallback` when the source times out.
pub fn synchronize_or_fallback<C>(clock: &mut C, timeout: Duration, fallback: EpochSeconds) -> TimeSync
where
    C: ClockSource + ?Sized,
{
    if clock.sync_local_time(timeout) {
        TimeSync::Synchronized
    } else {
        clock.set_time(fallback);
        TimeSync::Fallback(fallback)
    }
}
