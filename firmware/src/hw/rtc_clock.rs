//! Wall clock on the LSE-backed RTC.
//!
//! The calendar keeps running through standby, so "synchronizing" means
//! waiting for the RTC to report a plausible calendar. A blank backup domain
//! reads as 2000-01-01 and never becomes plausible on its own.

use core::time::Duration;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};
use embassy_stm32::rtc::{DateTime, DayOfWeek, Rtc};
use embassy_time::{Duration as TickDuration, Instant, block_for};

use coldstart_core::clock::{ClockSource, EpochSeconds};

/// Earliest calendar year accepted as a real, previously set time.
const MIN_PLAUSIBLE_YEAR: i32 = 2024;

const POLL_INTERVAL: TickDuration = TickDuration::from_millis(50);

/// [`ClockSource`] over the on-chip RTC.
pub struct RtcClock {
    rtc: Rtc,
}

impl RtcClock {
    pub fn new(rtc: Rtc) -> Self {
        Self { rtc }
    }

    fn read_civil(&self) -> Option<NaiveDateTime> {
        let now = self.rtc.now().ok()?;
        NaiveDate::from_ymd_opt(i32::from(now.year()), u32::from(now.month()), u32::from(now.day()))?
            .and_hms_opt(
                u32::from(now.hour()),
                u32::from(now.minute()),
                u32::from(now.second()),
            )
    }
}

impl ClockSource for RtcClock {
    fn sync_local_time(&mut self, timeout: Duration) -> bool {
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        let deadline = Instant::now() + TickDuration::from_millis(timeout_ms);
        loop {
            if self
                .read_civil()
                .is_some_and(|civil| civil.year() >= MIN_PLAUSIBLE_YEAR)
            {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            block_for(POLL_INTERVAL);
        }
    }

    fn now(&mut self) -> EpochSeconds {
        self.read_civil()
            .and_then(EpochSeconds::from_datetime)
            .unwrap_or_else(|| {
                defmt::warn!("rtc: calendar unreadable");
                EpochSeconds::UNSET
            })
    }

    fn set_time(&mut self, time: EpochSeconds) {
        let civil = time.to_datetime();
        let datetime = match (
            u16::try_from(civil.year()),
            narrow(civil.month()),
            narrow(civil.day()),
            narrow(civil.hour()),
            narrow(civil.minute()),
            narrow(civil.second()),
        ) {
            (Ok(year), Some(month), Some(day), Some(hour), Some(minute), Some(second)) => {
                DateTime::from(
                    year,
                    month,
                    day,
                    day_of_week(civil.weekday()),
                    hour,
                    minute,
                    second,
                    0,
                )
                .ok()
            }
            _ => None,
        };
        match datetime {
            Some(datetime) => {
                if self.rtc.set_datetime(datetime).is_err() {
                    defmt::warn!("rtc: failed to set calendar");
                }
            }
            None => defmt::warn!("rtc: {} is out of range", time.as_secs()),
        }
    }
}

fn narrow(field: u32) -> Option<u8> {
    u8::try_from(field).ok()
}

const fn day_of_week(day: Weekday) -> DayOfWeek {
    match day {
        Weekday::Mon => DayOfWeek::Monday,
        Weekday::Tue => DayOfWeek::Tuesday,
        Weekday::Wed => DayOfWeek::Wednesday,
        Weekday::Thu => DayOfWeek::Thursday,
        Weekday::Fri => DayOfWeek::Friday,
        Weekday::Sat => DayOfWeek::Saturday,
        Weekday::Sun => DayOfWeek::Sunday,
    }
}
