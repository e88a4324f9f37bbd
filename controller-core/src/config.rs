//! Compile-time configuration for the cold-start controller.
//!
//! Thresholds are fixed at build time; the device has no channel for tuning
//! them in the field.

use core::time::Duration;

use crate::clock::EpochSeconds;
use crate::controller::activation::{ColdStartRule, SleepWindow};

/// Pause before every sensing iteration, letting the sensor settle between reads.
pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(2);
/// Temperatures strictly below this value count as a cold start.
pub const COLD_THRESHOLD_CELSIUS: f32 = 20.0;
/// Sleeps shorter than this qualify for activation.
pub const RECENT_SLEEP_LIMIT_SECS: i64 = 300;
/// Sleeps longer than this qualify for activation.
pub const LONG_SLEEP_LIMIT_SECS: i64 = 21_600;
/// How long the relay output is held low when it fires.
pub const RELAY_PULSE: Duration = Duration::from_millis(300);
/// Upper bound on the wait for the external time source.
pub const TIME_SYNC_TIMEOUT: Duration = Duration::from_secs(5);
/// Wall-clock time committed when the time source does not answer:
/// Sunday, September 22 2024 12:00:00.
pub const FALLBACK_TIME: EpochSeconds = EpochSeconds::new(1_727_006_400);

/// Tunables consumed by [`WakeCycleController`](crate::controller::WakeCycleController).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ControllerConfig {
    pub sample_interval: Duration,
    pub rule: ColdStartRule,
    pub relay_pulse: Duration,
    pub time_sync_timeout: Duration,
    pub fallback_time: EpochSeconds,
}

impl ControllerConfig {
    /// Configuration matching the deployed relay wiring.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sample_interval: SAMPLE_INTERVAL,
            rule: ColdStartRule::new(
                COLD_THRESHOLD_CELSIUS,
                SleepWindow::new(RECENT_SLEEP_LIMIT_SECS, LONG_SLEEP_LIMIT_SECS),
            ),
            relay_pulse: RELAY_PULSE,
            time_sync_timeout: TIME_SYNC_TIMEOUT,
            fallback_time: FALLBACK_TIME,
        }
    }

    /// Fallback time as an epoch timestamp.
    #[must_use]
    pub const fn fallback_epoch(&self) -> EpochSeconds {
        self.fallback_time
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn fallback_time_is_noon_on_the_deployment_date() {
        let expected = NaiveDate::from_ymd_opt(2024, 9, 22)
            .and_then(|date| date.and_hms_opt(12, 0, 0))
            .expect("valid date");
        assert_eq!(FALLBACK_TIME.to_datetime(), expected);
        assert_eq!(ControllerConfig::new().fallback_epoch(), FALLBACK_TIME);
    }
}
