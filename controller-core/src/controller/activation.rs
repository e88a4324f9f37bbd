//! Cold-start activation rule.
//!
//! The relay fires when the device wakes cold after either a very short or a
//! very long sleep. Elapsed sleep is sampled once per episode, so the decision
//! for a given episode only changes with temperature and with whether the
//! relay already fired.

use core::cmp::Ordering;

/// Elapsed-sleep bounds outside of which activation is allowed.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SleepWindow {
    recent_limit_secs: i64,
    long_limit_secs: i64,
}

impl SleepWindow {
    /// Creates a window admitting sleeps shorter than `recent_limit_secs` or
    /// longer than `long_limit_secs`.
    #[must_use]
    pub const fn new(recent_limit_secs: i64, long_limit_secs: i64) -> Self {
        Self {
            recent_limit_secs,
            long_limit_secs,
        }
    }

    #[must_use]
    pub const fn recent_limit_secs(&self) -> i64 {
        self.recent_limit_secs
    }

    #[must_use]
    pub const fn long_limit_secs(&self) -> i64 {
        self.long_limit_secs
    }

    /// Returns `true` when the elapsed sleep qualifies for activation.
    ///
    /// An unknown sleep duration (first wake after a full power loss) is
    /// treated as an arbitrarily long sleep and qualifies.
    #[must_use]
    pub const fn admits(&self, elapsed_sleep_secs: Option<i64>) -> bool {
        match elapsed_sleep_secs {
            Some(elapsed) => elapsed < self.recent_limit_secs || elapsed > self.long_limit_secs,
            None => true,
        }
    }
}

/// Result of evaluating the activation rule for one sample.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ActivationDecision {
    /// Every condition holds; pulse the relay.
    Fire,
    /// Temperature is at or above the cold threshold.
    TooWarm,
    /// The relay already fired during this episode.
    AlreadyActivated,
    /// Elapsed sleep sits between the recent and long limits.
    OutsideSleepWindow,
}

impl ActivationDecision {
    #[must_use]
    pub const fn should_fire(self) -> bool {
        matches!(self, ActivationDecision::Fire)
    }
}

/// Temperature threshold combined with the elapsed-sleep window.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ColdStartRule {
    threshold_celsius: f32,
    window: SleepWindow,
}

impl ColdStartRule {
    #[must_use]
    pub const fn new(threshold_celsius: f32, window: SleepWindow) -> Self {
        Self {
            threshold_celsius,
            window,
        }
    }

    #[must_use]
    pub const fn threshold_celsius(&self) -> f32 {
        self.threshold_celsius
    }

    #[must_use]
    pub const fn window(&self) -> SleepWindow {
        self.window
    }

    /// Evaluates the rule for a validated temperature sample.
    ///
    /// Conditions are checked in order: temperature, prior activation, sleep
    /// window. The first one that fails is reported.
    #[must_use]
    pub fn evaluate(
        &self,
        temperature_celsius: f32,
        already_activated: bool,
        elapsed_sleep_secs: Option<i64>,
    ) -> ActivationDecision {
        if temperature_celsius.partial_cmp(&self.threshold_celsius) != Some(Ordering::Less) {
            ActivationDecision::TooWarm
        } else if already_activated {
            ActivationDecision::AlreadyActivated
        } else if !self.window.admits(elapsed_sleep_secs) {
            ActivationDecision::OutsideSleepWindow
        } else {
            ActivationDecision::Fire
        }
    }
}
