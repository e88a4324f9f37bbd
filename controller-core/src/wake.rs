//! Wake causes and the deep-sleep capability.

use core::fmt;

/// Why the device is running.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum WakeCause {
    /// The trigger pin woke the device (primary wake source).
    External,
    /// A group of external wake pins woke the device.
    ExternalGroup,
    /// A wake-up timer expired.
    Timer,
    /// A touch sensor woke the device.
    Touchpad,
    /// The low-power co-processor program woke the device.
    Coprocessor,
    /// Not a wake from deep sleep: power-on, brown-out, or reset.
    PowerOn,
}

impl WakeCause {
    /// Returns `true` when the device is resuming from deep sleep.
    #[must_use]
    pub const fn is_sleep_wake(self) -> bool {
        !matches!(self, WakeCause::PowerOn)
    }

    /// Short machine-friendly tag.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            WakeCause::External => "external",
            WakeCause::ExternalGroup => "external-group",
            WakeCause::Timer => "timer",
            WakeCause::Touchpad => "touchpad",
            WakeCause::Coprocessor => "coprocessor",
            WakeCause::PowerOn => "power-on",
        }
    }

    /// Parses a tag produced by [`WakeCause::tag`].
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        [
            WakeCause::External,
            WakeCause::ExternalGroup,
            WakeCause::Timer,
            WakeCause::Touchpad,
            WakeCause::Coprocessor,
            WakeCause::PowerOn,
        ]
        .into_iter()
        .find(|cause| cause.tag().eq_ignore_ascii_case(tag))
    }
}

impl fmt::Display for WakeCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            WakeCause::External => "Wakeup caused by external signal on the trigger pin",
            WakeCause::ExternalGroup => "Wakeup caused by external signal on a wake pin group",
            WakeCause::Timer => "Wakeup caused by timer",
            WakeCause::Touchpad => "Wakeup caused by touchpad",
            WakeCause::Coprocessor => "Wakeup caused by low-power co-processor program",
            WakeCause::PowerOn => "Wakeup was not caused by deep sleep",
        };
        f.write_str(text)
    }
}

/// Wake-up flags latched by the power controller across a standby period.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct StandbyFlags {
    /// The device was in standby before this reset.
    pub from_standby: bool,
    /// One bit per external wake line that fired, line 0 in bit 0.
    pub wake_lines: u8,
    /// An internal wake source (RTC wake-up timer or alarm) fired.
    pub internal: bool,
}

impl StandbyFlags {
    /// Classifies the latched flags, with `trigger_line` as the primary wake pin.
    ///
    /// A standby exit with no wake flag set cannot be attributed to any source
    /// and is reported as [`WakeCause::PowerOn`].
    #[must_use]
    pub fn wake_cause(self, trigger_line: usize) -> WakeCause {
        if !self.from_standby {
            return WakeCause::PowerOn;
        }
        let trigger = u32::try_from(trigger_line)
            .ok()
            .and_then(|line| 1u8.checked_shl(line))
            .unwrap_or(0);
        if self.wake_lines & trigger != 0 {
            WakeCause::External
        } else if self.wake_lines != 0 {
            WakeCause::ExternalGroup
        } else if self.internal {
            WakeCause::Timer
        } else {
            WakeCause::PowerOn
        }
    }
}

/// Capability interface over the low-power sleep hardware.
pub trait SleepController {
    /// Reports why the current episode started.
    fn wake_cause(&mut self) -> WakeCause;

    /// Arms the trigger pin so a high level wakes the device.
    fn arm_trigger_wake(&mut self);

    /// Enters deep sleep.
    ///
    /// On hardware this never returns: the next instruction executed is the
    /// reset vector. Host implementations return so a harness can start the
    /// next episode.
    fn enter_deep_sleep(&mut self);
}
