//! Diagnostic events emitted over the course of a wake episode.
//!
//! The controller never formats text itself. It hands [`Diagnostic`] values to
//! a [`DiagnosticSink`], and each target decides where the human-readable
//! line ends up (UART and defmt on the firmware, a transcript on the host).

use core::fmt::{self, Write as _};

use heapless::String;

use crate::clock::EpochSeconds;
use crate::sensor::ClimateReading;
use crate::wake::WakeCause;

/// Longest rendered diagnostic line, excluding the line terminator.
pub const MAX_DIAGNOSTIC_LINE: usize = 96;

/// Fixed-capacity buffer holding one rendered line.
pub type DiagnosticLine = String<MAX_DIAGNOSTIC_LINE>;

/// Severity attached to a diagnostic.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Level {
    Info,
    Warn,
}

/// Why the sensing loop stopped.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SleepReason {
    /// The trigger pin went high.
    TriggerHigh,
    /// A sensor read failed and the episode was cut short.
    SensorFault,
}

/// Everything the controller reports while it runs.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Diagnostic {
    /// The time source did not answer; the clock now holds the fallback time.
    TimeSyncFallback { fallback: EpochSeconds },
    WakeCause(WakeCause),
    BootNumber(u32),
    /// Wall-clock time right after waking.
    LocalTime(EpochSeconds),
    /// Seconds between the last sleep entry and this wake.
    SleptFor { secs: i64 },
    Sample(ClimateReading),
    SensorFailure,
    RelayActivated { temperature: f32 },
    EnteringSleep(SleepReason),
}

impl Diagnostic {
    #[must_use]
    pub const fn level(&self) -> Level {
        match self {
            Diagnostic::TimeSyncFallback { .. } | Diagnostic::SensorFailure => Level::Warn,
            _ => Level::Info,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::TimeSyncFallback { fallback } => {
                write!(f, "Failed to synchronize time, using default {fallback}")
            }
            Diagnostic::WakeCause(cause) => cause.fmt(f),
            Diagnostic::BootNumber(count) => write!(f, "Boot number: {count}"),
            Diagnostic::LocalTime(now) => now.fmt(f),
            Diagnostic::SleptFor { secs } => write!(f, "Time spent in sleep (seconds): {secs}"),
            Diagnostic::Sample(reading) => write!(
                f,
                "Humidity: {:.2}%  Temperature: {:.2}°C  Heat index: {:.2}°C",
                reading.humidity, reading.temperature, reading.heat_index
            ),
            Diagnostic::SensorFailure => f.write_str("Failed to read from climate sensor!"),
            Diagnostic::RelayActivated { temperature } => {
                write!(f, "Cold-start relay activated at {temperature:.2}°C")
            }
            Diagnostic::EnteringSleep(SleepReason::TriggerHigh) => {
                f.write_str("Trigger pin is high, entering deep sleep.")
            }
            Diagnostic::EnteringSleep(SleepReason::SensorFault) => {
                f.write_str("Sensor fault, entering deep sleep.")
            }
        }
    }
}

/// Renders `event` into a fixed-capacity line.
///
/// Text that does not fit is truncated at a character boundary.
#[must_use]
pub fn render_line(event: &Diagnostic) -> DiagnosticLine {
    let mut line = Truncating(DiagnosticLine::new());
    let _ = write!(line, "{event}");
    line.0
}

struct Truncating(DiagnosticLine);

impl fmt::Write for Truncating {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for ch in s.chars() {
            if self.0.push(ch).is_err() {
                return Err(fmt::Error);
            }
        }
        Ok(())
    }
}

/// Destination for diagnostic events.
pub trait DiagnosticSink {
    fn emit(&mut self, event: &Diagnostic);

    /// Blocks until every emitted line has left the device.
    fn flush(&mut self) {}
}

/// Sink that drops every event.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopDiagnostics;

impl DiagnosticSink for NoopDiagnostics {
    fn emit(&mut self, _: &Diagnostic) {}
}
