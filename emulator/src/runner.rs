//! Drives the shared controller through a scenario, one episode per wake.

use std::io::{self, Write};
use std::time::Duration;

use coldstart_core::clock::{EpochSeconds, TimeSync};
use coldstart_core::controller::{EpisodeExit, EpisodeReport, WakeCycleController};
use coldstart_core::diagnostics::{Diagnostic, DiagnosticSink, Level, render_line};
use coldstart_core::retained::MemoryStore;
use crossterm::style::Stylize;

use crate::board::{Bench, SimClock, SimDelay, SimPins, SimSensor, SimSleep};
use crate::scenario::{EpisodeScript, Scenario};

/// Wall-clock time the simulated RTC holds when a scenario starts
/// (2024-10-01 06:00:00).
pub const SCENARIO_START: EpochSeconds = EpochSeconds::new(1_727_762_400);

/// Calendar a blank RTC restarts from after the backup domain loses power
/// (2000-01-01 00:00:00).
pub const RTC_RESET_TIME: EpochSeconds = EpochSeconds::new(946_684_800);

type SimController = WakeCycleController<SimPins, SimSleep, SimClock, SimSensor, SimDelay>;

/// Writes diagnostics as a transcript, optionally colored for a terminal.
pub struct TranscriptSink<W: Write> {
    out: W,
    bench: Bench,
    origin: EpochSeconds,
    color: bool,
    error: Option<io::Error>,
}

impl<W: Write> TranscriptSink<W> {
    pub fn new(out: W, bench: Bench, color: bool) -> Self {
        let origin = bench.now();
        Self {
            out,
            bench,
            origin,
            color,
            error: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Writes a line that is not a device diagnostic.
    pub fn note(&mut self, text: &str) -> io::Result<()> {
        self.check()?;
        if self.color {
            writeln!(self.out, "{}", text.bold())
        } else {
            writeln!(self.out, "{text}")
        }
    }

    fn check(&mut self) -> io::Result<()> {
        self.error.take().map_or(Ok(()), Err)
    }

    fn write_event(&mut self, event: &Diagnostic) -> io::Result<()> {
        let offset = self.bench.now().seconds_since(self.origin);
        let line = render_line(event);
        let stamp = format!("[{offset:>+8} s]");
        if !self.color {
            return writeln!(self.out, "{stamp} {line}");
        }

        let styled = match (event, event.level()) {
            (_, Level::Warn) => line.as_str().yellow(),
            (Diagnostic::RelayActivated { .. }, _) => line.as_str().green().bold(),
            (Diagnostic::EnteringSleep(_), _) => line.as_str().dark_grey(),
            _ => line.as_str().reset(),
        };
        writeln!(self.out, "{} {styled}", stamp.as_str().dark_grey())
    }
}

impl<W: Write> DiagnosticSink for TranscriptSink<W> {
    fn emit(&mut self, event: &Diagnostic) {
        if self.error.is_some() {
            return;
        }
        self.error = self.write_event(event).err();
    }

    fn flush(&mut self) {
        if self.error.is_some() {
            return;
        }
        self.error = self.out.flush().err();
    }
}

/// Outcome of a whole scenario.
#[derive(Debug)]
pub struct RunSummary {
    pub reports: Vec<EpisodeReport>,
}

impl RunSummary {
    pub fn activations(&self) -> usize {
        self.reports
            .iter()
            .filter(|report| report.has_activated())
            .count()
    }
}

/// Runs every episode of `scenario`, writing the transcript to `out`.
///
/// Mirrors the device: `loop { run_episode(); sleep_until_wake(); }`, with
/// the simulated sleep advancing the bench clock between episodes.
pub fn run<W: Write>(
    scenario: &Scenario,
    out: W,
    color: bool,
) -> io::Result<(RunSummary, W)> {
    let bench = Bench::new(SCENARIO_START);
    let mut controller: SimController = WakeCycleController::new(
        bench.pins(),
        bench.sleep(),
        bench.clock(),
        bench.sensor(),
        bench.delay(),
    );
    let mut store = MemoryStore::new();
    let mut sink = TranscriptSink::new(out, bench.clone(), color);
    let mut summary = RunSummary {
        reports: Vec::with_capacity(scenario.episodes.len()),
    };

    for (index, episode) in scenario.episodes.iter().enumerate() {
        sleep_until_wake(&bench, &mut store, episode, index == 0);
        sink.note(&episode_header(index + 1, episode))?;

        let report = controller.cycle(&mut store, &mut sink);
        sink.check()?;

        let pulses = bench.with(|state| {
            debug_assert!(!state.relay_low, "relay left energized");
            debug_assert!(state.wake_armed, "trigger wake not armed");
            state.relay_pulses
        });
        sink.note(&episode_footer(&report, pulses))?;
        summary.reports.push(report);
    }

    let sleeps = bench.with(|state| state.sleeps);
    sink.note(&format!(
        "== {} episode(s), {} deep sleep(s), relay fired in {} ==",
        summary.reports.len(),
        sleeps,
        summary.activations()
    ))?;
    Ok((summary, sink.into_inner()))
}

/// Stages the next episode. The bench RTC holds [`SCENARIO_START`] when the
/// scenario begins; a later power loss blanks it along with the retained state.
fn sleep_until_wake(bench: &Bench, store: &mut MemoryStore, episode: &EpisodeScript, first: bool) {
    let mut sync_ok = episode.sync_ok;
    if episode.power_loss {
        store.power_loss();
        if !first {
            bench.set_clock(RTC_RESET_TIME);
            sync_ok = false;
        }
    }
    bench.advance(Duration::from_secs(u64::from(episode.slept_secs)));
    bench.stage_wake(episode.cause, sync_ok, &episode.steps);
}

fn episode_header(number: usize, episode: &EpisodeScript) -> String {
    if episode.power_loss {
        format!("-- episode {number}: power applied --")
    } else {
        format!(
            "-- episode {number}: {} wake after {} s --",
            episode.cause.tag(),
            episode.slept_secs
        )
    }
}

fn episode_footer(report: &EpisodeReport, pulses: u32) -> String {
    let sync = match report.time_sync {
        TimeSync::Synchronized => "synced",
        TimeSync::Fallback(_) => "fallback clock",
    };
    let exit = match report.exit {
        EpisodeExit::TriggerReleased => "trigger released",
        EpisodeExit::SensorFault => "sensor fault",
    };
    let relay = report.activated_at_sample.map_or_else(
        || String::from("relay idle"),
        |sample| format!("relay fired at sample {sample} ({pulses} pulse)"),
    );
    format!(
        "-- boot #{}, {sync}, {} sample(s), {relay}, {exit} --",
        report.boot_count, report.samples_taken
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::Profile;
    use coldstart_core::wake::WakeCause;

    fn run_profile(profile: Profile) -> (RunSummary, String) {
        let scenario = Scenario::parse(profile.script()).expect("built-in profile parses");
        let (summary, out) = run(&scenario, Vec::new(), false).expect("in-memory writes");
        (summary, String::from_utf8(out).expect("utf-8 transcript"))
    }

    #[test]
    fn cold_start_fires_once_on_third_sample() {
        let (summary, transcript) = run_profile(Profile::ColdStart);

        let wake = &summary.reports[1];
        assert_eq!(wake.wake_cause, WakeCause::External);
        assert_eq!(wake.boot_count, 2);
        assert_eq!(wake.elapsed_sleep_secs, Some(100));
        assert_eq!(wake.samples_taken, 4);
        assert_eq!(wake.activated_at_sample, Some(3));
        assert!(transcript.contains("relay fired at sample 3 (1 pulse)"));
        assert!(transcript.contains("Cold-start relay activated at 18.00°C"));
        assert!(!transcript.contains("activated at 17.00°C"));
    }

    #[test]
    fn warm_restart_inside_window_keeps_relay_idle() {
        let (summary, transcript) = run_profile(Profile::WarmRestart);
        let wake = &summary.reports[1];
        assert_eq!(wake.elapsed_sleep_secs, Some(600));
        assert!(!wake.has_activated());
        assert!(transcript.contains("Time spent in sleep (seconds): 600"));
    }

    #[test]
    fn long_sleep_fires() {
        let (summary, _) = run_profile(Profile::LongSleep);
        assert!(summary.reports[1].has_activated());
    }

    #[test]
    fn sensor_fault_ends_episode_early() {
        let (summary, transcript) = run_profile(Profile::SensorFault);
        let wake = &summary.reports[1];
        assert_eq!(wake.exit, EpisodeExit::SensorFault);
        assert!(!wake.has_activated());
        assert!(transcript.contains("Failed to read from climate sensor!"));
        assert!(transcript.contains("Sensor fault, entering deep sleep."));
        // The queued step after the failure never runs.
        assert_eq!(wake.samples_taken, 1);
    }

    #[test]
    fn first_boot_skips_sleep_report_and_may_fire() {
        let (summary, transcript) = run_profile(Profile::FirstBoot);
        let boot = &summary.reports[0];
        assert_eq!(boot.wake_cause, WakeCause::PowerOn);
        assert_eq!(boot.boot_count, 1);
        assert_eq!(boot.elapsed_sleep_secs, None);
        assert!(boot.has_activated());
        assert!(!transcript.contains("Time spent in sleep"));
    }

    #[test]
    fn failed_sync_applies_fallback_clock() {
        let scenario = Scenario::parse(
            "power-on\n\
             sync fail\n\
             wake timer after 30s\n",
        )
        .expect("scenario parses");
        let (summary, out) = run(&scenario, Vec::new(), false).expect("in-memory writes");
        let transcript = String::from_utf8(out).expect("utf-8 transcript");

        let wake = &summary.reports[1];
        assert!(matches!(wake.time_sync, TimeSync::Fallback(_)));
        assert!(wake.elapsed_sleep_secs.is_some_and(|secs| secs < 0));
        assert!(transcript.contains("using default Sunday, September 22 2024 12:00:00"));
    }

    #[test]
    fn power_loss_resets_boot_count() {
        let scenario =
            Scenario::parse("power-on\nwake timer after 10s\npower-on\n").expect("scenario parses");
        let (summary, _) = run(&scenario, Vec::new(), false).expect("in-memory writes");
        let counts: Vec<u32> = summary.reports.iter().map(|r| r.boot_count).collect();
        assert_eq!(counts, vec![1, 2, 1]);
    }

    #[test]
    fn power_loss_mid_scenario_blanks_the_rtc() {
        let scenario =
            Scenario::parse("power-on
wake timer after 10s
power-on
").expect("scenario parses");
        let (summary, out) = run(&scenario, Vec::new(), false).expect("in-memory writes");
        let transcript = String::from_utf8(out).expect("utf-8 transcript");

        assert!(summary.reports[0].time_sync.is_synchronized());
        assert!(summary.reports[1].time_sync.is_synchronized());
        assert_eq!(
            summary.reports[2].time_sync,
            TimeSync::Fallback(coldstart_core::config::FALLBACK_TIME)
        );
        assert_eq!(transcript.matches("Failed to synchronize time").count(), 1);
    }
}
