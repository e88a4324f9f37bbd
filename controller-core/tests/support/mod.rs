#![allow(dead_code)]

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use coldstart_core::clock::{ClockSource, EpochSeconds};
use coldstart_core::config::ControllerConfig;
use coldstart_core::controller::WakeCycleController;
use coldstart_core::diagnostics::{Diagnostic, DiagnosticSink};
use coldstart_core::pins::PinDriver;
use coldstart_core::retained::{MemoryStore, RetainedState, RetainedStore};
use coldstart_core::sensor::ClimateSensor;
use coldstart_core::wake::{SleepController, WakeCause};
use embedded_hal::delay::DelayNs;

/// Shared simulated time in nanoseconds.
#[derive(Clone, Default)]
pub struct Timeline(Rc<Cell<u64>>);

impl Timeline {
    pub fn starting_at(time: EpochSeconds) -> Self {
        let timeline = Self::default();
        timeline.set_secs(time.as_secs());
        timeline
    }

    pub fn now_ms(&self) -> u64 {
        self.0.get() / 1_000_000
    }

    pub fn now(&self) -> EpochSeconds {
        EpochSeconds::new(u32::try_from(self.0.get() / 1_000_000_000).unwrap())
    }

    pub fn set_secs(&self, secs: u32) {
        self.0.set(u64::from(secs) * 1_000_000_000);
    }

    pub fn advance(&self, duration: Duration) {
        let nanos = u64::try_from(duration.as_nanos()).unwrap();
        self.0.set(self.0.get() + nanos);
    }
}

pub struct FakeClock {
    timeline: Timeline,
    pub sync_succeeds: bool,
    pub sync_timeouts: Vec<Duration>,
    pub set_calls: Vec<EpochSeconds>,
}

impl ClockSource for FakeClock {
    fn sync_local_time(&mut self, timeout: Duration) -> bool {
        self.sync_timeouts.push(timeout);
        self.sync_succeeds
    }

    fn now(&mut self) -> EpochSeconds {
        self.timeline.now()
    }

    fn set_time(&mut self, time: EpochSeconds) {
        self.set_calls.push(time);
        self.timeline.set_secs(time.as_secs());
    }
}

pub struct FakeDelay {
    timeline: Timeline,
}

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.timeline.advance(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.timeline.advance(Duration::from_millis(u64::from(ms)));
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RelayEdge {
    Low { at_ms: u64 },
    High { at_ms: u64 },
}

pub struct ScriptedPins {
    timeline: Timeline,
    /// Number of trigger reads that still return low.
    pub lows_remaining: u32,
    pub trigger_reads: u32,
    pub relay_edges: Vec<RelayEdge>,
    pub relay_high: bool,
}

impl ScriptedPins {
    pub fn pulses(&self) -> Vec<u64> {
        let mut widths = Vec::new();
        let mut pending = None;
        for edge in &self.relay_edges {
            match *edge {
                RelayEdge::Low { at_ms } => pending = Some(at_ms),
                RelayEdge::High { at_ms } => {
                    if let Some(start) = pending.take() {
                        widths.push(at_ms - start);
                    }
                }
            }
        }
        widths
    }
}

impl PinDriver for ScriptedPins {
    fn trigger_is_high(&mut self) -> bool {
        self.trigger_reads += 1;
        if self.lows_remaining == 0 {
            true
        } else {
            self.lows_remaining -= 1;
            false
        }
    }

    fn assert_relay(&mut self) {
        self.relay_high = false;
        self.relay_edges.push(RelayEdge::Low {
            at_ms: self.timeline.now_ms(),
        });
    }

    fn release_relay(&mut self) {
        self.relay_high = true;
        self.relay_edges.push(RelayEdge::High {
            at_ms: self.timeline.now_ms(),
        });
    }
}

/// Sensor that replays `(humidity, temperature)` pairs, `None` meaning a failed read.
#[derive(Default)]
pub struct ScriptedSensor {
    pub queue: VecDeque<(Option<f32>, Option<f32>)>,
    current: Option<(Option<f32>, Option<f32>)>,
    pub begin_calls: u32,
    pub humidity_reads: u32,
}

impl ScriptedSensor {
    pub fn with_temperatures(temperatures: &[f32]) -> Self {
        Self {
            queue: temperatures
                .iter()
                .map(|value| (Some(45.0), Some(*value)))
                .collect(),
            ..Self::default()
        }
    }
}

impl ClimateSensor for ScriptedSensor {
    fn begin(&mut self) {
        self.begin_calls += 1;
    }

    fn read_humidity(&mut self) -> Option<f32> {
        self.humidity_reads += 1;
        self.current = self.queue.pop_front();
        self.current.and_then(|(humidity, _)| humidity)
    }

    fn read_temperature(&mut self) -> Option<f32> {
        self.current.and_then(|(_, temperature)| temperature)
    }
}

pub struct FakeSleep {
    timeline: Timeline,
    pub cause: WakeCause,
    pub armed: u32,
    pub sleeps: u32,
    /// Simulated time spent asleep on every `enter_deep_sleep`.
    pub sleep_for: Duration,
}

impl SleepController for FakeSleep {
    fn wake_cause(&mut self) -> WakeCause {
        self.cause
    }

    fn arm_trigger_wake(&mut self) {
        self.armed += 1;
    }

    fn enter_deep_sleep(&mut self) {
        self.sleeps += 1;
        self.timeline.advance(self.sleep_for);
    }
}

#[derive(Default)]
pub struct RecordingLog {
    pub events: Vec<Diagnostic>,
    pub flushes: u32,
}

impl RecordingLog {
    pub fn count(&self, predicate: impl Fn(&Diagnostic) -> bool) -> usize {
        self.events.iter().filter(|event| predicate(event)).count()
    }
}

impl DiagnosticSink for RecordingLog {
    fn emit(&mut self, event: &Diagnostic) {
        self.events.push(*event);
    }

    fn flush(&mut self) {
        self.flushes += 1;
    }
}

/// Store that remembers every state written to it.
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    pub writes: Vec<RetainedState>,
}

impl RecordingStore {
    pub fn seeded(state: RetainedState) -> Self {
        let mut store = Self::default();
        store.inner.store(&state);
        store
    }
}

impl RetainedStore for RecordingStore {
    fn load(&mut self) -> RetainedState {
        self.inner.load()
    }

    fn store(&mut self, state: &RetainedState) {
        self.writes.push(*state);
        self.inner.store(state);
    }
}

pub type TestController =
    WakeCycleController<ScriptedPins, FakeSleep, FakeClock, ScriptedSensor, FakeDelay>;

/// 2024-10-01 06:00:00.
pub const MORNING: EpochSeconds = EpochSeconds::new(1_727_762_400);

pub struct Bench {
    pub timeline: Timeline,
    pub controller: TestController,
}

impl Bench {
    /// Bench whose trigger stays low for exactly `samples.len()` iterations.
    pub fn with_temperatures(samples: &[f32]) -> Self {
        let sensor = ScriptedSensor::with_temperatures(samples);
        let lows = u32::try_from(samples.len()).unwrap();
        Self::new(sensor, lows)
    }

    pub fn new(sensor: ScriptedSensor, trigger_lows: u32) -> Self {
        let timeline = Timeline::starting_at(MORNING);
        let pins = ScriptedPins {
            timeline: timeline.clone(),
            lows_remaining: trigger_lows,
            trigger_reads: 0,
            relay_edges: Vec::new(),
            relay_high: false,
        };
        let sleep = FakeSleep {
            timeline: timeline.clone(),
            cause: WakeCause::External,
            armed: 0,
            sleeps: 0,
            sleep_for: Duration::from_secs(100),
        };
        let clock = FakeClock {
            timeline: timeline.clone(),
            sync_succeeds: true,
            sync_timeouts: Vec::new(),
            set_calls: Vec::new(),
        };
        let delay = FakeDelay {
            timeline: timeline.clone(),
        };
        let controller = WakeCycleController::with_config(
            pins,
            sleep,
            clock,
            sensor,
            delay,
            ControllerConfig::new(),
        );
        Self {
            timeline,
            controller,
        }
    }

    /// Retained state as if the device went to sleep `secs` before [`MORNING`].
    pub fn slept_for(secs: u32) -> RetainedState {
        RetainedState {
            boot_count: 7,
            sleep_enter_time: EpochSeconds::new(MORNING.as_secs() - secs),
            wakeup_time: EpochSeconds::new(MORNING.as_secs() - secs - 60),
        }
    }
}
