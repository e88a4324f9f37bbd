//! Simulated board: every capability the controller needs, backed by one
//! shared [`Bench`] so the runner can stage each episode.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use coldstart_core::clock::{ClockSource, EpochSeconds};
use coldstart_core::pins::PinDriver;
use coldstart_core::sensor::ClimateSensor;
use coldstart_core::wake::{SleepController, WakeCause};
use embedded_hal::delay::DelayNs;

use crate::scenario::SensorStep;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Mutable state of the simulated hardware.
#[derive(Debug)]
pub struct BenchState {
    /// Device wall clock in nanoseconds since the Unix epoch.
    pub now_ns: u64,
    pub sync_ok: bool,
    pub cause: WakeCause,
    pub steps: VecDeque<SensorStep>,
    current: Option<SensorStep>,
    pub relay_low: bool,
    pub relay_pulses: u32,
    pub wake_armed: bool,
    pub sleeps: u32,
}

/// Shared handle to the simulated hardware.
#[derive(Clone, Debug)]
pub struct Bench(Rc<RefCell<BenchState>>);

impl Bench {
    pub fn new(start: EpochSeconds) -> Self {
        Self(Rc::new(RefCell::new(BenchState {
            now_ns: u64::from(start.as_secs()) * NANOS_PER_SEC,
            sync_ok: true,
            cause: WakeCause::PowerOn,
            steps: VecDeque::new(),
            current: None,
            relay_low: false,
            relay_pulses: 0,
            wake_armed: false,
            sleeps: 0,
        })))
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut BenchState) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }

    pub fn now(&self) -> EpochSeconds {
        self.with(|state| epoch_from_ns(state.now_ns))
    }

    /// Overwrites the wall clock, as a backup-domain reset does to the RTC.
    pub fn set_clock(&self, time: EpochSeconds) {
        self.with(|state| state.now_ns = u64::from(time.as_secs()) * NANOS_PER_SEC);
    }

    pub fn advance(&self, by: Duration) {
        let nanos = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        self.with(|state| state.now_ns = state.now_ns.saturating_add(nanos));
    }

    /// Stages the next wake: cause, time-source behaviour and sensor steps.
    pub fn stage_wake(&self, cause: WakeCause, sync_ok: bool, steps: &[SensorStep]) {
        self.with(|state| {
            state.cause = cause;
            state.sync_ok = sync_ok;
            state.steps = steps.iter().copied().collect();
            state.current = None;
            state.wake_armed = false;
            state.relay_pulses = 0;
        });
    }

    pub fn pins(&self) -> SimPins {
        SimPins(self.clone())
    }

    pub fn sleep(&self) -> SimSleep {
        SimSleep(self.clone())
    }

    pub fn clock(&self) -> SimClock {
        SimClock(self.clone())
    }

    pub fn sensor(&self) -> SimSensor {
        SimSensor(self.clone())
    }

    pub fn delay(&self) -> SimDelay {
        SimDelay(self.clone())
    }
}

fn epoch_from_ns(now_ns: u64) -> EpochSeconds {
    EpochSeconds::new(u32::try_from(now_ns / NANOS_PER_SEC).unwrap_or(u32::MAX))
}

/// Trigger reads low while sensing steps remain queued.
pub struct SimPins(Bench);

impl PinDriver for SimPins {
    fn trigger_is_high(&mut self) -> bool {
        self.0.with(|state| state.steps.is_empty())
    }

    fn assert_relay(&mut self) {
        self.0.with(|state| {
            state.relay_low = true;
            state.relay_pulses += 1;
        });
    }

    fn release_relay(&mut self) {
        self.0.with(|state| state.relay_low = false);
    }
}

/// Sleep controller that returns so the runner can stage the next wake.
pub struct SimSleep(Bench);

impl SleepController for SimSleep {
    fn wake_cause(&mut self) -> WakeCause {
        self.0.with(|state| state.cause)
    }

    fn arm_trigger_wake(&mut self) {
        self.0.with(|state| state.wake_armed = true);
    }

    fn enter_deep_sleep(&mut self) {
        self.0.with(|state| state.sleeps += 1);
    }
}

/// Device clock; a failed sync burns the whole timeout.
pub struct SimClock(Bench);

impl ClockSource for SimClock {
    fn sync_local_time(&mut self, timeout: Duration) -> bool {
        let ok = self.0.with(|state| state.sync_ok);
        if !ok {
            self.0.advance(timeout);
        }
        ok
    }

    fn now(&mut self) -> EpochSeconds {
        self.0.now()
    }

    fn set_time(&mut self, time: EpochSeconds) {
        self.0.set_clock(time);
    }
}

/// Sensor replaying the staged steps; humidity is read first, and the
/// temperature read completes the step.
pub struct SimSensor(Bench);

impl SimSensor {
    fn current(&mut self) -> Option<SensorStep> {
        self.0.with(|state| {
            if state.current.is_none() {
                state.current = state.steps.pop_front();
            }
            state.current
        })
    }
}

impl ClimateSensor for SimSensor {
    fn read_humidity(&mut self) -> Option<f32> {
        match self.current()? {
            SensorStep::Reading { humidity, .. } => Some(humidity),
            SensorStep::Failure => Some(f32::NAN),
        }
    }

    fn read_temperature(&mut self) -> Option<f32> {
        let step = self.current();
        self.0.with(|state| state.current = None);
        match step? {
            SensorStep::Reading { temperature, .. } => Some(temperature),
            SensorStep::Failure => Some(f32::NAN),
        }
    }
}

/// Delay that advances the simulated clock instead of blocking.
pub struct SimDelay(Bench);

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.advance(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0.advance(Duration::from_millis(u64::from(ms)));
    }
}
