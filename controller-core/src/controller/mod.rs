//! Wake-episode orchestration shared between firmware and host targets.
//!
//! One episode is everything between a wake and the following sleep entry:
//! bring up the time base, book the wake in retained state, then sample the
//! sensor every couple of seconds while the trigger pin stays low, pulsing the
//! relay at most once when the cold-start rule holds. The controller talks to
//! hardware only through the capability traits, so the same code drives the
//! STM32 firmware and the host emulator.

pub mod activation;

use core::time::Duration;

use embedded_hal::delay::DelayNs;
use heapless::HistoryBuf;

use crate::clock::{ClockSource, EpochSeconds, TimeSync, synchronize_or_fallback};
use crate::config::ControllerConfig;
use crate::diagnostics::{Diagnostic, DiagnosticSink, SleepReason};
use crate::pins::PinDriver;
use crate::retained::RetainedStore;
use crate::sensor::{ClimateReading, ClimateSensor, read_climate};
use crate::wake::{SleepController, WakeCause};

pub use activation::{ActivationDecision, ColdStartRule, SleepWindow};

/// Number of recent samples kept in an [`EpisodeReport`].
pub const SAMPLE_HISTORY: usize = 16;

/// How the sensing loop ended.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EpisodeExit {
    /// The trigger pin read high.
    TriggerReleased,
    /// A sensor read failed; the loop stopped without evaluating the rule.
    SensorFault,
}

impl EpisodeExit {
    const fn sleep_reason(self) -> SleepReason {
        match self {
            EpisodeExit::TriggerReleased => SleepReason::TriggerHigh,
            EpisodeExit::SensorFault => SleepReason::SensorFault,
        }
    }
}

/// Transient per-episode state: the activation latch plus sample bookkeeping.
#[derive(Clone, Debug)]
pub struct SensingSession {
    rule: ColdStartRule,
    elapsed_sleep_secs: Option<i64>,
    has_activated: bool,
    samples_taken: u32,
    activated_at_sample: Option<u32>,
    recent: HistoryBuf<ClimateReading, SAMPLE_HISTORY>,
}

impl SensingSession {
    /// Starts a session with the latch cleared.
    ///
    /// `elapsed_sleep_secs` is captured once here and reused for every sample.
    #[must_use]
    pub fn new(rule: ColdStartRule, elapsed_sleep_secs: Option<i64>) -> Self {
        Self {
            rule,
            elapsed_sleep_secs,
            has_activated: false,
            samples_taken: 0,
            activated_at_sample: None,
            recent: HistoryBuf::new(),
        }
    }

    #[must_use]
    pub fn has_activated(&self) -> bool {
        self.has_activated
    }

    #[must_use]
    pub fn samples_taken(&self) -> u32 {
        self.samples_taken
    }

    #[must_use]
    pub fn elapsed_sleep_secs(&self) -> Option<i64> {
        self.elapsed_sleep_secs
    }

    /// Records a validated sample and evaluates the cold-start rule.
    ///
    /// A [`ActivationDecision::Fire`] result latches the session, so later
    /// samples report [`ActivationDecision::AlreadyActivated`] instead.
    pub fn observe(&mut self, reading: ClimateReading) -> ActivationDecision {
        self.samples_taken = self.samples_taken.saturating_add(1);
        self.recent.write(reading);

        let decision =
            self.rule
                .evaluate(reading.temperature, self.has_activated, self.elapsed_sleep_secs);
        if decision.should_fire() {
            self.has_activated = true;
            self.activated_at_sample = Some(self.samples_taken);
        }
        decision
    }
}

/// Summary of one episode, returned to host harnesses.
#[derive(Clone, Debug)]
pub struct EpisodeReport {
    pub boot_count: u32,
    pub wake_cause: WakeCause,
    pub time_sync: TimeSync,
    pub wakeup_time: EpochSeconds,
    pub sleep_enter_time: EpochSeconds,
    pub elapsed_sleep_secs: Option<i64>,
    pub samples_taken: u32,
    /// 1-based index of the sample that fired the relay.
    pub activated_at_sample: Option<u32>,
    pub exit: EpisodeExit,
    pub recent_samples: HistoryBuf<ClimateReading, SAMPLE_HISTORY>,
}

impl EpisodeReport {
    #[must_use]
    pub fn has_activated(&self) -> bool {
        self.activated_at_sample.is_some()
    }
}

/// Drives wake episodes against a set of hardware capabilities.
pub struct WakeCycleController<P, S, C, T, D> {
    pins: P,
    sleep: S,
    clock: C,
    sensor: T,
    delay: D,
    config: ControllerConfig,
}

impl<P, S, C, T, D> WakeCycleController<P, S, C, T, D>
where
    P: PinDriver,
    S: SleepController,
    C: ClockSource,
    T: ClimateSensor,
    D: DelayNs,
{
    /// Creates a controller using [`ControllerConfig::new`].
    pub fn new(pins: P, sleep: S, clock: C, sensor: T, delay: D) -> Self {
        Self::with_config(pins, sleep, clock, sensor, delay, ControllerConfig::new())
    }

    /// Creates a controller with explicit tunables.
    pub fn with_config(
        pins: P,
        sleep: S,
        clock: C,
        sensor: T,
        delay: D,
        config: ControllerConfig,
    ) -> Self {
        Self {
            pins,
            sleep,
            clock,
            sensor,
            delay,
            config,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn pins(&self) -> &P {
        &self.pins
    }

    pub fn pins_mut(&mut self) -> &mut P {
        &mut self.pins
    }

    pub fn sleep(&self) -> &S {
        &self.sleep
    }

    pub fn sleep_mut(&mut self) -> &mut S {
        &mut self.sleep
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn sensor_mut(&mut self) -> &mut T {
        &mut self.sensor
    }

    /// Runs one wake episode up to, but not including, deep-sleep entry.
    ///
    /// Retained state is persisted twice: once the wake is booked and again
    /// after the sleep-entry timestamp is taken.
    pub fn run_episode<R, L>(&mut self, store: &mut R, log: &mut L) -> EpisodeReport
    where
        R: RetainedStore + ?Sized,
        L: DiagnosticSink + ?Sized,
    {
        let mut retained = store.load();

        let time_sync = synchronize_or_fallback(
            &mut self.clock,
            self.config.time_sync_timeout,
            self.config.fallback_epoch(),
        );
        if let TimeSync::Fallback(fallback) = time_sync {
            log.emit(&Diagnostic::TimeSyncFallback { fallback });
        }

        self.pins.release_relay();

        let wake_cause = self.sleep.wake_cause();
        log.emit(&Diagnostic::WakeCause(wake_cause));

        let wakeup_time = self.clock.now();
        let boot_count = retained.record_wake(wakeup_time);
        store.store(&retained);
        log.emit(&Diagnostic::BootNumber(boot_count));
        log.emit(&Diagnostic::LocalTime(wakeup_time));

        let elapsed_sleep_secs = retained.elapsed_sleep_secs();
        if let Some(secs) = elapsed_sleep_secs {
            log.emit(&Diagnostic::SleptFor { secs });
        }

        self.sleep.arm_trigger_wake();
        self.sensor.begin();

        let mut session = SensingSession::new(self.config.rule, elapsed_sleep_secs);
        let exit = self.sense(&mut session, log);

        log.emit(&Diagnostic::EnteringSleep(exit.sleep_reason()));
        let sleep_enter_time = self.clock.now();
        retained.record_sleep_entry(sleep_enter_time);
        store.store(&retained);
        log.flush();

        EpisodeReport {
            boot_count,
            wake_cause,
            time_sync,
            wakeup_time,
            sleep_enter_time,
            elapsed_sleep_secs,
            samples_taken: session.samples_taken,
            activated_at_sample: session.activated_at_sample,
            exit,
            recent_samples: session.recent,
        }
    }

    /// Runs one episode and enters deep sleep.
    ///
    /// Only returns on targets whose [`SleepController`] returns from sleep.
    pub fn cycle<R, L>(&mut self, store: &mut R, log: &mut L) -> EpisodeReport
    where
        R: RetainedStore + ?Sized,
        L: DiagnosticSink + ?Sized,
    {
        let report = self.run_episode(store, log);
        self.sleep.enter_deep_sleep();
        report
    }

    /// Episode/sleep loop for hardware targets.
    pub fn run_forever<R, L>(&mut self, store: &mut R, log: &mut L) -> !
    where
        R: RetainedStore + ?Sized,
        L: DiagnosticSink + ?Sized,
    {
        loop {
            let _ = self.cycle(store, log);
        }
    }

    fn sense<L>(&mut self, session: &mut SensingSession, log: &mut L) -> EpisodeExit
    where
        L: DiagnosticSink + ?Sized,
    {
        while !self.pins.trigger_is_high() {
            self.delay.delay_ms(duration_ms(self.config.sample_interval));

            let Some(reading) = read_climate(&mut self.sensor) else {
                log.emit(&Diagnostic::SensorFailure);
                return EpisodeExit::SensorFault;
            };
            log.emit(&Diagnostic::Sample(reading));

            if session.observe(reading).should_fire() {
                log.emit(&Diagnostic::RelayActivated {
                    temperature: reading.temperature,
                });
                self.pulse_relay();
            }
        }
        EpisodeExit::TriggerReleased
    }

    fn pulse_relay(&mut self) {
        self.pins.assert_relay();
        self.delay.delay_ms(duration_ms(self.config.relay_pulse));
        self.pins.release_relay();
    }
}

fn duration_ms(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}
