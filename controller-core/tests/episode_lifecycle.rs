mod support;

use std::time::Duration;

use coldstart_core::clock::{EpochSeconds, TimeSync};
use coldstart_core::config::{FALLBACK_TIME, TIME_SYNC_TIMEOUT};
use coldstart_core::diagnostics::{Diagnostic, SleepReason};
use coldstart_core::retained::{RetainedState, RetainedStore};
use coldstart_core::wake::{SleepController, WakeCause};

use support::{Bench, MORNING, RecordingLog, RecordingStore, ScriptedSensor};

#[test]
fn boot_count_advances_once_per_episode_for_every_wake_cause() {
    let mut bench = Bench::new(ScriptedSensor::default(), 0);
    let mut store = RecordingStore::default();
    let mut log = RecordingLog::default();

    let causes = [
        WakeCause::PowerOn,
        WakeCause::External,
        WakeCause::Timer,
        WakeCause::Touchpad,
        WakeCause::Coprocessor,
        WakeCause::ExternalGroup,
    ];
    for (index, cause) in causes.into_iter().enumerate() {
        bench.controller.sleep_mut().cause = cause;
        let report = bench.controller.cycle(&mut store, &mut log);
        assert_eq!(report.wake_cause, cause);
        assert_eq!(report.boot_count, u32::try_from(index).unwrap() + 1);
    }

    assert_eq!(store.load().boot_count, 6);
    assert_eq!(bench.controller.sleep().sleeps, 6);
    assert_eq!(bench.controller.sleep().armed, 6);
}

#[test]
fn host_loop_carries_sleep_duration_between_episodes() {
    let mut bench = Bench::new(ScriptedSensor::default(), 0);
    bench.controller.sleep_mut().sleep_for = Duration::from_secs(450);
    let mut store = RecordingStore::default();
    let mut log = RecordingLog::default();

    let mut elapsed = Vec::new();
    for _ in 0..3 {
        let report = bench.controller.run_episode(&mut store, &mut log);
        elapsed.push(report.elapsed_sleep_secs);
        bench.controller.sleep_mut().enter_deep_sleep();
    }

    assert_eq!(elapsed, vec![None, Some(450), Some(450)]);
}

#[test]
fn wake_is_persisted_before_sensing_and_sleep_entry_after() {
    let mut bench = Bench::with_temperatures(&[25.0, 24.0]);
    let mut store = RecordingStore::seeded(Bench::slept_for(100));
    store.writes.clear();
    let mut log = RecordingLog::default();

    let report = bench.controller.run_episode(&mut store, &mut log);

    assert_eq!(store.writes.len(), 2);
    let booked = store.writes[0];
    assert_eq!(booked.boot_count, 8);
    assert_eq!(booked.wakeup_time, MORNING);
    assert_eq!(
        booked.sleep_enter_time,
        Bench::slept_for(100).sleep_enter_time,
        "sleep-entry time only changes right before sleep"
    );

    let parked = store.writes[1];
    assert_eq!(parked.boot_count, 8);
    assert_eq!(parked.wakeup_time, MORNING);
    assert_eq!(parked.sleep_enter_time, report.sleep_enter_time);
    assert_eq!(parked.sleep_enter_time.as_secs(), MORNING.as_secs() + 4);
}

#[test]
fn failed_time_sync_falls_back_to_default_date() {
    let mut bench = Bench::with_temperatures(&[25.0]);
    bench.controller.clock_mut().sync_succeeds = false;
    let mut store = RecordingStore::seeded(RetainedState::COLD);
    let mut log = RecordingLog::default();

    let report = bench.controller.run_episode(&mut store, &mut log);

    let fallback = FALLBACK_TIME;
    assert_eq!(report.time_sync, TimeSync::Fallback(fallback));
    assert_eq!(report.wakeup_time, fallback);
    assert_eq!(bench.controller.clock_mut().set_calls, vec![fallback]);
    assert_eq!(
        bench.controller.clock_mut().sync_timeouts,
        vec![TIME_SYNC_TIMEOUT]
    );
    assert_eq!(
        log.events.first(),
        Some(&Diagnostic::TimeSyncFallback { fallback })
    );
}

#[test]
fn fallback_clock_behind_sleep_stamp_yields_negative_elapsed() {
    let mut bench = Bench::with_temperatures(&[15.0]);
    bench.controller.clock_mut().sync_succeeds = false;
    let mut store = RecordingStore::seeded(Bench::slept_for(100));
    let mut log = RecordingLog::default();

    let report = bench.controller.run_episode(&mut store, &mut log);

    let fallback = FALLBACK_TIME;
    let expected = fallback.seconds_since(Bench::slept_for(100).sleep_enter_time);
    assert!(expected < 0);
    assert_eq!(report.elapsed_sleep_secs, Some(expected));
    assert!(report.has_activated());
}

#[test]
fn diagnostics_follow_start_up_order() {
    let mut bench = Bench::with_temperatures(&[25.0]);
    let mut store = RecordingStore::seeded(Bench::slept_for(100));
    let mut log = RecordingLog::default();

    let _ = bench.controller.run_episode(&mut store, &mut log);

    assert_eq!(log.events[0], Diagnostic::WakeCause(WakeCause::External));
    assert_eq!(log.events[1], Diagnostic::BootNumber(8));
    assert_eq!(log.events[2], Diagnostic::LocalTime(MORNING));
    assert_eq!(log.events[3], Diagnostic::SleptFor { secs: 100 });
    assert!(matches!(log.events[4], Diagnostic::Sample(_)));
    assert_eq!(
        log.events.last(),
        Some(&Diagnostic::EnteringSleep(SleepReason::TriggerHigh))
    );
    assert_eq!(log.flushes, 1);
}

#[test]
fn sensor_is_initialized_once_per_episode() {
    let mut bench = Bench::new(ScriptedSensor::default(), 0);
    let mut store = RecordingStore::default();
    let mut log = RecordingLog::default();

    let _ = bench.controller.cycle(&mut store, &mut log);
    let _ = bench.controller.cycle(&mut store, &mut log);

    assert_eq!(bench.controller.sensor_mut().begin_calls, 2);
}

#[test]
fn activation_latch_resets_every_episode() {
    let mut bench = Bench::with_temperatures(&[10.0, 10.0]);
    bench.controller.sleep_mut().sleep_for = Duration::from_secs(60);
    let mut store = RecordingStore::seeded(Bench::slept_for(100));
    let mut log = RecordingLog::default();

    let first = bench.controller.cycle(&mut store, &mut log);
    assert_eq!(first.activated_at_sample, Some(1));

    bench
        .controller
        .sensor_mut()
        .queue
        .extend([(Some(40.0), Some(9.0)), (Some(40.0), Some(8.0))]);
    bench.controller.pins_mut().lows_remaining = 2;
    let second = bench.controller.cycle(&mut store, &mut log);

    assert_eq!(second.elapsed_sleep_secs, Some(60));
    assert_eq!(second.activated_at_sample, Some(1));
    assert_eq!(bench.controller.pins().pulses().len(), 2);
    assert_eq!(
        store.load().sleep_enter_time,
        EpochSeconds::new(second.sleep_enter_time.as_secs())
    );
}
