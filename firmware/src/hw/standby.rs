//! Standby entry and wake-cause decoding.
//!
//! Standby drops everything except the backup domain and the wake-up logic,
//! so leaving it is a reset. The wake flags in `PWR_SR1` are read once at
//! boot, before anything else can clear them.

use cortex_m::peripheral::SCB;
use embassy_stm32::pac;
use embassy_stm32::pac::pwr::vals::Lpms;

use coldstart_core::wake::{SleepController, StandbyFlags, WakeCause};

use super::TRIGGER_WAKE_LINE;

const WAKE_LINES: usize = 6;

/// [`SleepController`] backed by the PWR standby mode.
pub struct StandbySleep {
    scb: SCB,
    cause: WakeCause,
}

impl StandbySleep {
    /// Latches the wake cause and clears the PWR wake flags.
    pub fn capture(scb: SCB) -> Self {
        pac::RCC.apbenr1().modify(|w| w.set_pwren(true));
        let cause = read_wake_cause();
        clear_wake_flags();
        Self { scb, cause }
    }
}

impl SleepController for StandbySleep {
    fn wake_cause(&mut self) -> WakeCause {
        self.cause
    }

    fn arm_trigger_wake(&mut self) {
        let pwr = pac::PWR;
        // Keep the trigger's pull-down alive in standby.
        pwr.pdcr(0).modify(|w| w.set_pd(TRIGGER_WAKE_LINE, true));
        pwr.cr4().modify(|w| w.set_wp(TRIGGER_WAKE_LINE, false));
        pwr.cr3().modify(|w| {
            w.set_apc(true);
            w.set_ewup(TRIGGER_WAKE_LINE, true);
        });
        defmt::debug!("standby: trigger wake armed on WKUP{}", TRIGGER_WAKE_LINE + 1);
    }

    fn enter_deep_sleep(&mut self) {
        clear_wake_flags();
        pac::PWR.cr1().modify(|w| w.set_lpms(Lpms::STANDBY));
        self.scb.set_sleepdeep();
        cortex_m::asm::dsb();
        loop {
            cortex_m::asm::wfi();
        }
    }
}

fn read_wake_cause() -> WakeCause {
    let sr1 = pac::PWR.sr1().read();
    let flags = StandbyFlags {
        from_standby: sr1.sbf(),
        wake_lines: (0..WAKE_LINES)
            .filter(|&line| sr1.wuf(line))
            .fold(0u8, |mask, line| mask | (1u8 << line)),
        internal: sr1.wufi(),
    };
    flags.wake_cause(TRIGGER_WAKE_LINE)
}

fn clear_wake_flags() {
    pac::PWR.scr().write(|w| {
        w.set_csbf(true);
        for line in 0..WAKE_LINES {
            w.set_cwuf(line, true);
        }
    });
}
