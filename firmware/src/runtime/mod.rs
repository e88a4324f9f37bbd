use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::gpio::{Flex, Input, Level, Output, Pull, Speed};
use embassy_stm32::rcc::LsConfig;
use embassy_stm32::rtc::{Rtc, RtcConfig};
use embassy_stm32::usart::{Config as UartConfig, DataBits, Parity, StopBits, UartTx};
use embassy_time::Delay;

use coldstart_core::controller::WakeCycleController;
use coldstart_core::pins::GpioPins;

use crate::diagnostics::SerialDiagnostics;
use crate::hw::{self, BackupRegisterStore, Dht11, RtcClock, StandbySleep};

mod episode_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

pub(super) type BoardController = WakeCycleController<
    GpioPins<Input<'static>, Output<'static>>,
    StandbySleep,
    RtcClock,
    Dht11,
    Delay,
>;

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let core = cortex_m::Peripherals::take().expect("core peripherals already taken");
    // Latch the wake flags before the HAL touches PWR.
    let sleep = StandbySleep::capture(core.SCB);

    let mut config = hal::Config::default();
    config.rcc.ls = LsConfig::default_lse();
    let hal::Peripherals {
        PA0,
        PA2,
        PA8,
        PB3,
        USART2,
        RTC,
        ..
    } = hal::init(config);

    let mut uart_config = UartConfig::default();
    uart_config.baudrate = hw::DIAGNOSTIC_BAUD;
    uart_config.data_bits = DataBits::DataBits8;
    uart_config.stop_bits = StopBits::STOP1;
    uart_config.parity = Parity::ParityNone;
    let tx = UartTx::new_blocking(USART2, PA2, uart_config).expect("diagnostic uart config");
    let diagnostics = SerialDiagnostics::new(tx);

    // The relay must idle released from the first instruction that owns it.
    let relay = Output::new(PB3, Level::High, Speed::Low);
    let trigger = Input::new(PA0, Pull::Down);
    let pins = GpioPins::new(trigger, relay);

    let clock = RtcClock::new(Rtc::new(RTC, RtcConfig::default()));
    let sensor = Dht11::new(Flex::new(PA8));
    let store = BackupRegisterStore::unlock();

    let controller = WakeCycleController::new(pins, sleep, clock, sensor, Delay);

    spawner
        .spawn(episode_task::run(controller, store, diagnostics))
        .expect("failed to spawn episode task");

    core::future::pending::<()>().await;
}
