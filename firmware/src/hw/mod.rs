//! Board support for the STM32G0B1 relay controller.
//!
//! Pin map:
//!
//! | Signal        | Pin  | Mode                              |
//! |---------------|------|-----------------------------------|
//! | Trigger input | PA0  | input, pull-down, WKUP1           |
//! | Relay driver  | PB3  | push-pull, idles high             |
//! | DHT11 data    | PA8  | open-drain, external 10k pull-up  |
//! | Diagnostics   | PA2  | USART2 TX, 9600 8N1               |
//!
//! The RTC runs from the 32.768 kHz LSE so the calendar and the backup
//! registers survive standby.

pub mod backup;
pub mod dht11;
pub mod rtc_clock;
pub mod standby;

pub use backup::BackupRegisterStore;
pub use dht11::Dht11;
pub use rtc_clock::RtcClock;
pub use standby::StandbySleep;

/// Diagnostic console baud rate.
pub const DIAGNOSTIC_BAUD: u32 = 9_600;

/// WKUP line wired to the trigger input (WKUP1, zero-based index 0).
pub const TRIGGER_WAKE_LINE: usize = 0;
