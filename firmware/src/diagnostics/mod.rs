//! Serial diagnostics for the board.
//!
//! Every [`Diagnostic`] becomes one CRLF-terminated line on the diagnostic
//! UART (9600 baud, the console the relay board's bench harness listens on)
//! and is mirrored to defmt for debugger-attached sessions.

use coldstart_core::diagnostics::{Diagnostic, MAX_DIAGNOSTIC_LINE, render_line};
use heapless::Vec;

/// Longest framed line: the rendered text plus CRLF.
pub const MAX_FRAME: usize = MAX_DIAGNOSTIC_LINE + 2;

/// Serial frame for one diagnostic.
pub type Frame = Vec<u8, MAX_FRAME>;

/// Renders `event` and appends the CRLF terminator.
#[cfg_attr(not(target_os = "none"), allow(dead_code))]
pub fn frame_line(event: &Diagnostic) -> Frame {
    let line = render_line(event);
    let mut frame = Frame::new();
    // Both writes fit: the rendered line is capped two bytes below MAX_FRAME.
    let _ = frame.extend_from_slice(line.as_bytes());
    let _ = frame.extend_from_slice(b"\r\n");
    frame
}

#[cfg(target_os = "none")]
pub use serial::SerialDiagnostics;

#[cfg(target_os = "none")]
mod serial {
    use coldstart_core::diagnostics::{Diagnostic, DiagnosticSink, Level};
    use embassy_stm32::mode::Blocking;
    use embassy_stm32::usart::UartTx;

    use super::frame_line;

    /// [`DiagnosticSink`] writing to a blocking UART transmitter.
    pub struct SerialDiagnostics {
        tx: UartTx<'static, Blocking>,
    }

    impl SerialDiagnostics {
        pub fn new(tx: UartTx<'static, Blocking>) -> Self {
            Self { tx }
        }
    }

    impl DiagnosticSink for SerialDiagnostics {
        fn emit(&mut self, event: &Diagnostic) {
            let frame = frame_line(event);
            let text = core::str::from_utf8(&frame[..frame.len() - 2]).unwrap_or("<invalid>");
            match event.level() {
                Level::Info => defmt::info!("diag: {=str}", text),
                Level::Warn => defmt::warn!("diag: {=str}", text),
            }

            if self.tx.blocking_write(&frame).is_err() {
                defmt::warn!("diag: uart write failed");
            }
        }

        fn flush(&mut self) {
            if self.tx.blocking_flush().is_err() {
                defmt::warn!("diag: uart flush failed");
            }
        }
    }
}
