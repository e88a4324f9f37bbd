#![no_std]

// Shared logic for the cold-start relay controller.
//
// Everything here stays portable across the MCU firmware and the host
// emulator: hardware access is expressed through the capability traits in
// `pins`, `wake`, `clock`, `sensor`, and `retained`, and the episode logic in
// `controller` only ever talks to those traits.

pub mod clock;
pub mod config;
pub mod controller;
pub mod diagnostics;
pub mod pins;
pub mod retained;
pub mod sensor;
pub mod wake;
