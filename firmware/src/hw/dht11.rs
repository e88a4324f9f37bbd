//! Bit-banged DHT11 driver on an open-drain pin.
//!
//! Timing-critical edges are measured inside a critical section; everything
//! after the 40 high-phase widths are captured is handled by
//! [`DhtFrame::from_high_phases`].

use embassy_stm32::gpio::{Flex, Pull, Speed};
use embassy_time::{Duration, Instant, block_for};

use coldstart_core::sensor::ClimateSensor;
use coldstart_core::sensor::dht::{DHT_FRAME_BITS, DHT_MIN_INTERVAL_MS, DhtError, DhtFrame};

/// Host start pulse; the DHT11 needs at least 18 ms.
const START_PULSE: Duration = Duration::from_millis(20);
/// Longest legal single phase on the wire.
const EDGE_TIMEOUT_US: u64 = 120;

/// DHT11 on a [`Flex`] pin configured as open-drain with pull-up.
pub struct Dht11 {
    pin: Flex<'static>,
    last: Option<(Instant, DhtFrame)>,
}

impl Dht11 {
    pub fn new(mut pin: Flex<'static>) -> Self {
        pin.set_high();
        pin.set_as_input_output_pull(Speed::Low, Pull::Up);
        Self { pin, last: None }
    }

    /// Returns the last frame when it is fresher than the sensor's minimum
    /// sampling interval, otherwise performs a new transfer.
    fn frame(&mut self) -> Option<DhtFrame> {
        let min_interval = Duration::from_millis(DHT_MIN_INTERVAL_MS);
        if let Some((_, frame)) = self.last.filter(|(at, _)| at.elapsed() < min_interval) {
            return Some(frame);
        }

        match self.transfer() {
            Ok(frame) => {
                self.last = Some((Instant::now(), frame));
                Some(frame)
            }
            Err(err) => {
                defmt::warn!("dht11: {}", defmt::Display2Format(&err));
                self.last = None;
                None
            }
        }
    }

    fn transfer(&mut self) -> Result<DhtFrame, DhtError> {
        self.pin.set_low();
        block_for(START_PULSE);
        self.pin.set_high();

        let mut high_us = [0u32; DHT_FRAME_BITS];
        critical_section::with(|_| -> Result<(), DhtError> {
            // Response: low ~80 µs, high ~80 µs, then the first bit's low phase.
            self.wait_for(false)?;
            self.wait_for(true)?;
            self.wait_for(false)?;
            for width in &mut high_us {
                self.wait_for(true)?;
                let rising = Instant::now();
                self.wait_for(false)?;
                *width = u32::try_from(rising.elapsed().as_micros()).unwrap_or(u32::MAX);
            }
            Ok(())
        })?;

        DhtFrame::from_high_phases(&high_us)
    }

    fn wait_for(&self, high: bool) -> Result<(), DhtError> {
        let start = Instant::now();
        while self.pin.is_high() != high {
            if start.elapsed().as_micros() > EDGE_TIMEOUT_US {
                return Err(DhtError::Timeout);
            }
        }
        Ok(())
    }
}

impl ClimateSensor for Dht11 {
    fn begin(&mut self) {
        self.pin.set_high();
        self.last = None;
    }

    fn read_humidity(&mut self) -> Option<f32> {
        self.frame().map(|frame| frame.humidity)
    }

    fn read_temperature(&mut self) -> Option<f32> {
        self.frame().map(|frame| frame.temperature)
    }
}
