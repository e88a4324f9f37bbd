//! Trigger input and relay output.
//!
//! The relay driver is active-low: the output idles high and is pulled low
//! for the duration of a pulse.

use core::convert::Infallible;

use embedded_hal::digital::{InputPin, OutputPin};

/// Capability interface over the two GPIO lines the controller touches.
pub trait PinDriver {
    /// Returns `true` while the trigger input reads high.
    fn trigger_is_high(&mut self) -> bool;

    /// Drives the relay output low (relay energized).
    fn assert_relay(&mut self);

    /// Drives the relay output high (relay idle).
    fn release_relay(&mut self);
}

/// [`PinDriver`] over any pair of `embedded-hal` pins that cannot fail.
pub struct GpioPins<I, O> {
    trigger: I,
    relay: O,
}

impl<I, O> GpioPins<I, O>
where
    I: InputPin<Error = Infallible>,
    O: OutputPin<Error = Infallible>,
{
    /// Takes ownership of already-configured pins: `trigger` with its
    /// pull-down enabled and `relay` driven high.
    pub fn new(trigger: I, relay: O) -> Self {
        Self { trigger, relay }
    }

    pub fn into_inner(self) -> (I, O) {
        (self.trigger, self.relay)
    }
}

impl<I, O> PinDriver for GpioPins<I, O>
where
    I: InputPin<Error = Infallible>,
    O: OutputPin<Error = Infallible>,
{
    fn trigger_is_high(&mut self) -> bool {
        match self.trigger.is_high() {
            Ok(level) => level,
            Err(never) => match never {},
        }
    }

    fn assert_relay(&mut self) {
        match self.relay.set_low() {
            Ok(()) => {}
            Err(never) => match never {},
        }
    }

    fn release_relay(&mut self) {
        match self.relay.set_high() {
            Ok(()) => {}
            Err(never) => match never {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

    struct FixedInput(bool);

    impl ErrorType for FixedInput {
        type Error = Infallible;
    }

    impl InputPin for FixedInput {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(self.0)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.0)
        }
    }

    #[derive(Default)]
    struct LatchOutput {
        high: bool,
    }

    impl ErrorType for LatchOutput {
        type Error = Infallible;
    }

    impl OutputPin for LatchOutput {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.high = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.high = true;
            Ok(())
        }
    }

    #[test]
    fn relay_is_active_low() {
        let mut pins = GpioPins::new(FixedInput(false), LatchOutput { high: true });
        assert!(!pins.trigger_is_high());

        pins.assert_relay();
        let (_, relay) = pins.into_inner();
        assert!(!relay.high);
    }

    #[test]
    fn release_drives_output_high() {
        let mut pins = GpioPins::new(FixedInput(true), LatchOutput::default());
        assert!(pins.trigger_is_high());
        pins.release_relay();
        assert!(pins.into_inner().1.high);
    }
}
