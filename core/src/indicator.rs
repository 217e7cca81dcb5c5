//! Status indicator (LED) with board polarity

use embedded_hal::digital::OutputPin;

/// Pin level that lights the indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

/// On/off/invert wrapper around an output pin
///
/// Tracks the logical state itself so plain `OutputPin`s work. Pin errors
/// are dropped.
pub struct Indicator<P> {
    pin: P,
    polarity: Polarity,
    lit: bool,
}

impl<P: OutputPin> Indicator<P> {
    /// Wrap `pin`, starting with the indicator off
    pub fn new(pin: P, polarity: Polarity) -> Self {
        let mut indicator = Self {
            pin,
            polarity,
            lit: false,
        };
        indicator.off();
        indicator
    }

    pub fn on(&mut self) {
        self.drive(true);
    }

    pub fn off(&mut self) {
        self.drive(false);
    }

    pub fn invert(&mut self) {
        self.drive(!self.lit);
    }

    pub fn is_on(&self) -> bool {
        self.lit
    }

    /// Give the pin back
    pub fn release(self) -> P {
        self.pin
    }

    fn drive(&mut self, lit: bool) {
        let high = match self.polarity {
            Polarity::ActiveHigh => lit,
            Polarity::ActiveLow => !lit,
        };
        if high {
            self.pin.set_high().ok();
        } else {
            self.pin.set_low().ok();
        }
        self.lit = lit;
    }
}
