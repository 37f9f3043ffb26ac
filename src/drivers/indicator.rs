//! Run/idle indicator LED.
//!
//! Drives any `embedded_hal` output pin.  Running lights the LED, Idle
//! turns it off; polarity maps the logical state onto the pin level so an
//! active-low on-board LED gets the inverted level.

use embedded_hal::digital::{OutputPin, PinState};

use crate::config::Polarity;
use crate::fsm::RunState;

pub struct IndicatorController<P> {
    pin: P,
    polarity: Polarity,
    lit: bool,
}

impl<P: OutputPin> IndicatorController<P> {
    /// Take ownership of `pin` and drive it to the "off" level.
    pub fn new(pin: P, polarity: Polarity) -> Self {
        let mut indicator = Self {
            pin,
            polarity,
            lit: false,
        };
        indicator.write(false);
        indicator
    }

    /// Mirror `state` on the LED.
    pub fn apply(&mut self, state: RunState) {
        self.write(state.is_running());
    }

    /// Logical state last written.
    pub fn is_lit(&self) -> bool {
        self.lit
    }

    fn write(&mut self, on: bool) {
        let level = PinState::from(self.polarity.level_for(on));
        // GPIO writes cannot fail on this board; a failure would not be
        // actionable here anyway.
        let _ = self.pin.set_state(level);
        self.lit = on;
    }
}
