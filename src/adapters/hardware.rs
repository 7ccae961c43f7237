//! Hardware adapter: GPIO pins behind the relay and PIR ports.
//!
//! Generic over the `embedded-hal` 1.0 digital traits, so on target these
//! wrap esp-idf-hal `PinDriver`s and on the host any test pin.  The
//! adapters only move levels; polarity lives in the relay controller.
//! Pin errors are logged and read as "low".

use embedded_hal::digital::{InputPin, StatefulOutputPin};
use log::error;

use crate::app::ports::{MotionSensorPort, RelayPort};

/// Relay coil driver on one output pin.
pub struct GpioRelay<P> {
    pin: P,
}

impl<P: StatefulOutputPin> GpioRelay<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P: StatefulOutputPin> RelayPort for GpioRelay<P> {
    fn set_level(&mut self, high: bool) {
        let result = if high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        if let Err(e) = result {
            error!("RELAY | pin write failed: {:?}", e);
        }
    }

    fn level(&mut self) -> bool {
        self.pin.is_set_high().unwrap_or_else(|e| {
            error!("RELAY | pin readback failed: {:?}", e);
            false
        })
    }
}

/// PIR sensor on one input pin; HIGH means motion.
pub struct GpioPir<P> {
    pin: P,
}

impl<P: InputPin> GpioPir<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }
}

impl<P: InputPin> MotionSensorPort for GpioPir<P> {
    fn motion_detected(&mut self) -> bool {
        self.pin.is_high().unwrap_or_else(|e| {
            error!("MOTION | PIR read failed: {:?}", e);
            false
        })
    }
}
