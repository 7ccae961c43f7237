//! Relay controller.
//!
//! Owns the relay's logical state and the activation timestamp that drives
//! automatic shutoff.  The physical pin is reached only through
//! [`RelayPort`]; polarity is fixed at construction and applied here, so
//! every other module speaks ON/OFF.
//!
//! ## Timeout contract
//!
//! [`RelayController::check_timeout`] compares `now` against the stored
//! absolute activation time, never against accumulated deltas.  A late tick
//! therefore delays the shutoff but can never bring it forward, and missed
//! ticks do not compound.

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, RelayPort};

/// Which output level energises the relay coil.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

impl Polarity {
    /// Pin level that energises the relay.
    pub const fn energized_level(self) -> bool {
        matches!(self, Self::ActiveHigh)
    }

    /// Interpret a pin level read back from the output.
    pub const fn is_energized(self, level_high: bool) -> bool {
        level_high == self.energized_level()
    }
}

/// Why the relay changed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Explicit `REL_ON` / `REL_OFF`.
    Command,
    /// Qualifying PIR edge.
    Motion,
    /// Max-on duration elapsed.
    Timeout,
    /// Forced off before entering deep sleep.
    Sleep,
}

impl Trigger {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Motion => "motion",
            Self::Timeout => "timeout",
            Self::Sleep => "sleep",
        }
    }
}

/// Relay status as reported on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayStatus {
    On,
    Off,
}

impl RelayStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
        }
    }
}

/// `activated_at` is `Some` exactly while the controller holds the relay on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelayState {
    pub is_on: bool,
    pub activated_at: Option<u64>,
}

pub struct RelayController {
    state: RelayState,
    polarity: Polarity,
}

impl RelayController {
    pub fn new(polarity: Polarity) -> Self {
        Self {
            state: RelayState::default(),
            polarity,
        }
    }

    /// Drive the output to the de-energised level.  Call once at boot so an
    /// active-low board does not click on while the pin floats LOW.
    pub fn init(&mut self, port: &mut impl RelayPort) {
        port.set_level(!self.polarity.energized_level());
        self.state = RelayState::default();
    }

    /// Energise the relay.  Idempotent: an active relay keeps its original
    /// activation time, so the shutoff is measured from the first activation.
    ///
    /// Returns `true` if this call switched the relay on.
    pub fn activate(
        &mut self,
        now_ms: u64,
        trigger: Trigger,
        port: &mut impl RelayPort,
        sink: &mut impl EventSink,
    ) -> bool {
        if self.state.is_on {
            return false;
        }
        port.set_level(self.polarity.energized_level());
        self.state = RelayState {
            is_on: true,
            activated_at: Some(now_ms),
        };
        info!("RELAY | ON ({})", trigger.as_str());
        sink.emit(&AppEvent::RelayChanged {
            on: true,
            trigger,
            at_ms: now_ms,
        });
        true
    }

    /// De-energise the relay.  The pin is always driven, so this also
    /// corrects an output that was flipped behind the controller's back.
    ///
    /// Returns `true` if this call switched the relay off.
    pub fn deactivate(
        &mut self,
        now_ms: u64,
        trigger: Trigger,
        port: &mut impl RelayPort,
        sink: &mut impl EventSink,
    ) -> bool {
        port.set_level(!self.polarity.energized_level());
        let was_on = self.state.is_on;
        self.state = RelayState::default();
        if was_on {
            info!("RELAY | OFF ({})", trigger.as_str());
            sink.emit(&AppEvent::RelayChanged {
                on: false,
                trigger,
                at_ms: now_ms,
            });
        }
        was_on
    }

    /// Status read from the physical output, not from the cached flag.
    pub fn status(&self, port: &mut impl RelayPort) -> RelayStatus {
        if self.polarity.is_energized(port.level()) {
            RelayStatus::On
        } else {
            RelayStatus::Off
        }
    }

    /// Switch off once `now - activated_at >= max_on_ms`.  Must run every tick.
    ///
    /// Returns `true` if the relay timed out on this call.
    pub fn check_timeout(
        &mut self,
        now_ms: u64,
        max_on_ms: u32,
        port: &mut impl RelayPort,
        sink: &mut impl EventSink,
    ) -> bool {
        match self.state.activated_at {
            Some(at) if self.state.is_on && now_ms.saturating_sub(at) >= u64::from(max_on_ms) => {
                info!("RELAY | max-on {}ms reached", max_on_ms);
                self.deactivate(now_ms, Trigger::Timeout, port, sink)
            }
            _ => false,
        }
    }

    /// `true` while an activation cycle is being timed.
    pub fn is_active(&self) -> bool {
        self.state.activated_at.is_some()
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }
}
