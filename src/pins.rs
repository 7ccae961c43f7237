//! GPIO pin assignments for the relay node board.
//!
//! Single source of truth: the binary takes the matching typed pins from
//! `esp_idf_svc::hal::peripherals::Peripherals`, and the deep-sleep code arms
//! the wake source from the raw numbers below.  Change a pin here *and* in
//! `main.rs` when rewiring.

use crate::control::relay::Polarity;

// ---------------------------------------------------------------------------
// PIR motion sensor (HC-SR501 / AM312, push-pull digital output)
// ---------------------------------------------------------------------------

/// Digital input: HIGH while the PIR reports motion.
/// Must be an RTC-capable pin so it can serve as the ext0 deep-sleep wake source.
pub const PIR_GPIO: i32 = 27;

/// ext0 wake level: wake when the PIR output goes HIGH.
pub const PIR_WAKE_LEVEL: i32 = 1;

// ---------------------------------------------------------------------------
// Relay module
// ---------------------------------------------------------------------------

/// Digital output driving the relay module's IN pin.
pub const RELAY_GPIO: i32 = 26;

/// Relay board wiring.  Most opto-isolated boards are active-low; the bare
/// transistor boards are active-high.
#[cfg(feature = "relay-active-low")]
pub const RELAY_POLARITY: Polarity = Polarity::ActiveLow;

/// Relay board wiring.  Most opto-isolated boards are active-low; the bare
/// transistor boards are active-high.
#[cfg(not(feature = "relay-active-low"))]
pub const RELAY_POLARITY: Polarity = Polarity::ActiveHigh;
