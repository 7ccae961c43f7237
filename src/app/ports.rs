//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ NodeService (domain)
//! ```
//!
//! Driven adapters (relay pin, PIR pin, clock, transport, event sinks)
//! implement these traits.  The [`NodeService`](super::service::NodeService)
//! and the [`Lifecycle`](crate::lifecycle::Lifecycle) consume them via
//! generics, so the domain core never touches hardware directly.

use crate::error::TransportError;

// ───────────────────────────────────────────────────────────────
// Relay port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Raw digital output behind the relay.  Knows nothing about polarity;
/// the [`RelayController`](crate::control::relay::RelayController) maps
/// ON/OFF onto levels.
pub trait RelayPort {
    /// Drive the output pin HIGH (`true`) or LOW (`false`).
    fn set_level(&mut self, high: bool);

    /// Read back the level the output pin is currently driving.
    fn level(&mut self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Motion sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// PIR input.
pub trait MotionSensorPort {
    /// `true` while the sensor output is HIGH.
    fn motion_detected(&mut self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic time source plus a bounded blocking delay.
pub trait ClockPort {
    /// Milliseconds since boot.
    fn now_ms(&self) -> u64;

    /// Block the single thread of control for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Transport port (driven adapter: domain ↔ broker / socket)
// ───────────────────────────────────────────────────────────────

/// Publish/subscribe transport carrying command lines in and JSON out.
///
/// Inbound messages are never delivered by callback into the domain:
/// adapters buffer them and hand them out through [`poll`](Self::poll),
/// which the coordinator drains once per tick.
pub trait TransportPort {
    /// Open a session.  Must be bounded in time; the caller owns retries.
    fn connect(&mut self, client_id: &str) -> Result<(), TransportError>;

    /// Close the session.  Idempotent.
    fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError>;

    fn unsubscribe(&mut self, topic: &str) -> Result<(), TransportError>;

    /// Fire-and-forget publish.
    fn publish(&mut self, topic: &str, payload: &str, retain: bool) -> Result<(), TransportError>;

    /// Next inbound command text, if any has arrived.
    fn poll(&mut self) -> Option<String>;

    /// `true` once after the session came back up without [`connect`]
    /// being called (client-side auto-reconnect).  Subscriptions made
    /// before the drop are gone at that point.
    ///
    /// [`connect`]: TransportPort::connect
    fn take_reconnected(&mut self) -> bool {
        false
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → transport / logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (MQTT topic, UDP
/// peer, serial log).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

impl EventSink for Vec<super::events::AppEvent> {
    fn emit(&mut self, event: &super::events::AppEvent) {
        self.push(event.clone());
    }
}
