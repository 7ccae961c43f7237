//! Outbound application events.
//!
//! The [`NodeService`](super::service::NodeService) and the
//! [`RelayController`](crate::control::relay::RelayController) emit these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on
//! the other side decide what to do with them: publish on MQTT, answer a
//! UDP peer, log to serial.

use serde::Serialize;

use crate::control::relay::Trigger;

use super::response::Response;
use super::topics::Topics;

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Service constructed; carries identity for the boot log.
    Started { device_id: String, name: String },

    /// Presence announcement after a (re)connect.  Published retained.
    Online(Response),

    /// The relay switched.  Not emitted for idempotent no-ops.
    RelayChanged { on: bool, trigger: Trigger, at_ms: u64 },

    /// An announced motion trigger.  `relay_driven` is `false` when
    /// `SKIP_LOCAL_RELAY` kept the local relay out of it.
    MotionDetected { report: MotionReport, relay_driven: bool },

    /// Answer to one inbound command line.
    Response(Response),

    /// Device name changed; adapters must move their subscriptions.
    TopicsChanged { old: Topics, new: Topics },
}

/// Motion event payload, published on the motion topic.
///
/// ```text
/// {"motion":true,"mac":"DEADBEEFCAFE","location":"garage","ip":"192.168.1.40","time":123456}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MotionReport {
    pub motion: bool,
    pub mac: String,
    pub location: String,
    pub ip: String,
    /// Uptime in milliseconds.
    pub time: u64,
}
