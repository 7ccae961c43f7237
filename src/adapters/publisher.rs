//! Transport-backed event sink.
//!
//! Implements [`EventSink`] by rendering each [`AppEvent`] as JSON and
//! publishing it on the matching topic through any [`TransportPort`]
//! (MQTT client, UDP socket, test double).  Owns the transport and the
//! current topic set, so a rename moves the command subscription here
//! without the domain knowing about brokers.
//!
//! | Event            | Topic    | Retained |
//! |------------------|----------|----------|
//! | `Online`         | status   | yes      |
//! | `Response`       | status   | no       |
//! | `RelayChanged`*  | status   | no       |
//! | `MotionDetected` | motion + status | no |
//!
//! *Only timeout and sleep shutoffs.  Command and motion switches are
//! already covered by the command's response or the motion note.

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, TransportPort};
use crate::app::response::Response;
use crate::app::topics::Topics;
use crate::control::relay::Trigger;
use crate::error::TransportError;

pub struct Publisher<T: TransportPort> {
    transport: T,
    topics: Topics,
}

impl<T: TransportPort> Publisher<T> {
    pub fn new(transport: T, topics: Topics) -> Self {
        Self { transport, topics }
    }

    /// Open the session and subscribe to the command topic.
    pub fn connect(&mut self, client_id: &str) -> Result<(), TransportError> {
        self.transport.connect(client_id)?;
        if let Err(e) = self.transport.subscribe(&self.topics.cmd) {
            self.transport.disconnect();
            return Err(e);
        }
        info!("MQTT | connected as {}, listening on {}", client_id, self.topics.cmd);
        Ok(())
    }

    /// Re-subscribe after the client restored a dropped session by itself.
    pub fn resubscribe(&mut self) -> Result<(), TransportError> {
        self.transport.subscribe(&self.topics.cmd)?;
        info!("MQTT | session restored, listening on {}", self.topics.cmd);
        Ok(())
    }

    pub fn topics(&self) -> &Topics {
        &self.topics
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn send(&mut self, to_motion: bool, payload: &str, retain: bool) {
        let topic = if to_motion {
            &self.topics.motion
        } else {
            &self.topics.status
        };
        debug!("MQTT | {} <- {}", topic, payload);
        if let Err(e) = self.transport.publish(topic, payload, retain) {
            warn!("MQTT | publish to {} dropped: {}", topic, e);
        }
    }

    fn move_subscription(&mut self, old: &Topics, new: &Topics) {
        self.topics = new.clone();
        if !self.transport.is_connected() {
            return;
        }
        if let Err(e) = self.transport.unsubscribe(&old.cmd) {
            warn!("MQTT | unsubscribe {} failed: {}", old.cmd, e);
        }
        match self.transport.subscribe(&new.cmd) {
            Ok(()) => info!("MQTT | now listening on {}", new.cmd),
            Err(e) => warn!("MQTT | subscribe {} failed: {}", new.cmd, e),
        }
    }
}

impl<T: TransportPort> EventSink for Publisher<T> {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { device_id, name } => {
                info!("START | {} as '{}'", device_id, name);
            }
            AppEvent::Online(presence) => {
                self.send(false, &presence.to_json(), true);
            }
            AppEvent::RelayChanged {
                trigger: Trigger::Command | Trigger::Motion,
                ..
            } => {}
            AppEvent::RelayChanged { on, trigger, .. } => {
                let note = Response::ok()
                    .with("relay", if *on { "ON" } else { "OFF" })
                    .with("reason", trigger.as_str());
                self.send(false, &note.to_json(), false);
            }
            AppEvent::MotionDetected {
                report,
                relay_driven,
            } => {
                match serde_json::to_string(report) {
                    Ok(payload) => self.send(true, &payload, false),
                    Err(e) => warn!("MOTION | payload serialisation failed: {}", e),
                }
                let note = if *relay_driven {
                    "Motion detected, relay activated"
                } else {
                    "Motion detected, SKIP_LOCAL_RELAY set, relay not activated"
                };
                self.send(false, &Response::ok().with("message", note).to_json(), false);
            }
            AppEvent::Response(response) => {
                self.send(false, &response.to_json(), false);
            }
            AppEvent::TopicsChanged { old, new } => {
                self.move_subscription(old, new);
            }
        }
    }
}
