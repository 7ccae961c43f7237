//! Mock adapters for integration tests.
//!
//! Records every pin write, delay and publication so tests can assert on
//! the full history without real GPIO, timers or a broker.

use std::collections::VecDeque;
use std::net::Ipv4Addr;

use ghafeer::adapters::wifi::ConnectivityPort;
use ghafeer::app::ports::{ClockPort, MotionSensorPort, RelayPort, TransportPort};
use ghafeer::error::{ConnectivityError, TransportError};

// ── Relay ─────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockRelay {
    pub level: bool,
    pub writes: Vec<bool>,
}

impl RelayPort for MockRelay {
    fn set_level(&mut self, high: bool) {
        self.level = high;
        self.writes.push(high);
    }

    fn level(&mut self) -> bool {
        self.level
    }
}

// ── PIR ───────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockPir {
    pub high: bool,
    pub reads: u32,
}

impl MotionSensorPort for MockPir {
    fn motion_detected(&mut self) -> bool {
        self.reads += 1;
        self.high
    }
}

// ── Clock ─────────────────────────────────────────────────────

/// Manual clock: `delay_ms` advances time instead of sleeping.
#[derive(Default)]
pub struct MockClock {
    pub now: u64,
    pub delays: Vec<u32>,
}

#[allow(dead_code)]
impl MockClock {
    pub fn at(now: u64) -> Self {
        Self {
            now,
            delays: Vec::new(),
        }
    }

    pub fn advance(&mut self, ms: u64) {
        self.now += ms;
    }
}

impl ClockPort for MockClock {
    fn now_ms(&self) -> u64 {
        self.now
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays.push(ms);
        self.now += u64::from(ms);
    }
}

// ── Network ───────────────────────────────────────────────────

/// Station double: `up = false` from a test is an AP drop.
pub struct MockNetwork {
    pub reachable: bool,
    pub up: bool,
    pub joins: u32,
    pub ip: Ipv4Addr,
}

impl Default for MockNetwork {
    fn default() -> Self {
        Self {
            reachable: true,
            up: false,
            joins: 0,
            ip: Ipv4Addr::new(10, 0, 0, 7),
        }
    }
}

impl ConnectivityPort for MockNetwork {
    fn set_credentials(&mut self, _ssid: &str, _password: &str) -> Result<(), ConnectivityError> {
        Ok(())
    }

    fn connect(&mut self) -> Result<(), ConnectivityError> {
        self.joins += 1;
        if !self.reachable {
            return Err(ConnectivityError::ConnectionFailed);
        }
        self.up = true;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.up = false;
    }

    fn is_connected(&self) -> bool {
        self.up
    }

    fn local_ip(&self) -> Option<Ipv4Addr> {
        self.up.then_some(self.ip)
    }
}

// ── Transport ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub topic: String,
    pub payload: String,
    pub retain: bool,
}

/// Broker double.  Setting `connected = true` after a `disconnect()`
/// mimics a client that restored the session by itself.
pub struct MockTransport {
    pub reachable: bool,
    pub connected: bool,
    pub dropped: bool,
    pub connect_attempts: u32,
    pub subscriptions: Vec<String>,
    pub inbound: VecDeque<String>,
    pub sent: Vec<Sent>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self {
            reachable: true,
            connected: false,
            dropped: false,
            connect_attempts: 0,
            subscriptions: Vec::new(),
            inbound: VecDeque::new(),
            sent: Vec::new(),
        }
    }
}

#[allow(dead_code)]
impl MockTransport {
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::default()
        }
    }

    pub fn inject(&mut self, line: &str) {
        self.inbound.push_back(line.to_owned());
    }

    pub fn on_topic<'a>(&'a self, suffix: &'a str) -> impl Iterator<Item = &'a Sent> + 'a {
        self.sent.iter().filter(move |s| s.topic.ends_with(suffix))
    }

    /// Parsed JSON of every status-topic message, in order.
    pub fn statuses(&self) -> Vec<serde_json::Value> {
        self.on_topic("/status")
            .map(|s| serde_json::from_str(&s.payload).expect("status payload is JSON"))
            .collect()
    }

    pub fn last_status(&self) -> serde_json::Value {
        self.statuses().pop().expect("no status published")
    }
}

impl TransportPort for MockTransport {
    fn connect(&mut self, _client_id: &str) -> Result<(), TransportError> {
        self.connect_attempts += 1;
        if !self.reachable {
            return Err(TransportError::ConnectFailed);
        }
        self.connected = true;
        self.dropped = false;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.connected = false;
        self.dropped = true;
        self.subscriptions.clear();
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        self.subscriptions.push(topic.to_owned());
        Ok(())
    }

    fn unsubscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        self.subscriptions.retain(|t| t != topic);
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &str, retain: bool) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        self.sent.push(Sent {
            topic: topic.to_owned(),
            payload: payload.to_owned(),
            retain,
        });
        Ok(())
    }

    fn poll(&mut self) -> Option<String> {
        if self.connected {
            self.inbound.pop_front()
        } else {
            None
        }
    }

    fn take_reconnected(&mut self) -> bool {
        let restored = self.connected && self.dropped;
        if restored {
            self.dropped = false;
        }
        restored
    }
}
