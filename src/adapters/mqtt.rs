//! MQTT transport adapter.
//!
//! Implements [`TransportPort`] over the ESP-IDF MQTT client.  The client
//! runs its own task and reports through a callback; the callback only
//! flips the connection flag and forwards received payloads into a
//! channel, which [`poll`](TransportPort::poll) drains from the main loop.
//!
//! ```text
//!  esp-mqtt task ──cb──▶ mpsc ──poll()──▶ Inbox ──▶ NodeService
//! ```
//!
//! The client reconnects on its own after a drop; the callback records
//! that so the lifecycle can restore the command subscription.  Payloads
//! are forwarded even when they are not valid UTF-8 (lossily decoded) so
//! the interpreter answers them instead of dropping them unseen.
//!
//! All traffic is QoS 0.  On the host a simulated broker stands in: it
//! records publications and delivers injected messages for subscribed
//! topics.

use log::info;

use crate::app::ports::TransportPort;
use crate::error::TransportError;

#[cfg(target_os = "espidf")]
mod platform {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc::{Receiver, Sender, channel};

    use esp_idf_svc::hal::delay::FreeRtos;
    use esp_idf_svc::mqtt::client::{
        Details, EspMqttClient, EventPayload, MqttClientConfiguration, QoS,
    };
    use log::{debug, warn};

    use crate::error::TransportError;

    /// How long `connect` waits for the broker's CONNACK.
    const CONNACK_WAIT_MS: u32 = 5_000;
    const CONNACK_POLL_MS: u32 = 50;

    pub struct Session {
        url: String,
        client: Option<EspMqttClient<'static>>,
        connected: Arc<AtomicBool>,
        restored: Arc<AtomicBool>,
        tx: Sender<String>,
        rx: Receiver<String>,
    }

    impl Session {
        pub fn new(url: String) -> Self {
            let (tx, rx) = channel();
            Self {
                url,
                client: None,
                connected: Arc::new(AtomicBool::new(false)),
                restored: Arc::new(AtomicBool::new(false)),
                tx,
                rx,
            }
        }

        pub fn connect(&mut self, client_id: &str) -> Result<(), TransportError> {
            if self.client.is_none() {
                let conf = MqttClientConfiguration {
                    client_id: Some(client_id),
                    ..Default::default()
                };
                let connected = Arc::clone(&self.connected);
                let restored = Arc::clone(&self.restored);
                let tx = self.tx.clone();
                let client = EspMqttClient::new_cb(&self.url, &conf, move |event| {
                    match event.payload() {
                        EventPayload::Connected(_) => {
                            connected.store(true, Ordering::Release);
                            restored.store(true, Ordering::Release);
                        }
                        EventPayload::Disconnected => connected.store(false, Ordering::Release),
                        // Later chunks of an oversize payload; the first
                        // chunk alone is already rejected as too long.
                        EventPayload::Received {
                            details: Details::SubsequentChunk(_),
                            ..
                        } => debug!("MQTT | skipped payload continuation"),
                        EventPayload::Received { data, .. } => {
                            let text = String::from_utf8_lossy(data).into_owned();
                            // The receiver lives as long as the session.
                            drop(tx.send(text));
                        }
                        EventPayload::Error(e) => warn!("MQTT | client error: {:?}", e),
                        _ => {}
                    }
                })
                .map_err(|e| {
                    warn!("MQTT | client init failed: {}", e);
                    TransportError::ConnectFailed
                })?;
                self.client = Some(client);
            }

            let mut waited = 0;
            while !self.is_connected() {
                if waited >= CONNACK_WAIT_MS {
                    return Err(TransportError::ConnectFailed);
                }
                FreeRtos::delay_ms(CONNACK_POLL_MS);
                waited += CONNACK_POLL_MS;
            }
            // The caller subscribes itself after an explicit connect.
            self.restored.store(false, Ordering::Release);
            Ok(())
        }

        pub fn take_reconnected(&mut self) -> bool {
            self.restored.swap(false, Ordering::AcqRel)
        }

        pub fn disconnect(&mut self) {
            self.client = None;
            self.connected.store(false, Ordering::Release);
        }

        pub fn is_connected(&self) -> bool {
            self.connected.load(Ordering::Acquire)
        }

        fn client(&mut self) -> Result<&mut EspMqttClient<'static>, TransportError> {
            if !self.is_connected() {
                return Err(TransportError::NotConnected);
            }
            self.client.as_mut().ok_or(TransportError::NotConnected)
        }

        pub fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
            self.client()?
                .subscribe(topic, QoS::AtMostOnce)
                .map(drop)
                .map_err(|_| TransportError::SubscribeFailed)
        }

        pub fn unsubscribe(&mut self, topic: &str) -> Result<(), TransportError> {
            self.client()?
                .unsubscribe(topic)
                .map(drop)
                .map_err(|_| TransportError::SubscribeFailed)
        }

        pub fn publish(&mut self, topic: &str, payload: &str, retain: bool) -> Result<(), TransportError> {
            self.client()?
                .publish(topic, QoS::AtMostOnce, retain, payload.as_bytes())
                .map(drop)
                .map_err(|_| TransportError::PublishFailed)
        }

        pub fn poll(&mut self) -> Option<String> {
            self.rx.try_recv().ok()
        }
    }
}

#[cfg(not(target_os = "espidf"))]
mod platform {
    use std::collections::VecDeque;

    use crate::error::TransportError;

    /// One recorded publication.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Published {
        pub topic: String,
        pub payload: String,
        pub retain: bool,
    }

    /// In-memory broker: one client, exact-match topics.
    pub struct Session {
        pub(super) reachable: bool,
        connected: bool,
        subscriptions: Vec<String>,
        pending: VecDeque<(String, String)>,
        pub(super) published: Vec<Published>,
    }

    impl Session {
        pub fn new(_url: String) -> Self {
            Self {
                reachable: true,
                connected: false,
                subscriptions: Vec::new(),
                pending: VecDeque::new(),
                published: Vec::new(),
            }
        }

        pub fn connect(&mut self, _client_id: &str) -> Result<(), TransportError> {
            if !self.reachable {
                return Err(TransportError::ConnectFailed);
            }
            self.connected = true;
            Ok(())
        }

        pub fn disconnect(&mut self) {
            self.connected = false;
            self.subscriptions.clear();
        }

        pub fn is_connected(&self) -> bool {
            self.connected
        }

        pub fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
            if !self.connected {
                return Err(TransportError::NotConnected);
            }
            if !self.subscriptions.iter().any(|t| t == topic) {
                self.subscriptions.push(topic.to_owned());
            }
            Ok(())
        }

        pub fn unsubscribe(&mut self, topic: &str) -> Result<(), TransportError> {
            if !self.connected {
                return Err(TransportError::NotConnected);
            }
            self.subscriptions.retain(|t| t != topic);
            Ok(())
        }

        pub fn publish(&mut self, topic: &str, payload: &str, retain: bool) -> Result<(), TransportError> {
            if !self.connected {
                return Err(TransportError::NotConnected);
            }
            self.published.push(Published {
                topic: topic.to_owned(),
                payload: payload.to_owned(),
                retain,
            });
            Ok(())
        }

        pub fn poll(&mut self) -> Option<String> {
            while let Some((topic, payload)) = self.pending.pop_front() {
                if self.connected && self.subscriptions.contains(&topic) {
                    return Some(payload);
                }
            }
            None
        }

        pub fn inject(&mut self, topic: &str, payload: &str) {
            self.pending.push_back((topic.to_owned(), payload.to_owned()));
        }

        pub fn subscriptions(&self) -> &[String] {
            &self.subscriptions
        }
    }
}

#[cfg(not(target_os = "espidf"))]
pub use platform::Published;

/// Broker session for one node.
pub struct MqttTransport {
    session: platform::Session,
}

impl MqttTransport {
    /// `url` as produced by [`NetworkConfig::mqtt_url`](crate::config::NetworkConfig::mqtt_url).
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        info!("MQTT | broker {}", url);
        Self {
            session: platform::Session::new(url),
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl MqttTransport {
    /// Simulation: queue a message as if the broker had delivered it.
    pub fn inject(&mut self, topic: &str, payload: &str) {
        self.session.inject(topic, payload);
    }

    /// Simulation: make the broker (un)reachable for future connects.
    pub fn set_reachable(&mut self, reachable: bool) {
        self.session.reachable = reachable;
    }

    pub fn published(&self) -> &[Published] {
        &self.session.published
    }

    pub fn subscriptions(&self) -> &[String] {
        self.session.subscriptions()
    }
}

impl TransportPort for MqttTransport {
    fn connect(&mut self, client_id: &str) -> Result<(), TransportError> {
        info!("MQTT | connecting as {}", client_id);
        self.session.connect(client_id)
    }

    fn disconnect(&mut self) {
        self.session.disconnect();
        info!("MQTT | disconnected");
    }

    fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        self.session.subscribe(topic)
    }

    fn unsubscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        self.session.unsubscribe(topic)
    }

    fn publish(&mut self, topic: &str, payload: &str, retain: bool) -> Result<(), TransportError> {
        self.session.publish(topic, payload, retain)
    }

    fn poll(&mut self) -> Option<String> {
        self.session.poll()
    }

    #[cfg(target_os = "espidf")]
    fn take_reconnected(&mut self) -> bool {
        self.session.take_reconnected()
    }
}
