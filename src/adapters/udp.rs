//! UDP datagram transport.
//!
//! Implements [`TransportPort`] over a non-blocking `std::net::UdpSocket`
//! (ESP-IDF provides the std socket layer on target).  There is no broker
//! and no topic routing:
//!
//! - an inbound datagram `CMD:<text>` is unwrapped to `<text>`; bare
//!   command text passes through unchanged;
//! - the sender of the latest datagram becomes the reply peer;
//! - command responses go to that peer;
//! - motion reports and the presence announcement go to the configured
//!   notify address, falling back to the peer.
//!
//! Subscriptions are accepted and ignored.
//!
//! Datagrams are read into a buffer well past the line limit, so an
//! oversize command reaches the inbox whole and is refused there as too
//! long; it is never cut down into something that parses.  Invalid UTF-8
//! is decoded lossily and answered as an unknown command.

use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};

use log::{debug, info, warn};

use crate::app::ports::TransportPort;
use crate::error::TransportError;
use crate::events::LINE_CAP;

const CMD_PREFIX: &str = "CMD:";
/// Receive buffer.  Anything filling it is longer than any valid line.
const RECV_CAP: usize = 4 * LINE_CAP;

/// Strip the optional `CMD:` envelope from a datagram's text.
pub fn decode_datagram(text: &str) -> &str {
    let text = text.trim();
    text.strip_prefix(CMD_PREFIX).map_or(text, str::trim)
}

/// Parse a `host:port` notify address; bad input is logged and ignored.
pub fn parse_notify(raw: Option<&str>) -> Option<SocketAddr> {
    let raw = raw?;
    match raw.parse() {
        Ok(addr) => Some(addr),
        Err(_) => {
            warn!("UDP | ignoring bad notify address '{}'", raw);
            None
        }
    }
}

pub struct UdpTransport {
    port: u16,
    notify: Option<SocketAddr>,
    socket: Option<UdpSocket>,
    peer: Option<SocketAddr>,
}

impl UdpTransport {
    pub fn new(port: u16, notify: Option<SocketAddr>) -> Self {
        Self {
            port,
            notify,
            socket: None,
            peer: None,
        }
    }

    /// Bound address, once connected.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    /// Sender of the most recent datagram.
    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    fn destination(&self, topic: &str, retain: bool) -> Option<SocketAddr> {
        let broadcast = retain || topic.ends_with("/motion");
        if broadcast {
            self.notify.or(self.peer)
        } else {
            self.peer.or(self.notify)
        }
    }
}

impl TransportPort for UdpTransport {
    fn connect(&mut self, _client_id: &str) -> Result<(), TransportError> {
        if self.socket.is_some() {
            return Ok(());
        }
        let bind = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, self.port);
        let socket = UdpSocket::bind(bind).map_err(|e| {
            warn!("UDP | bind {} failed: {}", bind, e);
            TransportError::ConnectFailed
        })?;
        socket
            .set_nonblocking(true)
            .map_err(|_| TransportError::ConnectFailed)?;
        info!("UDP | listening on {}", socket.local_addr().map_err(|_| TransportError::Io)?);
        self.socket = Some(socket);
        Ok(())
    }

    fn disconnect(&mut self) {
        self.socket = None;
    }

    fn is_connected(&self) -> bool {
        self.socket.is_some()
    }

    fn subscribe(&mut self, _topic: &str) -> Result<(), TransportError> {
        Ok(())
    }

    fn unsubscribe(&mut self, _topic: &str) -> Result<(), TransportError> {
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &str, retain: bool) -> Result<(), TransportError> {
        let Some(dest) = self.destination(topic, retain) else {
            debug!("UDP | no peer yet, dropping {}", topic);
            return Ok(());
        };
        let socket = self.socket.as_ref().ok_or(TransportError::NotConnected)?;
        socket
            .send_to(payload.as_bytes(), dest)
            .map(drop)
            .map_err(|_| TransportError::PublishFailed)
    }

    fn poll(&mut self) -> Option<String> {
        let socket = self.socket.as_ref()?;
        let mut buf = [0u8; RECV_CAP];
        match socket.recv_from(&mut buf) {
            Ok((len, from)) => {
                self.peer = Some(from);
                if len == RECV_CAP {
                    debug!("UDP | datagram from {} filled the receive buffer", from);
                }
                let text = String::from_utf8_lossy(&buf[..len]);
                Some(decode_datagram(&text).to_owned())
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => None,
            Err(e) => {
                warn!("UDP | receive failed: {}", e);
                None
            }
        }
    }
}
