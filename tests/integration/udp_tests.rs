//! UDP transport against real loopback sockets.

use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use serde_json::{Value, json};

use ghafeer::adapters::udp::UdpTransport;
use ghafeer::app::ports::TransportPort;
use ghafeer::app::service::NodeService;
use ghafeer::config::{LifecycleConfig, NodeConfig};
use ghafeer::control::relay::Polarity;
use ghafeer::lifecycle::Lifecycle;

use crate::mock_hw::{MockClock, MockNetwork, MockPir, MockRelay};

type UdpNode = Lifecycle<MockRelay, MockPir, MockClock, MockNetwork, UdpTransport>;

fn loopback(udp: &UdpTransport) -> SocketAddr {
    let port = udp.local_addr().expect("bound").port();
    SocketAddr::from(([127, 0, 0, 1], port))
}

fn client() -> UdpSocket {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
    socket
}

fn recv_json(socket: &UdpSocket) -> Value {
    let mut buf = [0u8; 1024];
    let (len, _) = socket.recv_from(&mut buf).expect("reply datagram");
    serde_json::from_slice(&buf[..len]).unwrap()
}

/// Non-blocking socket: give loopback delivery a moment.
fn poll_until(udp: &mut UdpTransport) -> Option<String> {
    for _ in 0..200 {
        if let Some(line) = udp.poll() {
            return Some(line);
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    None
}

#[test]
fn unwraps_cmd_envelope_and_replies_to_sender() {
    let mut udp = UdpTransport::new(0, None);
    udp.connect("node").unwrap();
    let peer = client();
    peer.send_to(b"CMD:REL_ON", loopback(&udp)).unwrap();

    assert_eq!(poll_until(&mut udp).as_deref(), Some("REL_ON"));
    assert_eq!(udp.peer(), Some(peer.local_addr().unwrap()));

    udp.publish("home/x/1/status", r#"{"status":"ok"}"#, false).unwrap();
    assert_eq!(recv_json(&peer), json!({"status": "ok"}));
}

#[test]
fn bare_command_text_passes_through() {
    let mut udp = UdpTransport::new(0, None);
    udp.connect("node").unwrap();
    client().send_to(b"PIR_INTERVAL:5000\n", loopback(&udp)).unwrap();
    assert_eq!(poll_until(&mut udp).as_deref(), Some("PIR_INTERVAL:5000"));
}

#[test]
fn motion_goes_to_notify_address() {
    let listener = client();
    let mut udp = UdpTransport::new(0, Some(listener.local_addr().unwrap()));
    udp.connect("node").unwrap();

    udp.publish("home/x/1/motion", r#"{"motion":true}"#, false).unwrap();
    assert_eq!(recv_json(&listener), json!({"motion": true}));
}

#[test]
fn oversize_datagram_arrives_whole() {
    let mut udp = UdpTransport::new(0, None);
    udp.connect("node").unwrap();
    let line = format!("REL_ON{}GARBAGE", " ".repeat(287));
    client().send_to(line.as_bytes(), loopback(&udp)).unwrap();
    assert_eq!(poll_until(&mut udp).map(|l| l.len()), Some(300));
}

fn udp_node() -> UdpNode {
    let service = NodeService::new(NodeConfig::default(), Polarity::ActiveHigh, "DEADBEEFCAFE");
    let mut node = Lifecycle::new(
        service,
        MockRelay::default(),
        MockPir::default(),
        MockClock::default(),
        MockNetwork::default(),
        UdpTransport::new(0, None),
        LifecycleConfig::default(),
    );
    node.start();
    node.tick();
    assert!(node.transport().is_connected());
    node
}

/// Tick until the node has read a datagram from `peer`.
fn serve(node: &mut UdpNode, peer: &UdpSocket) {
    for _ in 0..200 {
        node.tick();
        if node.transport().peer() == Some(peer.local_addr().unwrap()) {
            return;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    panic!("datagram never arrived");
}

#[test]
fn oversize_datagram_is_refused_not_truncated() {
    let mut node = udp_node();
    let peer = client();
    let line = format!("REL_ON{}GARBAGE", " ".repeat(287));
    peer.send_to(line.as_bytes(), loopback(node.transport())).unwrap();
    serve(&mut node, &peer);

    assert!(!node.relay_port().level);
    assert_eq!(
        recv_json(&peer),
        json!({"status": "error", "message": "Command too long (300 bytes)"})
    );
}

#[test]
fn invalid_utf8_datagram_is_answered() {
    let mut node = udp_node();
    let peer = client();
    peer.send_to(b"REL_ON\xff", loopback(node.transport())).unwrap();
    serve(&mut node, &peer);

    assert!(!node.relay_port().level);
    let reply = recv_json(&peer);
    assert_eq!(reply["status"], "error");
    assert!(reply["message"].as_str().unwrap().starts_with("Unknown command: REL_ON"));
}

#[test]
fn lifecycle_answers_datagram_commands() {
    let mut node = udp_node();

    let peer = client();
    peer.send_to(b"CMD:REL_ON", loopback(node.transport())).unwrap();
    for _ in 0..200 {
        node.tick();
        if node.relay_port().level {
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }

    assert!(node.relay_port().level);
    assert_eq!(recv_json(&peer), json!({"status": "ok", "relay": "ON"}));
}
