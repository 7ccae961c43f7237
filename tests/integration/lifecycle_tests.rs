//! Integration tests for the Lifecycle → NodeService → ports loop.
//!
//! Drive whole ticks (and whole burst cycles) against mock pins, a manual
//! clock and a recording transport, and assert on what reached the wire.

use serde_json::json;

use ghafeer::app::ports::TransportPort;
use ghafeer::app::service::NodeService;
use ghafeer::config::{LifecycleConfig, NodeConfig};
use ghafeer::control::relay::Polarity;
use ghafeer::lifecycle::{Exit, Lifecycle};

use crate::mock_hw::{MockClock, MockNetwork, MockPir, MockRelay, MockTransport};

type Node = Lifecycle<MockRelay, MockPir, MockClock, MockNetwork, MockTransport>;

const ID: &str = "DEADBEEFCAFE";
const CMD_TOPIC: &str = "home/GHAFEER/DEADBEEFCAFE/cmd";
const STATUS_TOPIC: &str = "home/GHAFEER/DEADBEEFCAFE/status";

fn build(transport: MockTransport) -> Node {
    let service = NodeService::new(NodeConfig::default(), Polarity::ActiveHigh, ID);
    Lifecycle::new(
        service,
        MockRelay::default(),
        MockPir::default(),
        MockClock::default(),
        MockNetwork::default(),
        transport,
        LifecycleConfig::default(),
    )
}

fn started() -> Node {
    let mut node = build(MockTransport::default());
    node.start();
    node
}

fn at(node: &mut Node, now: u64) -> Option<Exit> {
    node.clock().now = now;
    node.tick()
}

// ── Connection ────────────────────────────────────────────────

#[test]
fn first_tick_connects_subscribes_and_announces() {
    let mut node = started();
    assert_eq!(node.tick(), None);

    let t = node.transport();
    assert!(t.connected);
    assert_eq!(t.subscriptions, [CMD_TOPIC]);
    assert_eq!(t.sent[0].topic, STATUS_TOPIC);
    assert!(t.sent[0].retain, "presence must be retained");
    assert_eq!(
        t.last_status(),
        json!({"status": "online", "name": "GHAFEER", "mac": ID, "ip": "10.0.0.7"})
    );
}

#[test]
fn reconnect_uses_fixed_delay() {
    let mut node = build(MockTransport::unreachable());
    node.start();

    at(&mut node, 0);
    assert_eq!(node.transport().connect_attempts, 1);
    at(&mut node, 1_999);
    assert_eq!(node.transport().connect_attempts, 1);
    at(&mut node, 2_000);
    assert_eq!(node.transport().connect_attempts, 2);

    node.transport_mut().reachable = true;
    at(&mut node, 4_000);
    assert!(node.transport().connected);
    assert_eq!(node.transport().last_status()["status"], "online");
}

#[test]
fn timeout_is_enforced_while_offline() {
    let mut node = started();
    node.transport_mut().inject("REL_ON");
    at(&mut node, 0);
    assert!(node.relay_port().level);

    node.transport_mut().disconnect();
    node.transport_mut().reachable = false;
    at(&mut node, 60_000);
    assert!(!node.relay_port().level);
    assert!(!node.service().relay_state().is_on);
}

fn online_count(node: &Node) -> usize {
    node.transport()
        .statuses()
        .iter()
        .filter(|s| s["status"] == "online")
        .count()
}

#[test]
fn session_restored_by_client_is_resubscribed_and_announced() {
    let mut node = started();
    at(&mut node, 0);
    assert_eq!(online_count(&node), 1);

    // Broker drops us and the client reconnects between two ticks.
    node.transport_mut().disconnect();
    node.transport_mut().connected = true;
    at(&mut node, 10_000);

    assert_eq!(node.transport().subscriptions, [CMD_TOPIC]);
    assert_eq!(node.transport().connect_attempts, 1, "session reused, not reopened");
    assert_eq!(online_count(&node), 2);
    assert!(node.transport().sent.last().unwrap().retain);

    node.transport_mut().inject("REL_ON");
    at(&mut node, 20_000);
    assert!(node.relay_port().level);
}

#[test]
fn session_seen_down_then_restored_waits_for_retry_slot() {
    let mut node = started();
    at(&mut node, 0);

    node.transport_mut().disconnect();
    node.transport_mut().reachable = false;
    at(&mut node, 1_000);
    assert_eq!(node.transport().connect_attempts, 2);

    node.transport_mut().connected = true;
    at(&mut node, 2_000);
    assert!(node.transport().subscriptions.is_empty(), "still inside the retry delay");

    at(&mut node, 3_000);
    assert_eq!(node.transport().subscriptions, [CMD_TOPIC]);
    assert_eq!(online_count(&node), 2);
}

// ── Wi-Fi ─────────────────────────────────────────────────────

#[test]
fn station_is_joined_before_the_broker() {
    let mut node = build(MockTransport::default());
    node.network_mut().reachable = false;
    node.start();

    at(&mut node, 0);
    assert_eq!(node.network().joins, 1);
    assert_eq!(node.transport().connect_attempts, 0);
    at(&mut node, 1_999);
    assert_eq!(node.network().joins, 1);
    at(&mut node, 2_000);
    assert_eq!(node.network().joins, 2);

    node.network_mut().reachable = true;
    at(&mut node, 4_000);
    assert!(node.transport().connected);
}

#[test]
fn ap_drop_rejoins_and_refreshes_ip() {
    let mut node = started();
    at(&mut node, 0);
    assert_eq!(node.transport().last_status()["ip"], "10.0.0.7");

    node.network_mut().up = false;
    node.network_mut().ip = "10.0.0.9".parse().unwrap();
    at(&mut node, 5_000);

    assert_eq!(node.network().joins, 2);
    assert_eq!(node.transport().connect_attempts, 2);
    assert_eq!(node.transport().subscriptions, [CMD_TOPIC]);
    assert_eq!(node.transport().last_status()["ip"], "10.0.0.9");

    node.pir_port().high = true;
    at(&mut node, 6_000);
    let motion = node.transport().on_topic("/motion").last().cloned().unwrap();
    let report: serde_json::Value = serde_json::from_str(&motion.payload).unwrap();
    assert_eq!(report["ip"], "10.0.0.9");
}

// ── Commands ──────────────────────────────────────────────────

#[test]
fn command_line_drives_relay_and_answers() {
    let mut node = started();
    node.transport_mut().inject("REL_ON");
    node.tick();

    assert!(node.relay_port().level);
    assert_eq!(node.transport().last_status(), json!({"status": "ok", "relay": "ON"}));
}

#[test]
fn queued_command_runs_before_timeout() {
    let mut node = started();
    node.transport_mut().inject("REL_ON");
    at(&mut node, 0);

    node.transport_mut().inject("REL_STATUS");
    at(&mut node, 60_000);

    let statuses = node.transport().statuses();
    let tail = &statuses[statuses.len() - 2..];
    assert_eq!(tail[0], json!({"status": "ok", "relay_status": "ON"}));
    assert_eq!(tail[1], json!({"status": "ok", "relay": "OFF", "reason": "timeout"}));
    assert!(!node.relay_port().level);
}

#[test]
fn timeout_is_not_one_millisecond_early() {
    let mut node = started();
    node.transport_mut().inject("REL_ON");
    at(&mut node, 0);

    at(&mut node, 59_999);
    assert!(node.relay_port().level);
    at(&mut node, 60_000);
    assert!(!node.relay_port().level);
}

#[test]
fn rename_moves_subscription_and_answers_on_new_topic() {
    let mut node = started();
    node.transport_mut().inject("GHAFEER_NAME:porch");
    node.tick();

    let t = node.transport();
    assert_eq!(t.subscriptions, ["home/porch/DEADBEEFCAFE/cmd"]);
    let last = t.sent.last().unwrap();
    assert_eq!(last.topic, "home/porch/DEADBEEFCAFE/status");
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&last.payload).unwrap(),
        json!({"status": "ok", "GHAFEER_NAME": "porch"})
    );
}

#[test]
fn oversize_line_is_answered_with_error() {
    let mut node = started();
    node.transport_mut().inject(&"X".repeat(200));
    node.tick();

    assert_eq!(
        node.transport().last_status(),
        json!({"status": "error", "message": "Command too long (200 bytes)"})
    );
}

#[test]
fn unknown_command_is_answered_with_error() {
    let mut node = started();
    node.transport_mut().inject("FOO");
    node.tick();

    assert_eq!(
        node.transport().last_status(),
        json!({"status": "error", "message": "Unknown command: FOO"})
    );
}

#[test]
fn restart_answers_then_exits_after_grace() {
    let mut node = started();
    node.transport_mut().inject("RESTART");
    node.transport_mut().inject("REL_ON");

    assert_eq!(node.tick(), Some(Exit::Restart));
    assert_eq!(
        node.transport().last_status(),
        json!({"status": "ok", "message": "Restarting..."})
    );
    assert_eq!(node.clock().delays, [1_000]);
    assert!(!node.relay_port().level, "lines after RESTART are not applied");
}

#[test]
fn run_continuous_returns_on_reboot() {
    let mut node = build(MockTransport::default());
    node.transport_mut().inject("REBOOT");
    assert_eq!(node.run_continuous(), Exit::Restart);
}

// ── Motion ────────────────────────────────────────────────────

#[test]
fn motion_sample_activates_and_notifies() {
    let mut node = started();
    node.pir_port().high = true;
    at(&mut node, 0);

    assert!(node.relay_port().level);
    let motion: Vec<_> = node.transport().on_topic("/motion").cloned().collect();
    assert_eq!(motion.len(), 1);
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&motion[0].payload).unwrap(),
        json!({"motion": true, "mac": ID, "location": "GHAFEER", "ip": "10.0.0.7", "time": 0})
    );
    assert_eq!(
        node.transport().last_status(),
        json!({"status": "ok", "message": "Motion detected, relay activated"})
    );

    at(&mut node, 500);
    assert_eq!(node.pir_port().reads, 1, "sampled again before the PIR interval");
}

#[test]
fn motion_inside_cooldown_drives_relay_silently() {
    let mut node = started();
    node.pir_port().high = true;
    at(&mut node, 0);

    node.transport_mut().inject("REL_OFF");
    at(&mut node, 1_000);

    assert!(node.relay_port().level, "new cycle after REL_OFF");
    assert_eq!(node.transport().on_topic("/motion").count(), 1);
}

#[test]
fn skip_local_pir_stops_sampling() {
    let mut node = started();
    node.pir_port().high = true;
    node.transport_mut().inject("SKIP_LOCAL_PIR:true");
    at(&mut node, 0);

    assert_eq!(node.pir_port().reads, 0);
    assert!(!node.relay_port().level);
}

#[test]
fn skip_local_relay_notifies_without_switching() {
    let mut node = started();
    node.pir_port().high = true;
    node.transport_mut().inject("SKIP_LOCAL_RELAY:true");
    at(&mut node, 0);

    assert!(!node.relay_port().level);
    assert_eq!(node.transport().on_topic("/motion").count(), 1);
    let note = node.transport().last_status();
    assert!(note["message"].as_str().unwrap().contains("SKIP_LOCAL_RELAY"));
}

// ── Burst-and-sleep ───────────────────────────────────────────

#[test]
fn burst_wake_counts_as_motion_and_sleeps_after_window() {
    let mut node = build(MockTransport::default());
    assert_eq!(node.run_burst(), Exit::Sleep);

    assert!(node.clock().now >= 30_000);
    assert_eq!(node.relay_port().writes, [false, true, false]);
    assert_eq!(node.transport().on_topic("/motion").count(), 1);
    assert_eq!(
        node.transport().last_status(),
        json!({"status": "ok", "relay": "OFF", "reason": "sleep"})
    );
    assert!(!node.transport().connected);
    assert!(!node.network().up, "station released before sleep");
}

#[test]
fn burst_connect_timeout_goes_straight_to_sleep() {
    let mut node = build(MockTransport::unreachable());
    assert_eq!(node.run_burst(), Exit::Sleep);

    assert_eq!(node.clock().now, 10_000);
    assert_eq!(node.transport().connect_attempts, 6);
    assert!(node.transport().sent.is_empty());
    assert_eq!(node.relay_port().writes, [false], "relay never energised");
}

#[test]
fn burst_serves_commands_during_window() {
    let mut node = build(MockTransport::default());
    node.transport_mut().inject("RELAY_MAX_ON_DURATION:5000");
    assert_eq!(node.run_burst(), Exit::Sleep);

    let statuses = node.transport().statuses();
    assert!(statuses.contains(&json!({"status": "ok", "RELAY_MAX_ON_DURATION": 5000})));
    assert!(statuses.contains(&json!({"status": "ok", "relay": "OFF", "reason": "timeout"})));
    assert!(
        !statuses.iter().any(|s| s["reason"] == "sleep"),
        "relay already off before sleep"
    );
}

#[test]
fn burst_restart_cuts_window_short() {
    let mut node = build(MockTransport::default());
    node.transport_mut().inject("RESTART");
    assert_eq!(node.run_burst(), Exit::Restart);
    assert!(node.clock().now < 30_000);
}
