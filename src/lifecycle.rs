//! Node lifecycle coordinator.
//!
//! Drives one [`NodeService`] against concrete ports in either of the two
//! run modes:
//!
//! * **Continuous**: the loop never ends on its own.  Each tick keeps
//!   the Wi-Fi link and the broker session alive, drains queued commands,
//!   enforces the relay timeout and samples the PIR when due.
//! * **Burst**: woken by the PIR, connect within a deadline, treat the
//!   wake as motion, serve commands for a fixed window, then switch the
//!   relay off and hand back so the caller can deep sleep.
//!
//! Tick order is fixed: connection, then commands, then timeout, then
//! motion.  A command that arrived before the deadline is applied before
//! the relay is forced off.
//!
//! Connection upkeep is layered: the station is re-joined first (and the
//! node's IP refreshed), then the transport session.  Whenever a session
//! comes up, whether opened here or restored by the client on its own,
//! the command topic is subscribed again and the retained presence
//! message republished.

use log::{info, warn};

use crate::adapters::publisher::Publisher;
use crate::adapters::wifi::ConnectivityPort;
use crate::app::ports::{ClockPort, MotionSensorPort, RelayPort, TransportPort};
use crate::app::service::{Directive, NodeService};
use crate::config::LifecycleConfig;
use crate::events::{INBOX_CAP, Inbox};

/// Why a run loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// `RESTART` was answered; reboot the chip.
    Restart,
    /// Awake window over (or broker unreachable); enter deep sleep.
    Sleep,
}

pub struct Lifecycle<R, P, C, N, T>
where
    R: RelayPort,
    P: MotionSensorPort,
    C: ClockPort,
    N: ConnectivityPort,
    T: TransportPort,
{
    service: NodeService,
    relay: R,
    pir: P,
    clock: C,
    network: N,
    link: Publisher<T>,
    inbox: Inbox,
    timing: LifecycleConfig,
    next_connect_at: u64,
    /// Subscribed and announced on the current session.
    online: bool,
}

impl<R, P, C, N, T> Lifecycle<R, P, C, N, T>
where
    R: RelayPort,
    P: MotionSensorPort,
    C: ClockPort,
    N: ConnectivityPort,
    T: TransportPort,
{
    pub fn new(
        service: NodeService,
        relay: R,
        pir: P,
        clock: C,
        network: N,
        transport: T,
        timing: LifecycleConfig,
    ) -> Self {
        let link = Publisher::new(transport, service.topics().clone());
        Self {
            service,
            relay,
            pir,
            clock,
            network,
            link,
            inbox: Inbox::new(),
            timing,
            next_connect_at: 0,
            online: false,
        }
    }

    /// Relay to a known OFF state, log level applied.
    pub fn start(&mut self) {
        self.service.start(&mut self.relay, &mut self.link);
    }

    // ── Run modes ─────────────────────────────────────────────

    pub fn run_continuous(&mut self) -> Exit {
        self.start();
        info!("Entering continuous loop ({}ms period)", self.timing.loop_period_ms);
        loop {
            if let Some(exit) = self.tick() {
                return exit;
            }
            self.clock.delay_ms(self.timing.loop_period_ms);
        }
    }

    pub fn run_burst(&mut self) -> Exit {
        self.start();

        if !self.connect_within(self.timing.connect_timeout_ms) {
            warn!(
                "SLEEP | broker unreachable after {}ms, back to sleep",
                self.timing.connect_timeout_ms
            );
            return Exit::Sleep;
        }

        let woke_at = self.clock.now_ms();
        self.service.on_wake(woke_at, &mut self.relay, &mut self.link);

        let window = u64::from(self.timing.awake_window_ms);
        loop {
            let now = self.clock.now_ms();
            if now.saturating_sub(woke_at) >= window {
                break;
            }
            self.maintain_connection(now);
            if let Some(exit) = self.process_commands(now) {
                return exit;
            }
            self.service.check_timeout(now, &mut self.relay, &mut self.link);
            self.clock.delay_ms(self.timing.loop_period_ms);
        }

        let now = self.clock.now_ms();
        self.service.shutdown(now, &mut self.relay, &mut self.link);
        self.link.transport_mut().disconnect();
        self.network.disconnect();
        self.online = false;
        info!("SLEEP | awake window of {}ms over", window);
        Exit::Sleep
    }

    /// One continuous-mode iteration.
    pub fn tick(&mut self) -> Option<Exit> {
        let now = self.clock.now_ms();
        self.maintain_connection(now);
        if let Some(exit) = self.process_commands(now) {
            return Some(exit);
        }
        self.service.check_timeout(now, &mut self.relay, &mut self.link);
        if self.service.motion_sample_due(now) {
            let high = self.pir.motion_detected();
            self.service
                .on_motion_sample(now, high, &mut self.relay, &mut self.link);
        }
        None
    }

    // ── Internal ──────────────────────────────────────────────

    /// Non-blocking reconnect with a fixed retry delay.
    fn maintain_connection(&mut self, now: u64) {
        if !self.network.is_connected() && self.link.transport().is_connected() {
            warn!("WIFI | link lost, dropping session");
            self.link.transport_mut().disconnect();
        }
        let session_up = self.link.transport().is_connected();
        let restored = self.link.transport_mut().take_reconnected();
        if restored || !session_up {
            self.online = false;
        }
        if self.online || now < self.next_connect_at {
            return;
        }
        let up = if session_up {
            self.resume_session()
        } else {
            self.try_connect()
        };
        if !up {
            self.next_connect_at = now + u64::from(self.timing.reconnect_delay_ms);
        }
    }

    /// Blocking connect, bounded by `timeout_ms`.
    fn connect_within(&mut self, timeout_ms: u32) -> bool {
        let started = self.clock.now_ms();
        loop {
            if self.try_connect() {
                return true;
            }
            let elapsed = self.clock.now_ms().saturating_sub(started);
            if elapsed >= u64::from(timeout_ms) {
                return false;
            }
            self.clock.delay_ms(self.timing.reconnect_delay_ms);
        }
    }

    /// Join the station if needed, then open the session.
    fn try_connect(&mut self) -> bool {
        if !self.network.is_connected() {
            if let Err(e) = self.network.connect() {
                warn!(
                    "WIFI | join failed ({}), retrying in {}ms",
                    e, self.timing.reconnect_delay_ms
                );
                return false;
            }
        }
        self.service.set_local_ip(self.network.local_ip());

        let client_id = self.service.device_id().to_owned();
        match self.link.connect(&client_id) {
            Ok(()) => {
                self.online = true;
                self.service.announce_online(&mut self.link);
                true
            }
            Err(e) => {
                warn!(
                    "MQTT | connect failed ({}), retrying in {}ms",
                    e, self.timing.reconnect_delay_ms
                );
                false
            }
        }
    }

    /// The client re-established the session itself; subscriptions did not
    /// survive the drop.
    fn resume_session(&mut self) -> bool {
        match self.link.resubscribe() {
            Ok(()) => {
                self.online = true;
                self.service.announce_online(&mut self.link);
                true
            }
            Err(e) => {
                warn!(
                    "MQTT | resubscribe failed ({}), retrying in {}ms",
                    e, self.timing.reconnect_delay_ms
                );
                false
            }
        }
    }

    /// Move inbound lines into the queue, then apply them in order.
    fn process_commands(&mut self, now: u64) -> Option<Exit> {
        while self.inbox.len() < INBOX_CAP {
            let Some(text) = self.link.transport_mut().poll() else {
                break;
            };
            if let Err(e) = self.inbox.push(&text) {
                self.service.reject(&e, &mut self.link);
            }
        }

        while let Some(line) = self.inbox.pop() {
            let directive =
                self.service
                    .handle_line(&line, now, &mut self.relay, &mut self.link);
            if directive == Some(Directive::Restart) {
                self.clock.delay_ms(self.timing.restart_delay_ms);
                return Some(Exit::Restart);
            }
        }
        None
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn service(&self) -> &NodeService {
        &self.service
    }

    pub fn relay_port(&mut self) -> &mut R {
        &mut self.relay
    }

    pub fn pir_port(&mut self) -> &mut P {
        &mut self.pir
    }

    pub fn clock(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut N {
        &mut self.network
    }

    pub fn transport(&self) -> &T {
        self.link.transport()
    }

    pub fn transport_mut(&mut self) -> &mut T {
        self.link.transport_mut()
    }
}
