//! Node service: the hexagonal core.
//!
//! [`NodeService`] owns the configuration store, the relay controller and
//! the motion debouncer as one aggregate.  It interprets command lines,
//! applies PIR samples and timeouts, and reports everything as
//! [`AppEvent`]s.  Pins and sinks are injected at call sites, so the whole
//! service is testable with mock adapters.
//!
//! ```text
//!  command line ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!  PIR sample   ──▶ │        NodeService        │
//!                   │ Config · Relay · Debounce │ ──▶ RelayPort
//!                   └──────────────────────────┘
//! ```

use core::net::Ipv4Addr;

use log::{debug, info, warn};
use serde_json::{Map, Value};

use crate::config::NodeConfig;
use crate::control::motion::{MotionDebouncer, MotionDecision};
use crate::control::relay::{Polarity, RelayController, RelayState, Trigger};
use crate::error::CommandError;

use super::commands::{Command, HELP};
use super::events::{AppEvent, MotionReport};
use super::ports::{EventSink, RelayPort};
use super::response::Response;
use super::topics::Topics;

/// Follow-up the caller must perform after a command was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Reboot once the response has been delivered.
    Restart,
}

pub struct NodeService {
    config: NodeConfig,
    relay: RelayController,
    motion: MotionDebouncer,
    device_id: String,
    ip: Option<Ipv4Addr>,
    topics: Topics,
}

impl NodeService {
    pub fn new(config: NodeConfig, polarity: Polarity, device_id: impl Into<String>) -> Self {
        let device_id = device_id.into();
        let topics = Topics::build(config.device_name(), &device_id);
        Self {
            config,
            relay: RelayController::new(polarity),
            motion: MotionDebouncer::new(),
            device_id,
            ip: None,
            topics,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Put the relay in a known OFF state and apply the log level.
    pub fn start(&mut self, port: &mut impl RelayPort, sink: &mut impl EventSink) {
        self.relay.init(port);
        apply_log_level(self.config.debug());
        sink.emit(&AppEvent::Started {
            device_id: self.device_id.clone(),
            name: self.config.device_name().to_string(),
        });
        info!(
            "NodeService started as '{}' ({})",
            self.config.device_name(),
            self.device_id
        );
    }

    /// Presence message for the status topic, sent after every (re)connect.
    pub fn announce_online(&self, sink: &mut impl EventSink) {
        let presence = Response::online()
            .with("name", self.config.device_name().as_str())
            .with("mac", self.device_id.as_str())
            .with("ip", self.ip_string());
        sink.emit(&AppEvent::Online(presence));
    }

    /// Wake from deep sleep: the wake source is the PIR, so this always
    /// counts as motion.
    pub fn on_wake(&mut self, now_ms: u64, port: &mut impl RelayPort, sink: &mut impl EventSink) {
        let notify = self
            .motion
            .record_trigger(now_ms, self.config.motion_cooldown_ms());
        info!("MOTION | wake trigger");
        self.start_cycle(now_ms, notify, port, sink);
    }

    /// Switch the relay off before the node goes dark.
    pub fn shutdown(&mut self, now_ms: u64, port: &mut impl RelayPort, sink: &mut impl EventSink) {
        self.relay.deactivate(now_ms, Trigger::Sleep, port, sink);
    }

    // ── Per-tick work ─────────────────────────────────────────

    /// Automatic shutoff.  Runs every tick, before motion sampling.
    pub fn check_timeout(
        &mut self,
        now_ms: u64,
        port: &mut impl RelayPort,
        sink: &mut impl EventSink,
    ) -> bool {
        self.relay
            .check_timeout(now_ms, self.config.relay_max_on_ms(), port, sink)
    }

    /// Whether the coordinator should read the PIR this tick.
    pub fn motion_sample_due(&self, now_ms: u64) -> bool {
        !self.config.skip_local_pir()
            && self.motion.sample_due(now_ms, self.config.pir_interval_ms())
    }

    /// Feed one PIR sample.
    pub fn on_motion_sample(
        &mut self,
        now_ms: u64,
        signal_high: bool,
        port: &mut impl RelayPort,
        sink: &mut impl EventSink,
    ) -> MotionDecision {
        let decision = self.motion.on_sample(
            now_ms,
            signal_high,
            self.relay.is_active(),
            self.config.pir_interval_ms(),
            self.config.motion_cooldown_ms(),
        );
        if let MotionDecision::Triggered { notify } = decision {
            self.start_cycle(now_ms, notify, port, sink);
        }
        decision
    }

    // ── Command handling ──────────────────────────────────────

    /// Parse and apply one inbound line.  Always emits exactly one
    /// [`AppEvent::Response`].
    pub fn handle_line(
        &mut self,
        line: &str,
        now_ms: u64,
        port: &mut impl RelayPort,
        sink: &mut impl EventSink,
    ) -> Option<Directive> {
        info!("CMD | {}", line.trim());
        match Command::parse(line) {
            Ok(cmd) => self.execute(cmd, now_ms, port, sink),
            Err(e) => {
                self.reject(&e, sink);
                None
            }
        }
    }

    /// Answer a line that never made it to the interpreter (or failed in it).
    pub fn reject(&self, error: &CommandError, sink: &mut impl EventSink) {
        warn!("CMD | rejected: {}", error);
        sink.emit(&AppEvent::Response(Response::error(error.to_string())));
    }

    /// Apply a validated command.
    pub fn execute(
        &mut self,
        cmd: Command,
        now_ms: u64,
        port: &mut impl RelayPort,
        sink: &mut impl EventSink,
    ) -> Option<Directive> {
        let mut directive = None;
        let response = match cmd {
            Command::RelayOn => {
                self.relay.activate(now_ms, Trigger::Command, port, sink);
                Response::ok().with("relay", "ON")
            }
            Command::RelayOff => {
                self.relay.deactivate(now_ms, Trigger::Command, port, sink);
                Response::ok().with("relay", "OFF")
            }
            Command::RelayStatus => {
                Response::ok().with("relay_status", self.relay.status(port).as_str())
            }
            Command::PirInterval(ms) => match self.config.set_pir_interval_ms(ms) {
                Ok(()) => Response::ok().with("PIR_INTERVAL", self.config.pir_interval_ms()),
                Err(e) => Response::error(e.to_string()),
            },
            Command::RelayMaxOnDuration(ms) => match self.config.set_relay_max_on_ms(ms) {
                Ok(()) => Response::ok()
                    .with("RELAY_MAX_ON_DURATION", self.config.relay_max_on_ms()),
                Err(e) => Response::error(e.to_string()),
            },
            Command::SkipLocalRelay(skip) => {
                self.config.set_skip_local_relay(skip);
                Response::ok().with("SKIP_LOCAL_RELAY", skip)
            }
            Command::SkipLocalPir(skip) => {
                self.config.set_skip_local_pir(skip);
                Response::ok().with("SKIP_LOCAL_PIR", skip)
            }
            Command::Debug(on) => {
                self.config.set_debug(on);
                apply_log_level(on);
                Response::ok().with("debug", if on { "enabled" } else { "disabled" })
            }
            Command::DeviceName(name) => {
                self.config.set_device_name(name);
                let new = Topics::build(self.config.device_name(), &self.device_id);
                if new != self.topics {
                    let old = core::mem::replace(&mut self.topics, new.clone());
                    info!("Topics rebuilt under {}", new.cmd);
                    sink.emit(&AppEvent::TopicsChanged { old, new });
                }
                Response::ok().with("GHAFEER_NAME", self.config.device_name().as_str())
            }
            Command::Status => self.status_report(now_ms, port),
            Command::Help => Response::ok().with("commands", help_listing()),
            Command::Restart => {
                info!("Restart requested");
                directive = Some(Directive::Restart);
                Response::ok().with("message", "Restarting...")
            }
        };
        sink.emit(&AppEvent::Response(response));
        directive
    }

    // ── Queries ───────────────────────────────────────────────

    /// Full snapshot: identity, relay, every config value, topics.
    pub fn status_report(&self, now_ms: u64, port: &mut impl RelayPort) -> Response {
        Response::online()
            .with("name", self.config.device_name().as_str())
            .with("mac", self.device_id.as_str())
            .with("ip", self.ip_string())
            .with("relay", self.relay.status(port).as_str())
            .with("skip_local_relay", self.config.skip_local_relay())
            .with("skip_local_pir", self.config.skip_local_pir())
            .with("pir_interval", self.config.pir_interval_ms())
            .with("relay_max_on_duration", self.config.relay_max_on_ms())
            .with("motion_cooldown", self.config.motion_cooldown_ms())
            .with("debug", self.config.debug())
            .with("uptime", now_ms)
            .with("cmd_topic", self.topics.cmd.as_str())
            .with("status_topic", self.topics.status.as_str())
            .with("motion_topic", self.topics.motion.as_str())
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn topics(&self) -> &Topics {
        &self.topics
    }

    pub fn relay_state(&self) -> RelayState {
        self.relay.state()
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Station address, once the network is up.
    pub fn set_local_ip(&mut self, ip: Option<Ipv4Addr>) {
        self.ip = ip;
    }

    // ── Internal ──────────────────────────────────────────────

    fn start_cycle(
        &mut self,
        now_ms: u64,
        notify: bool,
        port: &mut impl RelayPort,
        sink: &mut impl EventSink,
    ) {
        let relay_driven = !self.config.skip_local_relay();
        if relay_driven {
            self.relay.activate(now_ms, Trigger::Motion, port, sink);
        } else {
            debug!("MOTION | SKIP_LOCAL_RELAY set, relay left alone");
        }

        if notify {
            info!("MOTION | detected at {}ms", now_ms);
            sink.emit(&AppEvent::MotionDetected {
                report: MotionReport {
                    motion: true,
                    mac: self.device_id.clone(),
                    location: self.config.device_name().to_string(),
                    ip: self.ip_string(),
                    time: now_ms,
                },
                relay_driven,
            });
        } else {
            debug!("MOTION | inside cooldown, not announced");
        }
    }

    fn ip_string(&self) -> String {
        self.ip.unwrap_or(Ipv4Addr::UNSPECIFIED).to_string()
    }
}

fn help_listing() -> Value {
    Value::Array(
        HELP.iter()
            .map(|(cmd, desc)| {
                let mut entry = Map::new();
                entry.insert("cmd".into(), Value::from(*cmd));
                entry.insert("desc".into(), Value::from(*desc));
                Value::Object(entry)
            })
            .collect(),
    )
}

fn apply_log_level(debug: bool) {
    log::set_max_level(if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    });
}
