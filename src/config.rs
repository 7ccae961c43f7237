//! Node configuration.
//!
//! Three layers:
//!
//! - [`NodeConfig`]: the runtime Configuration Store.  Mutable over the
//!   command interface, bounded, never persisted (reset on every boot/wake).
//! - [`NetworkConfig`]: Wi-Fi / broker / UDP settings baked in at build time.
//! - [`LifecycleConfig`]: loop timing for the coordinator.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CommandError;

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// Upper bound for `PIR_INTERVAL` (10 minutes).
pub const MAX_PIR_INTERVAL_MS: u32 = 600_000;
/// Lower bound for `RELAY_MAX_ON_DURATION`; shorter pulses chatter the contacts.
pub const RELAY_MIN_ON_MS: u32 = 3_000;
/// Upper bound for `RELAY_MAX_ON_DURATION` (1 hour).
pub const RELAY_MAX_ON_LIMIT_MS: u32 = 3_600_000;
/// Maximum device name length in bytes.
pub const DEVICE_NAME_MAX_LEN: usize = 64;

pub const DEFAULT_PIR_INTERVAL_MS: u32 = 1_000;
pub const DEFAULT_RELAY_MAX_ON_MS: u32 = 60_000;
pub const DEFAULT_MOTION_COOLDOWN_MS: u32 = 60_000;
pub const DEFAULT_DEVICE_NAME: &str = "GHAFEER";

// ---------------------------------------------------------------------------
// Device name
// ---------------------------------------------------------------------------

/// Validated device name.  Spliced into topic strings, so it must be
/// non-empty, at most [`DEVICE_NAME_MAX_LEN`] bytes, printable, and free of
/// the MQTT separators `/`, `+` and `#`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceName(String);

impl DeviceName {
    pub fn new(name: &str) -> Result<Self, CommandError> {
        let valid = !name.is_empty()
            && name.len() <= DEVICE_NAME_MAX_LEN
            && name.chars().all(|c| !c.is_control() && !matches!(c, '/' | '+' | '#'));
        if valid {
            Ok(Self(name.to_owned()))
        } else {
            Err(CommandError::InvalidName(name.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DeviceName {
    type Error = CommandError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<DeviceName> for String {
    fn from(name: DeviceName) -> Self {
        name.0
    }
}

impl fmt::Display for DeviceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Runtime configuration store
// ---------------------------------------------------------------------------

/// Runtime parameters shared by the relay controller, the motion debouncer
/// and status reporting.  Setters validate; a rejected value leaves the
/// store untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    pir_interval_ms: u32,
    relay_max_on_ms: u32,
    motion_cooldown_ms: u32,
    skip_local_relay: bool,
    skip_local_pir: bool,
    debug: bool,
    device_name: DeviceName,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            pir_interval_ms: DEFAULT_PIR_INTERVAL_MS,
            relay_max_on_ms: DEFAULT_RELAY_MAX_ON_MS,
            motion_cooldown_ms: DEFAULT_MOTION_COOLDOWN_MS,
            skip_local_relay: false,
            skip_local_pir: false,
            debug: false,
            device_name: DeviceName(DEFAULT_DEVICE_NAME.to_owned()),
        }
    }
}

impl NodeConfig {
    // ── Reads ─────────────────────────────────────────────────

    pub fn pir_interval_ms(&self) -> u32 {
        self.pir_interval_ms
    }

    pub fn relay_max_on_ms(&self) -> u32 {
        self.relay_max_on_ms
    }

    /// Minimum gap between two motion notifications.
    pub fn motion_cooldown_ms(&self) -> u32 {
        self.motion_cooldown_ms
    }

    pub fn skip_local_relay(&self) -> bool {
        self.skip_local_relay
    }

    pub fn skip_local_pir(&self) -> bool {
        self.skip_local_pir
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn device_name(&self) -> &DeviceName {
        &self.device_name
    }

    // ── Validated writes ──────────────────────────────────────

    pub fn set_pir_interval_ms(&mut self, ms: u32) -> Result<(), CommandError> {
        if ms > MAX_PIR_INTERVAL_MS {
            return Err(CommandError::InvalidValue {
                command: "PIR_INTERVAL",
                value: ms.to_string(),
            });
        }
        self.pir_interval_ms = ms;
        Ok(())
    }

    pub fn set_relay_max_on_ms(&mut self, ms: u32) -> Result<(), CommandError> {
        if !(RELAY_MIN_ON_MS..=RELAY_MAX_ON_LIMIT_MS).contains(&ms) {
            return Err(CommandError::InvalidValue {
                command: "RELAY_MAX_ON_DURATION",
                value: ms.to_string(),
            });
        }
        self.relay_max_on_ms = ms;
        Ok(())
    }

    pub fn set_skip_local_relay(&mut self, skip: bool) {
        self.skip_local_relay = skip;
    }

    pub fn set_skip_local_pir(&mut self, skip: bool) {
        self.skip_local_pir = skip;
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn set_device_name(&mut self, name: DeviceName) {
        self.device_name = name;
    }
}

// ---------------------------------------------------------------------------
// Build-time network configuration
// ---------------------------------------------------------------------------

/// Network endpoints, read from the build environment.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub wifi_ssid: &'static str,
    pub wifi_password: &'static str,
    pub mqtt_host: &'static str,
    pub mqtt_port: u16,
    /// Local port for the datagram transport.
    pub udp_port: u16,
    /// Where motion datagrams go when no peer has talked to us yet.
    pub udp_notify: Option<&'static str>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            wifi_ssid: option_env!("GHAFEER_WIFI_SSID").unwrap_or(""),
            wifi_password: option_env!("GHAFEER_WIFI_PASSWORD").unwrap_or(""),
            mqtt_host: option_env!("GHAFEER_MQTT_HOST").unwrap_or("192.168.1.246"),
            mqtt_port: parse_port(option_env!("GHAFEER_MQTT_PORT"), 1883),
            udp_port: parse_port(option_env!("GHAFEER_UDP_PORT"), 4210),
            udp_notify: option_env!("GHAFEER_UDP_NOTIFY"),
        }
    }
}

impl NetworkConfig {
    /// `mqtt://host:port` URL for the client.
    pub fn mqtt_url(&self) -> String {
        format!("mqtt://{}:{}", self.mqtt_host, self.mqtt_port)
    }
}

fn parse_port(raw: Option<&str>, default: u16) -> u16 {
    raw.and_then(|s| s.parse().ok()).unwrap_or(default)
}

// ---------------------------------------------------------------------------
// Lifecycle timing
// ---------------------------------------------------------------------------

/// Timing knobs for the lifecycle coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleConfig {
    /// Fixed delay between transport connect attempts.
    pub reconnect_delay_ms: u32,
    /// Burst mode: give up on the transport after this long and go back to sleep.
    pub connect_timeout_ms: u32,
    /// Burst mode: how long to stay awake after a wake.
    pub awake_window_ms: u32,
    /// Pause between loop iterations.
    pub loop_period_ms: u32,
    /// Grace period between acknowledging `RESTART` and rebooting.
    pub restart_delay_ms: u32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: 2_000,
            connect_timeout_ms: 10_000,
            awake_window_ms: 30_000,
            loop_period_ms: 10,
            restart_delay_ms: 1_000,
        }
    }
}
