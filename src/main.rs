//! Ghafeer relay node firmware: main entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  GpioRelay      GpioPir         SystemClock     WifiStation    │
//! │  (RelayPort)    (MotionSensor)  (ClockPort)     (Connectivity) │
//! │  MqttTransport / UdpTransport ── Publisher (EventSink)         │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              NodeService (pure logic)                  │    │
//! │  │  Config · RelayController · MotionDebouncer            │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Lifecycle (continuous loop or burst-and-sleep) · power        │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use log::info;

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::gpio::{PinDriver, Pull};
use esp_idf_svc::hal::prelude::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

use ghafeer::adapters::device_id;
use ghafeer::adapters::hardware::{GpioPir, GpioRelay};
use ghafeer::adapters::time::SystemClock;
use ghafeer::adapters::wifi::{ConnectivityPort, WifiStation};
use ghafeer::app::service::NodeService;
use ghafeer::config::{LifecycleConfig, NetworkConfig, NodeConfig};
use ghafeer::drivers::power;
use ghafeer::error::Error;
use ghafeer::lifecycle::{Exit, Lifecycle};
use ghafeer::pins;

fn main() -> anyhow::Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Ghafeer v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    power::log_wake_cause();

    let net = NetworkConfig::default();
    let timing = LifecycleConfig::default();

    // ── 2. Pins ───────────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let relay_pin = PinDriver::output(peripherals.pins.gpio26)?;
    let mut pir_pin = PinDriver::input(peripherals.pins.gpio27)?;
    pir_pin.set_pull(Pull::Down)?;
    info!(
        "Pins: relay GPIO{} ({:?}), PIR GPIO{}",
        pins::RELAY_GPIO,
        pins::RELAY_POLARITY,
        pins::PIR_GPIO
    );

    // ── 3. WiFi ───────────────────────────────────────────────
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let mut wifi = WifiStation::new(BlockingWifi::wrap(
        EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs))?,
        sysloop,
    )?);
    configure_station(&mut wifi, &net)?;

    // ── 4. Domain ─────────────────────────────────────────────
    let mac = device_id::read_mac();
    let id = device_id::device_id(&mac);
    let service = NodeService::new(NodeConfig::default(), pins::RELAY_POLARITY, id.as_str());
    info!("Device ID: {}", id);

    #[cfg(feature = "udp")]
    let transport = ghafeer::adapters::udp::UdpTransport::new(
        net.udp_port,
        ghafeer::adapters::udp::parse_notify(net.udp_notify),
    );
    #[cfg(not(feature = "udp"))]
    let transport = ghafeer::adapters::mqtt::MqttTransport::new(net.mqtt_url());

    let mut node = Lifecycle::new(
        service,
        GpioRelay::new(relay_pin),
        GpioPir::new(pir_pin),
        SystemClock::new(),
        wifi,
        transport,
        timing,
    );

    // ── 5. Run ────────────────────────────────────────────────
    // The lifecycle joins the AP itself and re-joins after a drop; in
    // deep-sleep mode the join counts against the connect timeout.
    #[cfg(feature = "deep-sleep")]
    let exit = node.run_burst();
    #[cfg(not(feature = "deep-sleep"))]
    let exit = node.run_continuous();

    match exit {
        Exit::Restart => power::restart(),
        Exit::Sleep => power::enter_deep_sleep(),
    }
}

/// Validate and store the build-time station credentials.
fn configure_station(wifi: &mut impl ConnectivityPort, net: &NetworkConfig) -> Result<(), Error> {
    if net.wifi_ssid.is_empty() {
        return Err(Error::Init("GHAFEER_WIFI_SSID was not set at build time"));
    }
    wifi.set_credentials(net.wifi_ssid, net.wifi_password)?;
    Ok(())
}
