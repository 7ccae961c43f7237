fn main() {
    // Network settings are baked in via option_env! in src/config.rs.
    for var in [
        "GHAFEER_WIFI_SSID",
        "GHAFEER_WIFI_PASSWORD",
        "GHAFEER_MQTT_HOST",
        "GHAFEER_MQTT_PORT",
        "GHAFEER_UDP_PORT",
        "GHAFEER_UDP_NOTIFY",
    ] {
        println!("cargo:rerun-if-env-changed={var}");
    }

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
