//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements         | Connects to                  |
//! |-------------|--------------------|------------------------------|
//! | `hardware`  | RelayPort          | relay output pin             |
//! |             | MotionSensorPort   | PIR input pin                |
//! | `time`      | ClockPort          | ESP32 system timer           |
//! | `mqtt`      | TransportPort      | ESP-IDF MQTT client          |
//! | `udp`       | TransportPort      | UDP socket                   |
//! | `publisher` | EventSink          | any TransportPort            |
//! | `wifi`      | ConnectivityPort   | ESP-IDF WiFi STA             |
//! | `device_id` | -                  | eFuse factory MAC            |

pub mod device_id;
pub mod hardware;
pub mod mqtt;
pub mod publisher;
pub mod time;
pub mod udp;
pub mod wifi;
