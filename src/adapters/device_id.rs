//! Device identity derived from the ESP32 factory MAC address.
//!
//! The identity is the full 6-byte MAC as 12 uppercase hex digits
//! (`DEADBEEFCAFE`).  It is stable across reboots and doubles as the
//! broker client id, the `mac` field of every report and the middle
//! segment of the node's topics.

/// "AABBCCDDEEFF" (12 chars).
pub type DeviceIdString = heapless::String<12>;

pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    // SAFETY: the buffer is exactly the 6 bytes the call writes.
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

pub fn device_id(mac: &MacAddress) -> DeviceIdString {
    use core::fmt::Write;
    let mut id = DeviceIdString::new();
    for byte in mac {
        // 6 bytes render to exactly 12 chars, the string capacity.
        let _ = write!(id, "{:02X}", byte);
    }
    id
}
