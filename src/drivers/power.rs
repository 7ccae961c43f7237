//! Reset, wake cause and deep sleep.
//!
//! Deep sleep arms the PIR pin as the ext0 wake source, so the next
//! motion event resets the chip and the burst cycle starts over from
//! `main`.  On the host these calls log and end the process.

use log::info;

#[cfg(target_os = "espidf")]
use log::warn;

use crate::pins;

/// Why the chip is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeCause {
    /// Cold boot or reset; not a wake from sleep.
    PowerOn,
    /// PIR level on the ext0 pin.
    Pir,
    Timer,
    Other,
}

impl WakeCause {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PowerOn => "power-on",
            Self::Pir => "PIR (ext0)",
            Self::Timer => "timer",
            Self::Other => "other",
        }
    }
}

#[cfg(target_os = "espidf")]
pub fn wake_cause() -> WakeCause {
    use esp_idf_svc::sys::{
        esp_sleep_get_wakeup_cause, esp_sleep_source_t_ESP_SLEEP_WAKEUP_EXT0,
        esp_sleep_source_t_ESP_SLEEP_WAKEUP_TIMER, esp_sleep_source_t_ESP_SLEEP_WAKEUP_UNDEFINED,
    };
    // SAFETY: reads a value latched by the ROM at boot.
    let cause = unsafe { esp_sleep_get_wakeup_cause() };
    #[allow(non_upper_case_globals)]
    match cause {
        esp_sleep_source_t_ESP_SLEEP_WAKEUP_UNDEFINED => WakeCause::PowerOn,
        esp_sleep_source_t_ESP_SLEEP_WAKEUP_EXT0 => WakeCause::Pir,
        esp_sleep_source_t_ESP_SLEEP_WAKEUP_TIMER => WakeCause::Timer,
        _ => WakeCause::Other,
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn wake_cause() -> WakeCause {
    WakeCause::PowerOn
}

/// Log the wake cause once at boot.
pub fn log_wake_cause() -> WakeCause {
    let cause = wake_cause();
    info!("SLEEP | boot cause: {}", cause.as_str());
    cause
}

/// Arm the PIR as the wake source and power down.  Never returns.
#[cfg(target_os = "espidf")]
pub fn enter_deep_sleep() -> ! {
    // SAFETY: ext0 setup on a valid RTC GPIO, then the ROM sleep entry.
    unsafe {
        let err = esp_idf_svc::sys::esp_sleep_enable_ext0_wakeup(
            pins::PIR_GPIO,
            pins::PIR_WAKE_LEVEL,
        );
        if err != esp_idf_svc::sys::ESP_OK {
            warn!("SLEEP | ext0 wake setup failed ({}), sleeping anyway", err);
        }
        info!("SLEEP | entering deep sleep, wake on GPIO{}", pins::PIR_GPIO);
        esp_idf_svc::sys::esp_deep_sleep_start()
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn enter_deep_sleep() -> ! {
    info!("SLEEP | (sim) deep sleep, wake on GPIO{}", pins::PIR_GPIO);
    std::process::exit(0)
}

/// Software reset.  Never returns.
#[cfg(target_os = "espidf")]
pub fn restart() -> ! {
    info!("Restarting");
    // SAFETY: ROM reset entry.
    unsafe { esp_idf_svc::sys::esp_restart() }
}

#[cfg(not(target_os = "espidf"))]
pub fn restart() -> ! {
    info!("(sim) restart");
    std::process::exit(0)
}
