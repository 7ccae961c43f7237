//! Timing and activation logic: relay controller and PIR debouncer.

pub mod motion;
pub mod relay;
