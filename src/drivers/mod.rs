//! Platform drivers with no port of their own.

pub mod power;
