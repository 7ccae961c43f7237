//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the business rules for the relay node: the
//! command interpreter, response and event shapes, topic naming, and the
//! [`service::NodeService`] aggregate that ties the configuration store,
//! relay controller and motion debouncer together.  All interaction with
//! hardware happens through **port traits** defined in [`ports`].

pub mod commands;
pub mod events;
pub mod ports;
pub mod response;
pub mod service;
pub mod topics;
