//! Application core: pure domain logic, zero I/O.
//!
//! Run/idle derivation and the status surface.  All interaction with
//! hardware and the network happens through **port traits** defined in
//! [`ports`] (plus `embedded_hal` pins), keeping this layer fully testable
//! without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
