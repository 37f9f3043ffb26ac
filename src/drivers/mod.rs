//! GPIO drivers, hardware initialisation, and the indicator LED.

pub mod gpio;
pub mod hw_init;
pub mod indicator;
pub mod watchdog;
