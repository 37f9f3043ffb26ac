//! GPIO pin assignments for the dryer monitor board.
//!
//! Single source of truth: drivers reference this module rather than
//! hard-coding pin numbers.  Defaults match an ESP dev board with the
//! SW-420 module on D5.

// ---------------------------------------------------------------------------
// Sensor
// ---------------------------------------------------------------------------

/// SW-420 vibration switch, digital output (DO).
pub const SENSOR_GPIO: i32 = 14;

// ---------------------------------------------------------------------------
// Indicator
// ---------------------------------------------------------------------------

/// On-board LED.  Active-LOW on most ESP8266/ESP32 dev boards.
pub const INDICATOR_GPIO: i32 = 2;
