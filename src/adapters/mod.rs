//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements  | Connects to             |
//! |------------|-------------|-------------------------|
//! | `log_sink` | EventSink   | Serial log output       |
//! | `time`     | Clock       | ESP32 high-res timer    |
//! | `wifi`     | (bootstrap) | ESP-IDF WiFi STA        |

pub mod log_sink;
pub mod time;
pub mod wifi;
