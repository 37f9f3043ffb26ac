//! System configuration parameters
//!
//! All tunable parameters for the dryer monitor.  Read once at startup and
//! immutable afterwards; there is no runtime reconfiguration.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::pins;

/// Electrical convention for a digital signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// Asserted when the pin reads HIGH.
    ActiveHigh,
    /// Asserted when the pin reads LOW.
    ActiveLow,
}

impl Polarity {
    /// Logical state for a raw pin level.
    #[inline]
    pub fn is_asserted(self, level_high: bool) -> bool {
        match self {
            Self::ActiveHigh => level_high,
            Self::ActiveLow => !level_high,
        }
    }

    /// Raw pin level that expresses the logical state `on`.
    #[inline]
    pub fn level_for(self, on: bool) -> bool {
        match self {
            Self::ActiveHigh => on,
            Self::ActiveLow => !on,
        }
    }
}

/// Core monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    // --- Pins ---
    /// SW-420 digital output.
    pub sensor_gpio: i32,
    /// On-board indicator LED.
    pub indicator_gpio: i32,
    /// SW-420 outputs HIGH while vibrating.
    pub sensor_polarity: Polarity,
    /// Most ESP dev boards wire the on-board LED active-low.
    pub indicator_polarity: Polarity,

    // --- Detection ---
    /// Minimum spacing between accepted sensor edges (milliseconds)
    pub debounce_ms: u32,
    /// Sensor silence after which Running reverts to Idle (milliseconds)
    pub run_timeout_ms: u32,

    // --- HTTP ---
    /// Status page listen port
    pub listen_port: u16,
    /// Total budget for reading the request head (milliseconds)
    pub header_read_timeout_ms: u32,
    /// Total budget for writing the response (milliseconds)
    pub response_write_timeout_ms: u32,
    /// Sleep between non-blocking accept attempts (milliseconds)
    pub accept_poll_interval_ms: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sensor_gpio: pins::SENSOR_GPIO,
            indicator_gpio: pins::INDICATOR_GPIO,
            sensor_polarity: Polarity::ActiveHigh,
            indicator_polarity: Polarity::ActiveLow,

            debounce_ms: 50,
            run_timeout_ms: 10_000,

            listen_port: 80,
            header_read_timeout_ms: 3_000,
            response_write_timeout_ms: 5_000,
            accept_poll_interval_ms: 100,
        }
    }
}

/// Ceiling on [`MonitorConfig::worst_case_iteration_ms`].  The watchdog
/// timeout is derived from it.
pub const MAX_LOOP_ITERATION_MS: u32 = 30_000;

/// A config field failed range validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigError(pub &'static str);

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid config: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}

impl MonitorConfig {
    /// Range-check every field.  Rejects rather than clamps.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sensor_gpio < 0 || self.indicator_gpio < 0 {
            return Err(ConfigError("GPIO numbers must be non-negative"));
        }
        if self.sensor_gpio == self.indicator_gpio {
            return Err(ConfigError("sensor and indicator must use different GPIOs"));
        }
        if self.debounce_ms == 0 {
            return Err(ConfigError("debounce_ms must be > 0"));
        }
        if self.run_timeout_ms <= self.debounce_ms {
            return Err(ConfigError("run_timeout_ms must exceed debounce_ms"));
        }
        // Keeps the wrapping tick arithmetic unambiguous.
        if self.run_timeout_ms > 24 * 60 * 60 * 1000 {
            return Err(ConfigError("run_timeout_ms must be at most one day"));
        }
        if self.listen_port == 0 {
            return Err(ConfigError("listen_port must be non-zero"));
        }
        if self.header_read_timeout_ms == 0 || self.response_write_timeout_ms == 0 {
            return Err(ConfigError("connection budgets must be > 0"));
        }
        if self.accept_poll_interval_ms == 0 || self.accept_poll_interval_ms > 1_000 {
            return Err(ConfigError("accept_poll_interval_ms must be in 1..=1000"));
        }
        if self.worst_case_iteration_ms() > MAX_LOOP_ITERATION_MS {
            return Err(ConfigError("read + write budgets + poll interval must be at most 30 s"));
        }
        Ok(())
    }

    /// Longest one server loop iteration can take: a full head read, a full
    /// response write, and one accept poll sleep.
    pub fn worst_case_iteration_ms(&self) -> u32 {
        self.header_read_timeout_ms
            .saturating_add(self.response_write_timeout_ms)
            .saturating_add(self.accept_poll_interval_ms)
    }

    /// Parse and validate a JSON config.  Missing fields are an error.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|_| ConfigError("malformed config JSON"))?;
        config.validate()?;
        Ok(config)
    }

    /// The config baked in at build time via `DRYERMON_CONFIG_JSON`, or the
    /// compiled-in defaults.
    pub fn from_build_env() -> Result<Self, ConfigError> {
        match option_env!("DRYERMON_CONFIG_JSON") {
            Some(json) => Self::from_json(json),
            None => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }
}
