//! Sensor subsystem: the vibration switch and its edge filter.
//!
//! [`SensorMonitor`] is created once at boot, leaked to `'static`, and
//! shared by reference between the GPIO ISR and the main loop.

pub mod debounce;
pub mod vibration;

pub use debounce::DebounceFilter;
pub use vibration::SensorMonitor;

/// How sensor edges reach the [`SensorMonitor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeMode {
    /// GPIO ISR plus the per-iteration poll.
    InterruptAndPoll,
    /// ISR install failed; the per-iteration poll alone keeps state correct.
    PollingOnly,
}
