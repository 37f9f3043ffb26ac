//! SW-420 vibration switch monitor.
//!
//! The module's digital output toggles while the drum shakes.  Every edge
//! the ISR sees, and every level the main loop polls, funnels through
//! [`SensorMonitor`]: polarity decides whether the level means "vibrating",
//! the [`DebounceFilter`] drops re-triggers inside the window, and an
//! accepted hit advances `last_hit_at`.
//!
//! ## Concurrency
//!
//! The GPIO ISR can preempt the main loop at any instruction.  Both
//! timestamps are single `AtomicU32`s updated by CAS, so a reader sees
//! either the old or the new value, and `last_hit_at` only ever moves
//! forward.  The ISR body does one debounce check and one atomic write,
//! with no allocation and no logging.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::config::{MonitorConfig, Polarity};
use crate::ticks::{self, Millis};

use super::debounce::DebounceFilter;

/// Silence after which the poll path rebases `last_hit_at` so the
/// wrapping difference never folds back into the Running window.
const STALE_HORIZON_MS: u32 = ticks::HALF_RANGE_MS - 60_000;

pub struct SensorMonitor {
    polarity: Polarity,
    run_timeout_ms: u32,
    filter: DebounceFilter,
    last_hit_at: AtomicU32,
}

impl SensorMonitor {
    /// Build the monitor at boot time `now`.  No hit has been seen yet, so
    /// `last_hit_at` starts one full timeout in the past.
    pub fn new(config: &MonitorConfig, now: Millis) -> Self {
        Self {
            polarity: config.sensor_polarity,
            run_timeout_ms: config.run_timeout_ms,
            filter: DebounceFilter::new(config.debounce_ms, now),
            last_hit_at: AtomicU32::new(now.wrapping_sub(config.run_timeout_ms)),
        }
    }

    /// Whether a raw level means "vibration present".
    #[inline]
    pub fn is_active(&self, level_high: bool) -> bool {
        self.polarity.is_asserted(level_high)
    }

    /// Interrupt path. Call on every rising and falling edge.
    ///
    /// Returns `true` if the edge was accepted as a hit.
    #[inline]
    pub fn on_edge(&self, level_high: bool, now: Millis) -> bool {
        self.record(level_high, now)
    }

    /// Poll path. Call once per main-loop iteration with the current level.
    ///
    /// Catches edges the interrupt missed and keeps working if the ISR
    /// could not be installed.  Returns `true` if the level was accepted as a hit.
    pub fn poll(&self, level_high: bool, now: Millis) -> bool {
        let hit = self.record(level_high, now);
        if !hit {
            self.rebase_if_stale(now);
        }
        hit
    }

    /// Timestamp of the most recent accepted hit.
    #[inline]
    pub fn last_hit_at(&self) -> Millis {
        self.last_hit_at.load(Ordering::Acquire)
    }

    pub fn debounce_window_ms(&self) -> u32 {
        self.filter.window_ms()
    }

    fn record(&self, level_high: bool, now: Millis) -> bool {
        if !self.is_active(level_high) || !self.filter.accept(now) {
            return false;
        }
        self.advance_last_hit(now);
        true
    }

    /// Move `last_hit_at` forward to `at`; never backwards.
    fn advance_last_hit(&self, at: Millis) {
        let _ = self
            .last_hit_at
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                ticks::is_after(at, current).then_some(at)
            });
    }

    fn rebase_if_stale(&self, now: Millis) {
        let last = self.last_hit_at();
        if ticks::elapsed(now, last) >= STALE_HORIZON_MS {
            // A failed CAS means the ISR just recorded a fresh hit.
            let _ = self.last_hit_at.compare_exchange(
                last,
                now.wrapping_sub(self.run_timeout_ms),
                Ordering::AcqRel,
                Ordering::Acquire,
            );
        }
    }
}
