//! Time-window debounce filter shared by the ISR and the main loop.
//!
//! An edge is accepted only if at least `window_ms` have passed since the
//! previously accepted edge.  `last_accepted_at` lives in an `AtomicU32`
//! and is advanced with compare-and-swap, so the GPIO ISR preempting a
//! main-loop `accept()` can never be overwritten by the older timestamp.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::ticks::{self, Millis};

pub struct DebounceFilter {
    window_ms: u32,
    last_accepted_at: AtomicU32,
}

impl DebounceFilter {
    /// Create a filter whose first edge at or after `now` is accepted.
    pub fn new(window_ms: u32, now: Millis) -> Self {
        Self {
            window_ms,
            last_accepted_at: AtomicU32::new(now.wrapping_sub(window_ms)),
        }
    }

    pub fn window_ms(&self) -> u32 {
        self.window_ms
    }

    /// Timestamp of the last accepted edge.
    pub fn last_accepted_at(&self) -> Millis {
        self.last_accepted_at.load(Ordering::Acquire)
    }

    /// Accept the edge observed at `now` if it is outside the window.
    ///
    /// Lock-free and allocation-free; safe from interrupt context.
    pub fn accept(&self, now: Millis) -> bool {
        let mut last = self.last_accepted_at.load(Ordering::Acquire);
        loop {
            if ticks::elapsed(now, last) < self.window_ms {
                return false;
            }
            match self.last_accepted_at.compare_exchange_weak(
                last,
                now,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                // Preempted by another accept; re-check against its timestamp.
                Err(current) => last = current,
            }
        }
    }
}
