//! Idle/Running state machine.
//!
//! ```text
//!            hit within timeout
//!   ┌──────┐ ──────────────────▶ ┌─────────┐
//!   │ Idle │                     │ Running │ ◀─┐ hit within timeout
//!   └──────┘ ◀────────────────── └─────────┘ ──┘ (run_started_at kept)
//!            silence ≥ timeout
//! ```
//!
//! The timeout window is the hysteresis: the SW-420 chatters while the
//! drum turns and goes quiet between tumbles, so a single missing edge
//! must not flip the indicator.  [`RunStateTracker`] is owned by the main
//! loop only; the ISR never touches it.

use core::time::Duration;

use crate::ticks::{self, Millis};

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RunState {
    Idle = 0,
    Running = 1,
}

impl RunState {
    pub fn is_running(self) -> bool {
        self == Self::Running
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Running => "RUNNING",
        }
    }
}

/// Result of one [`RunStateTracker::evaluate`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStatus {
    pub state: RunState,
    /// Time since the current Running streak began.  `None` while Idle.
    pub elapsed: Option<Duration>,
    /// Set when this evaluation changed the state.
    pub transition: Option<Transition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: RunState,
    pub to: RunState,
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

pub struct RunStateTracker {
    timeout_ms: u32,
    state: RunState,
    /// `Some` if and only if `state == Running`.
    run_started_at: Option<Millis>,
}

impl RunStateTracker {
    pub fn new(timeout_ms: u32) -> Self {
        Self {
            timeout_ms,
            state: RunState::Idle,
            run_started_at: None,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn run_started_at(&self) -> Option<Millis> {
        self.run_started_at
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    /// Derive the state at `now` from the last accepted sensor hit.
    ///
    /// `last_hit_at` may be slightly after `now` when the ISR fired after
    /// `now` was sampled; that counts as a hit right now.
    pub fn evaluate(&mut self, last_hit_at: Millis, now: Millis) -> RunStatus {
        let running = ticks::elapsed(now, last_hit_at) < self.timeout_ms;

        let transition = match (self.state, running) {
            (RunState::Idle, true) => {
                self.state = RunState::Running;
                self.run_started_at = Some(now);
                Some(Transition {
                    from: RunState::Idle,
                    to: RunState::Running,
                })
            }
            (RunState::Running, false) => {
                self.state = RunState::Idle;
                self.run_started_at = None;
                Some(Transition {
                    from: RunState::Running,
                    to: RunState::Idle,
                })
            }
            _ => None,
        };

        let elapsed = self
            .run_started_at
            .map(|started| Duration::from_millis(u64::from(ticks::elapsed(now, started))));

        RunStatus {
            state: self.state,
            elapsed,
            transition,
        }
    }
}
