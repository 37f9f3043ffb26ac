//! Outbound application events.
//!
//! The [`MonitorService`](super::service::MonitorService) emits these
//! through the [`EventSink`](super::ports::EventSink) port.

use core::time::Duration;

use crate::fsm::RunState;
use crate::sensors::EdgeMode;
use crate::ticks::Millis;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    /// The service has started (carries the edge-detection mode in effect).
    Started { edge_mode: EdgeMode, timeout_ms: u32 },

    /// Idle → Running.
    RunStarted { at: Millis },

    /// Running → Idle.  `ran_for` runs up to the evaluation that saw the
    /// timeout, so it includes the trailing silence window.
    RunEnded { ran_for: Duration },
}

impl MonitorEvent {
    /// State the event leaves the machine in, if it is a transition.
    pub fn resulting_state(&self) -> Option<RunState> {
        match self {
            Self::Started { .. } => None,
            Self::RunStarted { .. } => Some(RunState::Running),
            Self::RunEnded { .. } => Some(RunState::Idle),
        }
    }
}
