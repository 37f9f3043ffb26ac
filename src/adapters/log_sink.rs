//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured monitor events to the
//! ESP-IDF logger (UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::MonitorEvent;
use crate::app::ports::EventSink;
use crate::sensors::EdgeMode;

/// Adapter that logs every [`MonitorEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &MonitorEvent) {
        match event {
            MonitorEvent::Started { edge_mode, timeout_ms } => {
                info!("START | edges={:?} | timeout={}ms", edge_mode, timeout_ms);
                if *edge_mode == EdgeMode::PollingOnly {
                    warn!("START | sensor ISR unavailable, relying on per-loop polling");
                }
            }
            MonitorEvent::RunStarted { at } => {
                info!("STATE | IDLE -> RUNNING | t={}ms", at);
            }
            MonitorEvent::RunEnded { ran_for } => {
                info!("STATE | RUNNING -> IDLE | ran {}s", ran_for.as_secs());
            }
        }
    }
}
