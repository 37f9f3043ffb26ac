//! Application service, the hexagonal core.
//!
//! [`MonitorService`] wires the sensor pipeline together for the main
//! loop: read the sensor level, feed the poll path, evaluate the run state,
//! drive the indicator, and render the status page on request.
//!
//! ```text
//!  InputPin ──▶ ┌──────────────────────────────┐ ──▶ OutputPin (LED)
//!  (poll)       │        MonitorService         │
//!  ISR ──▶ &'static SensorMonitor ──▶ Tracker   │ ──▶ EventSink
//!  Clock ─────▶ └──────────────────────────────┘ ──▶ HTML page
//! ```
//!
//! The ISR only ever touches the shared [`SensorMonitor`]; everything else
//! here is owned by the main loop.

use core::time::Duration;

use embedded_hal::digital::{InputPin, OutputPin};
use log::{debug, info};

use crate::config::MonitorConfig;
use crate::drivers::indicator::IndicatorController;
use crate::fsm::{RunState, RunStateTracker, RunStatus};
use crate::http::page;
use crate::sensors::{EdgeMode, SensorMonitor};
use crate::ticks;

use super::events::MonitorEvent;
use super::ports::{Clock, EventSink, StatusPort};

// ───────────────────────────────────────────────────────────────
// MonitorService
// ───────────────────────────────────────────────────────────────

pub struct MonitorService<I, O, C, E> {
    monitor: &'static SensorMonitor,
    tracker: RunStateTracker,
    indicator: IndicatorController<O>,
    sensor_pin: I,
    clock: C,
    sink: E,
    edge_mode: EdgeMode,
}

impl<I, O, C, E> MonitorService<I, O, C, E>
where
    I: InputPin,
    O: OutputPin,
    C: Clock,
    E: EventSink,
{
    pub fn new(
        config: &MonitorConfig,
        monitor: &'static SensorMonitor,
        sensor_pin: I,
        indicator_pin: O,
        clock: C,
        sink: E,
        edge_mode: EdgeMode,
    ) -> Self {
        Self {
            monitor,
            tracker: RunStateTracker::new(config.run_timeout_ms),
            indicator: IndicatorController::new(indicator_pin, config.indicator_polarity),
            sensor_pin,
            clock,
            sink,
            edge_mode,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Announce the service and bring the indicator in line with state.
    pub fn start(&mut self) {
        self.sink.emit(&MonitorEvent::Started {
            edge_mode: self.edge_mode,
            timeout_ms: self.tracker.timeout_ms(),
        });
        self.refresh_indicator();
        info!("MonitorService started ({:?})", self.edge_mode);
    }

    // ── Per-iteration operations ──────────────────────────────

    /// Feed the current sensor level through the poll path.
    pub fn poll_sensor(&mut self) -> bool {
        // A pin read error is treated as "no vibration"; the ISR path and
        // the next poll still see real edges.
        let level_high = self.sensor_pin.is_high().unwrap_or(false);
        let now = self.clock.now_ms();
        let hit = self.monitor.poll(level_high, now);
        if hit {
            debug!("poll: hit at t={}ms", now);
        }
        hit
    }

    /// Poll the sensor, then derive the run state.
    pub fn evaluate(&mut self) -> RunStatus {
        self.poll_sensor();
        let now = self.clock.now_ms();
        let started_before = self.tracker.run_started_at();
        let status = self.tracker.evaluate(self.monitor.last_hit_at(), now);

        if let Some(transition) = status.transition {
            let event = match transition.to {
                RunState::Running => MonitorEvent::RunStarted { at: now },
                RunState::Idle => MonitorEvent::RunEnded {
                    ran_for: Duration::from_millis(u64::from(
                        started_before.map_or(0, |started| ticks::elapsed(now, started)),
                    )),
                },
            };
            self.sink.emit(&event);
        }
        status
    }

    /// Evaluate and mirror the result on the LED.
    pub fn refresh_indicator(&mut self) -> RunStatus {
        let status = self.evaluate();
        self.indicator.apply(status.state);
        status
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> RunState {
        self.tracker.state()
    }

    pub fn edge_mode(&self) -> EdgeMode {
        self.edge_mode
    }

    pub fn indicator_lit(&self) -> bool {
        self.indicator.is_lit()
    }

    pub fn sink(&self) -> &E {
        &self.sink
    }
}

impl<I, O, C, E> StatusPort for MonitorService<I, O, C, E>
where
    I: InputPin,
    O: OutputPin,
    C: Clock,
    E: EventSink,
{
    fn refresh(&mut self) {
        self.refresh_indicator();
    }

    fn render_status_page(&mut self) -> String {
        let status = self.refresh_indicator();
        page::render(status.state, status.elapsed)
    }
}
