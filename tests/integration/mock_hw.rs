//! Mock hardware for integration tests.
//!
//! Pins and the clock are backed by shared atomics so a test can keep a
//! handle while the service (possibly on another thread) owns the adapter.

use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

use dryermon::app::events::MonitorEvent;
use dryermon::app::ports::{Clock, EventSink, StatusPort};
use dryermon::config::MonitorConfig;
use dryermon::sensors::SensorMonitor;
use dryermon::ticks::Millis;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

// ── Sensor input ──────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockSensorPin {
    level: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl MockSensorPin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_high(&self, high: bool) {
        self.level.store(high, Ordering::SeqCst);
    }
}

impl ErrorType for MockSensorPin {
    type Error = Infallible;
}

impl InputPin for MockSensorPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.level.load(Ordering::SeqCst))
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.level.load(Ordering::SeqCst))
    }
}

// ── Indicator output ──────────────────────────────────────────

/// Remembers the last electrical level and how many writes happened.
#[derive(Clone, Default)]
pub struct MockLedPin {
    level: Arc<AtomicBool>,
    writes: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl MockLedPin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_high(&self) -> bool {
        self.level.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl ErrorType for MockLedPin {
    type Error = Infallible;
}

impl OutputPin for MockLedPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.level.store(false, Ordering::SeqCst);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.level.store(true, Ordering::SeqCst);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ── Clock ─────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct FakeClock {
    now: Arc<AtomicU32>,
}

#[allow(dead_code)]
impl FakeClock {
    pub fn at(now: Millis) -> Self {
        Self {
            now: Arc::new(AtomicU32::new(now)),
        }
    }

    pub fn set(&self, now: Millis) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: u32) -> Millis {
        self.now.fetch_add(ms, Ordering::SeqCst).wrapping_add(ms)
    }
}

impl Clock for FakeClock {
    fn now_ms(&self) -> Millis {
        self.now.load(Ordering::SeqCst)
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<MonitorEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &MonitorEvent) {
        self.events.push(event.clone());
    }
}

// ── Status port fake ──────────────────────────────────────────

/// Counts every call the server makes into the domain.
#[derive(Default)]
pub struct CountingStatus {
    pub refreshes: usize,
    pub renders: usize,
}

impl StatusPort for CountingStatus {
    fn refresh(&mut self) {
        self.refreshes += 1;
    }

    fn render_status_page(&mut self) -> String {
        self.renders += 1;
        format!("<p>render #{}</p>", self.renders)
    }
}

// ── Helpers ───────────────────────────────────────────────────

/// Mirror of the firmware's boot step: the monitor lives for the process.
pub fn leak_monitor(config: &MonitorConfig, now: Millis) -> &'static SensorMonitor {
    Box::leak(Box::new(SensorMonitor::new(config, now)))
}
