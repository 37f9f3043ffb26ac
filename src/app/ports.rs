//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ MonitorService (domain)
//! ```
//!
//! GPIO pins cross the boundary as `embedded_hal` digital traits; the
//! remaining seams (time, event output, the status surface the HTTP server
//! consumes) are defined here so the domain core never touches hardware or
//! sockets directly.

use crate::ticks::Millis;

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: hardware timer → domain)
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond time source.
///
/// Must agree with the timestamp the sensor ISR records, so both the ISR
/// and the adapter derive it from the same counter.
pub trait Clock {
    fn now_ms(&self) -> Millis;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`MonitorEvent`](super::events::MonitorEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::MonitorEvent);
}

// ───────────────────────────────────────────────────────────────
// Status port (driving adapter: HTTP server → domain)
// ───────────────────────────────────────────────────────────────

/// What the request server needs from the domain.
pub trait StatusPort {
    /// Poll the sensor, evaluate state, and update the indicator.
    /// Called before every accept attempt.
    fn refresh(&mut self);

    /// Poll, evaluate, and render the status page body.
    fn render_status_page(&mut self) -> String;
}
