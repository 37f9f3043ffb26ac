//! Single-connection HTTP status server.
//!
//! ```text
//!   refresh ─▶ accept? ─┬─ none ─▶ sleep(poll interval) ─▶ refresh …
//!                       └─ stream ─▶ read head (3 s) ─┬─ probe ─▶ 204
//!                                                     └─ page  ─▶ 200 (5 s)
//! ```
//!
//! The listener is non-blocking so the indicator and the sensor poll keep
//! running while nobody is connected.  Accepted streams are served one at
//! a time in blocking mode, each phase under a total deadline.  Anything
//! that goes wrong with a client ends that connection only.

pub mod listener;
pub mod page;
pub mod request;
pub mod response;

use std::io::{self, ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::time::{Duration, Instant};

use anyhow::Context;
use log::{debug, info, warn};

use crate::app::ports::StatusPort;
use crate::config::MonitorConfig;
use crate::drivers::watchdog::Watchdog;
use crate::error::ConnectionError;

// ───────────────────────────────────────────────────────────────
// Stream seam
// ───────────────────────────────────────────────────────────────

/// A byte stream whose blocking calls can be bounded.
pub trait TimedStream: Read + Write {
    fn set_read_budget(&mut self, budget: Duration) -> io::Result<()>;
    fn set_write_budget(&mut self, budget: Duration) -> io::Result<()>;
}

impl TimedStream for TcpStream {
    fn set_read_budget(&mut self, budget: Duration) -> io::Result<()> {
        self.set_read_timeout(Some(budget))
    }

    fn set_write_budget(&mut self, budget: Duration) -> io::Result<()> {
        self.set_write_timeout(Some(budget))
    }
}

/// Total time allowed for one phase of a connection.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    budget: Duration,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    /// Time left, or [`ConnectionError::Timeout`] once spent.
    pub fn remaining(&self) -> Result<Duration, ConnectionError> {
        let left = self.budget.saturating_sub(self.started.elapsed());
        if left.is_zero() {
            Err(ConnectionError::Timeout)
        } else {
            Ok(left)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionBudgets {
    pub header_read: Duration,
    pub response_write: Duration,
}

impl ConnectionBudgets {
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self {
            header_read: Duration::from_millis(u64::from(config.header_read_timeout_ms)),
            response_write: Duration::from_millis(u64::from(config.response_write_timeout_ms)),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Per-connection handler
// ───────────────────────────────────────────────────────────────

/// How a connection was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Served {
    /// Browser probe, 204 without touching the monitor.
    Probe,
    /// Status page, `bytes` written including the head.
    Page { bytes: usize },
}

/// Serve one request on `stream`.
///
/// Probe paths never reach `status`; every other path (including a
/// malformed request line) gets the rendered page.
pub fn handle_connection<T, S>(
    stream: &mut T,
    status: &mut S,
    budgets: ConnectionBudgets,
) -> Result<Served, ConnectionError>
where
    T: TimedStream,
    S: StatusPort,
{
    let head = request::read_head(stream, &Deadline::after(budgets.header_read))?;

    if request::is_probe(head.target().path) {
        response::write_no_content(stream, &Deadline::after(budgets.response_write))?;
        return Ok(Served::Probe);
    }

    let body = status.render_status_page();
    let bytes = response::write_page(stream, &body, &Deadline::after(budgets.response_write))?;
    Ok(Served::Page { bytes })
}

// ───────────────────────────────────────────────────────────────
// Server
// ───────────────────────────────────────────────────────────────

pub struct StatusServer {
    listener: TcpListener,
    budgets: ConnectionBudgets,
    accept_poll: Duration,
}

impl StatusServer {
    /// Bind `0.0.0.0:<listen_port>` with a backlog of
    /// [`listener::LISTEN_BACKLOG`].  Failure here is fatal to the caller.
    pub fn bind(config: &MonitorConfig) -> anyhow::Result<Self> {
        let listener = listener::bind(config.listen_port, listener::LISTEN_BACKLOG)
            .with_context(|| format!("binding status server to port {}", config.listen_port))?;
        Self::from_listener(listener, config)
    }

    /// Wrap an already bound listener.
    pub fn from_listener(listener: TcpListener, config: &MonitorConfig) -> anyhow::Result<Self> {
        listener
            .set_nonblocking(true)
            .context("switching listener to non-blocking")?;
        let server = Self {
            listener,
            budgets: ConnectionBudgets::from_config(config),
            accept_poll: Duration::from_millis(u64::from(config.accept_poll_interval_ms)),
        };
        info!("HTTP | listening on {}", server.local_addr()?);
        Ok(server)
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn budgets(&self) -> ConnectionBudgets {
        self.budgets
    }

    /// One loop iteration: refresh the monitor, then serve at most one
    /// client.  Returns `None` when nobody was waiting.
    pub fn serve_next<S: StatusPort>(
        &self,
        status: &mut S,
    ) -> Option<Result<Served, ConnectionError>> {
        status.refresh();

        match self.listener.accept() {
            Ok((mut stream, peer)) => Some(self.serve_stream(&mut stream, peer, status)),
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                std::thread::sleep(self.accept_poll);
                None
            }
            Err(e) => {
                // ECONNABORTED and friends: the listener itself is fine.
                warn!("HTTP | accept failed: {}", e);
                std::thread::sleep(self.accept_poll);
                None
            }
        }
    }

    fn serve_stream<S: StatusPort>(
        &self,
        stream: &mut TcpStream,
        peer: SocketAddr,
        status: &mut S,
    ) -> Result<Served, ConnectionError> {
        // Some stacks hand out accepted sockets with the listener's
        // O_NONBLOCK; the budgets rely on blocking calls with timeouts.
        stream.set_nonblocking(false)?;

        let result = handle_connection(stream, status, self.budgets);
        match &result {
            Ok(Served::Probe) => debug!("HTTP | {} probe -> 204", peer),
            Ok(Served::Page { bytes }) => debug!("HTTP | {} page -> 200 ({} bytes)", peer, bytes),
            Err(e) if e.is_benign() => debug!("HTTP | {} dropped: {}", peer, e),
            Err(e) => warn!("HTTP | {} aborted: {}", peer, e),
        }
        result
    }

    /// Serve forever, feeding the watchdog every iteration.
    pub fn run<S: StatusPort>(&self, status: &mut S, watchdog: &Watchdog) -> ! {
        loop {
            watchdog.feed();
            let _ = self.serve_next(status);
        }
    }
}
