//! Per-connection error type for the status server.
//!
//! Every failure while serving one client lands in [`ConnectionError`]. The
//! server logs it and closes that connection; nothing here ever reaches the
//! accept loop.  All variants are `Copy` so they can be logged and counted
//! without allocation.

use core::fmt;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionError {
    /// The read or write budget for this connection ran out.
    Timeout,
    /// The peer closed the stream before sending a request line.
    ShortRead,
    /// The request line or header block exceeded its fixed buffer.
    HeadTooLarge,
    /// Any other socket error.
    Io(io::ErrorKind),
}

impl ConnectionError {
    /// Expected churn from browsers (speculative connects, closed tabs).
    pub fn is_benign(self) -> bool {
        matches!(self, Self::Timeout | Self::ShortRead)
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timed out"),
            Self::ShortRead => write!(f, "peer closed before request line"),
            Self::HeadTooLarge => write!(f, "request head too large"),
            Self::Io(kind) => write!(f, "I/O error: {kind}"),
        }
    }
}

impl std::error::Error for ConnectionError {}

impl From<io::Error> for ConnectionError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            // lwIP and most hosts report an expired SO_RCVTIMEO/SO_SNDTIMEO
            // as EAGAIN; Windows uses TimedOut.
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Self::Timeout,
            io::ErrorKind::UnexpectedEof => Self::ShortRead,
            kind => Self::Io(kind),
        }
    }
}
