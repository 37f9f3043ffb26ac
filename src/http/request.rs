//! Request head reader.
//!
//! Reads line by line until the blank line that ends the headers (or EOF),
//! keeping only the request line.  Header fields are scanned for the
//! terminator and dropped.  The whole phase runs under one deadline.

use std::io::ErrorKind;

use crate::error::ConnectionError;

use super::{Deadline, TimedStream};

/// Request line bytes kept.  Anything past this is read and discarded.
pub const MAX_REQUEST_LINE: usize = 512;

/// Upper bound on the whole head (request line plus headers).
pub const MAX_HEAD_BYTES: usize = 8 * 1024;

/// Paths browsers fetch on their own.  Answered with 204, no rendering.
const PROBE_CONTAINS: &[&str] = &["favicon"];
const PROBE_PREFIX: &[&str] = &["/apple-touch-icon"];

pub fn is_probe(path: &str) -> bool {
    PROBE_CONTAINS.iter().any(|p| path.contains(p))
        || PROBE_PREFIX.iter().any(|p| path.starts_with(p))
}

// ---------------------------------------------------------------------------
// Request line
// ---------------------------------------------------------------------------

/// The raw first line of a request, CRLF stripped.
#[derive(Debug, Default, Clone)]
pub struct RequestLine {
    raw: heapless::Vec<u8, MAX_REQUEST_LINE>,
}

/// Method and path of a request.  A malformed line parses as `GET /`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target<'a> {
    pub method: &'a str,
    pub path: &'a str,
}

impl Target<'static> {
    pub const FALLBACK: Target<'static> = Target {
        method: "GET",
        path: "/",
    };
}

impl RequestLine {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConnectionError> {
        let raw = heapless::Vec::from_slice(bytes).map_err(|_| ConnectionError::HeadTooLarge)?;
        Ok(Self { raw })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// `METHOD SP path [SP HTTP/x.y]`.  The query string is dropped from
    /// the path.
    pub fn target(&self) -> Target<'_> {
        let Ok(line) = core::str::from_utf8(&self.raw) else {
            return Target::FALLBACK;
        };
        let mut parts = line.split_ascii_whitespace();
        let (Some(method), Some(uri)) = (parts.next(), parts.next()) else {
            return Target::FALLBACK;
        };
        let version_ok = match parts.next() {
            None => true,
            Some(v) => v.starts_with("HTTP/"),
        };
        if !version_ok
            || parts.next().is_some()
            || !method.bytes().all(|b| b.is_ascii_uppercase())
            || !uri.starts_with('/')
        {
            return Target::FALLBACK;
        }
        let path = uri.split_once('?').map_or(uri, |(p, _)| p);
        Target { method, path }
    }
}

// ---------------------------------------------------------------------------
// Head reader
// ---------------------------------------------------------------------------

/// Read the request head within `deadline`.
///
/// Leading empty lines are skipped.  A request line longer than
/// [`MAX_REQUEST_LINE`] is truncated, not rejected.  EOF after the request
/// line is accepted as the end of the head; EOF before any byte of it is a
/// [`ConnectionError::ShortRead`].
pub fn read_head<T: TimedStream>(
    stream: &mut T,
    deadline: &Deadline,
) -> Result<RequestLine, ConnectionError> {
    let mut line: heapless::Vec<u8, MAX_REQUEST_LINE> = heapless::Vec::new();
    let mut have_request_line = false;
    let mut header_len = 0usize;
    let mut truncated = 0usize;
    let mut total = 0usize;
    let mut chunk = [0u8; 256];

    loop {
        stream.set_read_budget(deadline.remaining()?)?;
        let n = match stream.read(&mut chunk) {
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        if n == 0 {
            if have_request_line || !line.is_empty() {
                return Ok(RequestLine { raw: line });
            }
            return Err(ConnectionError::ShortRead);
        }
        total += n;
        if total > MAX_HEAD_BYTES {
            return Err(ConnectionError::HeadTooLarge);
        }

        for &byte in &chunk[..n] {
            if !have_request_line {
                if byte == b'\n' {
                    if line.last() == Some(&b'\r') {
                        line.pop();
                    }
                    have_request_line = !line.is_empty();
                    if truncated > 0 {
                        log::debug!("HTTP | request line cut to {} bytes ({} dropped)", line.len(), truncated);
                    }
                } else if line.push(byte).is_err() {
                    truncated += 1;
                }
                continue;
            }
            match byte {
                b'\n' if header_len == 0 => return Ok(RequestLine { raw: line }),
                b'\n' => header_len = 0,
                b'\r' => {}
                _ => header_len += 1,
            }
        }
    }
}
