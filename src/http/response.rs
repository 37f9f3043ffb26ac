//! Response writers.  Every write runs under the connection's write deadline.

use std::io::ErrorKind;

use crate::error::ConnectionError;

use super::{Deadline, TimedStream};

const NO_CONTENT: &[u8] = b"HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n";

/// `write_all` with one deadline across every partial write.
pub fn write_all_within<T: TimedStream>(
    stream: &mut T,
    mut bytes: &[u8],
    deadline: &Deadline,
) -> Result<(), ConnectionError> {
    while !bytes.is_empty() {
        stream.set_write_budget(deadline.remaining()?)?;
        match stream.write(bytes) {
            Ok(0) => return Err(ConnectionError::Io(ErrorKind::WriteZero)),
            Ok(n) => bytes = &bytes[n..],
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Answer a browser probe.  Returns bytes written.
pub fn write_no_content<T: TimedStream>(
    stream: &mut T,
    deadline: &Deadline,
) -> Result<usize, ConnectionError> {
    write_all_within(stream, NO_CONTENT, deadline)?;
    stream.flush()?;
    Ok(NO_CONTENT.len())
}

pub fn page_head(content_length: usize) -> String {
    format!(
        "HTTP/1.1 200 OK\r\n\
         Content-Type: text/html; charset=utf-8\r\n\
         Content-Length: {content_length}\r\n\
         Cache-Control: no-cache\r\n\
         Connection: close\r\n\r\n"
    )
}

/// Write a 200 with `body`.  Returns bytes written.
pub fn write_page<T: TimedStream>(
    stream: &mut T,
    body: &str,
    deadline: &Deadline,
) -> Result<usize, ConnectionError> {
    let head = page_head(body.len());
    write_all_within(stream, head.as_bytes(), deadline)?;
    write_all_within(stream, body.as_bytes(), deadline)?;
    stream.flush()?;
    Ok(head.len() + body.len())
}
