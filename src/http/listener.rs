//! Listening socket for the status server.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: raw lwIP `socket` / `bind` / `listen` so the
//!   backlog is ours, then handed to `std` as a `TcpListener`.
//! - **all other targets**: `TcpListener::bind`, which listens with the
//!   platform's default backlog.

use std::io;
use std::net::TcpListener;

/// Connections the stack queues while one is being served.
pub const LISTEN_BACKLOG: i32 = 2;

/// Bind `0.0.0.0:port` and listen with `backlog` pending connections.
#[cfg(target_os = "espidf")]
pub fn bind(port: u16, backlog: i32) -> io::Result<TcpListener> {
    use std::os::fd::FromRawFd;

    use esp_idf_svc::sys::{
        AF_INET, SOCK_STREAM, in_addr, lwip_bind, lwip_close, lwip_htons, lwip_listen,
        lwip_socket, sockaddr_in,
    };

    // SAFETY: lwIP socket call with valid domain/type/protocol.
    let fd = unsafe { lwip_socket(AF_INET as _, SOCK_STREAM as _, 0) };
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }

    let close_with = |err: io::Error| {
        // SAFETY: `fd` is open and not yet owned by a TcpListener.
        unsafe {
            lwip_close(fd);
        }
        err
    };

    let addr = sockaddr_in {
        sin_len: 0,
        sin_family: AF_INET as _,
        // SAFETY: pure byte-order conversion.
        sin_port: unsafe { lwip_htons(port) },
        sin_addr: in_addr { s_addr: 0 },
        sin_zero: [0u8; 8],
    };
    // SAFETY: `addr` outlives the call and the length matches its type.
    let rc = unsafe {
        lwip_bind(
            fd,
            core::ptr::addr_of!(addr).cast(),
            core::mem::size_of::<sockaddr_in>() as _,
        )
    };
    if rc < 0 {
        return Err(close_with(io::Error::last_os_error()));
    }

    // SAFETY: `fd` is a bound stream socket.
    let rc = unsafe { lwip_listen(fd, backlog) };
    if rc < 0 {
        return Err(close_with(io::Error::last_os_error()));
    }

    // SAFETY: `fd` is an open listening socket; the TcpListener becomes its
    // only owner and closes it on drop.
    Ok(unsafe { TcpListener::from_raw_fd(fd) })
}

#[cfg(not(target_os = "espidf"))]
pub fn bind(port: u16, backlog: i32) -> io::Result<TcpListener> {
    log::debug!("HTTP(sim) | backlog {} left to the host stack", backlog);
    TcpListener::bind(("0.0.0.0", port))
}
