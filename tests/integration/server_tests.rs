//! Integration tests for the status server over real loopback sockets.
//!
//! Each test binds `127.0.0.1:0`, runs the server loop on a thread for a
//! fixed number of connections, and drives it with plain `TcpStream`
//! clients.  Budgets are shortened so timeouts fire in milliseconds.

use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use dryermon::app::ports::StatusPort;
use dryermon::app::service::MonitorService;
use dryermon::config::MonitorConfig;
use dryermon::error::ConnectionError;
use dryermon::http::{Served, StatusServer};
use dryermon::sensors::EdgeMode;

use super::mock_hw::{CountingStatus, FakeClock, MockLedPin, MockSensorPin, RecordingSink, leak_monitor};

type Outcome = Result<Served, ConnectionError>;

fn test_config() -> MonitorConfig {
    MonitorConfig {
        header_read_timeout_ms: 300,
        response_write_timeout_ms: 1_000,
        accept_poll_interval_ms: 5,
        ..MonitorConfig::default()
    }
}

/// Run the server until it has handled `connections` clients (or 10 s
/// pass), then hand back the status port and every outcome in order.
fn spawn_server<S>(status: S, connections: usize) -> (SocketAddr, JoinHandle<(S, Vec<Outcome>)>)
where
    S: StatusPort + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let server = StatusServer::from_listener(listener, &test_config()).unwrap();
    let addr = server.local_addr().unwrap();

    let handle = thread::spawn(move || {
        let mut status = status;
        let mut outcomes = Vec::new();
        let give_up = Instant::now() + Duration::from_secs(10);
        while outcomes.len() < connections && Instant::now() < give_up {
            if let Some(outcome) = server.serve_next(&mut status) {
                outcomes.push(outcome);
            }
        }
        (status, outcomes)
    });
    (addr, handle)
}

fn client(addr: SocketAddr) -> TcpStream {
    let stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    stream
}

fn exchange(addr: SocketAddr, request: &[u8]) -> String {
    let mut stream = client(addr);
    stream.write_all(request).unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).unwrap();
    response
}

fn header<'a>(response: &'a str, name: &str) -> Option<&'a str> {
    let head = response.split("\r\n\r\n").next()?;
    head.lines()
        .filter_map(|l| l.split_once(": "))
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v)
}

// ── Render path ───────────────────────────────────────────────

#[test]
fn root_request_gets_page_with_length_and_close() {
    let (addr, server) = spawn_server(CountingStatus::default(), 1);

    let response = exchange(addr, b"GET / HTTP/1.1\r\nHost: dryer\r\nAccept: text/html\r\n\r\n");
    let (status, outcomes) = server.join().unwrap();

    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"), "{response}");
    assert_eq!(header(&response, "Connection"), Some("close"));
    assert!(header(&response, "Content-Type").unwrap().starts_with("text/html"));
    let body = response.split("\r\n\r\n").nth(1).unwrap();
    assert_eq!(header(&response, "Content-Length"), Some(body.len().to_string().as_str()));
    assert_eq!(body, "<p>render #1</p>");

    assert_eq!(status.renders, 1);
    assert!(matches!(outcomes[..], [Ok(Served::Page { .. })]));
}

#[test]
fn malformed_request_line_is_served_as_root() {
    let (addr, server) = spawn_server(CountingStatus::default(), 1);

    let response = exchange(addr, b"complete nonsense here ok\r\n\r\n");
    let (status, _) = server.join().unwrap();

    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert_eq!(status.renders, 1);
}

#[test]
fn any_non_probe_path_renders() {
    let (addr, server) = spawn_server(CountingStatus::default(), 1);
    let response = exchange(addr, b"GET /status?x=1 HTTP/1.0\r\n\r\n");
    let (status, _) = server.join().unwrap();
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert_eq!(status.renders, 1);
}

#[test]
fn overlong_request_line_still_gets_the_page() {
    let (addr, server) = spawn_server(CountingStatus::default(), 1);

    let request = format!("GET /?utm={} HTTP/1.1\r\nHost: dryer\r\n\r\n", "a".repeat(600));
    let response = exchange(addr, request.as_bytes());
    let (status, outcomes) = server.join().unwrap();

    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"), "{response}");
    assert_eq!(status.renders, 1);
    assert!(matches!(outcomes[..], [Ok(Served::Page { .. })]));
}

// ── Probe fast path ───────────────────────────────────────────

#[test]
fn favicon_gets_204_without_rendering() {
    let (addr, server) = spawn_server(CountingStatus::default(), 3);

    let favicon = exchange(addr, b"GET /favicon.ico HTTP/1.1\r\nHost: dryer\r\n\r\n");
    let touch = exchange(addr, b"GET /apple-touch-icon-precomposed.png HTTP/1.1\r\n\r\n");
    let sized = exchange(addr, b"GET /favicon-32x32.png HTTP/1.1\r\n\r\n");
    let (status, outcomes) = server.join().unwrap();

    for response in [&favicon, &touch, &sized] {
        assert!(response.starts_with("HTTP/1.1 204 No Content\r\n"), "{response}");
        assert!(response.ends_with("\r\n\r\n"), "204 carries no body");
    }
    assert_eq!(status.renders, 0);
    assert_eq!(outcomes, vec![Ok(Served::Probe); 3]);
}

// ── Connection isolation ──────────────────────────────────────

#[test]
fn stalled_client_times_out_and_next_client_is_served() {
    let (addr, server) = spawn_server(CountingStatus::default(), 2);

    // Request line and a header, but never the blank line.
    let mut stalled = client(addr);
    stalled.write_all(b"GET / HTTP/1.1\r\nHost: dryer\r\n").unwrap();
    thread::sleep(Duration::from_millis(50));

    let response = exchange(addr, b"GET / HTTP/1.1\r\n\r\n");

    let mut leftover = Vec::new();
    let _ = stalled.read_to_end(&mut leftover);
    let (status, outcomes) = server.join().unwrap();

    assert!(leftover.is_empty(), "stalled client must get no response");
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert_eq!(outcomes[0], Err(ConnectionError::Timeout));
    assert!(matches!(outcomes[1], Ok(Served::Page { .. })));
    assert_eq!(status.renders, 1);
}

#[test]
fn trickling_client_is_cut_off_by_total_budget() {
    let (addr, server) = spawn_server(CountingStatus::default(), 1);

    let mut slow = client(addr);
    let started = Instant::now();
    for byte in b"GET / HTTP/1.1\r\nX-Slow: aaaaaaaaaaaaaaaa" {
        // Each byte lands well inside any per-read timeout.
        if slow.write_all(&[*byte]).is_err() {
            break;
        }
        thread::sleep(Duration::from_millis(30));
        if started.elapsed() > Duration::from_secs(2) {
            break;
        }
    }
    let (_, outcomes) = server.join().unwrap();

    assert_eq!(outcomes, vec![Err(ConnectionError::Timeout)]);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
fn client_closing_early_is_a_short_read() {
    let (addr, server) = spawn_server(CountingStatus::default(), 2);

    let early = client(addr);
    early.shutdown(Shutdown::Write).unwrap();
    drop(early);
    let response = exchange(addr, b"GET / HTTP/1.1\r\n\r\n");
    let (_, outcomes) = server.join().unwrap();

    assert_eq!(outcomes[0], Err(ConnectionError::ShortRead));
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
}

// ── Loop behaviour ────────────────────────────────────────────

#[test]
fn refreshes_while_no_client_connects() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let server = StatusServer::from_listener(listener, &test_config()).unwrap();
    let mut status = CountingStatus::default();

    for _ in 0..3 {
        assert!(server.serve_next(&mut status).is_none());
    }
    assert_eq!(status.refreshes, 3);
    assert_eq!(status.renders, 0);
}

#[test]
fn page_reflects_live_sensor_state() {
    let config = test_config();
    let clock = FakeClock::at(500_000);
    let sensor = MockSensorPin::new();
    let monitor = leak_monitor(&config, 500_000);
    let mut service = MonitorService::new(
        &config,
        monitor,
        sensor.clone(),
        MockLedPin::new(),
        clock.clone(),
        RecordingSink::default(),
        EdgeMode::PollingOnly,
    );
    service.start();

    sensor.set_high(true);
    let (addr, server) = spawn_server(service, 1);
    let response = exchange(addr, b"GET / HTTP/1.1\r\n\r\n");
    let (service, _) = server.join().unwrap();

    assert!(response.contains(">RUNNING<"));
    assert!(response.contains("LED: ON"));
    assert!(service.indicator_lit());
}
