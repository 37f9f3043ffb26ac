//! Dryer monitor firmware entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │  GpioInput/GpioOutput   Esp32Clock   LogEventSink   WifiLink │
//! │                                                              │
//! │  ─────────────────── Port Trait Boundary ──────────────────  │
//! │                                                              │
//! │  ┌──────────────────────────────────────────────────────┐    │
//! │  │      MonitorService (SensorMonitor · RunState)       │    │
//! │  └──────────────────────────────────────────────────────┘    │
//! │                                                              │
//! │  GPIO ISR ─▶ &'static SensorMonitor ◀─ StatusServer loop     │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use anyhow::{Context, Result};
use log::{info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;

use dryermon::adapters::log_sink::LogEventSink;
use dryermon::adapters::time::Esp32Clock;
use dryermon::adapters::wifi::{WifiCredentials, WifiLink, hostname_from_build_env};
use dryermon::app::ports::Clock;
use dryermon::app::service::MonitorService;
use dryermon::config::MonitorConfig;
use dryermon::drivers::gpio::{GpioInput, GpioOutput};
use dryermon::drivers::hw_init;
use dryermon::drivers::watchdog::Watchdog;
use dryermon::http::StatusServer;
use dryermon::sensors::{EdgeMode, SensorMonitor};

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  dryermon v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = MonitorConfig::from_build_env().context("invalid monitor configuration")?;
    info!(
        "Config: sensor GPIO{} ({:?}), LED GPIO{} ({:?}), debounce {}ms, timeout {}ms",
        config.sensor_gpio,
        config.sensor_polarity,
        config.indicator_gpio,
        config.indicator_polarity,
        config.debounce_ms,
        config.run_timeout_ms
    );

    // ── 3. GPIO ───────────────────────────────────────────────
    hw_init::init_peripherals(&config).context("GPIO init failed")?;

    // ── 4. Network ────────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sys_loop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let credentials = WifiCredentials::from_build_env()
        .inspect_err(|e| warn!("WiFi credentials unusable: {}", e))
        .ok();
    let hostname = hostname_from_build_env().context("invalid DRYERMON_HOSTNAME")?;
    let link = WifiLink::start(peripherals.modem, sys_loop, nvs, credentials.as_ref(), &hostname)?;
    info!("Network: {} at {}", link.mode(), link.address());

    // ── 5. Sensor monitor, shared with the ISR ────────────────
    let clock = Esp32Clock::new();
    let monitor: &'static SensorMonitor =
        Box::leak(Box::new(SensorMonitor::new(&config, clock.now_ms())));

    let edge_mode = match hw_init::init_isr_service(config.sensor_gpio, monitor) {
        Ok(()) => EdgeMode::InterruptAndPoll,
        Err(e) => {
            warn!("Sensor ISR unavailable ({}), continuing on polling", e);
            EdgeMode::PollingOnly
        }
    };

    // ── 6. Application service ────────────────────────────────
    let mut service = MonitorService::new(
        &config,
        monitor,
        GpioInput::new(config.sensor_gpio),
        GpioOutput::new(config.indicator_gpio),
        clock,
        LogEventSink::new(),
        edge_mode,
    );
    service.start();

    // ── 7. Serve forever ──────────────────────────────────────
    let server = StatusServer::bind(&config)?;
    let watchdog = Watchdog::for_config(&config);
    server.run(&mut service, &watchdog)
}
