//! Task watchdog (TWDT) for the server loop.
//!
//! One loop iteration is bounded by the header read budget, the response
//! write budget and the accept poll sleep.  The TWDT timeout is derived from
//! that bound, so a slow client cannot trip it but a wedged loop still
//! resets the chip.

use core::cell::Cell;

use log::{info, warn};

use crate::config::MonitorConfig;

/// The TWDT never fires sooner than this.
pub const MIN_TIMEOUT_MS: u32 = 10_000;

/// Headroom on top of the worst-case loop iteration.
pub const MARGIN_MS: u32 = 2_000;

/// TWDT timeout for the loop described by `config`.
pub fn timeout_ms_for(config: &MonitorConfig) -> u32 {
    config
        .worst_case_iteration_ms()
        .saturating_add(MARGIN_MS)
        .max(MIN_TIMEOUT_MS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subscription {
    /// The loop task is registered with the TWDT.
    Active,
    /// `esp_task_wdt_add` returned this code; feeds do nothing.
    Refused(i32),
    /// Host build, no TWDT.
    Simulated,
}

pub struct Watchdog {
    timeout_ms: u32,
    subscription: Subscription,
    feeds: Cell<u32>,
    skipped: Cell<u32>,
}

impl Watchdog {
    /// Configure the TWDT for `config` and subscribe the calling task.
    pub fn for_config(config: &MonitorConfig) -> Self {
        let timeout_ms = timeout_ms_for(config);
        let subscription = subscribe(timeout_ms);
        match subscription {
            Subscription::Active => {
                info!("Watchdog: subscribed ({}ms timeout, panic on trigger)", timeout_ms);
            }
            Subscription::Refused(rc) => warn!("Watchdog: subscribe failed ({}), loop unsupervised", rc),
            Subscription::Simulated => info!("Watchdog(sim): {}ms timeout, not enforced", timeout_ms),
        }
        Self {
            timeout_ms,
            subscription,
            feeds: Cell::new(0),
            skipped: Cell::new(0),
        }
    }

    /// Called once per loop iteration.
    pub fn feed(&self) {
        self.feeds.set(self.feeds.get().wrapping_add(1));
        match self.subscription {
            Subscription::Active => reset(),
            Subscription::Refused(rc) => {
                if self.skipped.get() == 0 {
                    warn!("Watchdog: feed skipped, not subscribed ({})", rc);
                }
                self.skipped.set(self.skipped.get().wrapping_add(1));
            }
            Subscription::Simulated => {}
        }
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    pub fn subscription(&self) -> Subscription {
        self.subscription
    }

    pub fn feeds(&self) -> u32 {
        self.feeds.get()
    }

    /// Feeds that reached no TWDT because the subscription was refused.
    pub fn skipped_feeds(&self) -> u32 {
        self.skipped.get()
    }
}

#[cfg(target_os = "espidf")]
fn subscribe(timeout_ms: u32) -> Subscription {
    use esp_idf_sys::{ESP_OK, esp_task_wdt_add, esp_task_wdt_config_t, esp_task_wdt_reconfigure};

    let cfg = esp_task_wdt_config_t {
        timeout_ms,
        idle_core_mask: 0,
        trigger_panic: true,
    };
    // SAFETY: plain TWDT configuration calls from the loop task; `cfg`
    // outlives the call.
    unsafe {
        let rc = esp_task_wdt_reconfigure(&cfg);
        if rc != ESP_OK as i32 {
            warn!("Watchdog: reconfigure returned {}, keeping the boot timeout", rc);
        }
        match esp_task_wdt_add(core::ptr::null_mut()) {
            rc if rc == ESP_OK as i32 => Subscription::Active,
            rc => Subscription::Refused(rc),
        }
    }
}

#[cfg(not(target_os = "espidf"))]
fn subscribe(_timeout_ms: u32) -> Subscription {
    Subscription::Simulated
}

#[cfg(target_os = "espidf")]
fn reset() {
    // SAFETY: only reached for a task that esp_task_wdt_add accepted.
    unsafe {
        esp_idf_sys::esp_task_wdt_reset();
    }
}

#[cfg(not(target_os = "espidf"))]
fn reset() {}
