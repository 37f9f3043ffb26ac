//! One-shot hardware peripheral initialization.
//!
//! Configures the sensor input, the indicator output, and the sensor's
//! any-edge interrupt using raw ESP-IDF sys calls.  Called once from
//! `main()` before the server loop starts.
//!
//! On non-espidf targets pin levels live in a simulation bitmask so host
//! tests can drive the sensor and observe the LED.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU64, Ordering};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

use crate::config::MonitorConfig;
use crate::sensors::SensorMonitor;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
    IntrTypeFailed(i32),
    IsrHandlerAddFailed(i32),
    IntrEnableFailed(i32),
    /// The target has no GPIO interrupt controller (host simulation).
    IsrUnsupported,
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc)    => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc)    => write!(f, "GPIO ISR service install failed (rc={})", rc),
            Self::IntrTypeFailed(rc)      => write!(f, "GPIO interrupt type set failed (rc={})", rc),
            Self::IsrHandlerAddFailed(rc) => write!(f, "GPIO ISR handler add failed (rc={})", rc),
            Self::IntrEnableFailed(rc)    => write!(f, "GPIO interrupt enable failed (rc={})", rc),
            Self::IsrUnsupported          => write!(f, "GPIO interrupts not available on this target"),
        }
    }
}

impl std::error::Error for HwInitError {}

// ── Peripherals ───────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn init_peripherals(config: &MonitorConfig) -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the server loop; single-threaded.
    unsafe {
        init_sensor_input(config.sensor_gpio)?;
        init_indicator_output(config.indicator_gpio)?;
    }
    gpio_write(config.indicator_gpio, config.indicator_polarity.level_for(false));
    info!("hw_init: sensor=GPIO{} indicator=GPIO{}", config.sensor_gpio, config.indicator_gpio);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals(config: &MonitorConfig) -> Result<(), HwInitError> {
    gpio_write(config.indicator_gpio, config.indicator_polarity.level_for(false));
    log::info!(
        "hw_init(sim): sensor=GPIO{} indicator=GPIO{}",
        config.sensor_gpio,
        config.indicator_gpio
    );
    Ok(())
}

// ── GPIO Input ────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_sensor_input(pin: i32) -> Result<(), HwInitError> {
    // SW-420 boards drive D0 from an LM393 comparator with an on-board
    // pull-up; no internal pulls.
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pin,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: gpio_get_level is a read-only register access on an
    // already-configured input pin; safe from main and ISR context.
    (unsafe { gpio_get_level(pin) }) != 0
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(pin: i32) -> bool {
    SIM_LEVELS.load(Ordering::Acquire) & sim_bit(pin) != 0
}

// ── GPIO Output ───────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_indicator_output(pin: i32) -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pin,
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: gpio_set_level writes to an already-configured output pin;
    // main-loop only.
    unsafe { gpio_set_level(pin, u32::from(high)); }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(pin: i32, high: bool) {
    sim_set_level(pin, high);
}

// ── Simulation pin levels ─────────────────────────────────────

/// Bit `n` holds the level of GPIO `n` on host builds.
#[cfg(not(target_os = "espidf"))]
static SIM_LEVELS: AtomicU64 = AtomicU64::new(0);

#[cfg(not(target_os = "espidf"))]
fn sim_bit(pin: i32) -> u64 {
    debug_assert!((0..64).contains(&pin), "sim GPIO out of range: {pin}");
    1u64 << (pin & 63)
}

/// Force the simulated level of `pin` (host builds only).
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_level(pin: i32, high: bool) {
    if high {
        SIM_LEVELS.fetch_or(sim_bit(pin), Ordering::AcqRel);
    } else {
        SIM_LEVELS.fetch_and(!sim_bit(pin), Ordering::AcqRel);
    }
}

/// Simulated level of `pin` (host builds only).
#[cfg(not(target_os = "espidf"))]
pub fn sim_level(pin: i32) -> bool {
    gpio_read(pin)
}

// ── GPIO ISR Service ──────────────────────────────────────────

/// Argument handed to the sensor ISR.  Leaked once at install time.
#[cfg(target_os = "espidf")]
struct EdgeBinding {
    gpio: i32,
    monitor: &'static SensorMonitor,
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn sensor_gpio_isr(arg: *mut core::ffi::c_void) {
    // SAFETY: `arg` is the leaked `&'static EdgeBinding` registered in
    // init_isr_service(); it is never freed or mutated.
    let binding = unsafe { &*(arg as *const EdgeBinding) };
    // SAFETY: gpio_get_level is a register read and esp_timer_get_time an
    // RTC counter read; both are safe in ISR context.
    let level_high = unsafe { gpio_get_level(binding.gpio) } != 0;
    let now_ms = (unsafe { esp_timer_get_time() } / 1_000) as u32;
    binding.monitor.on_edge(level_high, now_ms);
}

/// Install the GPIO ISR service and register the sensor edge handler.
///
/// Failure is not fatal: the caller falls back to polling only.
#[cfg(target_os = "espidf")]
pub fn init_isr_service(gpio: i32, monitor: &'static SensorMonitor) -> Result<(), HwInitError> {
    let binding: &'static EdgeBinding = Box::leak(Box::new(EdgeBinding { gpio, monitor }));

    // SAFETY: gpio_install_isr_service is idempotent; ESP_ERR_INVALID_STATE
    // means it was already installed (acceptable).  The handler only does a
    // debounce CAS and one atomic store on the 'static monitor.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        // Vibration switch: both edges; polarity is applied in the handler.
        let ret = gpio_set_intr_type(gpio, gpio_int_type_t_GPIO_INTR_ANYEDGE);
        if ret != ESP_OK as i32 {
            return Err(HwInitError::IntrTypeFailed(ret));
        }
        let ret = gpio_isr_handler_add(
            gpio,
            Some(sensor_gpio_isr),
            binding as *const EdgeBinding as *mut core::ffi::c_void,
        );
        if ret != ESP_OK as i32 {
            return Err(HwInitError::IsrHandlerAddFailed(ret));
        }
        let ret = gpio_intr_enable(gpio);
        if ret != ESP_OK as i32 {
            let _ = gpio_isr_handler_remove(gpio);
            return Err(HwInitError::IntrEnableFailed(ret));
        }

        info!("hw_init: ISR service installed (sensor GPIO{}, any edge)", gpio);
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service(_gpio: i32, _monitor: &'static SensorMonitor) -> Result<(), HwInitError> {
    Err(HwInitError::IsrUnsupported)
}
