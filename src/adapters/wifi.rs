//! WiFi bootstrap.
//!
//! Brings the network up before the status server binds.  Credentials are
//! baked in at build time from `DRYERMON_WIFI_SSID` / `DRYERMON_WIFI_PASS`.
//! Without usable credentials, or when the station never associates, the
//! device opens the `DryerSetup` access point instead so the page is still
//! reachable at 192.168.4.1.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::wifi::BlockingWifi` STA
//!   connect with a fixed number of attempts, then AP fallback.
//! - **all other targets**: credential and hostname validation only; the
//!   host already has a network.

use core::fmt;

#[cfg(target_os = "espidf")]
use log::{info, warn};

/// Open access point raised when the station link cannot come up.
pub const FALLBACK_AP_SSID: &str = "DryerSetup";

/// DHCP hostname used when `DRYERMON_HOSTNAME` is not set.
pub const DEFAULT_HOSTNAME: &str = "dryermon";

// ───────────────────────────────────────────────────────────────
// Errors
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    InvalidHostname,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials (set DRYERMON_WIFI_SSID at build time)"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
            Self::InvalidHostname => write!(f, "hostname invalid (1-32 letters, digits or '-', not at either end)"),
        }
    }
}

impl std::error::Error for ConnectivityError {}

// ───────────────────────────────────────────────────────────────
// Credentials
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiCredentials {
    ssid: heapless::String<32>,
    password: heapless::String<64>,
}

impl WifiCredentials {
    pub fn new(ssid: &str, password: &str) -> Result<Self, ConnectivityError> {
        if ssid.is_empty() || !is_printable_ascii(ssid) {
            return Err(ConnectivityError::InvalidSsid);
        }
        if !password.is_empty() && password.len() < 8 {
            return Err(ConnectivityError::InvalidPassword);
        }
        Ok(Self {
            ssid: ssid.try_into().map_err(|_| ConnectivityError::InvalidSsid)?,
            password: password
                .try_into()
                .map_err(|_| ConnectivityError::InvalidPassword)?,
        })
    }

    /// Credentials compiled into the firmware image.
    pub fn from_build_env() -> Result<Self, ConnectivityError> {
        let ssid = option_env!("DRYERMON_WIFI_SSID").ok_or(ConnectivityError::NoCredentials)?;
        Self::new(ssid, option_env!("DRYERMON_WIFI_PASS").unwrap_or(""))
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }
}

// ───────────────────────────────────────────────────────────────
// Hostname
// ───────────────────────────────────────────────────────────────

/// A single RFC 1123 label, sized for `esp_netif_set_hostname`.
pub fn validate_hostname(name: &str) -> Result<heapless::String<32>, ConnectivityError> {
    let well_formed = !name.is_empty()
        && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
        && !name.starts_with('-')
        && !name.ends_with('-');
    if !well_formed {
        return Err(ConnectivityError::InvalidHostname);
    }
    name.try_into().map_err(|_| ConnectivityError::InvalidHostname)
}

/// Hostname compiled into the firmware image, or [`DEFAULT_HOSTNAME`].
pub fn hostname_from_build_env() -> Result<heapless::String<32>, ConnectivityError> {
    validate_hostname(option_env!("DRYERMON_HOSTNAME").unwrap_or(DEFAULT_HOSTNAME))
}

/// Which interface ended up carrying the status page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMode {
    Station,
    /// Open [`FALLBACK_AP_SSID`] network.
    AccessPoint,
}

impl fmt::Display for LinkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Station => write!(f, "station"),
            Self::AccessPoint => write!(f, "access point '{}'", FALLBACK_AP_SSID),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Link (ESP-IDF)
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
const CONNECT_ATTEMPTS: u32 = 5;
#[cfg(target_os = "espidf")]
const RETRY_DELAY_MS: u64 = 2_000;

#[cfg(target_os = "espidf")]
type Driver = esp_idf_svc::wifi::BlockingWifi<esp_idf_svc::wifi::EspWifi<'static>>;

/// Owns the WiFi driver; dropping it tears the link down.
#[cfg(target_os = "espidf")]
pub struct WifiLink {
    _wifi: Driver,
    mode: LinkMode,
    address: esp_idf_svc::ipv4::Ipv4Addr,
}

#[cfg(target_os = "espidf")]
impl WifiLink {
    /// Join the configured network, or raise the fallback AP.
    ///
    /// Only driver-level failures are errors; missing credentials and a
    /// station that never associates both end in [`LinkMode::AccessPoint`].
    pub fn start(
        modem: esp_idf_svc::hal::modem::Modem,
        sys_loop: esp_idf_svc::eventloop::EspSystemEventLoop,
        nvs: esp_idf_svc::nvs::EspDefaultNvsPartition,
        credentials: Option<&WifiCredentials>,
        hostname: &str,
    ) -> anyhow::Result<Self> {
        use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

        let mut esp_wifi = EspWifi::new(modem, sys_loop.clone(), Some(nvs))?;
        esp_wifi.sta_netif_mut().set_hostname(hostname)?;
        let mut wifi = BlockingWifi::wrap(esp_wifi, sys_loop)?;

        if let Some(credentials) = credentials {
            match join_station(&mut wifi, credentials) {
                Ok(()) => {
                    let address = wifi.wifi().sta_netif().get_ip_info()?.ip;
                    info!("WiFi: connected as '{}', http://{}/", hostname, address);
                    return Ok(Self { _wifi: wifi, mode: LinkMode::Station, address });
                }
                Err(err) => warn!("WiFi: {}", err),
            }
            let _ = wifi.disconnect();
            let _ = wifi.stop();
        } else {
            warn!("WiFi: {}", ConnectivityError::NoCredentials);
        }

        raise_access_point(&mut wifi)?;
        let address = wifi.wifi().ap_netif().get_ip_info()?.ip;
        info!("WiFi: started AP '{}', browse http://{}/", FALLBACK_AP_SSID, address);
        Ok(Self { _wifi: wifi, mode: LinkMode::AccessPoint, address })
    }

    pub fn mode(&self) -> LinkMode {
        self.mode
    }

    /// Address the status page is served on.
    pub fn address(&self) -> esp_idf_svc::ipv4::Ipv4Addr {
        self.address
    }
}

#[cfg(target_os = "espidf")]
fn join_station(wifi: &mut Driver, credentials: &WifiCredentials) -> anyhow::Result<()> {
    use anyhow::anyhow;
    use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};

    let auth_method = if credentials.is_open() {
        AuthMethod::None
    } else {
        AuthMethod::WPAWPA2Personal
    };
    wifi.set_configuration(&Configuration::Client(ClientConfiguration {
        ssid: credentials
            .ssid()
            .try_into()
            .map_err(|_| anyhow!("wifi ssid too long"))?,
        password: credentials
            .password()
            .try_into()
            .map_err(|_| anyhow!("wifi password too long"))?,
        auth_method,
        ..Default::default()
    }))?;

    wifi.start()?;
    info!("WiFi: started, connecting to '{}'", credentials.ssid());

    let mut last_err = None;
    for attempt in 1..=CONNECT_ATTEMPTS {
        match wifi.connect().and_then(|()| wifi.wait_netif_up()) {
            Ok(()) => return Ok(()),
            Err(err) => {
                warn!("WiFi: attempt {}/{} failed: {}", attempt, CONNECT_ATTEMPTS, err);
                last_err = Some(err);
            }
        }
        if attempt < CONNECT_ATTEMPTS {
            let _ = wifi.disconnect();
            std::thread::sleep(std::time::Duration::from_millis(RETRY_DELAY_MS));
        }
    }
    Err(match last_err {
        Some(err) => anyhow!("all {} attempts failed: {}", CONNECT_ATTEMPTS, err),
        None => anyhow!("no connect attempts made"),
    })
}

#[cfg(target_os = "espidf")]
fn raise_access_point(wifi: &mut Driver) -> anyhow::Result<()> {
    use anyhow::anyhow;
    use esp_idf_svc::wifi::{AccessPointConfiguration, AuthMethod, Configuration};

    wifi.set_configuration(&Configuration::AccessPoint(AccessPointConfiguration {
        ssid: FALLBACK_AP_SSID
            .try_into()
            .map_err(|_| anyhow!("AP ssid too long"))?,
        auth_method: AuthMethod::None,
        channel: 1,
        ..Default::default()
    }))?;
    wifi.start()?;
    wifi.wait_netif_up()?;
    Ok(())
}
