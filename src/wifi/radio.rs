//! Wi-Fi driver bring-up for each ranging role.
//!
//! - ESP-NOW: station mode, not associated, 802.11 b/g/n + long range
//! - FTM client: station mode, scans for the responder's BSSID and channel
//! - FTM responder: SoftAP with the FTM responder flag set

use super::config::{FtmInitiatorConfig, RadioConfigError, ResponderApConfig};
use crate::link::MacAddr;
use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::wifi::{
    AccessPointConfiguration, AuthMethod, BlockingWifi, ClientConfiguration, Configuration,
    EspWifi,
};
use esp_idf_sys::{self as sys, esp, EspError};
use log::{debug, info};
use std::fmt;

/// BSSID and channel of a discovered FTM responder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponderInfo {
    pub bssid: MacAddr,
    pub channel: u8,
}

/// Owns the Wi-Fi driver for the lifetime of the selected role.
pub struct WifiRadio {
    wifi: BlockingWifi<EspWifi<'static>>,
}

impl WifiRadio {
    pub fn new(modem: Modem, sysloop: EspSystemEventLoop) -> Result<Self, RadioError> {
        let esp_wifi = EspWifi::new(modem, sysloop.clone(), None)?;
        let wifi = BlockingWifi::wrap(esp_wifi, sysloop)?;
        Ok(Self { wifi })
    }

    /// Station mode for ESP-NOW. Must run before the ESP-NOW driver is taken.
    pub fn start_espnow(&mut self) -> Result<(), RadioError> {
        self.wifi
            .set_configuration(&Configuration::Client(ClientConfiguration::default()))?;
        self.wifi.start()?;

        let protocols = sys::WIFI_PROTOCOL_11B
            | sys::WIFI_PROTOCOL_11G
            | sys::WIFI_PROTOCOL_11N
            | sys::WIFI_PROTOCOL_LR;
        esp!(unsafe {
            sys::esp_wifi_set_protocol(sys::wifi_interface_t_WIFI_IF_STA, protocols as u8)
        })?;

        info!("Wi-Fi started in station mode for ESP-NOW");
        Ok(())
    }

    /// Station mode plus a scan for the responder.
    pub fn start_ftm_client(
        &mut self,
        config: &FtmInitiatorConfig,
    ) -> Result<ResponderInfo, RadioError> {
        config.validate()?;
        self.wifi
            .set_configuration(&Configuration::Client(ClientConfiguration::default()))?;
        self.wifi.start()?;

        info!("Scanning for FTM responder '{}'", config.responder_ssid);
        let found = self
            .wifi
            .scan()?
            .into_iter()
            .find(|ap| ap.ssid.as_str() == config.responder_ssid)
            .ok_or_else(|| RadioError::ResponderNotFound(config.responder_ssid.clone()))?;

        let responder = ResponderInfo {
            bssid: MacAddr(found.bssid),
            channel: found.channel,
        };
        info!(
            "Found FTM responder {} on channel {}",
            responder.bssid, responder.channel
        );
        Ok(responder)
    }

    /// SoftAP that answers FTM requests.
    pub fn start_ftm_responder(&mut self, config: &ResponderApConfig) -> Result<(), RadioError> {
        config.validate()?;

        let auth_method = if config.is_open() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let mut ap = AccessPointConfiguration {
            ssid: config
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| RadioError::InvalidSsid)?,
            password: config
                .password
                .as_str()
                .try_into()
                .map_err(|_| RadioError::InvalidPassword)?,
            auth_method,
            max_connections: config.max_stations,
            ..Default::default()
        };
        if let Some(channel) = config.channel {
            ap.channel = channel;
        }
        self.wifi.set_configuration(&Configuration::AccessPoint(ap))?;
        enable_ftm_responder()?;
        self.wifi.start()?;

        info!(
            "FTM responder up: SSID '{}' ({})",
            config.ssid,
            if config.is_open() { "open" } else { "WPA2" }
        );
        Ok(())
    }
}

/// Set the responder flag on the stored AP configuration.
fn enable_ftm_responder() -> Result<(), EspError> {
    let mut cfg = sys::wifi_config_t::default();
    unsafe {
        esp!(sys::esp_wifi_get_config(sys::wifi_interface_t_WIFI_IF_AP, &mut cfg))?;
        cfg.ap.ftm_responder = true;
        esp!(sys::esp_wifi_set_config(sys::wifi_interface_t_WIFI_IF_AP, &mut cfg))?;
    }
    debug!("FTM responder flag set");
    Ok(())
}

/// Errors from radio bring-up. These are the only fatal errors on the device.
#[derive(Debug)]
pub enum RadioError {
    /// ESP-IDF driver error.
    Esp(EspError),
    /// Rejected configuration.
    Config(RadioConfigError),
    /// SSID does not fit the driver's buffer.
    InvalidSsid,
    /// Password does not fit the driver's buffer.
    InvalidPassword,
    /// No AP with the responder SSID answered the scan.
    ResponderNotFound(String),
}

impl From<EspError> for RadioError {
    fn from(e: EspError) -> Self {
        Self::Esp(e)
    }
}

impl From<RadioConfigError> for RadioError {
    fn from(e: RadioConfigError) -> Self {
        Self::Config(e)
    }
}

impl fmt::Display for RadioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Esp(e) => write!(f, "ESP error: {:?}", e),
            Self::Config(e) => write!(f, "invalid radio config: {}", e),
            Self::InvalidSsid => write!(f, "invalid SSID"),
            Self::InvalidPassword => write!(f, "invalid password"),
            Self::ResponderNotFound(ssid) => write!(f, "FTM responder '{}' not found", ssid),
        }
    }
}

impl std::error::Error for RadioError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}
