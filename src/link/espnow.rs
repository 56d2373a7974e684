//! ESP-NOW transport (ESP32 only).
//!
//! Wi-Fi must already be started in station mode (see
//! [`WifiRadio::start_espnow`](crate::wifi::WifiRadio::start_espnow)).
//! Receive and send-complete callbacks run on the Wi-Fi task and go straight
//! into [`AppState`].

use super::{MacAddr, PeerLink, TransportError};
use crate::state::AppState;
use esp_idf_svc::espnow::{EspNow, PeerInfo, ReceiveInfo, SendStatus};
use esp_idf_sys::{self as sys, EspError};
use log::{info, warn};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Largest ESP-NOW payload.
pub const ESP_NOW_MAX_DATA_LEN: usize = 250;

/// ESP-NOW link to a single peer.
pub struct EspNowLink {
    espnow: EspNow<'static>,
    peer: MacAddr,
}

impl EspNowLink {
    /// Take the ESP-NOW driver and register `peer`.
    pub fn new(peer: MacAddr) -> Result<Self, EspNowLinkError> {
        let espnow = EspNow::take()?;
        espnow.add_peer(PeerInfo {
            peer_addr: peer.octets(),
            channel: 0,
            ifidx: sys::wifi_interface_t_WIFI_IF_STA,
            encrypt: false,
            ..Default::default()
        })?;
        info!("ESP-NOW peer {} registered", peer);
        Ok(Self { espnow, peer })
    }

    /// Deliver received frames to `state`.
    pub fn route_received(&self, state: Arc<AppState>) -> Result<(), EspNowLinkError> {
        self.espnow
            .register_recv_cb(move |info: &ReceiveInfo, data: &[u8]| {
                let src = Some(MacAddr(*info.src_addr));
                let rssi = info.rx_ctrl.rssi() as i16;
                if let Err(e) = state.on_frame_received(src, rssi, data, Instant::now()) {
                    warn!("Dropped ESP-NOW frame: {}", e);
                }
            })?;
        Ok(())
    }

    /// Deliver send completions to `state`.
    pub fn route_send_status(&self, state: Arc<AppState>) -> Result<(), EspNowLinkError> {
        self.espnow
            .register_send_cb(move |mac: &[u8], status: SendStatus| {
                let peer = <[u8; 6]>::try_from(mac)
                    .map(MacAddr)
                    .unwrap_or(MacAddr::BROADCAST);
                let success = matches!(status, SendStatus::SUCCESS);
                state.on_send_complete(peer, success, Instant::now());
            })?;
        Ok(())
    }
}

impl PeerLink for EspNowLink {
    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        if payload.len() > ESP_NOW_MAX_DATA_LEN {
            return Err(TransportError::PayloadTooLarge {
                len: payload.len(),
                max: ESP_NOW_MAX_DATA_LEN,
            });
        }
        self.espnow
            .send(self.peer.octets(), payload)
            .map_err(|e| TransportError::Driver(format!("{:?}", e)))
    }

    fn peer(&self) -> MacAddr {
        self.peer
    }
}

/// ESP-NOW driver setup failed.
#[derive(Debug)]
pub struct EspNowLinkError(pub EspError);

impl From<EspError> for EspNowLinkError {
    fn from(e: EspError) -> Self {
        Self(e)
    }
}

impl fmt::Display for EspNowLinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ESP-NOW error: {:?}", self.0)
    }
}

impl std::error::Error for EspNowLinkError {}
