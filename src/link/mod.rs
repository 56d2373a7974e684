//! Peer link abstraction.
//!
//! The core only needs two things from a transport: a way to push one short
//! frame to the peer, and a callback path for received frames. This module
//! defines that contract so the same application code runs against:
//!
//! - **ESP32** (`esp32` feature): ESP-NOW via `esp-idf-svc`
//! - **Host**: an in-process simulated peer ([`sim`])
//!
//! # Components
//!
//! - [`ping`] - counter payloads and the periodic send tick
//! - [`sim`] - simulated peer producing RSSI and FTM readings
//! - `espnow` - ESP-NOW transport (ESP32 only)

pub mod ping;
pub mod sim;

#[cfg(feature = "esp32")]
mod espnow;

#[cfg(feature = "esp32")]
pub use espnow::{EspNowLink, EspNowLinkError};

pub use ping::{PingSender, MAX_PAYLOAD_LEN, SEND_INTERVAL};
pub use sim::{AckCallback, SimulatedPeer, SimulatedPeerLink, SIMULATED_PEER_ADDR};

use std::fmt;
use std::str::FromStr;

/// A 6-byte IEEE 802 MAC address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    /// Broadcast address, reaches every ESP-NOW listener on the channel.
    pub const BROADCAST: Self = Self([0xFF; 6]);

    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

impl FromStr for MacAddr {
    type Err = MacParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut octets = [0u8; 6];
        let mut parts = s.split(|c| c == ':' || c == '-');

        for octet in octets.iter_mut() {
            let part = parts.next().ok_or_else(|| MacParseError(s.to_string()))?;
            if part.len() != 2 {
                return Err(MacParseError(s.to_string()));
            }
            *octet = u8::from_str_radix(part, 16).map_err(|_| MacParseError(s.to_string()))?;
        }

        if parts.next().is_some() {
            return Err(MacParseError(s.to_string()));
        }
        Ok(Self(octets))
    }
}

/// A MAC address string that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacParseError(pub String);

impl fmt::Display for MacParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid MAC address: {:?}", self.0)
    }
}

impl std::error::Error for MacParseError {}

/// Outbound half of the transport.
///
/// Implementations must not block for long: the send tick calls this once
/// per interval and does not retry on failure.
pub trait PeerLink: Send {
    /// Queue one frame for the peer.
    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError>;

    /// The peer frames are addressed to.
    fn peer(&self) -> MacAddr;
}

/// A single outbound send failed.
#[derive(Debug)]
pub enum TransportError {
    /// Payload exceeds what the transport accepts.
    PayloadTooLarge { len: usize, max: usize },
    /// The peer is not reachable (not registered, or simulated peer offline).
    PeerUnavailable,
    /// Driver-level failure with a description.
    Driver(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PayloadTooLarge { len, max } => {
                write!(f, "payload too large: {} bytes (max {})", len, max)
            }
            Self::PeerUnavailable => write!(f, "peer unavailable"),
            Self::Driver(msg) => write!(f, "driver error: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

/// A received frame that was dropped without touching any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// Frame carried no payload.
    EmptyPayload,
    /// Source address was missing.
    MissingSource,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "malformed frame: empty payload"),
            Self::MissingSource => write!(f, "malformed frame: missing source address"),
        }
    }
}

impl std::error::Error for FrameError {}

/// Check the parts of a received frame before it reaches the core.
pub fn validate_frame(src: Option<MacAddr>, payload: &[u8]) -> Result<MacAddr, FrameError> {
    let src = src.ok_or(FrameError::MissingSource)?;
    if payload.is_empty() {
        return Err(FrameError::EmptyPayload);
    }
    Ok(src)
}

/// Render a payload for logs: text if it is UTF-8, a byte count otherwise.
pub fn describe_payload(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== MacAddr Tests ====================

    #[test]
    fn test_mac_parse_and_display() {
        let mac: MacAddr = "E4:B0:63:15:F6:24".parse().unwrap();
        assert_eq!(mac, MacAddr([0xE4, 0xB0, 0x63, 0x15, 0xF6, 0x24]));
        assert_eq!(mac.to_string(), "e4:b0:63:15:f6:24");
        assert_eq!("e4-b0-63-15-f6-24".parse::<MacAddr>().unwrap(), mac);
    }

    #[test]
    fn test_mac_broadcast() {
        let mac: MacAddr = "ff:ff:ff:ff:ff:ff".parse().unwrap();
        assert!(mac.is_broadcast());
        assert!(!MacAddr([0; 6]).is_broadcast());
    }

    #[test]
    fn test_mac_parse_errors() {
        for bad in [
            "",
            "ff:ff:ff:ff:ff",
            "ff:ff:ff:ff:ff:ff:ff",
            "fff:ff:ff:ff:ff:f",
            "gg:ff:ff:ff:ff:ff",
        ] {
            assert!(bad.parse::<MacAddr>().is_err(), "{:?} parsed", bad);
        }
    }

    // ==================== Frame Validation Tests ====================

    #[test]
    fn test_validate_frame() {
        let src = MacAddr([1, 2, 3, 4, 5, 6]);
        assert_eq!(validate_frame(Some(src), b"Ping 1"), Ok(src));
        assert_eq!(
            validate_frame(Some(src), b""),
            Err(FrameError::EmptyPayload)
        );
        assert_eq!(
            validate_frame(None, b"Ping 1"),
            Err(FrameError::MissingSource)
        );
    }

    #[test]
    fn test_describe_payload() {
        assert_eq!(describe_payload(b"Ping 7"), "Ping 7");
        assert_eq!(describe_payload(&[0xff, 0xfe]), "<binary 2 bytes>");
    }

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::PayloadTooLarge { len: 300, max: 250 };
        assert_eq!(err.to_string(), "payload too large: 300 bytes (max 250)");
        assert_eq!(TransportError::PeerUnavailable.to_string(), "peer unavailable");
    }
}
