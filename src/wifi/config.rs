//! Radio parameters for the FTM roles.
//!
//! Platform-independent so validation can be tested on the host.
//!
//! # Example
//!
//! ```
//! use esp_ranger::wifi::{FtmInitiatorConfig, ResponderApConfig};
//!
//! let ap = ResponderApConfig::default();
//! assert_eq!(ap.ssid, "FTM");
//! assert!(ap.validate().is_ok());
//!
//! let initiator = FtmInitiatorConfig::default();
//! assert_eq!(initiator.frame_count, 32);
//! assert!(initiator.validate().is_ok());
//! ```

use std::fmt;
use std::time::Duration;

/// Maximum SSID length per IEEE 802.11 standard.
pub const MAX_SSID_LEN: usize = 32;

/// Maximum password length for WPA2.
pub const MAX_PASSWORD_LEN: usize = 64;

/// Minimum password length for WPA2.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Upper bound on stations the SoftAP accepts.
pub const MAX_AP_STATIONS: u16 = 10;

/// SSID shared by responder and initiator.
pub const DEFAULT_FTM_SSID: &str = "FTM";

/// Frame counts the FTM initiator accepts. Zero lets the responder choose.
pub const VALID_FRAME_COUNTS: [u8; 5] = [0, 16, 24, 32, 64];

/// Longest burst period the driver accepts, in 100 ms units.
pub const MAX_BURST_PERIOD: u16 = 255;

/// SoftAP answering FTM requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponderApConfig {
    /// Network SSID (1-32 bytes).
    pub ssid: String,
    /// Password (8-64 bytes for WPA2, empty for an open network).
    pub password: String,
    /// Maximum associated stations.
    pub max_stations: u16,
    /// Primary channel, `None` for the driver default.
    pub channel: Option<u8>,
}

impl Default for ResponderApConfig {
    fn default() -> Self {
        Self {
            ssid: DEFAULT_FTM_SSID.to_string(),
            password: "12345678".to_string(),
            max_stations: 4,
            channel: None,
        }
    }
}

impl ResponderApConfig {
    /// Create a validated configuration.
    pub fn new(
        ssid: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, RadioConfigError> {
        let config = Self {
            ssid: ssid.into(),
            password: password.into(),
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RadioConfigError> {
        validate_ssid(&self.ssid)?;

        // Empty is fine for an open AP
        if !self.password.is_empty() && self.password.len() < MIN_PASSWORD_LEN {
            return Err(RadioConfigError::PasswordTooShort {
                len: self.password.len(),
                min: MIN_PASSWORD_LEN,
            });
        }
        if self.password.len() > MAX_PASSWORD_LEN {
            return Err(RadioConfigError::PasswordTooLong {
                len: self.password.len(),
                max: MAX_PASSWORD_LEN,
            });
        }
        if self.max_stations == 0 || self.max_stations > MAX_AP_STATIONS {
            return Err(RadioConfigError::InvalidStationLimit(self.max_stations));
        }
        if let Some(channel) = self.channel {
            validate_channel(channel)?;
        }
        Ok(())
    }

    /// Whether the AP runs without a password.
    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }
}

/// FTM initiator session parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtmInitiatorConfig {
    /// SSID of the responder to range against.
    pub responder_ssid: String,
    /// FTM frames per session.
    pub frame_count: u8,
    /// Time between bursts in 100 ms units, 0 for no preference.
    pub burst_period: u16,
    /// Pause between sessions.
    pub session_interval: Duration,
}

impl Default for FtmInitiatorConfig {
    fn default() -> Self {
        Self {
            responder_ssid: DEFAULT_FTM_SSID.to_string(),
            frame_count: 32,
            burst_period: 2,
            session_interval: Duration::from_millis(1000),
        }
    }
}

impl FtmInitiatorConfig {
    pub fn validate(&self) -> Result<(), RadioConfigError> {
        validate_ssid(&self.responder_ssid)?;
        if !VALID_FRAME_COUNTS.contains(&self.frame_count) {
            return Err(RadioConfigError::InvalidFrameCount(self.frame_count));
        }
        if self.burst_period > MAX_BURST_PERIOD {
            return Err(RadioConfigError::InvalidBurstPeriod(self.burst_period));
        }
        Ok(())
    }

    /// Burst period as a duration.
    pub fn burst_period_duration(&self) -> Duration {
        Duration::from_millis(self.burst_period as u64 * 100)
    }
}

fn validate_ssid(ssid: &str) -> Result<(), RadioConfigError> {
    if ssid.is_empty() {
        return Err(RadioConfigError::SsidEmpty);
    }
    if ssid.len() > MAX_SSID_LEN {
        return Err(RadioConfigError::SsidTooLong {
            len: ssid.len(),
            max: MAX_SSID_LEN,
        });
    }
    Ok(())
}

fn validate_channel(channel: u8) -> Result<(), RadioConfigError> {
    if (1..=14).contains(&channel) {
        Ok(())
    } else {
        Err(RadioConfigError::InvalidChannel(channel))
    }
}

/// Errors in radio configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioConfigError {
    /// SSID is empty.
    SsidEmpty,
    /// SSID exceeds maximum length.
    SsidTooLong { len: usize, max: usize },
    /// Password is too short for WPA2.
    PasswordTooShort { len: usize, min: usize },
    /// Password exceeds maximum length.
    PasswordTooLong { len: usize, max: usize },
    /// Station limit outside 1..=10.
    InvalidStationLimit(u16),
    /// Channel outside 1..=14.
    InvalidChannel(u8),
    /// Frame count the driver does not support.
    InvalidFrameCount(u8),
    /// Burst period too long.
    InvalidBurstPeriod(u16),
}

impl fmt::Display for RadioConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SsidEmpty => write!(f, "SSID cannot be empty"),
            Self::SsidTooLong { len, max } => {
                write!(f, "SSID too long: {} bytes (max {})", len, max)
            }
            Self::PasswordTooShort { len, min } => {
                write!(f, "password too short: {} bytes (min {})", len, min)
            }
            Self::PasswordTooLong { len, max } => {
                write!(f, "password too long: {} bytes (max {})", len, max)
            }
            Self::InvalidStationLimit(n) => {
                write!(f, "station limit must be 1-{}: {}", MAX_AP_STATIONS, n)
            }
            Self::InvalidChannel(c) => write!(f, "invalid channel: {}", c),
            Self::InvalidFrameCount(n) => write!(
                f,
                "unsupported FTM frame count {} (expected one of {:?})",
                n, VALID_FRAME_COUNTS
            ),
            Self::InvalidBurstPeriod(p) => {
                write!(f, "burst period too long: {} (max {})", p, MAX_BURST_PERIOD)
            }
        }
    }
}

impl std::error::Error for RadioConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== ResponderApConfig Tests ====================

    #[test]
    fn test_default_responder() {
        let config = ResponderApConfig::default();
        assert_eq!(config.ssid, "FTM");
        assert_eq!(config.password, "12345678");
        assert_eq!(config.max_stations, 4);
        assert!(!config.is_open());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_open_responder() {
        let config = ResponderApConfig::new("FTM", "").unwrap();
        assert!(config.is_open());
    }

    #[test]
    fn test_empty_ssid() {
        assert_eq!(
            ResponderApConfig::new("", "12345678"),
            Err(RadioConfigError::SsidEmpty)
        );
    }

    #[test]
    fn test_ssid_length_limit() {
        assert!(ResponderApConfig::new("a".repeat(32), "12345678").is_ok());
        assert!(matches!(
            ResponderApConfig::new("a".repeat(33), "12345678"),
            Err(RadioConfigError::SsidTooLong { len: 33, max: 32 })
        ));
    }

    #[test]
    fn test_password_limits() {
        assert!(matches!(
            ResponderApConfig::new("FTM", "1234567"),
            Err(RadioConfigError::PasswordTooShort { len: 7, min: 8 })
        ));
        assert!(ResponderApConfig::new("FTM", "a".repeat(64)).is_ok());
        assert!(matches!(
            ResponderApConfig::new("FTM", "a".repeat(65)),
            Err(RadioConfigError::PasswordTooLong { .. })
        ));
    }

    #[test]
    fn test_station_limit_and_channel() {
        let mut config = ResponderApConfig::default();
        config.max_stations = 0;
        assert_eq!(
            config.validate(),
            Err(RadioConfigError::InvalidStationLimit(0))
        );

        let mut config = ResponderApConfig::default();
        config.channel = Some(15);
        assert_eq!(config.validate(), Err(RadioConfigError::InvalidChannel(15)));
        config.channel = Some(6);
        assert!(config.validate().is_ok());
    }

    // ==================== FtmInitiatorConfig Tests ====================

    #[test]
    fn test_default_initiator() {
        let config = FtmInitiatorConfig::default();
        assert_eq!(config.responder_ssid, "FTM");
        assert_eq!(config.frame_count, 32);
        assert_eq!(config.burst_period, 2);
        assert_eq!(config.burst_period_duration(), Duration::from_millis(200));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_frame_counts() {
        for count in VALID_FRAME_COUNTS {
            let config = FtmInitiatorConfig {
                frame_count: count,
                ..Default::default()
            };
            assert!(config.validate().is_ok(), "{} rejected", count);
        }

        let config = FtmInitiatorConfig {
            frame_count: 33,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(RadioConfigError::InvalidFrameCount(33))
        );
    }

    #[test]
    fn test_burst_period_limit() {
        let config = FtmInitiatorConfig {
            burst_period: 256,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(RadioConfigError::InvalidBurstPeriod(256))
        );
    }
}
