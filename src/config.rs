//! Ranging configuration.
//!
//! Nothing is persisted: every boot starts from the compiled-in defaults.
//! Defaults can be overridden at build time through environment variables:
//!
//! | Variable | Meaning | Example |
//! |----------|---------|---------|
//! | `RANGER_PROFILE` | calibration profile | `line-of-sight`, `obstructed` |
//! | `RANGER_RSSI_AT_1M` | RSSI at one meter (dBm) | `-58` |
//! | `RANGER_PATH_LOSS_EXPONENT` | path loss exponent | `2.1` |
//! | `RANGER_PEER_MAC` | sender target | `e4:b0:63:15:f6:24` |
//!
//! Explicit values override the profile.
//!
//! # Example
//!
//! ```
//! use esp_ranger::config::{CalibrationProfile, RangingConfig};
//!
//! let config = RangingConfig::from_values(Some("obstructed"), None, None, None).unwrap();
//! assert_eq!(config.calibration, CalibrationProfile::Obstructed.calibration());
//! ```

use crate::link::{MacAddr, MacParseError, SEND_INTERVAL};
use crate::ranging::{CalibrationError, CalibrationPoint};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Distance shown as a full gauge.
pub const DEFAULT_GAUGE_MAX_METERS: f32 = 10.0;

/// Known-good starting points for the path loss model.
///
/// Measure in your environment and recalibrate on site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalibrationProfile {
    /// Boards in line of sight: -51 dBm at 1 m, n = 1.64.
    #[default]
    LineOfSight,
    /// Indoor with obstacles: -75 dBm at 1 m, n = 2.5.
    Obstructed,
}

impl CalibrationProfile {
    pub fn calibration(self) -> CalibrationPoint {
        match self {
            Self::LineOfSight => CalibrationPoint::new(-51.0, 1.64),
            Self::Obstructed => CalibrationPoint::new(-75.0, 2.5),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::LineOfSight => "line-of-sight",
            Self::Obstructed => "obstructed",
        }
    }
}

impl FromStr for CalibrationProfile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "line-of-sight" | "los" => Ok(Self::LineOfSight),
            "obstructed" | "indoor" => Ok(Self::Obstructed),
            _ => Err(ConfigError::UnknownProfile(s.to_string())),
        }
    }
}

impl fmt::Display for CalibrationProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime configuration of the ranging engine.
#[derive(Debug, Clone, PartialEq)]
pub struct RangingConfig {
    /// Initial path loss calibration.
    pub calibration: CalibrationPoint,
    /// Where sender mode addresses its pings.
    pub peer: MacAddr,
    /// Sender tick period.
    pub send_interval: Duration,
    /// Distance mapped to a full gauge.
    pub gauge_max_meters: f32,
}

impl Default for RangingConfig {
    fn default() -> Self {
        Self {
            calibration: CalibrationProfile::default().calibration(),
            peer: MacAddr::BROADCAST,
            send_interval: SEND_INTERVAL,
            gauge_max_meters: DEFAULT_GAUGE_MAX_METERS,
        }
    }
}

impl RangingConfig {
    /// Build from `RANGER_*` variables captured at compile time.
    pub fn from_build_env() -> Result<Self, ConfigError> {
        Self::from_values(
            option_env!("RANGER_PROFILE"),
            option_env!("RANGER_RSSI_AT_1M"),
            option_env!("RANGER_PATH_LOSS_EXPONENT"),
            option_env!("RANGER_PEER_MAC"),
        )
    }

    /// Build from optional string overrides.
    pub fn from_values(
        profile: Option<&str>,
        rssi_at_1m: Option<&str>,
        path_loss_exponent: Option<&str>,
        peer: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(profile) = profile {
            config.calibration = profile.parse::<CalibrationProfile>()?.calibration();
        }
        if let Some(value) = rssi_at_1m {
            config.calibration.reference_rssi = parse_number("RANGER_RSSI_AT_1M", value)?;
        }
        if let Some(value) = path_loss_exponent {
            config.calibration.path_loss_exponent =
                parse_number("RANGER_PATH_LOSS_EXPONENT", value)?;
        }
        if let Some(value) = peer {
            config.peer = value.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.calibration.validate()?;
        if self.send_interval.is_zero() {
            return Err(ConfigError::ZeroSendInterval);
        }
        if !(self.gauge_max_meters.is_finite() && self.gauge_max_meters > 0.0) {
            return Err(ConfigError::InvalidGaugeRange(self.gauge_max_meters));
        }
        Ok(())
    }
}

fn parse_number(key: &'static str, value: &str) -> Result<f32, ConfigError> {
    value
        .trim()
        .parse::<f32>()
        .map_err(|_| ConfigError::InvalidNumber {
            key,
            value: value.to_string(),
        })
}

/// Errors that can occur while building the configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Profile name not recognized.
    UnknownProfile(String),
    /// A numeric override did not parse.
    InvalidNumber { key: &'static str, value: String },
    /// Peer MAC address did not parse.
    InvalidPeer(MacParseError),
    /// Calibration cannot produce estimates.
    Calibration(CalibrationError),
    /// Sender interval of zero.
    ZeroSendInterval,
    /// Gauge range must be positive.
    InvalidGaugeRange(f32),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownProfile(p) => write!(f, "unknown calibration profile: {}", p),
            Self::InvalidNumber { key, value } => {
                write!(f, "{} is not a number: {:?}", key, value)
            }
            Self::InvalidPeer(e) => write!(f, "invalid peer: {}", e),
            Self::Calibration(e) => write!(f, "invalid calibration: {}", e),
            Self::ZeroSendInterval => write!(f, "send interval must be greater than zero"),
            Self::InvalidGaugeRange(m) => write!(f, "gauge range must be positive: {}", m),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidPeer(e) => Some(e),
            Self::Calibration(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MacParseError> for ConfigError {
    fn from(e: MacParseError) -> Self {
        Self::InvalidPeer(e)
    }
}

impl From<CalibrationError> for ConfigError {
    fn from(e: CalibrationError) -> Self {
        Self::Calibration(e)
    }
}
