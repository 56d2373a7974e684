//! Wi-Fi roles used for ranging.
//!
//! # Components
//!
//! - [`config`] - FTM initiator and responder parameters (host-testable)
//! - `radio` - driver bring-up for ESP-NOW, FTM client and FTM responder (ESP32 only)
//! - `ftm` - FTM session start and report delivery (ESP32 only)

pub mod config;

#[cfg(feature = "esp32")]
mod ftm;
#[cfg(feature = "esp32")]
mod radio;

pub use config::{FtmInitiatorConfig, RadioConfigError, ResponderApConfig};

#[cfg(feature = "esp32")]
pub use ftm::{register_ftm_reports, FtmInitiator};
#[cfg(feature = "esp32")]
pub use radio::{RadioError, ResponderInfo, WifiRadio};
