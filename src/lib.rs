//! ESP32 distance ranger firmware library.
//!
//! Estimates the distance to a peer board either from the RSSI of ESP-NOW
//! frames (log-distance path loss model) or from Wi-Fi FTM round-trip times,
//! and tracks how recently the peer was heard from.
//!
//! Everything except the radio and GPIO glue is platform-independent and
//! tested on the host machine without ESP32 hardware. The glue is compiled
//! with the `esp32` feature.

pub mod config;
pub mod input;
pub mod link;
pub mod liveness;
pub mod mode;
pub mod ranging;
pub mod state;
pub mod status_server;
pub mod ui;
pub mod wifi;

// Re-export commonly used items
pub use config::{CalibrationProfile, ConfigError, RangingConfig};
pub use link::{MacAddr, PeerLink, PingSender, TransportError};
pub use liveness::{LivenessState, LivenessTracker};
pub use mode::{DeviceMode, ModeEffect, ModeEvent, ModeSelector};
pub use ranging::{CalibrationPoint, DistanceEstimate, DistanceModel, FtmReport, FtmSession};
pub use state::{AppState, StatusSnapshot};
pub use status_server::{StatusServer, DEFAULT_STATUS_PORT};
