//! Distance estimation.
//!
//! - [`rssi`]: log-distance path loss model with runtime calibration
//! - [`ftm`]: latest Fine Timing Measurement report

mod ftm;
mod rssi;

pub use ftm::{FtmReport, FtmSession};
pub use rssi::{CalibrationError, CalibrationPoint, DistanceEstimate, DistanceModel, RssiSample};
