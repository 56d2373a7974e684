//! RSSI to distance conversion using the log-distance path loss model.
//!
//! The model is `RSSI = A - 10 * n * log10(d)` where `A` is the RSSI observed
//! at one meter and `n` is the path loss exponent. Solved for `d`:
//!
//! ```text
//! d = 10 ^ ((A - RSSI) / (10 * n))
//! ```
//!
//! Both constants depend heavily on the environment and antenna placement.
//! Measure them in the room you deploy in; the defaults are only a starting
//! point.
//!
//! # Example
//!
//! ```
//! use esp_ranger::ranging::{CalibrationPoint, DistanceModel};
//!
//! let mut model = DistanceModel::new(CalibrationPoint::new(-51.0, 1.64));
//! let estimate = model.estimate(-60);
//! assert!(estimate.valid);
//! assert!((estimate.meters - 3.54).abs() < 0.01);
//!
//! // Operator stands at one meter and presses "apply".
//! model.recalibrate(-58);
//! assert!((model.estimate(-58).meters - 1.0).abs() < 1e-6);
//! ```

use log::warn;
use std::fmt;
use std::time::Instant;

/// Reference point of the path loss model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationPoint {
    /// Expected RSSI in dBm at a distance of one meter.
    pub reference_rssi: f32,
    /// Path loss exponent `n`.
    ///
    /// - Free space: ~2.0
    /// - Indoor, line of sight: 1.6 - 1.8
    /// - Indoor, with obstacles: 2.0 - 4.0
    ///
    /// Zero disables estimation.
    pub path_loss_exponent: f32,
}

impl CalibrationPoint {
    /// Create a calibration point.
    ///
    /// No validation happens here; an invalid point produces invalid
    /// estimates instead of failing. Use [`validate`](Self::validate) for
    /// configuration-time checks.
    pub const fn new(reference_rssi: f32, path_loss_exponent: f32) -> Self {
        Self {
            reference_rssi,
            path_loss_exponent,
        }
    }

    /// Check that the point can produce estimates.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        if !self.reference_rssi.is_finite() {
            return Err(CalibrationError::NonFiniteReference(self.reference_rssi));
        }
        if !self.path_loss_exponent.is_finite() {
            return Err(CalibrationError::NonFiniteExponent(self.path_loss_exponent));
        }
        if self.path_loss_exponent == 0.0 {
            return Err(CalibrationError::ZeroExponent);
        }
        Ok(())
    }
}

/// A single RSSI reading taken from a received frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RssiSample {
    /// Signal strength in dBm.
    pub rssi: i16,
    /// When the frame carrying this reading arrived.
    pub received_at: Instant,
}

impl RssiSample {
    pub fn new(rssi: i16, received_at: Instant) -> Self {
        Self { rssi, received_at }
    }
}

/// Result of converting an RSSI value into a distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceEstimate {
    /// Estimated distance in meters. Meaningless when `valid` is false.
    pub meters: f32,
    /// False when the calibration is unusable or the result is not finite.
    pub valid: bool,
}

impl DistanceEstimate {
    /// An estimate that must not be displayed.
    pub const INVALID: Self = Self {
        meters: 0.0,
        valid: false,
    };

    /// The distance, if the estimate is valid.
    pub fn meters(&self) -> Option<f32> {
        self.valid.then_some(self.meters)
    }
}

/// Log-distance path loss model with a mutable reference point.
#[derive(Debug, Clone)]
pub struct DistanceModel {
    calibration: CalibrationPoint,
}

impl DistanceModel {
    pub fn new(calibration: CalibrationPoint) -> Self {
        Self { calibration }
    }

    /// Current calibration point.
    pub fn calibration(&self) -> CalibrationPoint {
        self.calibration
    }

    /// Convert an RSSI reading into a distance estimate.
    ///
    /// The output is not clamped; display bounds are the caller's concern.
    pub fn estimate(&self, rssi: i16) -> DistanceEstimate {
        let CalibrationPoint {
            reference_rssi,
            path_loss_exponent,
        } = self.calibration;

        if path_loss_exponent == 0.0 {
            warn!(
                "Cannot estimate distance: path loss exponent is zero (RSSI {} dBm)",
                rssi
            );
            return DistanceEstimate::INVALID;
        }

        let exponent = (reference_rssi - rssi as f32) / (10.0 * path_loss_exponent);
        let meters = 10.0_f32.powf(exponent);

        if !meters.is_finite() {
            warn!(
                "Distance estimate for RSSI {} dBm is not finite (reference {} dBm, n={})",
                rssi, reference_rssi, path_loss_exponent
            );
            return DistanceEstimate::INVALID;
        }

        DistanceEstimate {
            meters,
            valid: true,
        }
    }

    /// Take `observed_rssi` as the new one-meter reference.
    ///
    /// The path loss exponent is left unchanged.
    pub fn recalibrate(&mut self, observed_rssi: i16) {
        self.calibration.reference_rssi = observed_rssi as f32;
    }

    /// RSSI the model predicts at `meters` (inverse of [`estimate`](Self::estimate)).
    pub fn expected_rssi(&self, meters: f32) -> f32 {
        let CalibrationPoint {
            reference_rssi,
            path_loss_exponent,
        } = self.calibration;
        if meters <= 0.0 {
            return reference_rssi;
        }
        reference_rssi - 10.0 * path_loss_exponent * meters.log10()
    }
}

/// Errors for calibration values supplied through configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationError {
    /// Path loss exponent of zero would divide by zero.
    ZeroExponent,
    /// Path loss exponent is NaN or infinite.
    NonFiniteExponent(f32),
    /// Reference RSSI is NaN or infinite.
    NonFiniteReference(f32),
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroExponent => write!(f, "path loss exponent must not be zero"),
            Self::NonFiniteExponent(n) => write!(f, "path loss exponent is not finite: {}", n),
            Self::NonFiniteReference(a) => write!(f, "reference RSSI is not finite: {}", a),
        }
    }
}

impl std::error::Error for CalibrationError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(reference_rssi: f32, exponent: f32) -> DistanceModel {
        DistanceModel::new(CalibrationPoint::new(reference_rssi, exponent))
    }

    fn reference_formula(reference_rssi: f32, exponent: f32, rssi: i16) -> f32 {
        10.0_f32.powf((reference_rssi - rssi as f32) / (10.0 * exponent))
    }

    // ==================== Estimate Tests ====================

    #[test]
    fn test_estimate_matches_formula() {
        for &(a, n) in &[(-51.0, 1.64), (-75.0, 2.5), (-40.0, 3.3)] {
            let m = model(a, n);
            for rssi in [-100i16, -80, -60, -51, -40, -20] {
                let est = m.estimate(rssi);
                assert!(est.valid);
                let expected = reference_formula(a, n, rssi);
                assert!(
                    (est.meters - expected).abs() <= expected * 1e-5,
                    "a={} n={} rssi={}: {} vs {}",
                    a,
                    n,
                    rssi,
                    est.meters,
                    expected
                );
            }
        }
    }

    #[test]
    fn test_estimate_decreases_as_signal_strengthens() {
        let m = model(-51.0, 1.64);
        let mut previous = f32::INFINITY;
        for rssi in -110i16..=-10 {
            let meters = m.estimate(rssi).meters;
            assert!(meters < previous, "not decreasing at rssi={}", rssi);
            previous = meters;
        }
    }

    #[test]
    fn test_estimate_scenario_minus_60() {
        let m = model(-51.0, 1.64);
        let est = m.estimate(-60);
        assert!(est.valid);
        assert!((est.meters - 3.538).abs() < 0.01, "got {}", est.meters);
    }

    #[test]
    fn test_estimate_at_reference_is_one_meter() {
        let m = model(-75.0, 2.5);
        assert!((m.estimate(-75).meters - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_exponent_is_invalid_for_every_rssi() {
        let m = model(-51.0, 0.0);
        for rssi in [i16::MIN, -100, -51, 0, 30, i16::MAX] {
            let est = m.estimate(rssi);
            assert!(!est.valid);
            assert_eq!(est.meters(), None);
        }
    }

    #[test]
    fn test_non_finite_result_is_invalid() {
        // Tiny exponent pushes 10^x past f32::MAX.
        let m = model(0.0, 0.001);
        let est = m.estimate(-100);
        assert!(!est.valid);
    }

    #[test]
    fn test_no_clamping() {
        let m = model(-51.0, 1.64);
        assert!(m.estimate(-120).meters > 200.0);
        assert!(m.estimate(0).meters < 0.1);
    }

    // ==================== Calibration Tests ====================

    #[test]
    fn test_recalibrate_then_estimate_is_one_meter() {
        for &n in &[1.64, 2.5, 0.5, 4.0] {
            let mut m = model(-51.0, n);
            for rssi in [-90i16, -63, -30] {
                m.recalibrate(rssi);
                assert!((m.estimate(rssi).meters - 1.0).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_recalibrate_keeps_exponent() {
        let mut m = model(-51.0, 1.64);
        m.recalibrate(-63);
        assert_eq!(m.calibration(), CalibrationPoint::new(-63.0, 1.64));
    }

    #[test]
    fn test_recalibrate_is_idempotent() {
        let mut m = model(-51.0, 2.5);
        m.recalibrate(-70);
        let once = m.calibration();
        m.recalibrate(-70);
        assert_eq!(m.calibration(), once);
    }

    #[test]
    fn test_expected_rssi_inverts_estimate() {
        let m = model(-51.0, 1.64);
        for meters in [0.5f32, 1.0, 3.0, 12.0] {
            let rssi = m.expected_rssi(meters);
            let back = 10.0_f32.powf((-51.0 - rssi) / 16.4);
            assert!((back - meters).abs() < 1e-3);
        }
        assert_eq!(m.expected_rssi(0.0), -51.0);
    }

    #[test]
    fn test_validate() {
        assert!(CalibrationPoint::new(-51.0, 1.64).validate().is_ok());
        assert_eq!(
            CalibrationPoint::new(-51.0, 0.0).validate(),
            Err(CalibrationError::ZeroExponent)
        );
        assert!(matches!(
            CalibrationPoint::new(f32::NAN, 2.0).validate(),
            Err(CalibrationError::NonFiniteReference(_))
        ));
        assert!(matches!(
            CalibrationPoint::new(-51.0, f32::INFINITY).validate(),
            Err(CalibrationError::NonFiniteExponent(_))
        ));
    }
}
