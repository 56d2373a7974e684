//! Fine Timing Measurement report holder.
//!
//! The Wi-Fi driver delivers one report per FTM burst with the estimated
//! round-trip time and the distance derived from it. Only the latest report
//! is kept; staleness is tracked by the shared liveness tracker.

/// Speed of light in centimeters per nanosecond.
const CM_PER_NS: f64 = 29.979_245_8;

/// One FTM ranging report as delivered by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FtmReport {
    /// Estimated round-trip time in nanoseconds.
    pub rtt_ns: u32,
    /// Estimated one-way distance in centimeters.
    pub distance_cm: u32,
    /// Number of FTM frames the estimate is based on.
    pub sample_count: u8,
}

impl FtmReport {
    pub fn new(rtt_ns: u32, distance_cm: u32, sample_count: u8) -> Self {
        Self {
            rtt_ns,
            distance_cm,
            sample_count,
        }
    }

    /// Build a report from a round-trip time, deriving the one-way distance.
    pub fn from_rtt_ns(rtt_ns: u32, sample_count: u8) -> Self {
        let distance_cm = (rtt_ns as f64 * CM_PER_NS / 2.0).round() as u32;
        Self::new(rtt_ns, distance_cm, sample_count)
    }

    /// One-way distance in meters.
    pub fn distance_meters(&self) -> f32 {
        self.distance_cm as f32 / 100.0
    }
}

/// Latest FTM report, overwritten on every update.
#[derive(Debug, Clone, Default)]
pub struct FtmSession {
    report: Option<FtmReport>,
}

impl FtmSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current report.
    pub fn update(&mut self, report: FtmReport) {
        self.report = Some(report);
    }

    /// The latest report, if one has arrived.
    pub fn report(&self) -> Option<FtmReport> {
        self.report
    }

    /// Distance of the latest report in meters.
    pub fn distance_meters(&self) -> Option<f32> {
        self.report.map(|r| r.distance_meters())
    }

    pub fn rtt_ns(&self) -> Option<u32> {
        self.report.map(|r| r.rtt_ns)
    }

    pub fn sample_count(&self) -> Option<u8> {
        self.report.map(|r| r.sample_count)
    }
}
