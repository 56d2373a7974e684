//! Shared application state.
//!
//! One [`AppState`] is created at boot and shared (via `Arc`) between the
//! transport callbacks, the button handlers and the UI timers. Everything
//! mutable sits behind a single mutex so a calibration change can never be
//! observed half-applied by an estimate running on another task.
//!
//! Lock hold times are bounded: no method performs I/O or logging while the
//! guard is held, apart from the distance model's warning on an invalid
//! calibration.

use crate::config::RangingConfig;
use crate::link::{describe_payload, validate_frame, FrameError, MacAddr};
use crate::liveness::{LivenessState, LivenessTracker};
use crate::mode::{CalibStep, DeviceMode, ModeEffect, ModeEvent, ModeSelector, ModeState};
use crate::ranging::{
    CalibrationPoint, DistanceEstimate, DistanceModel, FtmReport, FtmSession, RssiSample,
};
use log::{debug, info, warn};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Counters for the status endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkCounters {
    /// Frames accepted from the peer.
    pub frames_received: u64,
    /// Frames dropped as malformed.
    pub frames_dropped: u64,
    /// Sends the peer acknowledged.
    pub sends_acked: u64,
    /// Sends the transport reported as failed.
    pub sends_failed: u64,
    /// FTM reports received.
    pub ftm_reports: u64,
}

impl LinkCounters {
    /// Total events that stamped the liveness tracker.
    pub fn contacts(&self) -> u64 {
        self.frames_received + self.sends_acked + self.ftm_reports
    }
}

/// Point-in-time copy of everything the UI shows.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    pub mode: ModeState,
    pub rssi: Option<i16>,
    /// Raw distance for the active mode; `None` if invalid or not yet known.
    pub distance_m: Option<f32>,
    pub calibration: CalibrationPoint,
    pub liveness: LivenessState,
    pub since_contact: Option<Duration>,
    pub ftm: Option<FtmReport>,
    pub counters: LinkCounters,
}

struct Shared {
    model: DistanceModel,
    estimate: DistanceEstimate,
    latest: Option<RssiSample>,
    ftm: FtmSession,
    liveness: LivenessTracker,
    selector: ModeSelector,
    counters: LinkCounters,
}

impl Shared {
    fn distance_m(&self) -> Option<f32> {
        match self.selector.mode() {
            DeviceMode::EspNowReceiver => self.estimate.meters(),
            DeviceMode::FtmClient => self.ftm.distance_meters(),
            DeviceMode::EspNowSender | DeviceMode::FtmResponder => None,
        }
    }
}

/// Everything the device knows about its peer and its own mode.
pub struct AppState {
    shared: Mutex<Shared>,
}

impl AppState {
    /// Create state with the given calibration and the default mode selection.
    pub fn new(calibration: CalibrationPoint) -> Self {
        Self {
            shared: Mutex::new(Shared {
                model: DistanceModel::new(calibration),
                estimate: DistanceEstimate::INVALID,
                latest: None,
                ftm: FtmSession::new(),
                liveness: LivenessTracker::new(),
                selector: ModeSelector::new(),
                counters: LinkCounters::default(),
            }),
        }
    }

    pub fn from_config(config: &RangingConfig) -> Self {
        Self::new(config.calibration)
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        // Every method leaves Shared consistent, so poisoning carries no meaning.
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ==================== Transport callbacks ====================

    /// A frame arrived from the peer.
    ///
    /// Malformed frames (no source, empty payload) are rejected before any
    /// state changes. Otherwise the RSSI is stored, the distance re-estimated
    /// and the contact time stamped.
    pub fn on_frame_received(
        &self,
        src: Option<MacAddr>,
        rssi: i16,
        payload: &[u8],
        now: Instant,
    ) -> Result<DistanceEstimate, FrameError> {
        let src = match validate_frame(src, payload) {
            Ok(src) => src,
            Err(e) => {
                self.lock().counters.frames_dropped += 1;
                return Err(e);
            }
        };

        let estimate = {
            let mut shared = self.lock();
            shared.latest = Some(RssiSample::new(rssi, now));
            shared.estimate = shared.model.estimate(rssi);
            shared.liveness.record_contact(now);
            shared.counters.frames_received += 1;
            shared.estimate
        };

        debug!(
            "Received from {}: {} (RSSI: {})",
            src,
            describe_payload(payload),
            rssi
        );
        if let Some(meters) = estimate.meters() {
            debug!("Estimated distance: {:.2} meters", meters);
        }
        Ok(estimate)
    }

    /// An FTM report arrived.
    pub fn on_ftm_report(&self, report: FtmReport, now: Instant) {
        {
            let mut shared = self.lock();
            shared.ftm.update(report);
            shared.liveness.record_contact(now);
            shared.counters.ftm_reports += 1;
        }
        debug!(
            "FTM report: RTT {} ns, distance {}.{:02} m ({} frames)",
            report.rtt_ns,
            report.distance_cm / 100,
            report.distance_cm % 100,
            report.sample_count
        );
    }

    /// The transport finished a send. Only acknowledged sends count as contact.
    pub fn on_send_complete(&self, peer: MacAddr, success: bool, now: Instant) {
        {
            let mut shared = self.lock();
            if success {
                shared.liveness.record_contact(now);
                shared.counters.sends_acked += 1;
            } else {
                shared.counters.sends_failed += 1;
            }
        }
        if success {
            debug!("Send success to {}", peer);
        } else {
            warn!("Send fail to {}", peer);
        }
    }

    // ==================== Buttons ====================

    /// Feed a button event through the mode machine.
    ///
    /// [`ModeEffect::ApplyCalibration`] is carried out here, under the same
    /// lock: the latest RSSI becomes the one-meter reference. With no RSSI
    /// received yet the reference is left alone.
    pub fn press(&self, event: ModeEvent) -> ModeEffect {
        let (effect, applied) = {
            let mut shared = self.lock();
            let effect = shared.selector.handle(event);
            let mut applied = None;
            if effect == ModeEffect::ApplyCalibration {
                if let Some(sample) = shared.latest {
                    shared.model.recalibrate(sample.rssi);
                    shared.estimate = shared.model.estimate(sample.rssi);
                    applied = Some(sample.rssi);
                }
            }
            (effect, applied)
        };

        match effect {
            ModeEffect::ModeChanged(mode) => info!("Mode: {}", mode),
            ModeEffect::SelectionLocked(mode) => info!("Mode locked: {}", mode),
            ModeEffect::CalibrationStarted => info!("Calibration: stand 1 m from the peer"),
            ModeEffect::CalibrationAborted => info!("Calibration aborted"),
            ModeEffect::ApplyCalibration => match applied {
                Some(rssi) => info!("Calibration applied: {} dBm at 1 m", rssi),
                None => warn!("Calibration not applied: no RSSI received yet"),
            },
            ModeEffect::None => {}
        }
        effect
    }

    /// The "set" button.
    pub fn press_set(&self) -> ModeEffect {
        self.press(ModeEvent::Cycle)
    }

    /// The "enter" button.
    pub fn press_enter(&self) -> ModeEffect {
        self.press(ModeEvent::Confirm)
    }

    // ==================== UI read surface ====================

    /// Distance for the active mode: RSSI estimate for the receiver, FTM for
    /// the client, `None` otherwise or when no valid value exists.
    pub fn current_distance_meters(&self) -> Option<f32> {
        self.lock().distance_m()
    }

    /// RSSI of the most recent accepted frame.
    pub fn current_rssi(&self) -> Option<i16> {
        self.lock().latest.map(|s| s.rssi)
    }

    pub fn current_liveness(&self, now: Instant) -> LivenessState {
        self.lock().liveness.classify(now)
    }

    pub fn current_mode(&self) -> DeviceMode {
        self.lock().selector.mode()
    }

    pub fn current_calibration_step(&self) -> CalibStep {
        self.lock().selector.calibration_step()
    }

    pub fn calibration(&self) -> CalibrationPoint {
        self.lock().model.calibration()
    }

    pub fn ftm_report(&self) -> Option<FtmReport> {
        self.lock().ftm.report()
    }

    pub fn counters(&self) -> LinkCounters {
        self.lock().counters
    }

    /// Copy everything the UI needs in one lock acquisition.
    pub fn snapshot(&self, now: Instant) -> StatusSnapshot {
        let shared = self.lock();
        StatusSnapshot {
            mode: shared.selector.state(),
            rssi: shared.latest.map(|s| s.rssi),
            distance_m: shared.distance_m(),
            calibration: shared.model.calibration(),
            liveness: shared.liveness.classify(now),
            since_contact: shared.liveness.since_last_contact(now),
            ftm: shared.ftm.report(),
            counters: shared.counters,
        }
    }
}
