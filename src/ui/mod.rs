//! View model for the gauge, status label and liveness LED.
//!
//! Each element refreshes on its own cadence and renders from a
//! [`StatusSnapshot`]; nothing here touches shared state. The renderer
//! behind [`StatusDisplay`] decides what pixels or log lines come out.
//!
//! Distances are hidden whenever they cannot be trusted: before the first
//! contact, after the peer is lost, while the receiver is calibrating, and
//! whenever the estimate itself is invalid.

mod log_display;

pub use log_display::LogDisplay;

use crate::liveness::LivenessState;
use crate::mode::{DeviceMode, Selection};
use crate::state::StatusSnapshot;
use std::time::Duration;

/// Gauge refresh period.
pub const GAUGE_REFRESH: Duration = Duration::from_millis(100);

/// Status label refresh period.
pub const STATUS_REFRESH: Duration = Duration::from_millis(500);

/// Liveness LED refresh period.
pub const LED_REFRESH: Duration = Duration::from_millis(1000);

/// Distance the UI is willing to show, if any.
pub fn shown_distance(snapshot: &StatusSnapshot) -> Option<f32> {
    if snapshot.mode.is_calibrating() {
        return None;
    }
    match snapshot.liveness {
        LivenessState::NeverContacted | LivenessState::Lost => None,
        _ => snapshot.distance_m,
    }
}

/// What the gauge shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaugeView {
    /// Needle position, 0 to 100.
    pub percent: u8,
    /// Readout under the needle; `None` renders as dashes.
    pub meters: Option<f32>,
}

impl GaugeView {
    pub const EMPTY: Self = Self {
        percent: 0,
        meters: None,
    };
}

/// Map the shown distance onto a `0..=max_meters` gauge.
pub fn gauge_view(snapshot: &StatusSnapshot, max_meters: f32) -> GaugeView {
    let Some(meters) = shown_distance(snapshot) else {
        return GaugeView::EMPTY;
    };
    let percent = if max_meters > 0.0 {
        (meters / max_meters * 100.0).clamp(0.0, 100.0).round() as u8
    } else {
        0
    };
    GaugeView {
        percent,
        meters: Some(meters),
    }
}

/// Human-readable connection health.
pub fn liveness_label(state: LivenessState) -> &'static str {
    match state {
        LivenessState::NeverContacted => "Waiting for peer",
        LivenessState::Fresh => "Connected",
        LivenessState::Stale => "Waiting",
        LivenessState::VeryStale => "Weak",
        LivenessState::Lost => "Lost",
    }
}

/// One-line status label.
pub fn status_text(snapshot: &StatusSnapshot) -> String {
    let mode = snapshot.mode.mode;
    if snapshot.mode.selection == Selection::Open {
        return format!("Select: {}", mode.label());
    }

    let rssi = match snapshot.rssi {
        Some(rssi) => format!("{} dBm", rssi),
        None => "--".to_string(),
    };

    if snapshot.mode.is_calibrating() {
        return format!("Calibrate: place peer at 1 m, RSSI {}", rssi);
    }

    let health = liveness_label(snapshot.liveness);
    let distance = match shown_distance(snapshot) {
        Some(m) => format!("{:.2} m", m),
        None => "--".to_string(),
    };

    match mode {
        DeviceMode::EspNowReceiver => {
            format!("{} | {} | RSSI {} | {}", mode.label(), health, rssi, distance)
        }
        DeviceMode::FtmClient => format!("{} | {} | {}", mode.label(), health, distance),
        DeviceMode::EspNowSender => format!("{} | {}", mode.label(), health),
        DeviceMode::FtmResponder => format!("{} | serving", mode.label()),
    }
}

/// Liveness LED color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedColor {
    Off,
    Green,
    Yellow,
    Orange,
    Red,
}

pub fn led_color(state: LivenessState) -> LedColor {
    match state {
        LivenessState::NeverContacted => LedColor::Off,
        LivenessState::Fresh => LedColor::Green,
        LivenessState::Stale => LedColor::Yellow,
        LivenessState::VeryStale => LedColor::Orange,
        LivenessState::Lost => LedColor::Red,
    }
}

/// LED state for one refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedView {
    pub color: LedColor,
    /// Flips every refresh that saw new contact, so the LED blinks with traffic.
    pub lit: bool,
}

/// Tracks contact counts between LED refreshes.
#[derive(Debug, Default)]
pub struct LedIndicator {
    seen_contacts: u64,
    lit: bool,
}

impl LedIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, snapshot: &StatusSnapshot) -> LedView {
        let contacts = snapshot.counters.contacts();
        if contacts != self.seen_contacts {
            self.seen_contacts = contacts;
            self.lit = !self.lit;
        }
        LedView {
            color: led_color(snapshot.liveness),
            lit: self.lit,
        }
    }
}

/// Something that can show the three UI elements.
pub trait StatusDisplay: Send {
    fn show_gauge(&mut self, gauge: &GaugeView);
    fn show_status(&mut self, text: &str);
    fn show_led(&mut self, led: LedView);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::{CalibStep, ModeState};
    use crate::ranging::CalibrationPoint;
    use crate::state::LinkCounters;

    fn snapshot(
        mode: DeviceMode,
        liveness: LivenessState,
        distance_m: Option<f32>,
    ) -> StatusSnapshot {
        StatusSnapshot {
            mode: ModeState {
                mode,
                selection: Selection::Locked,
                calib: CalibStep::Idle,
            },
            rssi: Some(-60),
            distance_m,
            calibration: CalibrationPoint::new(-51.0, 1.64),
            liveness,
            since_contact: Some(Duration::from_millis(100)),
            ftm: None,
            counters: LinkCounters::default(),
        }
    }

    // ==================== Gauge Tests ====================

    #[test]
    fn test_gauge_maps_distance() {
        let snap = snapshot(DeviceMode::EspNowReceiver, LivenessState::Fresh, Some(2.5));
        assert_eq!(
            gauge_view(&snap, 10.0),
            GaugeView {
                percent: 25,
                meters: Some(2.5)
            }
        );
    }

    #[test]
    fn test_gauge_clamps_far_distance() {
        let snap = snapshot(DeviceMode::EspNowReceiver, LivenessState::Fresh, Some(42.0));
        assert_eq!(gauge_view(&snap, 10.0).percent, 100);
    }

    #[test]
    fn test_gauge_hidden_when_untrusted() {
        for liveness in [LivenessState::NeverContacted, LivenessState::Lost] {
            let snap = snapshot(DeviceMode::EspNowReceiver, liveness, Some(2.0));
            assert_eq!(gauge_view(&snap, 10.0), GaugeView::EMPTY);
        }

        let snap = snapshot(DeviceMode::EspNowReceiver, LivenessState::Fresh, None);
        assert_eq!(gauge_view(&snap, 10.0), GaugeView::EMPTY);

        let mut snap = snapshot(DeviceMode::EspNowReceiver, LivenessState::Fresh, Some(2.0));
        snap.mode.calib = CalibStep::Sampling;
        assert_eq!(gauge_view(&snap, 10.0), GaugeView::EMPTY);
    }

    #[test]
    fn test_stale_peer_still_shows_distance() {
        let snap = snapshot(DeviceMode::FtmClient, LivenessState::VeryStale, Some(1.0));
        assert_eq!(gauge_view(&snap, 10.0).meters, Some(1.0));
    }

    // ==================== Status Text Tests ====================

    #[test]
    fn test_status_text_selection() {
        let mut snap = snapshot(DeviceMode::FtmClient, LivenessState::NeverContacted, None);
        snap.mode.selection = Selection::Open;
        assert_eq!(status_text(&snap), "Select: FTM Client");
    }

    #[test]
    fn test_status_text_receiver() {
        let snap = snapshot(DeviceMode::EspNowReceiver, LivenessState::Fresh, Some(3.54));
        assert_eq!(
            status_text(&snap),
            "ESP-NOW Receiver | Connected | RSSI -60 dBm | 3.54 m"
        );
    }

    #[test]
    fn test_status_text_calibrating() {
        let mut snap = snapshot(DeviceMode::EspNowReceiver, LivenessState::Fresh, Some(3.54));
        snap.mode.calib = CalibStep::Sampling;
        assert_eq!(
            status_text(&snap),
            "Calibrate: place peer at 1 m, RSSI -60 dBm"
        );
    }

    #[test]
    fn test_status_text_lost_hides_distance() {
        let snap = snapshot(DeviceMode::EspNowReceiver, LivenessState::Lost, Some(3.54));
        assert_eq!(
            status_text(&snap),
            "ESP-NOW Receiver | Lost | RSSI -60 dBm | --"
        );
    }

    #[test]
    fn test_status_text_other_modes() {
        let snap = snapshot(DeviceMode::EspNowSender, LivenessState::Stale, None);
        assert_eq!(status_text(&snap), "ESP-NOW Sender | Waiting");

        let snap = snapshot(DeviceMode::FtmResponder, LivenessState::NeverContacted, None);
        assert_eq!(status_text(&snap), "FTM Responder | serving");
    }

    // ==================== LED Tests ====================

    #[test]
    fn test_led_colors() {
        assert_eq!(led_color(LivenessState::NeverContacted), LedColor::Off);
        assert_eq!(led_color(LivenessState::Fresh), LedColor::Green);
        assert_eq!(led_color(LivenessState::Stale), LedColor::Yellow);
        assert_eq!(led_color(LivenessState::VeryStale), LedColor::Orange);
        assert_eq!(led_color(LivenessState::Lost), LedColor::Red);
    }

    #[test]
    fn test_led_blinks_on_contact() {
        let mut led = LedIndicator::new();
        let mut snap = snapshot(DeviceMode::EspNowReceiver, LivenessState::Fresh, Some(1.0));

        assert!(!led.update(&snap).lit);

        snap.counters.frames_received = 1;
        assert!(led.update(&snap).lit);
        // No new contact, no flip.
        assert!(led.update(&snap).lit);

        snap.counters.frames_received = 2;
        assert!(!led.update(&snap).lit);
    }
}
