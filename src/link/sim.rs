//! In-process simulated peer for running the ranging stack on the host.
//!
//! A [`SimulatedPeer`] is a second board at a configurable distance. Its RSSI
//! follows the path loss model with a bit of random jitter and its FTM
//! reports carry the round-trip time light needs for that distance. Moving
//! the peer or taking it offline is done through a cloned handle, so the
//! console can drive the scene while the radio tasks read it.
//!
//! # Example
//!
//! ```
//! use esp_ranger::link::SimulatedPeer;
//! use esp_ranger::ranging::{CalibrationPoint, DistanceModel};
//!
//! let peer = SimulatedPeer::new(CalibrationPoint::new(-51.0, 1.64), 3.0);
//! peer.set_jitter_db(0.0);
//!
//! let rssi = peer.rssi().unwrap();
//! let model = DistanceModel::new(CalibrationPoint::new(-51.0, 1.64));
//! assert!((model.estimate(rssi).meters - 3.0).abs() < 0.5);
//!
//! peer.set_online(false);
//! assert!(peer.rssi().is_none());
//! ```

use super::{MacAddr, PeerLink, TransportError, MAX_PAYLOAD_LEN};
use crate::ranging::{CalibrationPoint, DistanceModel, FtmReport};
use log::debug;
use rand_core::{OsRng, RngCore};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Light travels this many meters per nanosecond.
const METERS_PER_NS: f32 = 0.299_792_458;

/// Frames per FTM burst, as the initiator requests them.
const FTM_FRAME_COUNT: u8 = 32;

/// Default RSSI jitter amplitude (dB).
pub const DEFAULT_JITTER_DB: f32 = 2.0;

/// Address the simulated peer reports as frame source.
pub const SIMULATED_PEER_ADDR: MacAddr = MacAddr([0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);

#[derive(Debug)]
struct Scene {
    distance_m: f32,
    online: bool,
    truth: DistanceModel,
    jitter_db: f32,
}

/// Shared handle to a simulated peer.
#[derive(Debug, Clone)]
pub struct SimulatedPeer {
    scene: Arc<Mutex<Scene>>,
}

impl SimulatedPeer {
    /// Place a peer `distance_m` away. `truth` is the channel the simulated
    /// radio actually follows, independent of what the receiver believes.
    pub fn new(truth: CalibrationPoint, distance_m: f32) -> Self {
        Self {
            scene: Arc::new(Mutex::new(Scene {
                distance_m: distance_m.max(0.0),
                online: true,
                truth: DistanceModel::new(truth),
                jitter_db: DEFAULT_JITTER_DB,
            })),
        }
    }

    fn scene(&self) -> MutexGuard<'_, Scene> {
        self.scene.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn address(&self) -> MacAddr {
        SIMULATED_PEER_ADDR
    }

    /// Move the peer. Negative distances are clamped to zero.
    pub fn set_distance(&self, meters: f32) {
        self.scene().distance_m = meters.max(0.0);
    }

    pub fn distance(&self) -> f32 {
        self.scene().distance_m
    }

    /// Switch the peer on or off. An offline peer neither sends nor acks.
    pub fn set_online(&self, online: bool) {
        self.scene().online = online;
    }

    pub fn is_online(&self) -> bool {
        self.scene().online
    }

    pub fn set_jitter_db(&self, jitter_db: f32) {
        self.scene().jitter_db = jitter_db.abs();
    }

    /// RSSI of the next frame from the peer, `None` while offline.
    pub fn rssi(&self) -> Option<i16> {
        let (expected, jitter_db) = {
            let scene = self.scene();
            if !scene.online {
                return None;
            }
            (scene.truth.expected_rssi(scene.distance_m), scene.jitter_db)
        };
        let noisy = expected + jitter(jitter_db);
        Some(noisy.round().clamp(-127.0, 0.0) as i16)
    }

    /// FTM report for one burst against the peer, `None` while offline.
    pub fn ftm_report(&self) -> Option<FtmReport> {
        let scene = self.scene();
        if !scene.online {
            return None;
        }
        let rtt_ns = (2.0 * scene.distance_m / METERS_PER_NS).round() as u32;
        Some(FtmReport::from_rtt_ns(rtt_ns, FTM_FRAME_COUNT))
    }
}

/// Uniform noise in `[-amplitude, amplitude]`.
fn jitter(amplitude: f32) -> f32 {
    if amplitude == 0.0 {
        return 0.0;
    }
    let unit = OsRng.next_u32() as f32 / u32::MAX as f32;
    (unit * 2.0 - 1.0) * amplitude
}

/// Callback for send completions: peer address and whether it acked.
pub type AckCallback = Box<dyn FnMut(MacAddr, bool) + Send>;

/// Outbound link to a [`SimulatedPeer`].
///
/// Sends are accepted as long as the payload fits; the ack callback then
/// reports whether the peer was online to receive it.
pub struct SimulatedPeerLink {
    peer: SimulatedPeer,
    on_ack: AckCallback,
}

impl SimulatedPeerLink {
    pub fn new(peer: SimulatedPeer, on_ack: AckCallback) -> Self {
        Self { peer, on_ack }
    }
}

impl fmt::Debug for SimulatedPeerLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulatedPeerLink")
            .field("peer", &self.peer)
            .finish_non_exhaustive()
    }
}

impl PeerLink for SimulatedPeerLink {
    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(TransportError::PayloadTooLarge {
                len: payload.len(),
                max: MAX_PAYLOAD_LEN,
            });
        }
        let delivered = self.peer.is_online();
        debug!(
            "Simulated send of {} bytes ({})",
            payload.len(),
            if delivered { "delivered" } else { "lost" }
        );
        (self.on_ack)(self.peer.address(), delivered);
        Ok(())
    }

    fn peer(&self) -> MacAddr {
        self.peer.address()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_peer(distance_m: f32) -> SimulatedPeer {
        let peer = SimulatedPeer::new(CalibrationPoint::new(-51.0, 1.64), distance_m);
        peer.set_jitter_db(0.0);
        peer
    }

    // ==================== RSSI Tests ====================

    #[test]
    fn test_rssi_follows_distance() {
        let peer = quiet_peer(1.0);
        assert_eq!(peer.rssi(), Some(-51));

        peer.set_distance(10.0);
        // -51 - 16.4
        assert_eq!(peer.rssi(), Some(-67));
    }

    #[test]
    fn test_rssi_jitter_bounded() {
        let peer = quiet_peer(1.0);
        peer.set_jitter_db(2.0);
        for _ in 0..100 {
            let rssi = peer.rssi().unwrap();
            assert!((-53..=-49).contains(&rssi), "rssi {}", rssi);
        }
    }

    #[test]
    fn test_rssi_clamped() {
        let peer = quiet_peer(0.001);
        let rssi = peer.rssi().unwrap();
        assert!(rssi <= 0);

        peer.set_distance(1.0e12);
        assert_eq!(peer.rssi(), Some(-127));
    }

    #[test]
    fn test_negative_distance_clamped() {
        let peer = quiet_peer(-4.0);
        assert_eq!(peer.distance(), 0.0);
    }

    #[test]
    fn test_offline_peer_is_silent() {
        let peer = quiet_peer(2.0);
        peer.set_online(false);
        assert_eq!(peer.rssi(), None);
        assert_eq!(peer.ftm_report(), None);

        peer.set_online(true);
        assert!(peer.rssi().is_some());
    }

    #[test]
    fn test_handles_share_scene() {
        let peer = quiet_peer(2.0);
        let handle = peer.clone();
        handle.set_distance(5.0);
        assert_eq!(peer.distance(), 5.0);
    }

    // ==================== FTM Tests ====================

    #[test]
    fn test_ftm_report_matches_distance() {
        let peer = quiet_peer(3.0);
        let report = peer.ftm_report().unwrap();
        assert_eq!(report.sample_count, 32);
        assert_eq!(report.rtt_ns, 20);
        assert!((report.distance_meters() - 3.0).abs() < 0.05);
    }

    // ==================== Link Tests ====================

    #[test]
    fn test_link_acks_while_online() {
        let peer = quiet_peer(2.0);
        let acks = Arc::new(Mutex::new(Vec::new()));
        let recorder = acks.clone();
        let mut link = SimulatedPeerLink::new(
            peer.clone(),
            Box::new(move |mac, ok| recorder.lock().unwrap().push((mac, ok))),
        );

        link.send(b"Ping 0").unwrap();
        peer.set_online(false);
        link.send(b"Ping 1").unwrap();

        assert_eq!(
            *acks.lock().unwrap(),
            vec![(SIMULATED_PEER_ADDR, true), (SIMULATED_PEER_ADDR, false)]
        );
        assert_eq!(link.peer(), SIMULATED_PEER_ADDR);
    }

    #[test]
    fn test_link_rejects_oversized_payload() {
        let mut link = SimulatedPeerLink::new(quiet_peer(1.0), Box::new(|_, _| {}));
        let payload = [b'x'; MAX_PAYLOAD_LEN + 1];
        assert!(matches!(
            link.send(&payload),
            Err(TransportError::PayloadTooLarge { len: 32, max: 31 })
        ));
    }
}
