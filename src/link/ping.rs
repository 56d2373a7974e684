//! Periodic ping frames for sender mode.
//!
//! The sender pushes `"Ping N"` to its peer once per [`SEND_INTERVAL`]. A
//! failed send is logged and left alone; the next tick is the retry.

use super::{PeerLink, TransportError};
use log::{debug, error};
use std::time::Duration;

/// How often the sender transmits.
pub const SEND_INTERVAL: Duration = Duration::from_millis(1000);

/// Longest payload the sender produces (fits a 32-byte C buffer with NUL).
pub const MAX_PAYLOAD_LEN: usize = 31;

/// Builds numbered ping payloads and sends one per tick.
#[derive(Debug, Default)]
pub struct PingSender {
    counter: u32,
    sent: u64,
    failed: u64,
}

impl PingSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Payload for the next ping. Advances the counter, wrapping at `u32::MAX`.
    pub fn next_payload(&mut self) -> String {
        let payload = format!("Ping {}", self.counter);
        self.counter = self.counter.wrapping_add(1);
        payload
    }

    /// Send one ping over `link`.
    pub fn tick(&mut self, link: &mut dyn PeerLink) -> Result<(), TransportError> {
        let payload = self.next_payload();
        debug_assert!(payload.len() <= MAX_PAYLOAD_LEN);

        match link.send(payload.as_bytes()) {
            Ok(()) => {
                self.sent += 1;
                debug!("Queued '{}' for {}", payload, link.peer());
                Ok(())
            }
            Err(e) => {
                self.failed += 1;
                error!("Error sending '{}' to {}: {}", payload, link.peer(), e);
                Err(e)
            }
        }
    }

    /// Sends handed to the transport successfully.
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Sends the transport refused.
    pub fn failed(&self) -> u64 {
        self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::MacAddr;

    /// Records payloads; fails every call while `fail` is set.
    struct RecordingLink {
        frames: Vec<Vec<u8>>,
        fail: bool,
    }

    impl PeerLink for RecordingLink {
        fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
            if self.fail {
                return Err(TransportError::PeerUnavailable);
            }
            self.frames.push(payload.to_vec());
            Ok(())
        }

        fn peer(&self) -> MacAddr {
            MacAddr::BROADCAST
        }
    }

    #[test]
    fn test_payload_counter() {
        let mut sender = PingSender::new();
        assert_eq!(sender.next_payload(), "Ping 0");
        assert_eq!(sender.next_payload(), "Ping 1");
        assert_eq!(sender.next_payload(), "Ping 2");
    }

    #[test]
    fn test_payload_wraps_and_fits() {
        let mut sender = PingSender {
            counter: u32::MAX,
            ..Default::default()
        };
        let longest = sender.next_payload();
        assert_eq!(longest, format!("Ping {}", u32::MAX));
        assert!(longest.len() <= MAX_PAYLOAD_LEN);
        assert_eq!(sender.next_payload(), "Ping 0");
    }

    #[test]
    fn test_tick_sends_one_frame() {
        let mut link = RecordingLink {
            frames: Vec::new(),
            fail: false,
        };
        let mut sender = PingSender::new();
        sender.tick(&mut link).unwrap();
        sender.tick(&mut link).unwrap();

        assert_eq!(link.frames, vec![b"Ping 0".to_vec(), b"Ping 1".to_vec()]);
        assert_eq!(sender.sent(), 2);
        assert_eq!(sender.failed(), 0);
    }

    #[test]
    fn test_failed_tick_is_not_retried() {
        let mut link = RecordingLink {
            frames: Vec::new(),
            fail: true,
        };
        let mut sender = PingSender::new();
        assert!(matches!(
            sender.tick(&mut link),
            Err(TransportError::PeerUnavailable)
        ));
        assert!(link.frames.is_empty());
        assert_eq!(sender.failed(), 1);

        // Next tick carries on with the next counter value.
        link.fail = false;
        sender.tick(&mut link).unwrap();
        assert_eq!(link.frames, vec![b"Ping 1".to_vec()]);
    }
}
