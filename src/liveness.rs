//! Peer contact freshness.
//!
//! Every received frame, acknowledged send or FTM report stamps the time of
//! last contact. The UI classifies the elapsed time into a handful of
//! connection-health states.
//!
//! # Example
//!
//! ```
//! use std::time::{Duration, Instant};
//! use esp_ranger::liveness::{LivenessState, LivenessTracker};
//!
//! let mut tracker = LivenessTracker::new();
//! let t0 = Instant::now();
//! assert_eq!(tracker.classify(t0), LivenessState::NeverContacted);
//!
//! tracker.record_contact(t0);
//! assert_eq!(tracker.classify(t0 + Duration::from_millis(2500)), LivenessState::Stale);
//! ```

use std::fmt;
use std::time::{Duration, Instant};

/// Below this the peer counts as connected.
pub const FRESH_LIMIT: Duration = Duration::from_millis(2000);

/// Below this the peer counts as briefly silent.
pub const STALE_LIMIT: Duration = Duration::from_millis(4000);

/// At or above this the peer counts as lost.
pub const LOST_AFTER: Duration = Duration::from_millis(8000);

/// Connection health derived from time since last contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LivenessState {
    /// No contact has happened since boot.
    NeverContacted,
    /// Less than 2 s since last contact.
    Fresh,
    /// 2 s up to 4 s.
    Stale,
    /// 4 s up to 8 s.
    VeryStale,
    /// 8 s or more.
    Lost,
}

impl LivenessState {
    /// Classify an elapsed time. Intervals are half-open, lower bound inclusive.
    pub fn from_elapsed(elapsed: Duration) -> Self {
        if elapsed < FRESH_LIMIT {
            Self::Fresh
        } else if elapsed < STALE_LIMIT {
            Self::Stale
        } else if elapsed < LOST_AFTER {
            Self::VeryStale
        } else {
            Self::Lost
        }
    }

    /// Whether live readings may be shown in this state.
    pub fn is_live(&self) -> bool {
        !matches!(self, Self::NeverContacted | Self::Lost)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NeverContacted => "never_contacted",
            Self::Fresh => "fresh",
            Self::Stale => "stale",
            Self::VeryStale => "very_stale",
            Self::Lost => "lost",
        }
    }
}

impl fmt::Display for LivenessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Holds the single last-contact timestamp.
#[derive(Debug, Clone, Default)]
pub struct LivenessTracker {
    last_contact: Option<Instant>,
}

impl LivenessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp a contact at `now`.
    pub fn record_contact(&mut self, now: Instant) {
        self.last_contact = Some(now);
    }

    /// When the peer was last heard from.
    pub fn last_contact(&self) -> Option<Instant> {
        self.last_contact
    }

    /// Time since last contact, or `None` before the first one.
    ///
    /// A `now` earlier than the last contact counts as zero elapsed.
    pub fn since_last_contact(&self, now: Instant) -> Option<Duration> {
        self.last_contact
            .map(|last| now.saturating_duration_since(last))
    }

    /// Classify the peer's freshness at `now`.
    pub fn classify(&self, now: Instant) -> LivenessState {
        match self.since_last_contact(now) {
            None => LivenessState::NeverContacted,
            Some(elapsed) => LivenessState::from_elapsed(elapsed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_never_contacted_regardless_of_now() {
        let tracker = LivenessTracker::new();
        let now = Instant::now();
        assert_eq!(tracker.classify(now), LivenessState::NeverContacted);
        assert_eq!(tracker.classify(now + ms(1)), LivenessState::NeverContacted);
        assert_eq!(
            tracker.classify(now + Duration::from_secs(3600)),
            LivenessState::NeverContacted
        );
        assert_eq!(tracker.since_last_contact(now), None);
    }

    #[test]
    fn test_threshold_boundaries() {
        let mut tracker = LivenessTracker::new();
        let t0 = Instant::now();
        tracker.record_contact(t0);

        let cases = [
            (0, LivenessState::Fresh),
            (1999, LivenessState::Fresh),
            (2000, LivenessState::Stale),
            (3999, LivenessState::Stale),
            (4000, LivenessState::VeryStale),
            (6000, LivenessState::VeryStale),
            (7999, LivenessState::VeryStale),
            (8000, LivenessState::Lost),
            (60_000, LivenessState::Lost),
        ];
        for (elapsed, expected) in cases {
            assert_eq!(
                tracker.classify(t0 + ms(elapsed)),
                expected,
                "at {} ms",
                elapsed
            );
        }
    }

    #[test]
    fn test_new_contact_refreshes() {
        let mut tracker = LivenessTracker::new();
        let t0 = Instant::now();
        tracker.record_contact(t0);
        assert_eq!(tracker.classify(t0 + ms(9000)), LivenessState::Lost);

        tracker.record_contact(t0 + ms(9000));
        assert_eq!(tracker.classify(t0 + ms(9500)), LivenessState::Fresh);
        assert_eq!(tracker.last_contact(), Some(t0 + ms(9000)));
    }

    #[test]
    fn test_now_before_contact_is_fresh() {
        let mut tracker = LivenessTracker::new();
        let t0 = Instant::now();
        tracker.record_contact(t0 + ms(500));
        assert_eq!(tracker.since_last_contact(t0), Some(Duration::ZERO));
        assert_eq!(tracker.classify(t0), LivenessState::Fresh);
    }

    #[test]
    fn test_is_live() {
        assert!(!LivenessState::NeverContacted.is_live());
        assert!(LivenessState::Fresh.is_live());
        assert!(LivenessState::Stale.is_live());
        assert!(LivenessState::VeryStale.is_live());
        assert!(!LivenessState::Lost.is_live());
    }

    #[test]
    fn test_display() {
        assert_eq!(LivenessState::VeryStale.to_string(), "very_stale");
        assert_eq!(LivenessState::NeverContacted.to_string(), "never_contacted");
    }
}
