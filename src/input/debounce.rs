//! Button debouncing.
//!
//! The pins are sampled every [`POLL_INTERVAL`]. A level change is accepted
//! immediately and then further changes are ignored for [`DEBOUNCE`], which
//! swallows contact bounce on both press and release.
//!
//! # Example
//!
//! ```
//! use std::time::{Duration, Instant};
//! use esp_ranger::input::{ButtonDebouncer, ButtonEdge};
//!
//! let mut button = ButtonDebouncer::new();
//! let t0 = Instant::now();
//! assert_eq!(button.update(true, t0), Some(ButtonEdge::Pressed));
//! // Bounce 10 ms later is ignored.
//! assert_eq!(button.update(false, t0 + Duration::from_millis(10)), None);
//! ```

use std::time::{Duration, Instant};

/// How often the button pins are sampled.
pub const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Minimum time between two accepted level changes.
pub const DEBOUNCE: Duration = Duration::from_millis(50);

/// A debounced level change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEdge {
    /// Falling edge on an active-low pin.
    Pressed,
    /// Rising edge.
    Released,
}

/// Debounce state for one button.
#[derive(Debug, Clone, Default)]
pub struct ButtonDebouncer {
    pressed: bool,
    last_change: Option<Instant>,
}

impl ButtonDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Debounced state.
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Feed one sample. Returns the edge if the debounced state changed.
    pub fn update(&mut self, pressed: bool, now: Instant) -> Option<ButtonEdge> {
        if pressed == self.pressed {
            return None;
        }
        if let Some(last) = self.last_change {
            if now.saturating_duration_since(last) < DEBOUNCE {
                return None;
            }
        }

        self.pressed = pressed;
        self.last_change = Some(now);
        Some(if pressed {
            ButtonEdge::Pressed
        } else {
            ButtonEdge::Released
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_clean_press_and_release() {
        let mut button = ButtonDebouncer::new();
        let t0 = Instant::now();

        assert_eq!(button.update(false, t0), None);
        assert_eq!(button.update(true, t0 + ms(20)), Some(ButtonEdge::Pressed));
        assert!(button.is_pressed());
        assert_eq!(button.update(true, t0 + ms(40)), None);
        assert_eq!(
            button.update(false, t0 + ms(200)),
            Some(ButtonEdge::Released)
        );
        assert!(!button.is_pressed());
    }

    #[test]
    fn test_bounce_is_ignored() {
        let mut button = ButtonDebouncer::new();
        let t0 = Instant::now();

        assert_eq!(button.update(true, t0), Some(ButtonEdge::Pressed));
        assert_eq!(button.update(false, t0 + ms(20)), None);
        assert_eq!(button.update(true, t0 + ms(40)), None);
        // Still held after the window: no second press.
        assert_eq!(button.update(true, t0 + ms(60)), None);
        assert!(button.is_pressed());
    }

    #[test]
    fn test_release_after_window_lands_late() {
        let mut button = ButtonDebouncer::new();
        let t0 = Instant::now();

        button.update(true, t0);
        // Quick tap: released inside the window, seen on the next poll after it.
        assert_eq!(button.update(false, t0 + ms(40)), None);
        assert_eq!(
            button.update(false, t0 + ms(60)),
            Some(ButtonEdge::Released)
        );
    }

    #[test]
    fn test_one_press_per_hold() {
        let mut button = ButtonDebouncer::new();
        let t0 = Instant::now();
        let presses = (0..50)
            .filter_map(|i| button.update(true, t0 + POLL_INTERVAL * i))
            .filter(|e| *e == ButtonEdge::Pressed)
            .count();
        assert_eq!(presses, 1);
    }
}
