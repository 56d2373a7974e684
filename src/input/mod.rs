//! Operator input: the two board buttons and the serial console.
//!
//! Both sources end up as [`Button`] presses fed into the mode machine.
//! The console additionally carries status and simulation commands.

mod console;
mod debounce;

#[cfg(feature = "esp32")]
mod gpio;

pub use console::{ConsoleCommand, HELP_TEXT};
pub use debounce::{ButtonDebouncer, ButtonEdge, DEBOUNCE, POLL_INTERVAL};

#[cfg(feature = "esp32")]
pub use gpio::{spawn_button_poller, BoardDisplay, ButtonPins, StatusLed};

use crate::mode::ModeEvent;

/// One of the two board buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Cycles the mode, toggles calibration.
    Set,
    /// Locks the mode, applies calibration.
    Enter,
}

impl Button {
    pub fn event(self) -> ModeEvent {
        match self {
            Self::Set => ModeEvent::Cycle,
            Self::Enter => ModeEvent::Confirm,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_events() {
        assert_eq!(Button::Set.event(), ModeEvent::Cycle);
        assert_eq!(Button::Enter.event(), ModeEvent::Confirm);
    }
}
