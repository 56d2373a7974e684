//! Device mode selection and the receiver calibration sub-flow.
//!
//! Two buttons drive everything:
//!
//! - **set** ([`ModeEvent::Cycle`]): while the selection is open, advance to
//!   the next mode. Once locked as a receiver, toggle calibration on/off.
//! - **enter** ([`ModeEvent::Confirm`]): lock the selection. While
//!   calibrating, apply the current RSSI as the new one-meter reference.
//!
//! The machine is a pure function over [`ModeState`]; side effects are
//! returned as a [`ModeEffect`] for the owner to carry out.
//!
//! ```text
//!  Open:    Receiver -> Sender -> FtmClient -> FtmResponder -> Receiver   (set)
//!           any --enter--> Locked(mode)
//!  Locked(Receiver):  Idle --set--> Sampling --set--> Idle (abort)
//!                              Sampling --enter--> Idle (apply)
//! ```

use std::fmt;

/// Operating mode of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceMode {
    /// Sends a ping frame to the peer every second.
    EspNowSender,
    /// Estimates distance from the RSSI of received pings.
    EspNowReceiver,
    /// Initiates FTM sessions against a responder.
    FtmClient,
    /// Runs a SoftAP that answers FTM requests.
    FtmResponder,
}

impl DeviceMode {
    /// Next mode in selection order.
    pub fn next(self) -> Self {
        match self {
            Self::EspNowReceiver => Self::EspNowSender,
            Self::EspNowSender => Self::FtmClient,
            Self::FtmClient => Self::FtmResponder,
            Self::FtmResponder => Self::EspNowReceiver,
        }
    }

    /// Whether this mode ranges from received frames and can be calibrated.
    pub fn is_receiver(self) -> bool {
        self == Self::EspNowReceiver
    }

    /// Short label for the display.
    pub fn label(self) -> &'static str {
        match self {
            Self::EspNowSender => "ESP-NOW Sender",
            Self::EspNowReceiver => "ESP-NOW Receiver",
            Self::FtmClient => "FTM Client",
            Self::FtmResponder => "FTM Responder",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::EspNowSender => "espnow_sender",
            Self::EspNowReceiver => "espnow_receiver",
            Self::FtmClient => "ftm_client",
            Self::FtmResponder => "ftm_responder",
        }
    }
}

impl fmt::Display for DeviceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether the mode can still be changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Open,
    Locked,
}

/// Calibration sub-state of a locked receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibStep {
    /// Normal distance readout (step 0).
    Idle,
    /// Waiting for the operator to confirm the one-meter position (step 1).
    Sampling,
}

impl CalibStep {
    /// Numeric step as shown on the display.
    pub fn index(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Sampling => 1,
        }
    }
}

/// Button-driven input to the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeEvent {
    /// The "set" button.
    Cycle,
    /// The "enter" button.
    Confirm,
}

/// What the owner of the state has to do after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeEffect {
    /// Nothing changed.
    None,
    /// A different mode is now highlighted.
    ModeChanged(DeviceMode),
    /// Selection is final; start this mode's radio role.
    SelectionLocked(DeviceMode),
    /// Distance readout paused, waiting for the one-meter position.
    CalibrationStarted,
    /// Calibration left without applying anything.
    CalibrationAborted,
    /// Apply the current RSSI as the one-meter reference.
    ApplyCalibration,
}

/// Full state of the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeState {
    pub mode: DeviceMode,
    pub selection: Selection,
    pub calib: CalibStep,
}

impl Default for ModeState {
    fn default() -> Self {
        Self {
            mode: DeviceMode::EspNowReceiver,
            selection: Selection::Open,
            calib: CalibStep::Idle,
        }
    }
}

impl ModeState {
    pub fn is_locked(&self) -> bool {
        self.selection == Selection::Locked
    }

    /// Whether the receiver is in the calibration step.
    pub fn is_calibrating(&self) -> bool {
        self.calib == CalibStep::Sampling
    }
}

/// Pure transition function.
pub fn transition(state: ModeState, event: ModeEvent) -> (ModeState, ModeEffect) {
    use CalibStep::{Idle, Sampling};
    use Selection::{Locked, Open};

    match (state.selection, state.calib, event) {
        (Open, _, ModeEvent::Cycle) => {
            let mode = state.mode.next();
            (ModeState { mode, ..state }, ModeEffect::ModeChanged(mode))
        }
        (Open, _, ModeEvent::Confirm) => (
            ModeState {
                selection: Locked,
                calib: Idle,
                ..state
            },
            ModeEffect::SelectionLocked(state.mode),
        ),
        (Locked, Idle, ModeEvent::Cycle) if state.mode.is_receiver() => (
            ModeState {
                calib: Sampling,
                ..state
            },
            ModeEffect::CalibrationStarted,
        ),
        (Locked, Sampling, ModeEvent::Cycle) => (
            ModeState {
                calib: Idle,
                ..state
            },
            ModeEffect::CalibrationAborted,
        ),
        (Locked, Sampling, ModeEvent::Confirm) => (
            ModeState {
                calib: Idle,
                ..state
            },
            ModeEffect::ApplyCalibration,
        ),
        (Locked, Idle, _) => (state, ModeEffect::None),
    }
}

/// Owned selector wrapping [`transition`].
#[derive(Debug, Clone, Default)]
pub struct ModeSelector {
    state: ModeState,
}

impl ModeSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ModeState {
        self.state
    }

    pub fn mode(&self) -> DeviceMode {
        self.state.mode
    }

    pub fn calibration_step(&self) -> CalibStep {
        self.state.calib
    }

    /// Apply an event and return the effect to carry out.
    pub fn handle(&mut self, event: ModeEvent) -> ModeEffect {
        let (next, effect) = transition(self.state, event);
        self.state = next;
        effect
    }

    /// The "set" button.
    pub fn cycle(&mut self) -> ModeEffect {
        self.handle(ModeEvent::Cycle)
    }

    /// The "enter" button.
    pub fn confirm(&mut self) -> ModeEffect {
        self.handle(ModeEvent::Confirm)
    }
}
