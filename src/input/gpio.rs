//! Board buttons and status LED (ESP32 only).
//!
//! | Signal | GPIO | Notes |
//! |--------|------|-------|
//! | Enter button | 8 | active low, internal pull-up |
//! | Set button | 10 | active low, internal pull-up |
//! | Status LED | 11 | active high |

use super::{Button, ButtonDebouncer, ButtonEdge, POLL_INTERVAL};
use crate::ui::{GaugeView, LedColor, LedView, LogDisplay, StatusDisplay};
use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, Input, Output, PinDriver, Pull};
use esp_idf_sys::EspError;
use log::{debug, info, warn};
use std::thread;
use std::time::Instant;

/// Stack for the polling thread; it only reads two pins.
const POLLER_STACK_SIZE: usize = 4096;

/// The two button inputs, configured with pull-ups.
pub struct ButtonPins {
    set: PinDriver<'static, AnyIOPin, Input>,
    enter: PinDriver<'static, AnyIOPin, Input>,
}

impl ButtonPins {
    pub fn new(set: AnyIOPin, enter: AnyIOPin) -> Result<Self, EspError> {
        let mut set = PinDriver::input(set)?;
        set.set_pull(Pull::Up)?;
        let mut enter = PinDriver::input(enter)?;
        enter.set_pull(Pull::Up)?;
        Ok(Self { set, enter })
    }
}

/// Poll both buttons on a dedicated thread and report presses.
///
/// The thread exits once `on_press` returns false.
pub fn spawn_button_poller<F>(
    pins: ButtonPins,
    mut on_press: F,
) -> std::io::Result<thread::JoinHandle<()>>
where
    F: FnMut(Button) -> bool + Send + 'static,
{
    thread::Builder::new()
        .name("buttons".into())
        .stack_size(POLLER_STACK_SIZE)
        .spawn(move || {
            let mut set = ButtonDebouncer::new();
            let mut enter = ButtonDebouncer::new();
            info!("Button poller started");

            loop {
                let now = Instant::now();
                let inputs = [
                    (Button::Set, set.update(pins.set.is_low(), now)),
                    (Button::Enter, enter.update(pins.enter.is_low(), now)),
                ];
                for (button, edge) in inputs {
                    match edge {
                        Some(ButtonEdge::Pressed) => {
                            debug!("{:?} pressed", button);
                            if !on_press(button) {
                                info!("Button poller stopping");
                                return;
                            }
                        }
                        Some(ButtonEdge::Released) => debug!("{:?} released", button),
                        None => {}
                    }
                }
                thread::sleep(POLL_INTERVAL);
            }
        })
}

/// Single-color status LED.
pub struct StatusLed {
    pin: PinDriver<'static, AnyOutputPin, Output>,
}

impl StatusLed {
    pub fn new(pin: AnyOutputPin) -> Result<Self, EspError> {
        let mut pin = PinDriver::output(pin)?;
        pin.set_low()?;
        Ok(Self { pin })
    }

    pub fn set(&mut self, on: bool) -> Result<(), EspError> {
        if on {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        }
    }
}

/// Board renderer: text and gauge go to the log, liveness drives the LED.
pub struct BoardDisplay {
    text: LogDisplay,
    led: StatusLed,
}

impl BoardDisplay {
    pub fn new(led: StatusLed) -> Self {
        Self {
            text: LogDisplay::new(),
            led,
        }
    }
}

impl StatusDisplay for BoardDisplay {
    fn show_gauge(&mut self, gauge: &GaugeView) {
        self.text.show_gauge(gauge);
    }

    fn show_status(&mut self, text: &str) {
        self.text.show_status(text);
    }

    fn show_led(&mut self, led: LedView) {
        // A single-color LED can only blink; a lost peer keeps it dark.
        let on = led.lit && !matches!(led.color, LedColor::Off | LedColor::Red);
        if let Err(e) = self.led.set(on) {
            warn!("Failed to drive status LED: {:?}", e);
        }
        self.text.show_led(led);
    }
}
