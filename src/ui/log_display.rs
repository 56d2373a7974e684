use super::{GaugeView, LedView, StatusDisplay};
use log::{debug, info};

/// Renders the UI into the log, one line per change.
///
/// Used on the host and for boards without a panel. The gauge refreshes ten
/// times a second, so identical frames are suppressed.
#[derive(Debug, Default)]
pub struct LogDisplay {
    last_gauge: Option<GaugeView>,
    last_status: Option<String>,
    last_led: Option<LedView>,
}

impl LogDisplay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatusDisplay for LogDisplay {
    fn show_gauge(&mut self, gauge: &GaugeView) {
        if self.last_gauge.as_ref() == Some(gauge) {
            return;
        }
        match gauge.meters {
            Some(m) => debug!("[gauge] {:>3}% {:.2} m", gauge.percent, m),
            None => debug!("[gauge] ---% --"),
        }
        self.last_gauge = Some(*gauge);
    }

    fn show_status(&mut self, text: &str) {
        if self.last_status.as_deref() == Some(text) {
            return;
        }
        info!("[status] {}", text);
        self.last_status = Some(text.to_string());
    }

    fn show_led(&mut self, led: LedView) {
        if self.last_led == Some(led) {
            return;
        }
        debug!("[led] {:?} {}", led.color, if led.lit { "on" } else { "off" });
        self.last_led = Some(led);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::LedColor;

    #[test]
    fn test_remembers_last_frame() {
        let mut display = LogDisplay::new();
        display.show_status("Select: ESP-NOW Receiver");
        display.show_status("Select: ESP-NOW Receiver");
        assert_eq!(
            display.last_status.as_deref(),
            Some("Select: ESP-NOW Receiver")
        );

        let gauge = GaugeView {
            percent: 35,
            meters: Some(3.5),
        };
        display.show_gauge(&gauge);
        assert_eq!(display.last_gauge, Some(gauge));

        let led = LedView {
            color: LedColor::Green,
            lit: true,
        };
        display.show_led(led);
        assert_eq!(display.last_led, Some(led));
    }
}
