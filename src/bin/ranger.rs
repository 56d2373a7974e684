//! Distance ranger binary.
//!
//! Runs on both ESP32 and host platforms:
//! - **Host**: `cargo run --bin ranger` (ranges against a simulated peer)
//! - **ESP32**: `cargo espflash flash --bin ranger --features esp32 --release`
//!
//! ## Buttons
//!
//! - **set** (GPIO10): cycle the mode; on a locked receiver, start or abort calibration
//! - **enter** (GPIO8): lock the mode; while calibrating, apply the current RSSI as 1 m
//!
//! ## Console Commands
//!
//! Connect via serial monitor (or use the terminal on host) and type:
//! - `set`, `enter` - same as the buttons
//! - `status` - show the current snapshot
//! - `move <meters>`, `peer on|off` - drive the simulated peer (host only)
//! - `help` - show help
//!
//! ## Endpoints
//!
//! - Status (host): http://localhost:8080/status

use esp_ranger::input::{Button, ConsoleCommand, HELP_TEXT};
use esp_ranger::ui::{
    gauge_view, status_text, LedIndicator, StatusDisplay, GAUGE_REFRESH, LED_REFRESH,
    STATUS_REFRESH,
};
use esp_ranger::{AppState, ModeEffect, ModeEvent, RangingConfig};
use log::{error, info, warn};
use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

// ESP32: Initialize ESP-IDF before anything else
#[cfg(feature = "esp32")]
fn platform_init() {
    esp_idf_sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    info!("ESP-IDF initialized");
}

// Host: Just initialize env_logger
#[cfg(not(feature = "esp32"))]
fn platform_init() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

/// Something the operator did.
enum Input {
    Button(Button),
    Console(ConsoleCommand),
}

/// Print a line to the console.
fn print_console(msg: &str) {
    println!("{}", msg);
    let _ = std::io::stdout().flush();
}

/// Print the prompt.
fn print_prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    platform_init();

    info!("=== ESP Ranger starting ===");

    let config = match RangingConfig::from_build_env() {
        Ok(config) => config,
        Err(e) => {
            warn!("Invalid build configuration ({}), using defaults", e);
            RangingConfig::default()
        }
    };
    info!(
        "Calibration: {} dBm at 1 m, n={}; peer {}",
        config.calibration.reference_rssi, config.calibration.path_loss_exponent, config.peer
    );

    let state = Arc::new(AppState::from_config(&config));
    let cancel = CancellationToken::new();
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<Input>();

    let (mut platform, display) = match platform::Platform::new(&config, input_tx.clone()) {
        Ok(p) => p,
        Err(e) => {
            error!("Platform setup failed: {}", e);
            return;
        }
    };

    #[cfg(not(feature = "esp32"))]
    let _status_server = {
        use esp_ranger::{StatusServer, DEFAULT_STATUS_PORT};
        match StatusServer::start(None, DEFAULT_STATUS_PORT, state.clone()) {
            Ok(server) => {
                info!(
                    "Status server at http://localhost:{}/status",
                    DEFAULT_STATUS_PORT
                );
                Some(server)
            }
            Err(e) => {
                warn!("Failed to start status server: {}", e);
                None
            }
        }
    };

    let ui_task = tokio::spawn(run_ui(
        state.clone(),
        display,
        config.gauge_max_meters,
        cancel.clone(),
    ));

    // input_tx stays alive in main so the channel never closes on console EOF.
    if let Err(e) = spawn_console_reader(input_tx.clone()) {
        warn!("Console unavailable: {}", e);
    }

    print_console("");
    print_console("=== ESP Ranger ===");
    print_console("Press set to choose a mode, enter to start. Type 'help' for commands");
    print_console("");
    print_prompt();

    loop {
        #[cfg(not(feature = "esp32"))]
        let shutdown = tokio::signal::ctrl_c();
        #[cfg(feature = "esp32")]
        let shutdown = std::future::pending::<std::io::Result<()>>();

        tokio::select! {
            _ = shutdown => {
                print_console("\nShutting down...");
                break;
            }
            input = input_rx.recv() => {
                let Some(input) = input else { break };
                if let Err(e) = handle_input(input, &state, &mut platform, &cancel) {
                    error!("Failed to start role: {}", e);
                    break;
                }
            }
        }
    }

    cancel.cancel();
    if let Err(e) = ui_task.await {
        error!("UI task error: {}", e);
    }
    info!("Shutdown complete");
}

/// Read console lines on a plain thread so a blocked read never holds up shutdown.
fn spawn_console_reader(input: UnboundedSender<Input>) -> std::io::Result<()> {
    std::thread::Builder::new()
        .name("console".into())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if input.send(Input::Console(ConsoleCommand::parse(&line))).is_err() {
                    break;
                }
            }
        })?;
    Ok(())
}

fn handle_input(
    input: Input,
    state: &Arc<AppState>,
    platform: &mut platform::Platform,
    cancel: &CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    match input {
        Input::Button(button) => press(button.event(), state, platform, cancel),
        Input::Console(cmd) => {
            let result = handle_command(cmd, state, platform, cancel);
            print_prompt();
            result
        }
    }
}

fn handle_command(
    cmd: ConsoleCommand,
    state: &Arc<AppState>,
    platform: &mut platform::Platform,
    cancel: &CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        ConsoleCommand::Set => return press(ModeEvent::Cycle, state, platform, cancel),
        ConsoleCommand::Enter => return press(ModeEvent::Confirm, state, platform, cancel),
        ConsoleCommand::Status => {
            let snapshot = state.snapshot(Instant::now());
            print_console(&status_text(&snapshot));
            print_console(&snapshot.to_json());
        }
        ConsoleCommand::Help => print_console(HELP_TEXT),
        ConsoleCommand::Move { .. } | ConsoleCommand::Peer { .. } => platform.simulate(&cmd),
        ConsoleCommand::Unknown(msg) => {
            if !msg.is_empty() {
                print_console(&msg);
            }
        }
    }
    Ok(())
}

fn press(
    event: ModeEvent,
    state: &Arc<AppState>,
    platform: &mut platform::Platform,
    cancel: &CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    if let ModeEffect::SelectionLocked(mode) = state.press(event) {
        platform.start_role(mode, state.clone(), cancel.clone())?;
    }
    Ok(())
}

/// Refresh the three UI elements on their own cadences.
async fn run_ui(
    state: Arc<AppState>,
    mut display: Box<dyn StatusDisplay>,
    gauge_max_meters: f32,
    cancel: CancellationToken,
) {
    let mut gauge_timer = tokio::time::interval(GAUGE_REFRESH);
    let mut status_timer = tokio::time::interval(STATUS_REFRESH);
    let mut led_timer = tokio::time::interval(LED_REFRESH);
    for timer in [&mut gauge_timer, &mut status_timer, &mut led_timer] {
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    }
    let mut led = LedIndicator::new();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("UI task shutting down");
                break;
            }
            _ = gauge_timer.tick() => {
                let snapshot = state.snapshot(Instant::now());
                display.show_gauge(&gauge_view(&snapshot, gauge_max_meters));
            }
            _ = status_timer.tick() => {
                let snapshot = state.snapshot(Instant::now());
                display.show_status(&status_text(&snapshot));
            }
            _ = led_timer.tick() => {
                let snapshot = state.snapshot(Instant::now());
                display.show_led(led.update(&snapshot));
            }
        }
    }
}

/// Run `tick` every `period` until cancelled.
fn spawn_periodic<F>(
    name: &'static str,
    period: std::time::Duration,
    cancel: CancellationToken,
    mut tick: F,
) where
    F: FnMut() + Send + 'static,
{
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("{} task shutting down", name);
                    break;
                }
                _ = timer.tick() => tick(),
            }
        }
    });
}

#[cfg(not(feature = "esp32"))]
mod platform {
    //! Host: the peer is simulated in-process.

    use super::{print_console, spawn_periodic, Input};
    use esp_ranger::input::ConsoleCommand;
    use esp_ranger::link::{PingSender, SimulatedPeer, SimulatedPeerLink};
    use esp_ranger::ui::{LogDisplay, StatusDisplay};
    use esp_ranger::wifi::FtmInitiatorConfig;
    use esp_ranger::{AppState, DeviceMode, RangingConfig};
    use log::{debug, info};
    use std::sync::Arc;
    use std::time::{Duration, Instant};
    use tokio::sync::mpsc::UnboundedSender;
    use tokio_util::sync::CancellationToken;

    /// Where the simulated peer starts.
    const INITIAL_DISTANCE_M: f32 = 2.0;

    pub struct Platform {
        peer: SimulatedPeer,
        send_interval: Duration,
        ftm: FtmInitiatorConfig,
    }

    impl Platform {
        pub fn new(
            config: &RangingConfig,
            _input: UnboundedSender<Input>,
        ) -> Result<(Self, Box<dyn StatusDisplay>), Box<dyn std::error::Error>> {
            let peer = SimulatedPeer::new(config.calibration, INITIAL_DISTANCE_M);
            info!(
                "Platform: Host (simulated peer {} at {:.1} m)",
                peer.address(),
                INITIAL_DISTANCE_M
            );
            let platform = Self {
                peer,
                send_interval: config.send_interval,
                ftm: FtmInitiatorConfig::default(),
            };
            Ok((platform, Box::new(LogDisplay::new())))
        }

        pub fn start_role(
            &mut self,
            mode: DeviceMode,
            state: Arc<AppState>,
            cancel: CancellationToken,
        ) -> Result<(), Box<dyn std::error::Error>> {
            match mode {
                DeviceMode::EspNowReceiver => {
                    let peer = self.peer.clone();
                    let mut pings = PingSender::new();
                    spawn_periodic("receiver", self.send_interval, cancel, move || {
                        if let Some(rssi) = peer.rssi() {
                            let payload = pings.next_payload();
                            // Frames from the simulator are always well formed.
                            let _ = state.on_frame_received(
                                Some(peer.address()),
                                rssi,
                                payload.as_bytes(),
                                Instant::now(),
                            );
                        }
                    });
                }
                DeviceMode::EspNowSender => {
                    let ack_state = state.clone();
                    let mut link = SimulatedPeerLink::new(
                        self.peer.clone(),
                        Box::new(move |peer, ok| {
                            ack_state.on_send_complete(peer, ok, Instant::now())
                        }),
                    );
                    let mut pings = PingSender::new();
                    spawn_periodic("sender", self.send_interval, cancel, move || {
                        // Failures are logged by the sender; the next tick retries.
                        let _ = pings.tick(&mut link);
                    });
                }
                DeviceMode::FtmClient => {
                    let peer = self.peer.clone();
                    spawn_periodic("ftm", self.ftm.session_interval, cancel, move || {
                        match peer.ftm_report() {
                            Some(report) => state.on_ftm_report(report, Instant::now()),
                            None => debug!("FTM session timed out"),
                        }
                    });
                }
                DeviceMode::FtmResponder => {
                    info!("FTM responder has no counterpart on host; serving nothing");
                }
            }
            info!("Started {}", mode);
            Ok(())
        }

        pub fn simulate(&self, cmd: &ConsoleCommand) {
            match *cmd {
                ConsoleCommand::Move { meters } => {
                    self.peer.set_distance(meters);
                    print_console(&format!("Peer moved to {:.2} m", meters));
                }
                ConsoleCommand::Peer { online } => {
                    self.peer.set_online(online);
                    print_console(if online { "Peer online" } else { "Peer offline" });
                }
                _ => {}
            }
        }
    }
}

#[cfg(feature = "esp32")]
mod platform {
    //! ESP32: real radio, buttons and LED.

    use super::{print_console, spawn_periodic, Input};
    use esp_ranger::input::{
        spawn_button_poller, BoardDisplay, ButtonPins, ConsoleCommand, StatusLed,
    };
    use esp_ranger::link::{EspNowLink, PingSender};
    use esp_ranger::ui::StatusDisplay;
    use esp_ranger::wifi::{
        register_ftm_reports, FtmInitiator, FtmInitiatorConfig, ResponderApConfig, WifiRadio,
    };
    use esp_ranger::{AppState, DeviceMode, MacAddr, RangingConfig};
    use esp_idf_hal::gpio::{IOPin, OutputPin};
    use esp_idf_hal::peripherals::Peripherals;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use log::{error, info};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedSender;
    use tokio_util::sync::CancellationToken;

    pub struct Platform {
        radio: WifiRadio,
        peer: MacAddr,
        send_interval: Duration,
        /// Kept alive so the receive callbacks stay registered.
        receiver_link: Option<EspNowLink>,
    }

    impl Platform {
        pub fn new(
            config: &RangingConfig,
            input: UnboundedSender<Input>,
        ) -> Result<(Self, Box<dyn StatusDisplay>), Box<dyn std::error::Error>> {
            info!("Platform: ESP32");
            let peripherals = Peripherals::take()?;
            let sysloop = EspSystemEventLoop::take()?;

            let pins = ButtonPins::new(
                peripherals.pins.gpio10.downgrade(),
                peripherals.pins.gpio8.downgrade(),
            )?;
            spawn_button_poller(pins, move |button| input.send(Input::Button(button)).is_ok())?;

            let led = StatusLed::new(peripherals.pins.gpio11.downgrade_output())?;
            let radio = WifiRadio::new(peripherals.modem, sysloop)?;

            let platform = Self {
                radio,
                peer: config.peer,
                send_interval: config.send_interval,
                receiver_link: None,
            };
            Ok((platform, Box::new(BoardDisplay::new(led))))
        }

        pub fn start_role(
            &mut self,
            mode: DeviceMode,
            state: Arc<AppState>,
            cancel: CancellationToken,
        ) -> Result<(), Box<dyn std::error::Error>> {
            match mode {
                DeviceMode::EspNowReceiver => {
                    self.radio.start_espnow()?;
                    let link = EspNowLink::new(self.peer)?;
                    link.route_received(state.clone())?;
                    link.route_send_status(state)?;
                    self.receiver_link = Some(link);
                }
                DeviceMode::EspNowSender => {
                    self.radio.start_espnow()?;
                    let mut link = EspNowLink::new(self.peer)?;
                    link.route_received(state.clone())?;
                    link.route_send_status(state)?;
                    let mut pings = PingSender::new();
                    spawn_periodic("sender", self.send_interval, cancel, move || {
                        // Failures are logged by the sender; the next tick retries.
                        let _ = pings.tick(&mut link);
                    });
                }
                DeviceMode::FtmClient => {
                    let config = FtmInitiatorConfig::default();
                    let responder = self.radio.start_ftm_client(&config)?;
                    register_ftm_reports(state)?;
                    let interval = config.session_interval;
                    let initiator = FtmInitiator::new(config, responder);
                    spawn_periodic("ftm", interval, cancel, move || {
                        if let Err(e) = initiator.start_session() {
                            error!("Failed to start FTM session: {}", e);
                        }
                    });
                }
                DeviceMode::FtmResponder => {
                    self.radio.start_ftm_responder(&ResponderApConfig::default())?;
                }
            }
            info!("Started {}", mode);
            Ok(())
        }

        pub fn simulate(&self, _cmd: &ConsoleCommand) {
            print_console("Peer simulation is only available on host");
        }
    }
}
