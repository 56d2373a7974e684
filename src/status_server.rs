//! HTTP status server.
//!
//! Serves the UI read surface as JSON on `/status`. Uses `tiny_http`, which
//! works on both host and ESP32 (via std::net).
//!
//! # Example Response
//!
//! ```json
//! {
//!   "mode": "espnow_receiver",
//!   "selection_locked": true,
//!   "calibration_step": 0,
//!   "rssi": -60,
//!   "distance_m": 3.54,
//!   "reference_rssi": -51.0,
//!   "path_loss_exponent": 1.64,
//!   "liveness": "fresh",
//!   "ms_since_contact": 420,
//!   "ftm": null,
//!   "counters": { "frames_received": 12, "frames_dropped": 0, ... }
//! }
//! ```

use crate::state::{AppState, LinkCounters, StatusSnapshot};
use log::{error, info, warn};
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tiny_http::{Header, Method, Response, Server};

/// Default port for the status server.
pub const DEFAULT_STATUS_PORT: u16 = 8080;

/// How long the server loop waits for a request before checking for shutdown.
const POLL_TIMEOUT: Duration = Duration::from_millis(100);

fn json_opt<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "null".to_string(), |v| v.to_string())
}

impl LinkCounters {
    fn to_json(&self) -> String {
        format!(
            r#"{{"frames_received":{},"frames_dropped":{},"sends_acked":{},"sends_failed":{},"ftm_reports":{}}}"#,
            self.frames_received,
            self.frames_dropped,
            self.sends_acked,
            self.sends_failed,
            self.ftm_reports
        )
    }
}

impl StatusSnapshot {
    /// Serialize to JSON.
    pub fn to_json(&self) -> String {
        let ftm = match self.ftm {
            Some(r) => format!(
                r#"{{"rtt_ns":{},"distance_cm":{},"sample_count":{}}}"#,
                r.rtt_ns, r.distance_cm, r.sample_count
            ),
            None => "null".to_string(),
        };
        let distance = json_opt(
            self.distance_m
                .filter(|m| m.is_finite())
                .map(|m| format!("{:.2}", m)),
        );

        format!(
            r#"{{"mode":"{}","selection_locked":{},"calibration_step":{},"rssi":{},"distance_m":{},"reference_rssi":{:.1},"path_loss_exponent":{:.2},"liveness":"{}","ms_since_contact":{},"ftm":{},"counters":{}}}"#,
            self.mode.mode.as_str(),
            self.mode.is_locked(),
            self.mode.calib.index(),
            json_opt(self.rssi),
            distance,
            self.calibration.reference_rssi,
            self.calibration.path_loss_exponent,
            self.liveness.as_str(),
            json_opt(self.since_contact.map(|d| d.as_millis())),
            ftm,
            self.counters.to_json()
        )
    }
}

/// HTTP status server.
///
/// Runs in a background thread and serves the current snapshot as JSON.
pub struct StatusServer {
    handle: Option<thread::JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl StatusServer {
    /// Start the server on `bind_addr:port` (`None` binds 0.0.0.0).
    ///
    /// Drop the returned handle to stop it.
    pub fn start(
        bind_addr: Option<IpAddr>,
        port: u16,
        state: Arc<AppState>,
    ) -> Result<Self, std::io::Error> {
        let addr = match bind_addr {
            Some(ip) => format!("{}:{}", ip, port),
            None => format!("0.0.0.0:{}", port),
        };

        let server = Server::http(&addr)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::AddrInUse, format!("{}", e)))?;

        info!("Status server listening on http://{}/status", addr);

        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let handle = thread::Builder::new()
            .name("status-http".into())
            .spawn(move || Self::run_server(server, state, shutdown_clone))?;

        Ok(Self {
            handle: Some(handle),
            shutdown,
        })
    }

    fn run_server(server: Server, state: Arc<AppState>, shutdown: Arc<AtomicBool>) {
        let headers = match ResponseHeaders::new() {
            Some(h) => h,
            None => {
                error!("Status server: failed to build response headers");
                return;
            }
        };

        loop {
            if shutdown.load(Ordering::Acquire) {
                info!("Status server shutting down");
                break;
            }

            match server.recv_timeout(POLL_TIMEOUT) {
                Ok(Some(request)) => {
                    let (status, body) = route(request.method(), request.url(), &state);
                    let mut response = Response::from_string(body).with_status_code(status);
                    match status {
                        200 => response = response.with_header(headers.json.clone()),
                        302 => response = response.with_header(headers.location.clone()),
                        405 => response = response.with_header(headers.allow_get.clone()),
                        _ => {}
                    }
                    if let Err(e) = request.respond(response) {
                        warn!("Failed to send response: {}", e);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    error!("Server error: {}", e);
                    break;
                }
            }
        }
    }

    /// Stop the server. May take up to one poll interval.
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for StatusServer {
    fn drop(&mut self) {
        self.stop();
    }
}

struct ResponseHeaders {
    json: Header,
    location: Header,
    allow_get: Header,
}

impl ResponseHeaders {
    fn new() -> Option<Self> {
        Some(Self {
            json: Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).ok()?,
            location: Header::from_bytes(&b"Location"[..], &b"/status"[..]).ok()?,
            allow_get: Header::from_bytes(&b"Allow"[..], &b"GET"[..]).ok()?,
        })
    }
}

/// Status code and body for one request.
fn route(method: &Method, path: &str, state: &AppState) -> (u16, String) {
    if method != &Method::Get {
        return (405, "Method Not Allowed".to_string());
    }
    match path {
        "/status" | "/status/" => (200, state.snapshot(Instant::now()).to_json()),
        "/" => (302, "See /status for ranging status".to_string()),
        _ => (404, "Not Found".to_string()),
    }
}
