//! FTM initiator sessions and report delivery.
//!
//! The driver posts `WIFI_EVENT_FTM_REPORT` on the default event loop once a
//! session finishes. The handler converts it to an [`FtmReport`] and hands it
//! to the shared [`AppState`].

use super::config::FtmInitiatorConfig;
use super::radio::{RadioError, ResponderInfo};
use crate::ranging::FtmReport;
use crate::state::AppState;
use esp_idf_sys::{self as sys, esp};
use log::{debug, warn};
use std::ffi::c_void;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

/// Where FTM reports go. Set once by [`register_ftm_reports`].
static REPORT_SINK: OnceLock<Arc<AppState>> = OnceLock::new();

/// Route FTM reports into `state`. Only the first call registers a handler.
pub fn register_ftm_reports(state: Arc<AppState>) -> Result<(), RadioError> {
    if REPORT_SINK.set(state).is_err() {
        warn!("FTM report handler already registered");
        return Ok(());
    }
    esp!(unsafe {
        sys::esp_event_handler_register(
            sys::WIFI_EVENT,
            sys::wifi_event_t_WIFI_EVENT_FTM_REPORT as i32,
            Some(on_ftm_report),
            std::ptr::null_mut(),
        )
    })?;
    Ok(())
}

unsafe extern "C" fn on_ftm_report(
    _arg: *mut c_void,
    _base: sys::esp_event_base_t,
    _id: i32,
    data: *mut c_void,
) {
    if data.is_null() {
        return;
    }
    let event = &*(data as *const sys::wifi_event_ftm_report_t);

    // The driver allocates the per-frame entries for us to release.
    if !event.ftm_report_data.is_null() {
        sys::free(event.ftm_report_data as *mut c_void);
    }

    if event.status != sys::wifi_ftm_status_t_FTM_STATUS_SUCCESS {
        warn!("FTM session failed (status {})", event.status);
        return;
    }

    let report = FtmReport::new(event.rtt_est, event.dist_est, event.ftm_report_num_entries);
    if let Some(state) = REPORT_SINK.get() {
        state.on_ftm_report(report, Instant::now());
    }
}

/// Starts FTM sessions against one responder.
#[derive(Debug, Clone)]
pub struct FtmInitiator {
    config: FtmInitiatorConfig,
    responder: ResponderInfo,
}

impl FtmInitiator {
    pub fn new(config: FtmInitiatorConfig, responder: ResponderInfo) -> Self {
        Self { config, responder }
    }

    /// Kick off one session. The result arrives later as a report event.
    pub fn start_session(&self) -> Result<(), RadioError> {
        let mut cfg = sys::wifi_ftm_initiator_cfg_t {
            resp_mac: self.responder.bssid.octets(),
            channel: self.responder.channel,
            frm_count: self.config.frame_count,
            burst_period: self.config.burst_period,
            ..Default::default()
        };
        esp!(unsafe { sys::esp_wifi_ftm_initiate_session(&mut cfg) })?;
        debug!(
            "FTM session started with {} ({} frames, burst period {:?})",
            self.responder.bssid,
            self.config.frame_count,
            self.config.burst_period_duration()
        );
        Ok(())
    }
}
