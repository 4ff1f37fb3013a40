use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Deserialize;

use crate::models::config::{
    CaptureConfiguration, EncoderConfig, SessionTuning, DEFAULT_FILE_NAME_FORMAT, DEFAULT_SAMPLE_RATE,
};
use crate::models::encoder::DEFAULT_ENCODER_ID;
use crate::models::error::CaptureError;
use crate::models::permission::PermissionStatus;
use crate::models::recording_result::StopResult;
use crate::models::state::CaptureState;
use crate::permission::gate::PermissionGate;
use crate::processing::amplitude::{AmplitudeMeter, LoudnessLaw};
use crate::session::capture::CaptureSession;
use crate::traits::permission::PermissionProvider;
use crate::traits::platform::CapturePlatform;

/// `startRecording` arguments as the host transport sends them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StartRecordingArgs {
    pub path: Option<String>,
    pub encoder: Option<i64>,
    pub sample_rate: Option<u32>,
    pub bit_rate: Option<u32>,
    pub file_name_format: Option<String>,
    pub use_legacy_normalization: Option<bool>,
}

impl StartRecordingArgs {
    pub fn into_configuration(self) -> CaptureConfiguration {
        CaptureConfiguration {
            output_path: self.path.map(PathBuf::from),
            encoder: EncoderConfig::new(
                self.encoder.unwrap_or(DEFAULT_ENCODER_ID),
                self.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE),
                self.bit_rate,
            ),
            file_name_format: self
                .file_name_format
                .unwrap_or_else(|| DEFAULT_FILE_NAME_FORMAT.to_string()),
            legacy_normalization: self.use_legacy_normalization.unwrap_or(false),
            ..Default::default()
        }
    }
}

/// Meter of the live session, readable without the session lock so
/// loudness polling never waits behind a slow `stop`.
struct MeterHandle {
    meter: Option<Arc<AmplitudeMeter>>,
    law: LoudnessLaw,
}

/// Facade the host transport calls.
///
/// Holds at most one `CaptureSession`. Control calls are serialized by the
/// session mutex. Starting while a session is active tears the old one
/// down first (its file is finalized and its result discarded).
pub struct SessionManager {
    platform: Arc<dyn CapturePlatform>,
    permissions: PermissionGate,
    tuning: SessionTuning,
    session: Mutex<Option<CaptureSession>>,
    meter: Mutex<MeterHandle>,
}

impl SessionManager {
    pub fn new(platform: Arc<dyn CapturePlatform>, permissions: Arc<dyn PermissionProvider>) -> Self {
        Self {
            platform,
            permissions: PermissionGate::new(permissions),
            tuning: SessionTuning::default(),
            session: Mutex::new(None),
            meter: Mutex::new(MeterHandle {
                meter: None,
                law: LoudnessLaw::Linear,
            }),
        }
    }

    pub fn with_tuning(mut self, tuning: SessionTuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// State of the held session, `Idle` when there is none.
    pub fn state(&self) -> CaptureState {
        self.session
            .lock()
            .as_ref()
            .map(CaptureSession::state)
            .unwrap_or(CaptureState::Idle)
    }

    pub fn start_recording(&self, args: StartRecordingArgs) -> Result<bool, CaptureError> {
        self.start_with_configuration(args.into_configuration())
    }

    pub fn start_with_configuration(&self, config: CaptureConfiguration) -> Result<bool, CaptureError> {
        if self.permissions.status() == PermissionStatus::Denied {
            return Err(CaptureError::PermissionDenied);
        }

        let mut slot = self.session.lock();

        if let Some(mut previous) = slot.take() {
            if previous.state().is_active() {
                log::warn!("Session {} still active; stopping it before starting a new one", previous.id());
                self.detach_meter();
                match previous.stop() {
                    Ok(result) => log::info!("Replaced session saved {}", result.file_path.display()),
                    Err(e) => log::error!("Failed to stop replaced session: {}", e),
                }
            }
        }

        let mut session = CaptureSession::with_tuning(Arc::clone(&self.platform), self.tuning.clone());
        session.start(config)?;

        {
            let mut handle = self.meter.lock();
            handle.meter = Some(session.meter());
            handle.law = session.loudness_law();
        }
        let recording = session.state().is_recording();
        *slot = Some(session);
        Ok(recording)
    }

    /// Always `Ok(false)` on success: the session is no longer recording.
    pub fn pause_recording(&self) -> Result<bool, CaptureError> {
        let mut slot = self.session.lock();
        Self::held(&mut slot, "pause")?.pause()
    }

    pub fn resume_recording(&self) -> Result<bool, CaptureError> {
        let mut slot = self.session.lock();
        Self::held(&mut slot, "resume")?.resume()
    }

    /// A session whose file could not be saved is still released and
    /// dropped; the error is returned.
    pub fn stop_recording(&self) -> Result<StopResult, CaptureError> {
        let mut slot = self.session.lock();
        let result = Self::held(&mut slot, "stop")?.stop();
        if slot.as_ref().is_some_and(|s| !s.state().is_active()) {
            self.detach_meter();
            *slot = None;
        }
        result.map(|r| r.to_stop_result())
    }

    /// Peak since the previous call, per the session's loudness law.
    /// Resets the stored peak.
    pub fn get_loudness(&self) -> f32 {
        let handle = self.meter.lock();
        match &handle.meter {
            Some(meter) => meter.take_loudness(handle.law),
            None => handle.law.silence(),
        }
    }

    pub fn check_permission(&self) -> bool {
        self.permissions.has_permission()
    }

    fn held<'a>(
        slot: &'a mut Option<CaptureSession>,
        operation: &'static str,
    ) -> Result<&'a mut CaptureSession, CaptureError> {
        slot.as_mut().ok_or(CaptureError::InvalidState {
            operation,
            state: CaptureState::Idle.as_str(),
        })
    }

    fn detach_meter(&self) {
        self.meter.lock().meter = None;
    }
}
