use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use uuid::Uuid;

use crate::models::config::{CaptureConfiguration, SessionTuning};
use crate::models::error::CaptureError;
use crate::models::recording_result::{DurationSource, RecordingResult};
use crate::models::state::CaptureState;
use crate::processing::amplitude::{AmplitudeMeter, LoudnessLaw};
use crate::session::clock::ActiveClock;
use crate::session::file_recorder::FileRecorder;
use crate::session::probe::probe_with_timeout;
use crate::storage::output_path::resolve_output_path;
use crate::traits::audio_sink::{fan_out, AudioSink};
use crate::traits::capture_provider::{CaptureProvider, InputFormat};
use crate::traits::platform::CapturePlatform;

/// Hardware held while a session is recording or paused.
struct ActiveGraph {
    input: Box<dyn CaptureProvider>,
    /// Format the recorder's resampler was built for.
    format: InputFormat,
    recorder: FileRecorder,
}

/// Resources acquired during `start`, released in reverse order if a later
/// step fails.
struct PendingStart<'a> {
    platform: &'a dyn CapturePlatform,
    input: Option<Box<dyn CaptureProvider>>,
    format: Option<InputFormat>,
    tap_installed: bool,
    recorder: Option<FileRecorder>,
    armed: bool,
}

impl<'a> PendingStart<'a> {
    fn new(platform: &'a dyn CapturePlatform) -> Self {
        Self {
            platform,
            input: None,
            format: None,
            tap_installed: false,
            recorder: None,
            armed: true,
        }
    }

    fn complete(mut self) -> Option<ActiveGraph> {
        self.armed = false;
        match (self.input.take(), self.format.take(), self.recorder.take()) {
            (Some(input), Some(format), Some(recorder)) => Some(ActiveGraph { input, format, recorder }),
            _ => None,
        }
    }
}

impl Drop for PendingStart<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Some(input) = self.input.as_mut() {
            input.stop();
            if self.tap_installed {
                input.remove_tap();
            }
        }
        if let Some(recorder) = self.recorder.take() {
            recorder.discard();
        }
        self.platform.deactivate_audio_session();
    }
}

/// One recording: a file-writing recorder and an amplitude tap sharing a
/// single microphone input.
///
/// ```text
///                         ┌→ RecorderSink → [RingBuffer] → writer thread → [MediaWriter]
/// [CaptureProvider tap] ──┤
///                         └→ AmplitudeMeter (atomic peak) ← loudness()
/// ```
///
/// All methods run on the control side and must be serialized by the
/// owner (`SessionManager` holds the session behind a mutex). The only
/// state shared with the audio thread is the meter and the recorder's
/// ring buffer.
pub struct CaptureSession {
    id: Uuid,
    platform: Arc<dyn CapturePlatform>,
    tuning: SessionTuning,
    state: CaptureState,
    config: Option<CaptureConfiguration>,
    output_path: Option<PathBuf>,
    started_at: Option<DateTime<Utc>>,
    law: LoudnessLaw,
    meter: Arc<AmplitudeMeter>,
    graph: Option<ActiveGraph>,
    clock: ActiveClock,
}

impl CaptureSession {
    pub fn new(platform: Arc<dyn CapturePlatform>) -> Self {
        Self::with_tuning(platform, SessionTuning::default())
    }

    pub fn with_tuning(platform: Arc<dyn CapturePlatform>, tuning: SessionTuning) -> Self {
        Self {
            id: Uuid::new_v4(),
            platform,
            tuning,
            state: CaptureState::Idle,
            config: None,
            output_path: None,
            started_at: None,
            law: LoudnessLaw::Linear,
            meter: Arc::new(AmplitudeMeter::new()),
            graph: None,
            clock: ActiveClock::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn output_path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }

    /// When the current recording started, if one has.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn configuration(&self) -> Option<&CaptureConfiguration> {
        self.config.as_ref()
    }

    pub fn loudness_law(&self) -> LoudnessLaw {
        self.law
    }

    /// Shared peak store fed by the tap.
    pub fn meter(&self) -> Arc<AmplitudeMeter> {
        Arc::clone(&self.meter)
    }

    /// Active recording time so far, excluding pauses.
    pub fn elapsed(&self) -> std::time::Duration {
        self.clock.elapsed()
    }

    /// Start recording. Transitions: idle → recording.
    ///
    /// Either both consumers are running when this returns `Ok`, or nothing
    /// is held: every resource acquired before a failure is released.
    pub fn start(&mut self, config: CaptureConfiguration) -> Result<(), CaptureError> {
        self.require("start", CaptureState::Idle)?;

        config.validate()?;

        let now = Local::now();
        let path = resolve_output_path(
            config.output_path.as_deref(),
            self.platform.documents_dir(),
            &config.file_name_format,
            config.encoder.descriptor.file_extension,
            &now,
        )?;

        log::debug!(
            "Session {}: {} @ {} Hz, bit rate {:?}, legacy={} → {}",
            self.id,
            config.encoder.descriptor.name,
            config.encoder.sample_rate,
            config.encoder.bit_rate,
            config.legacy_normalization,
            path.display()
        );

        let graph = self.build_graph(&config, &path)?;

        self.law = LoudnessLaw::from_legacy_flag(config.legacy_normalization);
        self.output_path = Some(path);
        self.started_at = Some(now.with_timezone(&Utc));
        self.config = Some(config);
        self.graph = Some(graph);
        self.clock.start();
        self.set_state(CaptureState::Recording);
        Ok(())
    }

    fn build_graph(&self, config: &CaptureConfiguration, path: &Path) -> Result<ActiveGraph, CaptureError> {
        self.platform.activate_audio_session(&config.audio_session)?;
        let mut pending = PendingStart::new(self.platform.as_ref());

        let input = pending.input.insert(self.platform.open_input()?);
        if !input.is_available() {
            return Err(CaptureError::HardwareInitFailure("no microphone input available".into()));
        }
        let format = *pending.format.insert(input.input_format()?);

        let writer = self.platform.create_writer(&config.encoder)?;
        let recorder = pending.recorder.insert(FileRecorder::open(
            writer,
            path,
            &config.encoder,
            format.sample_rate,
            &self.tuning,
        )?);

        let sinks: Vec<Arc<dyn AudioSink>> = vec![recorder.sink(), self.meter()];
        self.meter.reset();
        if let Some(input) = pending.input.as_mut() {
            input.install_tap(self.tuning.tap_buffer_size, fan_out(sinks))?;
        }
        pending.tap_installed = true;

        if let Some(recorder) = pending.recorder.as_mut() {
            recorder.record()?;
        }
        if let Some(input) = pending.input.as_mut() {
            input.start()?;
        }

        pending
            .complete()
            .ok_or_else(|| CaptureError::HardwareInitFailure("capture graph incomplete".into()))
    }

    /// Pause recording. Transitions: recording → paused.
    ///
    /// Returns whether the session is still recording, which is always
    /// `false` on success.
    pub fn pause(&mut self) -> Result<bool, CaptureError> {
        self.require("pause", CaptureState::Recording)?;

        if let Some(graph) = self.graph.as_mut() {
            graph.recorder.pause();
            // No native pause on the tap: halt the input entirely.
            graph.input.stop();
        }
        self.meter.reset();
        self.clock.pause();
        self.set_state(CaptureState::Paused);
        Ok(self.state.is_recording())
    }

    /// Resume recording. Transitions: paused → recording.
    ///
    /// If the input cannot be restarted the session stays paused and the
    /// caller may retry.
    pub fn resume(&mut self) -> Result<bool, CaptureError> {
        self.require("resume", CaptureState::Paused)?;

        let graph = self
            .graph
            .as_mut()
            .ok_or_else(|| CaptureError::HardwareInitFailure("capture graph missing".into()))?;

        let current = graph.input.input_format()?;
        if current.sample_rate != graph.format.sample_rate {
            log::warn!(
                "Session {}: input rate changed from {} Hz to {} Hz while paused",
                self.id,
                graph.format.sample_rate,
                current.sample_rate
            );
            return Err(CaptureError::HardwareInitFailure(format!(
                "input sample rate changed from {} Hz to {} Hz",
                graph.format.sample_rate, current.sample_rate
            )));
        }

        if let Err(e) = graph.input.start() {
            log::warn!("Session {}: failed to restart input, staying paused: {}", self.id, e);
            return Err(match e {
                CaptureError::HardwareInitFailure(_) => e,
                other => CaptureError::HardwareInitFailure(other.to_string()),
            });
        }
        graph.recorder.record()?;

        self.clock.resume();
        self.set_state(CaptureState::Recording);
        Ok(true)
    }

    /// Stop recording, finalize the file and report its duration.
    /// Transitions: recording/paused → stopped.
    ///
    /// Hardware is released even when the file could not be written
    /// completely; the session still ends `Stopped` and the storage error
    /// is returned instead of a result.
    pub fn stop(&mut self) -> Result<RecordingResult, CaptureError> {
        if !self.state.is_active() {
            return Err(self.invalid("stop"));
        }

        self.clock.pause();
        let wall_clock = self.clock.elapsed();
        let released = self.release_graph();
        self.platform.deactivate_audio_session();
        self.meter.reset();
        self.set_state(CaptureState::Stopped);

        if let Err(e) = released {
            log::error!("Session {}: recording not saved: {}", self.id, e);
            return Err(e);
        }

        let path = self
            .output_path
            .clone()
            .ok_or_else(|| CaptureError::StorageError("output path missing".into()))?;

        let (duration, duration_source) =
            match probe_with_timeout(Arc::clone(&self.platform), path.clone(), self.tuning.probe_timeout) {
                Ok(d) => (d, DurationSource::MediaProbe),
                Err(e) => {
                    log::warn!("Session {}: {}; using wall-clock duration", self.id, e);
                    (wall_clock, DurationSource::WallClock)
                }
            };

        log::info!(
            "Session {}: saved {} ({} ms)",
            self.id,
            path.display(),
            duration.as_millis()
        );

        Ok(RecordingResult {
            file_path: path,
            duration,
            duration_source,
            started_at: self.started_at.unwrap_or_else(Utc::now),
        })
    }

    /// Take the peak since the last call, converted with this session's law.
    ///
    /// Outside recording/paused this is the law's silence value.
    pub fn loudness(&self) -> f32 {
        if self.state.is_active() {
            self.meter.take_loudness(self.law)
        } else {
            self.law.silence()
        }
    }

    // --- Internal helpers ---

    /// Remove the tap before the input is released, then close the file.
    fn release_graph(&mut self) -> Result<(), CaptureError> {
        let Some(mut graph) = self.graph.take() else {
            return Ok(());
        };
        graph.input.stop();
        graph.input.remove_tap();
        drop(graph.input);

        graph.recorder.finish()
    }

    fn require(&self, operation: &'static str, expected: CaptureState) -> Result<(), CaptureError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(self.invalid(operation))
        }
    }

    fn invalid(&self, operation: &'static str) -> CaptureError {
        CaptureError::InvalidState {
            operation,
            state: self.state.as_str(),
        }
    }

    fn set_state(&mut self, new_state: CaptureState) {
        log::info!("Session {}: {} → {}", self.id, self.state, new_state);
        self.state = new_state;
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        if self.graph.is_some() {
            log::warn!("Session {} dropped while {}; releasing hardware", self.id, self.state);
            if let Err(e) = self.release_graph() {
                log::error!("Session {}: failed to finalize recording: {}", self.id, e);
            }
            self.platform.deactivate_audio_session();
        }
    }
}
