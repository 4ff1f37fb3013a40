use std::path::{Path, PathBuf};
use std::time::Duration;

use waveform_capture_core::{
    probe_wav_duration, AudioSessionOptions, CaptureError, CapturePlatform, CaptureProvider, EncoderConfig,
    MediaWriter, WavWriter,
};

use crate::input::CpalInput;

/// Desktop implementation of the platform collaborators.
///
/// Only linear PCM is encoded; compressed formats are rejected at start.
/// Desktop hosts have no audio-session concept, so activation is a no-op.
#[derive(Debug, Clone, Default)]
pub struct DesktopPlatform {
    input_device: Option<String>,
    documents_dir: Option<PathBuf>,
}

impl DesktopPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record from the named device instead of the system default.
    pub fn with_input_device(mut self, name: impl Into<String>) -> Self {
        self.input_device = Some(name.into());
        self
    }

    /// Write synthesized file names here instead of the user's documents folder.
    pub fn with_documents_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.documents_dir = Some(dir.into());
        self
    }
}

impl CapturePlatform for DesktopPlatform {
    fn open_input(&self) -> Result<Box<dyn CaptureProvider>, CaptureError> {
        Ok(Box::new(CpalInput::new(self.input_device.clone())))
    }

    fn create_writer(&self, config: &EncoderConfig) -> Result<Box<dyn MediaWriter>, CaptureError> {
        if !config.descriptor.is_linear_pcm() {
            return Err(CaptureError::HardwareInitFailure(format!(
                "{} encoding is not available on this platform (use encoder {})",
                config.descriptor.name,
                waveform_capture_core::models::encoder::LINEAR_PCM_ID
            )));
        }
        Ok(Box::new(WavWriter::new()))
    }

    fn activate_audio_session(&self, options: &AudioSessionOptions) -> Result<(), CaptureError> {
        log::debug!("Audio session {:?} requested; nothing to configure on desktop", options.category);
        Ok(())
    }

    fn documents_dir(&self) -> Option<PathBuf> {
        self.documents_dir.clone().or_else(dirs_next::document_dir)
    }

    fn probe_duration(&self, path: &Path) -> Result<Duration, CaptureError> {
        probe_wav_duration(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waveform_capture_core::{CaptureConfiguration, CaptureSession};

    #[test]
    fn compressed_encoders_are_rejected() {
        let platform = DesktopPlatform::new();
        let err = platform.create_writer(&EncoderConfig::default()).err().unwrap();
        assert!(matches!(err, CaptureError::HardwareInitFailure(msg) if msg.contains("AAC")));
        assert!(platform.create_writer(&EncoderConfig::new(10, 16_000, None)).is_ok());
    }

    #[test]
    fn documents_override_wins() {
        let dir = tempfile::tempdir().unwrap();
        let platform = DesktopPlatform::new().with_documents_dir(dir.path());
        assert_eq!(platform.documents_dir().as_deref(), Some(dir.path()));
    }

    #[test]
    fn aac_start_fails_before_opening_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let platform = std::sync::Arc::new(DesktopPlatform::new().with_documents_dir(dir.path()));
        let mut session = CaptureSession::new(platform);

        // Fails at the writer (AAC) or earlier (no microphone on the test host).
        assert!(session.start(CaptureConfiguration::default()).is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
