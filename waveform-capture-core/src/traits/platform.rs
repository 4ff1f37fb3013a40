use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::config::{AudioSessionOptions, EncoderConfig};
use crate::models::error::CaptureError;
use crate::traits::capture_provider::CaptureProvider;
use crate::traits::media_writer::MediaWriter;

/// Host services a capture session depends on.
///
/// Implemented per platform (`waveform-capture-cpal` on desktop) and by
/// fakes in tests.
pub trait CapturePlatform: Send + Sync {
    /// Open the microphone input for a new session.
    fn open_input(&self) -> Result<Box<dyn CaptureProvider>, CaptureError>;

    /// Build the codec writer for `config`.
    fn create_writer(&self, config: &EncoderConfig) -> Result<Box<dyn MediaWriter>, CaptureError>;

    /// Activate the shared audio session with the requested category.
    fn activate_audio_session(&self, options: &AudioSessionOptions) -> Result<(), CaptureError>;

    /// Release the audio session. Best effort.
    fn deactivate_audio_session(&self) {}

    /// Writable application documents directory, if the platform has one.
    fn documents_dir(&self) -> Option<PathBuf>;

    /// Read the media duration of a finished file. May block; the session
    /// bounds it with a timeout.
    fn probe_duration(&self, path: &Path) -> Result<Duration, CaptureError>;
}
