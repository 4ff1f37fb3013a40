use thiserror::Error;

use waveform_capture_core::CaptureError;

/// Failures from the cpal host layer.
#[derive(Error, Debug)]
pub enum CpalError {
    #[error("no input device available")]
    NoInputDevice,

    #[error("input device '{0}' not found")]
    DeviceNotFound(String),

    #[error("failed to enumerate input devices: {0}")]
    Devices(#[from] cpal::DevicesError),

    #[error("failed to query input configuration: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("unsupported sample format: {0:?}")]
    UnsupportedFormat(cpal::SampleFormat),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start input stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("input thread: {0}")]
    Thread(String),
}

impl From<CpalError> for CaptureError {
    fn from(e: CpalError) -> Self {
        CaptureError::HardwareInitFailure(e.to_string())
    }
}
