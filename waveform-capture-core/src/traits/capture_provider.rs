use std::sync::Arc;

use crate::models::error::CaptureError;

/// Callback invoked on the hardware thread for every tapped buffer.
///
/// Parameters:
/// - `samples`: Interleaved f32 samples, `frames * channels` long.
/// - `channels`: Number of interleaved channels (1 = mono).
///
/// Runs at real-time priority: implementations must not allocate, log,
/// block on I/O, or wait on contended locks.
pub type AudioBufferCallback = Arc<dyn Fn(&[f32], u16) + Send + Sync + 'static>;

/// Native format of the hardware input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputFormat {
    pub sample_rate: f64,
    pub channels: u16,
}

/// One physical microphone input.
///
/// A capture session installs a single tap whose callback fans the buffer
/// out to the file-writing path and the amplitude tap. The lifecycle is:
/// `install_tap` → `start` → (`stop` → `start`)* → `stop` → `remove_tap`.
pub trait CaptureProvider: Send {
    /// Whether the input device is present and usable.
    fn is_available(&self) -> bool;

    /// Format the callback will deliver.
    fn input_format(&self) -> Result<InputFormat, CaptureError>;

    /// Register the buffer callback. `buffer_size` is a frame count hint.
    fn install_tap(&mut self, buffer_size: usize, callback: AudioBufferCallback) -> Result<(), CaptureError>;

    /// Unregister the callback. Must happen before the provider is dropped.
    fn remove_tap(&mut self);

    /// Start delivering buffers. Fails synchronously if the hardware
    /// cannot be started.
    fn start(&mut self) -> Result<(), CaptureError>;

    /// Stop delivering buffers. The tap stays installed. Must be a no-op
    /// when not started.
    fn stop(&mut self);
}
