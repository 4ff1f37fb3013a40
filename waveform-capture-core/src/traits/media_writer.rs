use std::path::Path;

use crate::models::config::EncoderConfig;
use crate::models::error::CaptureError;

/// Codec/muxer sink for the file-writing path.
///
/// Called from the writer thread only, never from the hardware callback.
pub trait MediaWriter: Send {
    /// Create the output file. Called exactly once, before any `write`.
    fn open(&mut self, path: &Path, config: &EncoderConfig) -> Result<(), CaptureError>;

    /// Append mono samples at `config.sample_rate`.
    fn write(&mut self, samples: &[f32]) -> Result<(), CaptureError>;

    /// Flush and close the file so its duration can be probed.
    fn finish(&mut self) -> Result<(), CaptureError>;
}
