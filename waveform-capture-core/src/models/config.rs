use std::path::PathBuf;
use std::time::Duration;

use std::ops::RangeInclusive;

use super::encoder::{self, EncoderDescriptor};
use super::error::CaptureError;

/// Default sample rate when the host does not send one.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Sample rates an encoder may be configured with.
pub const SUPPORTED_SAMPLE_RATES: RangeInclusive<u32> = 8_000..=384_000;

/// Default `fileNameFormat` when the host does not send one.
pub const DEFAULT_FILE_NAME_FORMAT: &str = "yyyy-MM-dd-HH-mm-ss";

/// Encoder quality tiers, valued like the platform quality constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QualityTier {
    Min = 0x00,
    Low = 0x20,
    Medium = 0x40,
    High = 0x60,
    Max = 0x7F,
}

/// Codec settings for one recording. Fixed at start, never mutated.
///
/// `bit_rate` is optional; writers read it from here instead of branching
/// on two differently shaped settings maps.
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderConfig {
    pub descriptor: EncoderDescriptor,
    pub sample_rate: u32,
    /// Always 1: capture is mono.
    pub channels: u16,
    pub quality: QualityTier,
    pub bit_rate: Option<u32>,
}

impl EncoderConfig {
    pub fn new(encoder_id: i64, sample_rate: u32, bit_rate: Option<u32>) -> Self {
        Self {
            descriptor: *encoder::resolve(encoder_id),
            sample_rate,
            channels: 1,
            quality: QualityTier::High,
            bit_rate,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !SUPPORTED_SAMPLE_RATES.contains(&self.sample_rate) {
            return Err(format!(
                "sample rate {} Hz outside {}..={} Hz",
                self.sample_rate,
                SUPPORTED_SAMPLE_RATES.start(),
                SUPPORTED_SAMPLE_RATES.end()
            ));
        }
        if self.channels != 1 {
            return Err(format!("unsupported channel count: {}", self.channels));
        }
        if self.bit_rate == Some(0) {
            return Err("bit rate must be positive when set".into());
        }
        Ok(())
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self::new(encoder::DEFAULT_ENCODER_ID, DEFAULT_SAMPLE_RATE, None)
    }
}

/// Audio session category requested from the host platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioSessionCategory {
    /// Simultaneous playback and record.
    PlayAndRecord,
    Record,
}

/// Hardware session configuration handed to the platform on start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSessionOptions {
    pub category: AudioSessionCategory,
    pub default_to_speaker: bool,
    pub allow_bluetooth: bool,
}

impl Default for AudioSessionOptions {
    fn default() -> Self {
        Self {
            category: AudioSessionCategory::PlayAndRecord,
            default_to_speaker: true,
            allow_bluetooth: true,
        }
    }
}

/// Configuration for starting a capture session.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureConfiguration {
    /// Explicit output file. When `None` the file is synthesized inside
    /// the platform documents directory.
    pub output_path: Option<PathBuf>,

    pub encoder: EncoderConfig,

    /// Unicode date pattern for synthesized file names.
    pub file_name_format: String,

    /// Report loudness as `20 * log10(peak)` instead of the linear peak.
    pub legacy_normalization: bool,

    pub audio_session: AudioSessionOptions,
}

impl CaptureConfiguration {
    /// Encoder problems are `HardwareInitFailure` (the recorder cannot be
    /// built); an unusable file name format is `PathResolutionFailure`.
    pub fn validate(&self) -> Result<(), CaptureError> {
        self.encoder
            .validate()
            .map_err(|e| CaptureError::HardwareInitFailure(format!("invalid encoder settings: {}", e)))?;
        if self.output_path.is_none() && self.file_name_format.trim().is_empty() {
            return Err(CaptureError::PathResolutionFailure("file name format is empty".into()));
        }
        Ok(())
    }
}

impl Default for CaptureConfiguration {
    fn default() -> Self {
        Self {
            output_path: None,
            encoder: EncoderConfig::default(),
            file_name_format: DEFAULT_FILE_NAME_FORMAT.into(),
            legacy_normalization: false,
            audio_session: AudioSessionOptions::default(),
        }
    }
}

/// Internal timing knobs. The defaults suit UI-rate metering.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionTuning {
    /// Frames per analysis-tap callback.
    pub tap_buffer_size: usize,
    /// Seconds of mono audio the file path may buffer before dropping.
    pub ring_buffer_secs: f64,
    /// How often the writer thread drains the ring buffer.
    pub writer_interval: Duration,
    /// Upper bound on the media duration probe in `stop`.
    pub probe_timeout: Duration,
}

impl Default for SessionTuning {
    fn default() -> Self {
        Self {
            tap_buffer_size: 735,
            ring_buffer_secs: 5.0,
            writer_interval: Duration::from_millis(50),
            probe_timeout: Duration::from_secs(2),
        }
    }
}
