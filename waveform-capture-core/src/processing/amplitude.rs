//! Peak amplitude extraction for the analysis tap.
//!
//! The hardware callback folds each buffer's channel-0 peak into a shared
//! atomic; the control side reads and clears it. The stored value is
//! therefore "peak since last poll", scaled to the 16-bit meter range.

use std::sync::atomic::{AtomicU32, Ordering};

/// Full-scale value of the 16-bit peak-meter convention.
pub const PCM16_FULL_SCALE: f32 = 32767.0;

/// Decibel value reported for a silent window under the legacy law.
pub const SILENCE_DB: f32 = -160.0;

/// Conversion applied when the stored peak is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoudnessLaw {
    /// Scaled peak returned as is, `[0, 32767]`.
    Linear,
    /// `20 * log10(scaled_peak)`, floored at [`SILENCE_DB`].
    LegacyDecibel,
}

impl LoudnessLaw {
    pub fn from_legacy_flag(legacy_normalization: bool) -> Self {
        if legacy_normalization {
            Self::LegacyDecibel
        } else {
            Self::Linear
        }
    }

    /// Value reported when nothing was captured since the last read.
    pub fn silence(&self) -> f32 {
        to_loudness(0.0, *self)
    }
}

/// Largest `|sample|` on channel 0 of an interleaved buffer, clamped to
/// `[0, 1]`. NaN samples are skipped.
pub fn channel_zero_peak(samples: &[f32], channels: u16) -> f32 {
    let stride = usize::from(channels.max(1));
    let mut peak = 0.0f32;
    for &sample in samples.iter().step_by(stride) {
        let magnitude = sample.abs();
        if magnitude > peak {
            peak = magnitude;
        }
    }
    peak.min(1.0)
}

/// Map a normalized peak to the 16-bit meter range.
pub fn scale_peak(peak: f32) -> f32 {
    peak.clamp(0.0, 1.0) * PCM16_FULL_SCALE
}

/// Convert a scaled peak with the given law. Always finite.
pub fn to_loudness(scaled_peak: f32, law: LoudnessLaw) -> f32 {
    match law {
        LoudnessLaw::Linear => scaled_peak.max(0.0),
        LoudnessLaw::LegacyDecibel => {
            if scaled_peak <= 0.0 {
                return SILENCE_DB;
            }
            let db = 20.0 * scaled_peak.log10();
            if db.is_finite() {
                db.max(SILENCE_DB)
            } else {
                SILENCE_DB
            }
        }
    }
}

/// Lock-free "peak since last read" store shared between the hardware
/// callback (single writer) and the control side (single reader).
///
/// The scalar is an `f32` kept as bits in an `AtomicU32`. Every stored
/// value is non-negative, where IEEE-754 bit order matches numeric order,
/// so `fetch_max` on the bits is a numeric max.
#[derive(Debug, Default)]
pub struct AmplitudeMeter {
    peak_bits: AtomicU32,
}

impl AmplitudeMeter {
    pub fn new() -> Self {
        Self {
            peak_bits: AtomicU32::new(0.0f32.to_bits()),
        }
    }

    /// Fold one interleaved buffer into the stored peak.
    ///
    /// Real-time safe: one pass over the buffer and one atomic RMW.
    pub fn process(&self, samples: &[f32], channels: u16) {
        self.record(scale_peak(channel_zero_peak(samples, channels)));
    }

    /// Fold an already scaled peak into the stored value.
    pub fn record(&self, scaled_peak: f32) {
        if scaled_peak.is_nan() || scaled_peak <= 0.0 {
            return;
        }
        let clamped = scaled_peak.min(PCM16_FULL_SCALE);
        self.peak_bits.fetch_max(clamped.to_bits(), Ordering::AcqRel);
    }

    /// Return the peak observed since the previous `take` and clear it.
    ///
    /// The swap is a single atomic step, so a callback racing with the read
    /// lands either in this value or in the next one, never lost.
    pub fn take(&self) -> f32 {
        f32::from_bits(self.peak_bits.swap(0.0f32.to_bits(), Ordering::AcqRel))
    }

    /// Take the stored peak and convert it with `law`.
    pub fn take_loudness(&self, law: LoudnessLaw) -> f32 {
        to_loudness(self.take(), law)
    }

    /// Current value without clearing it.
    pub fn peek(&self) -> f32 {
        f32::from_bits(self.peak_bits.load(Ordering::Acquire))
    }

    pub fn reset(&self) {
        self.peak_bits.store(0.0f32.to_bits(), Ordering::Release);
    }
}
