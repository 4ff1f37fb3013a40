//! WAV container helpers for the built-in linear PCM writer.
//!
//! Generates standard 44-byte RIFF headers and parses one back to compute
//! the media duration.

use std::time::Duration;

/// Size of the standard WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Offsets of the two size fields a streaming writer patches on finish.
pub const RIFF_SIZE_OFFSET: u64 = 4;
pub const DATA_SIZE_OFFSET: u64 = 40;

/// Generate a 44-byte WAV RIFF header.
///
/// Format: PCM (format code 1), little-endian. Derived fields saturate
/// instead of overflowing; callers validate rates beforehand.
///
/// Layout:
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    file size - 8 (36 + data_size)
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16 (PCM format chunk size)
/// [20-21]  1 (PCM format code)
/// [22-23]  channels
/// [24-27]  sample_rate
/// [28-31]  byte_rate = sample_rate * channels * bit_depth / 8
/// [32-33]  block_align = channels * bit_depth / 8
/// [34-35]  bit_depth
/// [36-39]  "data"
/// [40-43]  data_size
/// ```
pub fn generate_wav_header(sample_rate: u32, bit_depth: u16, channels: u16, data_size: u32) -> [u8; WAV_HEADER_SIZE] {
    let byte_rate = u64::from(sample_rate) * u64::from(channels) * u64::from(bit_depth) / 8;
    let byte_rate = u32::try_from(byte_rate).unwrap_or(u32::MAX);
    let block_align = (u32::from(channels) * u32::from(bit_depth) / 8).min(u32::from(u16::MAX)) as u16;
    let chunk_size = data_size.saturating_add(36);

    let mut header = [0u8; WAV_HEADER_SIZE];

    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&chunk_size.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&1u16.to_le_bytes());
    header[22..24].copy_from_slice(&channels.to_le_bytes());
    header[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&bit_depth.to_le_bytes());

    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    header
}

/// Convert f32 samples `[-1.0, 1.0]` to 16-bit PCM (little-endian bytes).
///
/// Clamps out-of-range values. Output length = `samples.len() * 2` bytes.
pub fn pcm16_bytes(samples: &[f32]) -> Vec<u8> {
    let mut data = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let clamped = sample.clamp(-1.0, 1.0);
        let value = (clamped * i16::MAX as f32) as i16;
        data.extend_from_slice(&value.to_le_bytes());
    }
    data
}

/// Fields of a parsed WAV header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavInfo {
    pub sample_rate: u32,
    pub channels: u16,
    pub bit_depth: u16,
    pub byte_rate: u32,
    pub data_size: u32,
}

impl WavInfo {
    pub fn duration(&self) -> Duration {
        if self.byte_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.data_size as f64 / self.byte_rate as f64)
    }
}

/// Parse a canonical 44-byte header. Returns `None` for anything else.
pub fn parse_wav_header(header: &[u8]) -> Option<WavInfo> {
    if header.len() < WAV_HEADER_SIZE
        || &header[0..4] != b"RIFF"
        || &header[8..12] != b"WAVE"
        || &header[12..16] != b"fmt "
        || &header[36..40] != b"data"
    {
        return None;
    }
    let u16_at = |i: usize| u16::from_le_bytes([header[i], header[i + 1]]);
    let u32_at = |i: usize| u32::from_le_bytes([header[i], header[i + 1], header[i + 2], header[i + 3]]);

    Some(WavInfo {
        channels: u16_at(22),
        sample_rate: u32_at(24),
        byte_rate: u32_at(28),
        bit_depth: u16_at(34),
        data_size: u32_at(40),
    })
}
