use std::fs::{self, File};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::config::EncoderConfig;
use crate::models::error::CaptureError;
use crate::processing::wav_format;
use crate::traits::media_writer::MediaWriter;

const BIT_DEPTH: u16 = 16;

/// Largest data chunk whose RIFF size (`36 + data`) still fits in a `u32`.
const MAX_DATA_BYTES: u64 = (u32::MAX - 36) as u64;

/// Streaming mono 16-bit WAV writer.
///
/// The built-in `MediaWriter` for linear PCM. Compressed formats are left
/// to platform writers.
///
/// ## File Format
/// ```text
/// [44-byte WAV header, sizes patched on finish]
/// [raw 16-bit PCM data...]
/// ```
pub struct WavWriter {
    file_path: Option<PathBuf>,
    file: Option<BufWriter<File>>,
    data_bytes: u64,
    max_data_bytes: u64,
}

impl Default for WavWriter {
    fn default() -> Self {
        Self {
            file_path: None,
            file: None,
            data_bytes: 0,
            max_data_bytes: MAX_DATA_BYTES,
        }
    }
}

impl WavWriter {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn with_data_limit(max_data_bytes: u64) -> Self {
        Self {
            max_data_bytes,
            ..Self::default()
        }
    }

    /// PCM bytes written so far, excluding the header.
    pub fn data_bytes(&self) -> u64 {
        self.data_bytes
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    fn file_mut(&mut self) -> Result<&mut BufWriter<File>, CaptureError> {
        self.file
            .as_mut()
            .ok_or_else(|| CaptureError::StorageError("file is not open".into()))
    }
}

impl MediaWriter for WavWriter {
    fn open(&mut self, path: &Path, config: &EncoderConfig) -> Result<(), CaptureError> {
        if self.file.is_some() {
            return Err(CaptureError::StorageError("writer is already open".into()));
        }
        config.validate().map_err(CaptureError::StorageError)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| CaptureError::StorageError(format!("failed to create directory: {}", e)))?;
        }

        let file = File::create(path)
            .map_err(|e| CaptureError::StorageError(format!("failed to create file: {}", e)))?;
        let mut file = BufWriter::new(file);

        let header = wav_format::generate_wav_header(config.sample_rate, BIT_DEPTH, config.channels, 0);
        file.write_all(&header)
            .map_err(|e| CaptureError::StorageError(format!("write failed: {}", e)))?;

        self.file = Some(file);
        self.file_path = Some(path.to_path_buf());
        self.data_bytes = 0;
        Ok(())
    }

    /// Refuses samples that would push the file past the 4 GiB WAV limit;
    /// what was written before stays valid.
    fn write(&mut self, samples: &[f32]) -> Result<(), CaptureError> {
        let incoming = samples.len() as u64 * u64::from(BIT_DEPTH / 8);
        if self.data_bytes + incoming > self.max_data_bytes {
            return Err(CaptureError::StorageError("recording exceeds the 4 GiB WAV limit".into()));
        }
        let pcm = wav_format::pcm16_bytes(samples);
        self.file_mut()?
            .write_all(&pcm)
            .map_err(|e| CaptureError::StorageError(format!("write failed: {}", e)))?;
        self.data_bytes += pcm.len() as u64;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), CaptureError> {
        let (data_size, riff_size) = u32::try_from(self.data_bytes)
            .ok()
            .and_then(|size| Some((size, size.checked_add(36)?)))
            .ok_or_else(|| CaptureError::StorageError("recording exceeds the 4 GiB WAV limit".into()))?;
        let mut file = self
            .file
            .take()
            .ok_or_else(|| CaptureError::StorageError("file is not open".into()))?
            .into_inner()
            .map_err(|e| CaptureError::StorageError(format!("flush failed: {}", e)))?;

        let io = |e: std::io::Error| CaptureError::StorageError(e.to_string());

        file.seek(SeekFrom::Start(wav_format::RIFF_SIZE_OFFSET)).map_err(io)?;
        file.write_all(&riff_size.to_le_bytes()).map_err(io)?;
        file.seek(SeekFrom::Start(wav_format::DATA_SIZE_OFFSET)).map_err(io)?;
        file.write_all(&data_size.to_le_bytes()).map_err(io)?;
        file.sync_all().map_err(io)?;
        Ok(())
    }
}

/// Read a finished WAV file's header and compute its media duration.
pub fn probe_wav_duration(path: &Path) -> Result<Duration, CaptureError> {
    let mut header = [0u8; wav_format::WAV_HEADER_SIZE];
    File::open(path)
        .and_then(|mut f| f.read_exact(&mut header))
        .map_err(|e| CaptureError::ProbeFailure(format!("{}: {}", path.display(), e)))?;

    let info = wav_format::parse_wav_header(&header)
        .ok_or_else(|| CaptureError::ProbeFailure(format!("{}: not a PCM WAV file", path.display())))?;
    Ok(info.duration())
}
