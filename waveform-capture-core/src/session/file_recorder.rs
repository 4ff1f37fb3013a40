use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::config::{EncoderConfig, SessionTuning};
use crate::models::error::CaptureError;
use crate::processing::resampler::MonoResampler;
use crate::processing::ring_buffer::RingBuffer;
use crate::traits::audio_sink::AudioSink;
use crate::traits::media_writer::MediaWriter;

/// Tap-side half of the file-writing path.
///
/// Downmixes into the ring buffer while recording; drops buffers while
/// paused so the file resumes seamlessly.
pub struct RecorderSink {
    buffer: Arc<Mutex<RingBuffer>>,
    accepting: Arc<AtomicBool>,
}

impl AudioSink for RecorderSink {
    fn consume(&self, samples: &[f32], channels: u16) {
        if self.accepting.load(Ordering::Acquire) {
            self.buffer.lock().push_frames(samples, channels);
        }
    }
}

/// Writer-side state shared with the drain thread.
struct WriterState {
    writer: Box<dyn MediaWriter>,
    resampler: MonoResampler,
    /// First write error; later audio is discarded.
    failure: Option<CaptureError>,
}

/// File-writing consumer of the microphone tap.
///
/// ```text
/// [tap callback] → RecorderSink → [RingBuffer] → drain thread → [MonoResampler] → [MediaWriter]
/// ```
pub struct FileRecorder {
    path: PathBuf,
    buffer: Arc<Mutex<RingBuffer>>,
    accepting: Arc<AtomicBool>,
    state: Arc<Mutex<WriterState>>,
    samples_written: Arc<AtomicU64>,
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
    interval: Duration,
}

impl FileRecorder {
    /// Open the output file. The recorder starts paused; call `record`.
    pub fn open(
        mut writer: Box<dyn MediaWriter>,
        path: &Path,
        config: &EncoderConfig,
        input_sample_rate: f64,
        tuning: &SessionTuning,
    ) -> Result<Self, CaptureError> {
        writer.open(path, config).map_err(|e| {
            CaptureError::HardwareInitFailure(format!("recorder could not open {}: {}", path.display(), e))
        })?;

        let capacity = (input_sample_rate.max(1.0) * tuning.ring_buffer_secs) as usize;
        Ok(Self {
            path: path.to_path_buf(),
            buffer: Arc::new(Mutex::new(RingBuffer::new(capacity))),
            accepting: Arc::new(AtomicBool::new(false)),
            state: Arc::new(Mutex::new(WriterState {
                writer,
                resampler: MonoResampler::new(input_sample_rate, config.sample_rate as f64),
                failure: None,
            })),
            samples_written: Arc::new(AtomicU64::new(0)),
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
            interval: tuning.writer_interval,
        })
    }

    /// Sink to register on the hardware tap.
    pub fn sink(&self) -> Arc<RecorderSink> {
        Arc::new(RecorderSink {
            buffer: Arc::clone(&self.buffer),
            accepting: Arc::clone(&self.accepting),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Samples handed to the writer so far, at the encoder rate.
    pub fn samples_written(&self) -> u64 {
        self.samples_written.load(Ordering::Acquire)
    }

    /// Start (or resume) accepting audio. Spawns the drain thread once.
    pub fn record(&mut self) -> Result<(), CaptureError> {
        if self.handle.is_none() {
            self.running.store(true, Ordering::SeqCst);

            let running = Arc::clone(&self.running);
            let buffer = Arc::clone(&self.buffer);
            let state = Arc::clone(&self.state);
            let written = Arc::clone(&self.samples_written);
            let interval = self.interval;

            let handle = thread::Builder::new()
                .name("waveform-writer".into())
                .spawn(move || {
                    while running.load(Ordering::SeqCst) {
                        thread::sleep(interval);
                        drain_into_writer(&buffer, &state, &written);
                    }
                })
                .map_err(|e| {
                    self.running.store(false, Ordering::SeqCst);
                    CaptureError::HardwareInitFailure(format!("failed to spawn writer thread: {}", e))
                })?;
            self.handle = Some(handle);
        }

        self.accepting.store(true, Ordering::Release);
        Ok(())
    }

    /// Stop accepting audio; the file stays open.
    pub fn pause(&self) {
        self.accepting.store(false, Ordering::Release);
    }

    /// Stop the drain thread, write what is left, and close the file.
    ///
    /// Fails with the first write error if any audio could not be written,
    /// even though the file itself was closed.
    pub fn finish(mut self) -> Result<(), CaptureError> {
        self.shutdown();
        drain_into_writer(&self.buffer, &self.state, &self.samples_written);
        let dropped = self.buffer.lock().dropped();
        if dropped > 0 {
            log::warn!("{}: writer fell behind, {} samples dropped", self.path.display(), dropped);
        }
        let mut state = self.state.lock();
        let finished = state.writer.finish();
        let failure = state.failure.take();
        match failure {
            Some(e) => Err(e),
            None => finished,
        }
    }

    /// Close and delete the file. Used when a start is rolled back.
    pub fn discard(self) {
        let path = self.path.clone();
        if let Err(e) = self.finish() {
            log::warn!("Failed to close abandoned recording {}: {}", path.display(), e);
        }
        if let Err(e) = std::fs::remove_file(&path) {
            log::debug!("Could not remove abandoned recording {}: {}", path.display(), e);
        }
    }

    fn shutdown(&mut self) {
        self.accepting.store(false, Ordering::Release);
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Writer thread panicked for {}", self.path.display());
            }
        }
    }
}

impl Drop for FileRecorder {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Move everything buffered through the resampler into the writer.
fn drain_into_writer(buffer: &Mutex<RingBuffer>, state: &Mutex<WriterState>, written: &AtomicU64) {
    let samples = buffer.lock().drain();
    if samples.is_empty() {
        return;
    }

    let mut state = state.lock();
    if state.failure.is_some() {
        return;
    }
    let resampled = state.resampler.process(&samples);
    match state.writer.write(&resampled) {
        Ok(()) => {
            written.fetch_add(resampled.len() as u64, Ordering::AcqRel);
        }
        Err(e) => {
            // Stop writing after the first failure; the file is finalized as is.
            log::error!("Failed to write audio data: {}", e);
            state.failure = Some(if matches!(e, CaptureError::StorageError(_)) {
                e
            } else {
                CaptureError::StorageError(e.to_string())
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::wav_format;
    use crate::storage::wav_writer::{probe_wav_duration, WavWriter};

    fn fast_tuning() -> SessionTuning {
        SessionTuning {
            writer_interval: Duration::from_millis(5),
            ..Default::default()
        }
    }

    #[test]
    fn paused_recorder_drops_tap_buffers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.wav");
        let config = EncoderConfig::new(10, 8_000, None);

        let recorder = FileRecorder::open(Box::new(WavWriter::new()), &path, &config, 8_000.0, &fast_tuning()).unwrap();
        let sink = recorder.sink();
        sink.consume(&[0.5; 800], 1);
        recorder.finish().unwrap();

        assert_eq!(probe_wav_duration(&path).unwrap(), Duration::ZERO);
    }

    #[test]
    fn recorded_audio_reaches_the_file_resampled_and_mono() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.wav");
        let config = EncoderConfig::new(10, 8_000, None);

        let mut recorder =
            FileRecorder::open(Box::new(WavWriter::new()), &path, &config, 16_000.0, &fast_tuning()).unwrap();
        let sink = recorder.sink();
        recorder.record().unwrap();

        // 0.5 s of 16 kHz stereo.
        for _ in 0..10 {
            sink.consume(&[0.25; 1_600], 2);
        }
        recorder.pause();
        sink.consume(&[0.25; 1_600], 2);
        recorder.finish().unwrap();

        let data = std::fs::read(&path).unwrap();
        let info = wav_format::parse_wav_header(&data).unwrap();
        assert_eq!(info.sample_rate, 8_000);
        assert_eq!(info.channels, 1);
        // 8000 input frames at 16 kHz → about 4000 output samples.
        let samples = info.data_size as i64 / 2;
        assert!((samples - 4_000).abs() <= 2, "{}", samples);
    }

    #[test]
    fn open_failure_is_hardware_init_failure() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened as a file.
        let err = FileRecorder::open(
            Box::new(WavWriter::new()),
            dir.path(),
            &EncoderConfig::default(),
            44_100.0,
            &fast_tuning(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, CaptureError::HardwareInitFailure(_)));
    }

    /// Writer that accepts the header and then rejects every sample.
    struct FullDisk;

    impl MediaWriter for FullDisk {
        fn open(&mut self, _path: &Path, _config: &EncoderConfig) -> Result<(), CaptureError> {
            Ok(())
        }

        fn write(&mut self, _samples: &[f32]) -> Result<(), CaptureError> {
            Err(CaptureError::StorageError("disk full".into()))
        }

        fn finish(&mut self) -> Result<(), CaptureError> {
            Ok(())
        }
    }

    #[test]
    fn write_failure_is_reported_by_finish() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.wav");
        let config = EncoderConfig::new(10, 8_000, None);

        let mut recorder = FileRecorder::open(Box::new(FullDisk), &path, &config, 8_000.0, &fast_tuning()).unwrap();
        let sink = recorder.sink();
        recorder.record().unwrap();
        sink.consume(&[0.5; 800], 1);

        assert_eq!(
            recorder.finish().unwrap_err(),
            CaptureError::StorageError("disk full".into())
        );
    }

    #[test]
    fn discard_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abandoned.wav");
        let recorder =
            FileRecorder::open(Box::new(WavWriter::new()), &path, &EncoderConfig::default(), 44_100.0, &fast_tuning())
                .unwrap();
        recorder.discard();
        assert!(!path.exists());
    }
}
