//! Scriptable fakes for the platform collaborators.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use waveform_capture_core::{
    probe_wav_duration, AudioBufferCallback, AudioSessionOptions, CaptureError, CapturePlatform, CaptureProvider,
    EncoderConfig, InputFormat, MediaWriter, PermissionCompletion, PermissionProvider, PermissionStatus,
    SessionTuning, WavWriter,
};

/// Shared view of the fake microphone, kept by the test to drive callbacks.
pub struct InputControl {
    pub format: Mutex<InputFormat>,
    pub available: AtomicBool,
    pub callback: Mutex<Option<AudioBufferCallback>>,
    pub running: AtomicBool,
    pub tap_installed: AtomicBool,
    pub taps_removed: AtomicUsize,
    pub fail_install: AtomicBool,
    pub fail_next_starts: AtomicUsize,
    pub dropped_with_tap: AtomicBool,
}

impl InputControl {
    pub fn new(sample_rate: f64) -> Arc<Self> {
        Arc::new(Self {
            format: Mutex::new(InputFormat {
                sample_rate,
                channels: 1,
            }),
            available: AtomicBool::new(true),
            callback: Mutex::new(None),
            running: AtomicBool::new(false),
            tap_installed: AtomicBool::new(false),
            taps_removed: AtomicUsize::new(0),
            fail_install: AtomicBool::new(false),
            fail_next_starts: AtomicUsize::new(0),
            dropped_with_tap: AtomicBool::new(false),
        })
    }

    /// Deliver one hardware buffer. Returns false if the input is halted.
    pub fn fire(&self, samples: &[f32], channels: u16) -> bool {
        if !self.running.load(Ordering::SeqCst) || !self.tap_installed.load(Ordering::SeqCst) {
            return false;
        }
        let callback = self.callback.lock().clone();
        match callback {
            Some(cb) => {
                cb(samples, channels);
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

pub struct FakeInput {
    control: Arc<InputControl>,
}

impl CaptureProvider for FakeInput {
    fn is_available(&self) -> bool {
        self.control.available.load(Ordering::SeqCst)
    }

    fn input_format(&self) -> Result<InputFormat, CaptureError> {
        Ok(*self.control.format.lock())
    }

    fn install_tap(&mut self, _buffer_size: usize, callback: AudioBufferCallback) -> Result<(), CaptureError> {
        if self.control.fail_install.load(Ordering::SeqCst) {
            return Err(CaptureError::HardwareInitFailure("tap rejected".into()));
        }
        *self.control.callback.lock() = Some(callback);
        self.control.tap_installed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn remove_tap(&mut self) {
        *self.control.callback.lock() = None;
        self.control.tap_installed.store(false, Ordering::SeqCst);
        self.control.taps_removed.fetch_add(1, Ordering::SeqCst);
    }

    fn start(&mut self) -> Result<(), CaptureError> {
        let failures = &self.control.fail_next_starts;
        if failures.load(Ordering::SeqCst) > 0 {
            failures.fetch_sub(1, Ordering::SeqCst);
            return Err(CaptureError::HardwareInitFailure("engine refused to start".into()));
        }
        self.control.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) {
        self.control.running.store(false, Ordering::SeqCst);
    }
}

impl Drop for FakeInput {
    fn drop(&mut self) {
        if self.control.tap_installed.load(Ordering::SeqCst) {
            self.control.dropped_with_tap.store(true, Ordering::SeqCst);
        }
    }
}

pub struct FakePlatform {
    pub input: Arc<InputControl>,
    pub documents: Mutex<Option<PathBuf>>,
    pub activations: AtomicUsize,
    pub deactivations: AtomicUsize,
    pub inputs_opened: AtomicUsize,
    pub fail_activation: AtomicBool,
    pub fail_writes: AtomicBool,
    pub probe_fails: AtomicBool,
    pub probe_delay: Mutex<Duration>,
    pub last_options: Mutex<Option<AudioSessionOptions>>,
}

impl FakePlatform {
    pub fn new(documents: &Path, sample_rate: f64) -> Arc<Self> {
        Arc::new(Self {
            input: InputControl::new(sample_rate),
            documents: Mutex::new(Some(documents.to_path_buf())),
            activations: AtomicUsize::new(0),
            deactivations: AtomicUsize::new(0),
            inputs_opened: AtomicUsize::new(0),
            fail_activation: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            probe_fails: AtomicBool::new(false),
            probe_delay: Mutex::new(Duration::ZERO),
            last_options: Mutex::new(None),
        })
    }
}

impl CapturePlatform for FakePlatform {
    fn open_input(&self) -> Result<Box<dyn CaptureProvider>, CaptureError> {
        self.inputs_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeInput {
            control: Arc::clone(&self.input),
        }))
    }

    fn create_writer(&self, _config: &EncoderConfig) -> Result<Box<dyn MediaWriter>, CaptureError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Ok(Box::new(FullDiskWriter));
        }
        Ok(Box::new(WavWriter::new()))
    }

    fn activate_audio_session(&self, options: &AudioSessionOptions) -> Result<(), CaptureError> {
        if self.fail_activation.load(Ordering::SeqCst) {
            return Err(CaptureError::HardwareInitFailure("audio session unavailable".into()));
        }
        *self.last_options.lock() = Some(*options);
        self.activations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn deactivate_audio_session(&self) {
        self.deactivations.fetch_add(1, Ordering::SeqCst);
    }

    fn documents_dir(&self) -> Option<PathBuf> {
        self.documents.lock().clone()
    }

    fn probe_duration(&self, path: &Path) -> Result<Duration, CaptureError> {
        let delay = *self.probe_delay.lock();
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        if self.probe_fails.load(Ordering::SeqCst) {
            return Err(CaptureError::ProbeFailure("asset has no duration".into()));
        }
        probe_wav_duration(path)
    }
}

/// Writer that opens fine and then fails every write and the finalize.
pub struct FullDiskWriter;

impl MediaWriter for FullDiskWriter {
    fn open(&mut self, _path: &Path, _config: &EncoderConfig) -> Result<(), CaptureError> {
        Ok(())
    }

    fn write(&mut self, _samples: &[f32]) -> Result<(), CaptureError> {
        Err(CaptureError::StorageError("disk full".into()))
    }

    fn finish(&mut self) -> Result<(), CaptureError> {
        Err(CaptureError::StorageError("disk full".into()))
    }
}

/// Permission provider that answers prompts immediately.
pub struct FakePermissions {
    pub status: Mutex<PermissionStatus>,
    pub answer: bool,
}

impl FakePermissions {
    pub fn new(status: PermissionStatus) -> Arc<Self> {
        Arc::new(Self {
            status: Mutex::new(status),
            answer: true,
        })
    }
}

impl PermissionProvider for FakePermissions {
    fn record_permission(&self) -> PermissionStatus {
        *self.status.lock()
    }

    fn request_record_permission(&self, completion: PermissionCompletion) {
        let answer = self.answer;
        *self.status.lock() = if answer {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        };
        completion(answer);
    }
}

pub fn fast_tuning() -> SessionTuning {
    SessionTuning {
        writer_interval: Duration::from_millis(5),
        ..Default::default()
    }
}

pub fn tone(len: usize, amplitude: f32) -> Vec<f32> {
    (0..len)
        .map(|i| if i % 2 == 0 { amplitude } else { -amplitude })
        .collect()
}
