//! cpal microphone input.
//!
//! `cpal::Stream` is not `Send` on every host, so each started input owns
//! its stream on a dedicated thread. `start` blocks until that thread
//! reports the stream playing (or failing); `stop` signals the thread and
//! joins it, which drops the stream.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{BufferSize, SampleFormat, StreamConfig, SupportedBufferSize};
use crossbeam_channel::{bounded, Sender};
use parking_lot::Mutex;

use waveform_capture_core::{AudioBufferCallback, CaptureError, CaptureProvider, InputFormat};

use crate::device::{find_input_device, ToNormalized};
use crate::error::CpalError;

/// How long `start` waits for the stream thread to report in.
const START_TIMEOUT: Duration = Duration::from_secs(3);

type SharedTap = Arc<Mutex<Option<AudioBufferCallback>>>;

struct StreamWorker {
    stop: Sender<()>,
    handle: thread::JoinHandle<()>,
}

/// Microphone input over the default cpal host.
pub struct CpalInput {
    device_name: Option<String>,
    tap: SharedTap,
    buffer_frames: Option<u32>,
    worker: Option<StreamWorker>,
}

impl CpalInput {
    /// Input on the named device, or the system default when `None`.
    pub fn new(device_name: Option<String>) -> Self {
        Self {
            device_name,
            tap: Arc::new(Mutex::new(None)),
            buffer_frames: None,
            worker: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }
}

impl CaptureProvider for CpalInput {
    fn is_available(&self) -> bool {
        find_input_device(self.device_name.as_deref()).is_ok()
    }

    fn input_format(&self) -> Result<InputFormat, CaptureError> {
        let device = find_input_device(self.device_name.as_deref())?;
        let config = device.default_input_config().map_err(CpalError::from)?;
        Ok(InputFormat {
            sample_rate: config.sample_rate().0 as f64,
            channels: config.channels(),
        })
    }

    /// Also pins the system default device by name, so a later `start`
    /// (after a pause) reopens the device whose format was reported.
    fn install_tap(&mut self, buffer_size: usize, callback: AudioBufferCallback) -> Result<(), CaptureError> {
        if self.device_name.is_none() {
            let device = find_input_device(None)?;
            match device.name() {
                Ok(name) => {
                    log::debug!("Pinned default input device {}", name);
                    self.device_name = Some(name);
                }
                Err(e) => log::warn!("Default input device has no name, it cannot be pinned: {}", e),
            }
        }
        self.buffer_frames = u32::try_from(buffer_size).ok().filter(|n| *n > 0);
        *self.tap.lock() = Some(callback);
        Ok(())
    }

    fn remove_tap(&mut self) {
        *self.tap.lock() = None;
    }

    fn start(&mut self) -> Result<(), CaptureError> {
        if self.worker.is_some() {
            return Ok(());
        }

        let (ready_tx, ready_rx) = bounded::<Result<(), CpalError>>(1);
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let device_name = self.device_name.clone();
        let tap = Arc::clone(&self.tap);
        let buffer_frames = self.buffer_frames;

        let handle = thread::Builder::new()
            .name("waveform-input".into())
            .spawn(move || {
                let stream = match open_stream(device_name.as_deref(), buffer_frames, tap) {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));

                // Parked until `stop` sends or the input is dropped.
                let _ = stop_rx.recv();
                if let Err(e) = stream.pause() {
                    log::debug!("Failed to pause input stream: {}", e);
                }
                drop(stream);
            })
            .map_err(|e| CpalError::Thread(format!("failed to spawn input thread: {}", e)))?;

        match ready_rx.recv_timeout(START_TIMEOUT) {
            Ok(Ok(())) => {
                log::debug!("Input stream started");
                self.worker = Some(StreamWorker { stop: stop_tx, handle });
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e.into())
            }
            Err(_) => {
                // The thread exits on its own once the stop sender is gone.
                drop(stop_tx);
                Err(CpalError::Thread("input stream did not start in time".into()).into())
            }
        }
    }

    fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        let _ = worker.stop.send(());
        if worker.handle.join().is_err() {
            log::error!("Input thread panicked");
        }
        log::debug!("Input stream stopped");
    }
}

impl Drop for CpalInput {
    fn drop(&mut self) {
        self.stop();
    }
}

fn open_stream(
    device_name: Option<&str>,
    buffer_frames: Option<u32>,
    tap: SharedTap,
) -> Result<cpal::Stream, CpalError> {
    let device = find_input_device(device_name)?;
    let supported = device.default_input_config()?;
    let format = supported.sample_format();

    let buffer_size = match (buffer_frames, supported.buffer_size()) {
        (Some(frames), SupportedBufferSize::Range { min, max }) if (*min..=*max).contains(&frames) => {
            BufferSize::Fixed(frames)
        }
        _ => BufferSize::Default,
    };
    let mut config: StreamConfig = supported.into();
    config.buffer_size = buffer_size;

    log::info!(
        "Input device {}: {:?} @ {} Hz, {} channel(s), buffer {:?}",
        device.name().unwrap_or_else(|_| "unknown".into()),
        format,
        config.sample_rate.0,
        config.channels,
        config.buffer_size
    );

    let stream = match format {
        SampleFormat::F32 => build_stream::<f32>(&device, &config, tap)?,
        SampleFormat::I16 => build_stream::<i16>(&device, &config, tap)?,
        SampleFormat::U16 => build_stream::<u16>(&device, &config, tap)?,
        other => return Err(CpalError::UnsupportedFormat(other)),
    };
    stream.play()?;
    Ok(stream)
}

fn build_stream<T>(device: &cpal::Device, config: &StreamConfig, tap: SharedTap) -> Result<cpal::Stream, CpalError>
where
    T: cpal::SizedSample + ToNormalized + Send + 'static,
{
    let channels = config.channels.max(1);
    // Reused across callbacks; grows only if the host hands over a larger buffer.
    let mut scratch: Vec<f32> = Vec::new();

    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            let guard = tap.lock();
            let Some(callback) = guard.as_ref() else {
                return;
            };
            scratch.clear();
            scratch.extend(data.iter().map(|s| s.to_normalized()));
            callback(&scratch, channels);
        },
        |err| log::error!("Input stream error: {}", err),
        None,
    )?;
    Ok(stream)
}
