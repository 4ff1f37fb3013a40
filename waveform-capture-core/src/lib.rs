//! # waveform-capture-core
//!
//! Platform-agnostic microphone capture with a live amplitude tap.
//!
//! One hardware input feeds two consumers at once: a file-writing recorder
//! and an analysis tap that keeps the peak amplitude since the last poll,
//! so a host can draw a live waveform while the file is being written.
//! Platform backends implement `CapturePlatform`, `CaptureProvider` and
//! `PermissionProvider`; the host transport talks to `SessionManager`.
//!
//! ## Architecture
//!
//! ```text
//! waveform-capture-core (this crate)
//! ├── traits/       ← CaptureProvider, AudioSink, MediaWriter, CapturePlatform, PermissionProvider
//! ├── models/       ← CaptureError, CaptureState, CaptureConfiguration, encoder catalog, results
//! ├── processing/   ← AmplitudeMeter, RingBuffer, MonoResampler, WAV header helpers
//! ├── permission/   ← PermissionGate
//! ├── session/      ← CaptureSession (state machine), SessionManager (facade), writer thread
//! └── storage/      ← WavWriter, output path resolution
//! ```

pub mod models;
pub mod permission;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::config::{
    AudioSessionCategory, AudioSessionOptions, CaptureConfiguration, EncoderConfig, QualityTier, SessionTuning,
};
pub use models::encoder::{EncoderDescriptor, EncoderFormat};
pub use models::error::CaptureError;
pub use models::permission::PermissionStatus;
pub use models::recording_result::{DurationSource, RecordingResult, StopResult};
pub use models::state::CaptureState;
pub use permission::gate::PermissionGate;
pub use processing::amplitude::{AmplitudeMeter, LoudnessLaw, PCM16_FULL_SCALE, SILENCE_DB};
pub use session::capture::CaptureSession;
pub use session::manager::{SessionManager, StartRecordingArgs};
pub use storage::wav_writer::{probe_wav_duration, WavWriter};
pub use traits::audio_sink::AudioSink;
pub use traits::capture_provider::{AudioBufferCallback, CaptureProvider, InputFormat};
pub use traits::media_writer::MediaWriter;
pub use traits::permission::{PermissionCompletion, PermissionProvider};
pub use traits::platform::CapturePlatform;
