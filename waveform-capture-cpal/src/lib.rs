//! # waveform-capture-cpal
//!
//! Desktop backend for waveform-capture.
//!
//! Provides:
//! - `CpalInput`: microphone input via the default cpal host
//! - `DesktopPlatform`: `CapturePlatform` with WAV output and the user's documents folder
//! - `DesktopPermission`: microphone access probe
//!
//! ## Encoders
//!
//! Only linear PCM (encoder id 10, `.wav`) is written on desktop. The
//! core's default encoder is AAC, so hosts must pass `encoder: Some(10)`;
//! any other id fails `start_recording` with `HardwareInitFailure` before a
//! file is created.
//!
//! ## Usage
//! ```ignore
//! use std::sync::Arc;
//! use waveform_capture_core::{SessionManager, StartRecordingArgs};
//! use waveform_capture_cpal::{DesktopPermission, DesktopPlatform};
//!
//! let manager = SessionManager::new(Arc::new(DesktopPlatform::new()), Arc::new(DesktopPermission::default()));
//! manager.start_recording(StartRecordingArgs { encoder: Some(10), ..Default::default() })?;
//! let level = manager.get_loudness();
//! let result = manager.stop_recording()?;
//! ```

pub mod device;
pub mod error;
pub mod input;
pub mod permissions;
pub mod platform;

pub use device::{find_input_device, list_input_devices};
pub use error::CpalError;
pub use input::CpalInput;
pub use permissions::DesktopPermission;
pub use platform::DesktopPlatform;
