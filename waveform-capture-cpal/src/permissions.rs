//! Desktop microphone permission check.
//!
//! Desktop hosts have no consent dialog for unpackaged apps. Access is
//! inferred by opening the input device: a missing device or a refused
//! configuration query reads as denied.

use cpal::traits::DeviceTrait;

use waveform_capture_core::{PermissionCompletion, PermissionProvider, PermissionStatus};

use crate::device::find_input_device;

#[derive(Debug, Clone, Default)]
pub struct DesktopPermission {
    input_device: Option<String>,
}

impl DesktopPermission {
    pub fn new(input_device: Option<String>) -> Self {
        Self { input_device }
    }
}

impl PermissionProvider for DesktopPermission {
    fn record_permission(&self) -> PermissionStatus {
        let device = match find_input_device(self.input_device.as_deref()) {
            Ok(d) => d,
            Err(e) => {
                log::debug!("Microphone unavailable: {}", e);
                return PermissionStatus::Denied;
            }
        };
        match device.default_input_config() {
            Ok(_) => PermissionStatus::Granted,
            Err(e) => {
                log::warn!("Microphone access refused: {}", e);
                PermissionStatus::Denied
            }
        }
    }

    /// There is nothing to prompt; answers with the current probe.
    fn request_record_permission(&self, completion: PermissionCompletion) {
        completion(self.record_permission().is_granted());
    }
}
