use cpal::traits::{DeviceTrait, HostTrait};

use crate::error::CpalError;

/// Resolve the named input device, or the host default when `name` is `None`.
pub fn find_input_device(name: Option<&str>) -> Result<cpal::Device, CpalError> {
    let host = cpal::default_host();
    match name {
        Some(name) => host
            .input_devices()?
            .find(|d| d.name().map(|n| n == name).unwrap_or(false))
            .ok_or_else(|| CpalError::DeviceNotFound(name.to_string())),
        None => host.default_input_device().ok_or(CpalError::NoInputDevice),
    }
}

/// Names of all input devices the default host exposes.
pub fn list_input_devices() -> Result<Vec<String>, CpalError> {
    let host = cpal::default_host();
    Ok(host.input_devices()?.filter_map(|d| d.name().ok()).collect())
}

/// Convert one hardware sample to normalized `f32`.
pub trait ToNormalized: Copy {
    fn to_normalized(self) -> f32;
}

impl ToNormalized for f32 {
    fn to_normalized(self) -> f32 {
        self
    }
}

impl ToNormalized for i16 {
    fn to_normalized(self) -> f32 {
        self as f32 / 32_768.0
    }
}

impl ToNormalized for u16 {
    fn to_normalized(self) -> f32 {
        (self as f32 - 32_768.0) / 32_768.0
    }
}
