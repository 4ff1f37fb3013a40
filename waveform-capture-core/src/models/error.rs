use thiserror::Error;

/// Errors surfaced by capture operations.
///
/// `ProbeFailure` is absorbed inside `stop` (the session falls back to the
/// active wall-clock duration); every other kind reaches the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    #[error("hardware initialization failed: {0}")]
    HardwareInitFailure(String),

    #[error("path resolution failed: {0}")]
    PathResolutionFailure(String),

    #[error("permission denied")]
    PermissionDenied,

    #[error("duration probe failed: {0}")]
    ProbeFailure(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

impl CaptureError {
    /// Stable identifier handed to the host transport alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidState { .. } => "invalid_state",
            Self::HardwareInitFailure(_) => "hardware_init_failure",
            Self::PathResolutionFailure(_) => "path_resolution_failure",
            Self::PermissionDenied => "permission_denied",
            Self::ProbeFailure(_) => "probe_failure",
            Self::StorageError(_) => "storage_error",
        }
    }

    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState { .. })
    }
}
