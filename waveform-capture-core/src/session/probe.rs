use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError};

use crate::models::error::CaptureError;
use crate::traits::platform::CapturePlatform;

/// Run the platform duration probe on a helper thread and wait at most
/// `timeout` for it.
///
/// A probe that never completes leaves its thread behind; the caller gets
/// `ProbeFailure` and carries on.
pub fn probe_with_timeout(
    platform: Arc<dyn CapturePlatform>,
    path: PathBuf,
    timeout: Duration,
) -> Result<Duration, CaptureError> {
    let (tx, rx) = bounded(1);

    thread::Builder::new()
        .name("duration-probe".into())
        .spawn(move || {
            let _ = tx.send(platform.probe_duration(&path));
        })
        .map_err(|e| CaptureError::ProbeFailure(format!("failed to spawn probe thread: {}", e)))?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(CaptureError::ProbeFailure(format!(
            "timed out after {} ms",
            timeout.as_millis()
        ))),
        Err(RecvTimeoutError::Disconnected) => {
            Err(CaptureError::ProbeFailure("probe thread exited without a result".into()))
        }
    }
}
