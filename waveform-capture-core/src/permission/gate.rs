use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::models::permission::PermissionStatus;
use crate::traits::permission::PermissionProvider;

/// Cached microphone-permission answer.
///
/// `Denied`/`Granted` are read from the OS on every query. `Undetermined`
/// triggers at most one prompt per gate; its answer lands in the cache
/// whenever the OS calls back, so a query made while the prompt is open
/// returns the previous cached value (initially `false`).
pub struct PermissionGate {
    provider: Arc<dyn PermissionProvider>,
    granted: Arc<AtomicBool>,
    prompted: AtomicBool,
}

impl PermissionGate {
    pub fn new(provider: Arc<dyn PermissionProvider>) -> Self {
        Self {
            provider,
            granted: Arc::new(AtomicBool::new(false)),
            prompted: AtomicBool::new(false),
        }
    }

    /// Current OS authorization, without prompting.
    pub fn status(&self) -> PermissionStatus {
        self.provider.record_permission()
    }

    /// Best-effort synchronous answer. May prompt once.
    pub fn has_permission(&self) -> bool {
        match self.provider.record_permission() {
            PermissionStatus::Undetermined => self.prompt_once(),
            PermissionStatus::Denied => self.granted.store(false, Ordering::Release),
            PermissionStatus::Granted => self.granted.store(true, Ordering::Release),
        }
        self.granted.load(Ordering::Acquire)
    }

    fn prompt_once(&self) {
        if self.prompted.swap(true, Ordering::AcqRel) {
            return;
        }
        log::info!("Requesting microphone permission");
        let granted = Arc::clone(&self.granted);
        self.provider.request_record_permission(Box::new(move |allowed| {
            log::info!("Microphone permission {}", if allowed { "granted" } else { "denied" });
            granted.store(allowed, Ordering::Release);
        }));
    }
}
