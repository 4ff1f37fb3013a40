use crate::models::permission::PermissionStatus;

/// Completion for an asynchronous permission prompt.
pub type PermissionCompletion = Box<dyn FnOnce(bool) + Send + 'static>;

/// Platform microphone-authorization API.
pub trait PermissionProvider: Send + Sync {
    /// Current OS authorization, read synchronously.
    fn record_permission(&self) -> PermissionStatus;

    /// Show the OS prompt. `completion` may run on any thread, possibly
    /// before this call returns.
    fn request_record_permission(&self, completion: PermissionCompletion);
}
