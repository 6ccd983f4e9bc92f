//! Camera authorization gate.
//!
//! Converts the platform's authorization status into at most one
//! "granted" notification. Denial is silent: nothing fires and the
//! component stays inert.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Authorization state for camera access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionStatus {
    Granted,
    Denied,
    Restricted,
    NotDetermined,
}

/// Callback receiving the outcome of a permission prompt.
pub type PermissionCallback = Box<dyn FnOnce(bool) + Send>;

/// Source of camera authorization, usually the operating system.
pub trait PermissionProvider: Send + Sync {
    /// Returns the current authorization status.
    fn status(&self) -> PermissionStatus;

    /// Shows the permission prompt. `on_result` runs once when the user
    /// answers, possibly on another thread.
    fn request_access(&self, on_result: PermissionCallback);
}

/// Issues at most one "granted" notification per gate.
#[derive(Debug, Default)]
pub struct PermissionGate {
    fired: Arc<AtomicBool>,
}

impl PermissionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `on_granted` now if access is already granted, after the prompt
    /// if the status is undetermined and the user accepts, and never
    /// otherwise.
    pub fn request_if_needed<F>(&self, provider: &dyn PermissionProvider, on_granted: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let status = provider.status();
        match status {
            PermissionStatus::Granted => {
                tracing::debug!("Camera access already granted");
                Self::fire(&self.fired, on_granted);
            }
            PermissionStatus::NotDetermined => {
                tracing::info!("Requesting camera access");
                let fired = Arc::clone(&self.fired);
                provider.request_access(Box::new(move |granted| {
                    if granted {
                        tracing::info!("Camera access granted");
                        Self::fire(&fired, on_granted);
                    } else {
                        tracing::info!("Camera access denied by user");
                    }
                }));
            }
            PermissionStatus::Denied | PermissionStatus::Restricted => {
                tracing::info!(?status, "Camera access unavailable, camera stays inactive");
            }
        }
    }

    /// Returns true once a grant has been delivered.
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    fn fire<F: FnOnce()>(fired: &AtomicBool, on_granted: F) {
        if fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            on_granted();
        }
    }
}

/// Provider with a fixed status that answers prompts immediately.
#[derive(Debug, Clone, Copy)]
pub struct StaticPermission {
    status: PermissionStatus,
    grant_on_request: bool,
}

impl StaticPermission {
    pub fn granted() -> Self {
        Self {
            status: PermissionStatus::Granted,
            grant_on_request: true,
        }
    }

    pub fn denied() -> Self {
        Self {
            status: PermissionStatus::Denied,
            grant_on_request: false,
        }
    }

    /// Undetermined status whose prompt resolves with `grant`.
    pub fn prompt(grant: bool) -> Self {
        Self {
            status: PermissionStatus::NotDetermined,
            grant_on_request: grant,
        }
    }
}

impl PermissionProvider for StaticPermission {
    fn status(&self) -> PermissionStatus {
        self.status
    }

    fn request_access(&self, on_result: PermissionCallback) {
        on_result(self.grant_on_request);
    }
}

/// Provider whose prompt stays open until [`DeferredPermission::respond`].
#[derive(Default)]
pub struct DeferredPermission {
    pending: Mutex<Option<PermissionCallback>>,
    prompts: Mutex<usize>,
}

impl DeferredPermission {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers the outstanding prompt. Returns false if none is open.
    pub fn respond(&self, granted: bool) -> bool {
        let callback = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match callback {
            Some(callback) => {
                callback(granted);
                true
            }
            None => false,
        }
    }

    /// Number of prompts shown so far.
    pub fn prompt_count(&self) -> usize {
        *self.prompts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PermissionProvider for DeferredPermission {
    fn status(&self) -> PermissionStatus {
        PermissionStatus::NotDetermined
    }

    fn request_access(&self, on_result: PermissionCallback) {
        *self.prompts.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = Some(on_result);
    }
}
