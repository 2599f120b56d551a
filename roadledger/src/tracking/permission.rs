//! Location permission gate.
//!
//! The platform permission prompt lives outside the library; tracking only
//! needs a yes/no answer before subscribing.

use std::sync::atomic::{AtomicBool, Ordering};

/// Answers whether location tracking is currently permitted.
pub trait PermissionGate: Send + Sync {
    /// Whether the user has granted location access.
    fn is_granted(&self) -> bool;
}

/// A permission gate with a fixed or externally toggled answer.
#[derive(Debug)]
pub struct StaticPermission {
    granted: AtomicBool,
}

impl StaticPermission {
    /// A gate that always grants.
    pub fn granted() -> Self {
        Self {
            granted: AtomicBool::new(true),
        }
    }

    /// A gate that always denies.
    pub fn denied() -> Self {
        Self {
            granted: AtomicBool::new(false),
        }
    }

    /// Change the answer, e.g. after the host app re-prompts the user.
    pub fn set_granted(&self, granted: bool) {
        self.granted.store(granted, Ordering::SeqCst);
    }
}

impl PermissionGate for StaticPermission {
    fn is_granted(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }
}
