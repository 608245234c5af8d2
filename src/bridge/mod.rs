//! Calling back into the managed runtime from native threads
//!
//! The bridge binds a runtime and a weakly held callback target once, at
//! setup. Worker threads then `attach`, `invoke` once per tick through the
//! returned guard, and detach when the guard drops.

pub mod runtime;
pub mod status;

pub use runtime::{AttachGuard, Attachment, LocalRuntime, ManagedRuntime};
pub use status::{LogStatus, StatusSink};

use crate::errors::{AttachError, CallbackError};
use std::sync::{Arc, Weak};

/// Managed object whose update method runs once per tick.
pub trait CallbackTarget: Send + Sync {
    /// The `updateTimer()` callback: no arguments, side effects only.
    fn update_timer(&self) -> Result<(), CallbackError>;
}

/// Runtime plus callback target, resolved once and shared with the worker.
#[derive(Clone)]
pub struct CallbackBridge {
    runtime: Arc<dyn ManagedRuntime>,
    target: Weak<dyn CallbackTarget>,
}

impl CallbackBridge {
    /// The bridge never keeps `target` alive.
    pub fn new(runtime: Arc<dyn ManagedRuntime>, target: Weak<dyn CallbackTarget>) -> Self {
        Self { runtime, target }
    }

    /// Attach the calling thread. Keep the guard for the thread's lifetime.
    pub fn attach(&self) -> Result<AttachGuard, AttachError> {
        AttachGuard::acquire(&self.runtime)
    }

    /// Run the target's update method on the attached thread.
    pub fn invoke(&self, _env: &AttachGuard) -> Result<(), CallbackError> {
        let target = self.target.upgrade().ok_or(CallbackError::TargetGone)?;
        target.update_timer()
    }

    pub fn is_target_alive(&self) -> bool {
        self.target.strong_count() > 0
    }

    pub fn runtime(&self) -> &Arc<dyn ManagedRuntime> {
        &self.runtime
    }
}
