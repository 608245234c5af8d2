//! Thread registration with the managed runtime
//!
//! Every thread not created by the managed runtime has to register before it
//! calls into it and deregister before it exits. `AttachGuard` ties that pair
//! to a scope so the release happens on every exit path.

use crate::errors::AttachError;
use crate::infrastructure::logging::{log_thread_attach, log_thread_detach};
use dashmap::DashSet;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};

/// Outcome of an attach request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attachment {
    /// The thread was registered by this call and must be detached later
    New,
    /// The thread was already known to the runtime; detaching is not ours to do
    Existing,
}

/// A managed runtime that native threads can attach to.
pub trait ManagedRuntime: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Register the calling thread with the runtime.
    fn attach_current_thread(&self) -> Result<Attachment, AttachError>;

    /// Unregister the calling thread. Only called for `Attachment::New`.
    fn detach_current_thread(&self);
}

/// Proof that the current thread is attached to a runtime.
///
/// Not `Send`: calls made through it are only valid on the thread that
/// attached. Dropping it detaches the thread if this guard attached it.
pub struct AttachGuard {
    runtime: Arc<dyn ManagedRuntime>,
    attachment: Attachment,
    thread: ThreadId,
    _not_send: PhantomData<*const ()>,
}

impl AttachGuard {
    /// Attach the current thread to `runtime`.
    pub fn acquire(runtime: &Arc<dyn ManagedRuntime>) -> Result<Self, AttachError> {
        let attachment = runtime.attach_current_thread()?;
        let current = thread::current();
        log_thread_attach(runtime.name(), current.name(), attachment == Attachment::New);

        Ok(Self {
            runtime: Arc::clone(runtime),
            attachment,
            thread: current.id(),
            _not_send: PhantomData,
        })
    }

    pub fn attachment(&self) -> Attachment {
        self.attachment
    }

    pub fn thread(&self) -> ThreadId {
        self.thread
    }

    pub fn runtime(&self) -> &Arc<dyn ManagedRuntime> {
        &self.runtime
    }
}

impl Drop for AttachGuard {
    fn drop(&mut self) {
        debug_assert_eq!(thread::current().id(), self.thread);
        if self.attachment == Attachment::New {
            self.runtime.detach_current_thread();
            log_thread_detach(self.runtime.name(), thread::current().name());
        }
    }
}

/// In-process runtime used by the headless host and by tests.
///
/// Keeps the set of attached threads so leaks and double attaches are
/// observable, and refuses new threads once shut down.
pub struct LocalRuntime {
    attached: DashSet<ThreadId>,
    shutting_down: AtomicBool,
    attaches: AtomicU64,
    detaches: AtomicU64,
}

impl LocalRuntime {
    pub fn new() -> Self {
        Self {
            attached: DashSet::with_capacity(8),
            shutting_down: AtomicBool::new(false),
            attaches: AtomicU64::new(0),
            detaches: AtomicU64::new(0),
        }
    }

    /// Mark the calling thread as owned by the runtime itself (main or UI
    /// thread). Such threads report `Attachment::Existing`.
    pub fn adopt_current_thread(&self) {
        self.attached.insert(thread::current().id());
    }

    /// Refuse all further attaches
    pub fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    pub fn is_attached(&self, thread: ThreadId) -> bool {
        self.attached.contains(&thread)
    }

    /// Threads currently registered, adopted ones included
    pub fn attached_count(&self) -> usize {
        self.attached.len()
    }

    /// Number of successful native attaches over the runtime's lifetime
    pub fn total_attaches(&self) -> u64 {
        self.attaches.load(Ordering::SeqCst)
    }

    pub fn total_detaches(&self) -> u64 {
        self.detaches.load(Ordering::SeqCst)
    }
}

impl Default for LocalRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl ManagedRuntime for LocalRuntime {
    fn name(&self) -> &str {
        "local"
    }

    fn attach_current_thread(&self) -> Result<Attachment, AttachError> {
        if self.is_shutting_down() {
            return Err(AttachError::ShuttingDown);
        }

        if self.attached.insert(thread::current().id()) {
            self.attaches.fetch_add(1, Ordering::SeqCst);
            Ok(Attachment::New)
        } else {
            Ok(Attachment::Existing)
        }
    }

    fn detach_current_thread(&self) {
        if self.attached.remove(&thread::current().id()).is_some() {
            self.detaches.fetch_add(1, Ordering::SeqCst);
        } else {
            tracing::warn!(target: "bridge", "detach requested for a thread that is not attached");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local() -> (Arc<LocalRuntime>, Arc<dyn ManagedRuntime>) {
        let runtime = Arc::new(LocalRuntime::new());
        let dynamic: Arc<dyn ManagedRuntime> = runtime.clone();
        (runtime, dynamic)
    }

    #[test]
    fn test_guard_detaches_on_drop() {
        let (runtime, dynamic) = local();

        let handle = thread::spawn(move || {
            let guard = AttachGuard::acquire(&dynamic).unwrap();
            assert_eq!(guard.attachment(), Attachment::New);
            guard.thread()
        });
        let id = handle.join().unwrap();

        assert!(!runtime.is_attached(id));
        assert_eq!(runtime.total_attaches(), 1);
        assert_eq!(runtime.total_detaches(), 1);
        assert_eq!(runtime.attached_count(), 0);
    }

    #[test]
    fn test_guard_released_on_early_return() {
        let (runtime, dynamic) = local();

        fn work(runtime: &Arc<dyn ManagedRuntime>) -> Result<(), String> {
            let _guard = AttachGuard::acquire(runtime).map_err(|e| e.to_string())?;
            Err("bail out".to_string())
        }

        thread::spawn(move || assert!(work(&dynamic).is_err())).join().unwrap();
        assert_eq!(runtime.attached_count(), 0);
        assert_eq!(runtime.total_detaches(), 1);
    }

    #[test]
    fn test_existing_thread_not_detached() {
        let (runtime, dynamic) = local();
        runtime.adopt_current_thread();

        let guard = AttachGuard::acquire(&dynamic).unwrap();
        assert_eq!(guard.attachment(), Attachment::Existing);
        drop(guard);

        assert!(runtime.is_attached(thread::current().id()));
        assert_eq!(runtime.total_detaches(), 0);
    }

    #[test]
    fn test_attach_refused_after_shutdown() {
        let (runtime, dynamic) = local();
        runtime.shutdown();

        let result = thread::spawn(move || AttachGuard::acquire(&dynamic).map(|_| ()))
            .join()
            .unwrap();
        assert_eq!(result, Err(AttachError::ShuttingDown));
        assert_eq!(runtime.total_attaches(), 0);
    }
}
