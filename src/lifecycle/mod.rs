//! Start/stop control for the ticker
//!
//! `LifecycleController` guarantees at most one ticker worker and that
//! `stop` has fully quiesced the worker before returning: once `stop`
//! returns, no further callback can start.

use crate::bridge::{AttachGuard, CallbackBridge, CallbackTarget, ManagedRuntime, StatusSink};
use crate::errors::StartError;
use crate::frontend::TickerConfig;
use crate::ticker::{RunFlag, StatsSnapshot, TickerShared, TickerThread};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};

pub struct LifecycleController {
    runtime: Arc<dyn ManagedRuntime>,
    status: Arc<dyn StatusSink>,
    config: TickerConfig,
    shared: Arc<TickerShared>,
    worker: Mutex<Option<TickerThread>>,
}

impl LifecycleController {
    pub fn new(runtime: Arc<dyn ManagedRuntime>, status: Arc<dyn StatusSink>, config: TickerConfig) -> Self {
        Self {
            runtime,
            status,
            config,
            shared: Arc::new(TickerShared::new()),
            worker: Mutex::new(None),
        }
    }

    /// Ensure a ticker is running against `target`.
    ///
    /// Calling this while a ticker runs is a successful no-op; the running
    /// ticker keeps its original target. `param` is logged and otherwise
    /// unused.
    pub fn start(&self, target: Weak<dyn CallbackTarget>, param: &str) -> Result<(), StartError> {
        if self.shared.is_worker_thread() {
            tracing::debug!(target: "lifecycle", param, "start from the ticker thread ignored");
            return Ok(());
        }
        let mut worker = self.worker.lock();

        if self.shared.run_flag() == RunFlag::Running {
            tracing::debug!(target: "lifecycle", param, "start ignored, ticker already running");
            return Ok(());
        }

        // A worker that exited on its own still has to be reaped
        if let Some(finished) = worker.take() {
            finished.join();
        }

        let bridge = CallbackBridge::new(Arc::clone(&self.runtime), target);
        let thread = TickerThread::spawn(
            Arc::clone(&self.shared),
            bridge,
            Arc::clone(&self.status),
            &self.config,
            param,
        )?;

        tracing::info!(target: "lifecycle", param, thread = ?thread.thread_id(), "ticker started");
        *worker = Some(thread);
        Ok(())
    }

    /// Ensure no ticker is running. Blocks until the worker has exited and
    /// been joined. A no-op when idle.
    ///
    /// Called from inside the update callback, it only requests the stop:
    /// the worker cannot join itself, and the worker lock may be held by a
    /// concurrent `stop` that is joining this very thread.
    pub fn stop(&self) {
        if self.shared.is_worker_thread() {
            self.shared.request_stop();
            tracing::debug!(target: "lifecycle", "stop requested from the ticker thread");
            return;
        }

        let mut worker = self.worker.lock();
        let was_running = self.shared.request_stop();
        if let Some(thread) = worker.take() {
            thread.join();
        }
        self.shared.mark_idle();

        if was_running {
            let stats = self.shared.stats().snapshot();
            tracing::info!(
                target: "lifecycle",
                delivered = stats.delivered,
                skipped = stats.skipped,
                overruns = stats.overruns,
                "ticker stopped"
            );
        } else {
            tracing::debug!(target: "lifecycle", "stop ignored, no ticker running");
        }
    }

    /// Spawn a detached native thread that attaches, reports its identity,
    /// detaches and exits. Independent of the ticker.
    pub fn create_thread(&self, param: &str) -> Result<JoinHandle<()>, StartError> {
        let runtime = Arc::clone(&self.runtime);
        let param = param.to_string();

        let handle = thread::Builder::new()
            .name(format!("{}-aux", self.config.thread_name))
            .spawn(move || {
                let _env = match AttachGuard::acquire(&runtime) {
                    Ok(env) => env,
                    Err(e) => {
                        tracing::warn!(target: "lifecycle", error = %e, "auxiliary thread could not attach");
                        return;
                    }
                };
                tracing::info!(
                    target: "lifecycle",
                    thread = ?thread::current().id(),
                    pid = std::process::id(),
                    param = %param,
                    "auxiliary native thread running"
                );
            })?;

        Ok(handle)
    }

    pub fn is_running(&self) -> bool {
        self.shared.run_flag() == RunFlag::Running
    }

    pub fn run_flag(&self) -> RunFlag {
        self.shared.run_flag()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats().snapshot()
    }

    pub fn config(&self) -> &TickerConfig {
        &self.config
    }
}

impl Drop for LifecycleController {
    fn drop(&mut self) {
        self.stop();
    }
}
