//! The native ticker thread
//!
//! One worker per active ticker. The worker attaches to the managed runtime,
//! then alternates between an interruptible wait for the next deadline and
//! one bridge invocation, until the shared `RunFlag` leaves `Running`.
//!
//! The wait is a condition-variable timed wait on the same mutex that guards
//! the flag, so a stop request issued while the worker sleeps wakes it
//! immediately and cannot be missed.

pub mod stats;

pub use stats::{StatsSnapshot, TickerStats};

use crate::bridge::status::{STATUS_INITIALIZING, STATUS_OVERRUN, STATUS_STOPPED, STATUS_TICKING};
use crate::bridge::{CallbackBridge, StatusSink};
use crate::errors::{CallbackError, StartError};
use crate::frontend::TickerConfig;
use crate::infrastructure::logging::{log_tick, log_tick_skipped};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};

/// Whether the ticker loop should keep going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunFlag {
    Idle,
    Running,
    StopRequested,
}

/// State shared between the controller and its worker.
pub struct TickerShared {
    flag: Mutex<RunFlag>,
    wake: Condvar,
    worker: Mutex<Option<ThreadId>>,
    stats: TickerStats,
}

impl TickerShared {
    pub fn new() -> Self {
        Self {
            flag: Mutex::new(RunFlag::Idle),
            wake: Condvar::new(),
            worker: Mutex::new(None),
            stats: TickerStats::new(),
        }
    }

    pub fn run_flag(&self) -> RunFlag {
        *self.flag.lock()
    }

    pub fn stats(&self) -> &TickerStats {
        &self.stats
    }

    /// Move to `StopRequested` and wake the sleeping worker.
    /// Returns whether a ticker was running.
    pub fn request_stop(&self) -> bool {
        let mut flag = self.flag.lock();
        if *flag != RunFlag::Running {
            return false;
        }
        *flag = RunFlag::StopRequested;
        self.wake.notify_all();
        true
    }

    /// Whether the calling thread is the live ticker worker
    pub fn is_worker_thread(&self) -> bool {
        *self.worker.lock() == Some(thread::current().id())
    }

    /// Controller side: the worker is gone, back to `Idle`.
    pub fn mark_idle(&self) {
        *self.flag.lock() = RunFlag::Idle;
    }

    /// Block until `deadline` or until the flag leaves `Running`.
    /// Returns true if the caller should tick.
    fn wait_until(&self, deadline: Instant) -> bool {
        let mut flag = self.flag.lock();
        loop {
            if *flag != RunFlag::Running {
                return false;
            }
            if self.wake.wait_until(&mut flag, deadline).timed_out() {
                return *flag == RunFlag::Running;
            }
        }
    }

    /// Worker side: however the loop ended, the flag goes back to `Idle`.
    /// A controller that requested the stop still joins the handle.
    fn finish(&self) {
        *self.worker.lock() = None;
        *self.flag.lock() = RunFlag::Idle;
    }
}

impl Default for TickerShared {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs `TickerShared::finish` however the worker exits.
struct FinishOnExit<'a>(&'a TickerShared);

impl Drop for FinishOnExit<'_> {
    fn drop(&mut self) {
        self.0.finish();
    }
}

/// Handle to a running ticker worker.
pub struct TickerThread {
    handle: JoinHandle<()>,
}

impl TickerThread {
    /// Flip the flag to `Running` and start the worker.
    ///
    /// On spawn failure the flag is put back to `Idle`.
    pub fn spawn(
        shared: Arc<TickerShared>,
        bridge: CallbackBridge,
        status: Arc<dyn StatusSink>,
        config: &TickerConfig,
        param: &str,
    ) -> Result<Self, StartError> {
        *shared.flag.lock() = RunFlag::Running;

        let worker = Worker {
            shared: Arc::clone(&shared),
            bridge,
            status,
            interval: config.interval(),
            report_overruns: config.report_overruns,
        };

        tracing::debug!(target: "ticker", param, interval_ms = config.interval_ms, "spawning ticker thread");

        match thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || worker.run())
        {
            Ok(handle) => {
                shared.stats.record_spawn();
                Ok(Self { handle })
            }
            Err(e) => {
                shared.mark_idle();
                Err(StartError::Spawn(e))
            }
        }
    }

    pub fn thread_id(&self) -> ThreadId {
        self.handle.thread().id()
    }

    /// Wait for the worker to exit.
    pub fn join(self) {
        if self.handle.join().is_err() {
            tracing::error!(target: "ticker", "ticker thread panicked");
        }
    }
}

struct Worker {
    shared: Arc<TickerShared>,
    bridge: CallbackBridge,
    status: Arc<dyn StatusSink>,
    interval: Duration,
    report_overruns: bool,
}

impl Worker {
    fn run(self) {
        *self.shared.worker.lock() = Some(thread::current().id());
        let _finish = FinishOnExit(&self.shared);

        let env = match self.bridge.attach() {
            Ok(env) => env,
            Err(e) => {
                tracing::error!(target: "ticker", error = %e, "ticker thread could not attach, exiting");
                self.shared.stats.record_attach_failure();
                return;
            }
        };

        self.status.update_status(STATUS_INITIALIZING);
        self.status.update_status(STATUS_TICKING);

        let mut deadline = Instant::now() + self.interval;
        while self.shared.wait_until(deadline) {
            match self.bridge.invoke(&env) {
                Ok(()) => log_tick(self.shared.stats.record_delivered()),
                Err(CallbackError::TargetGone) => {
                    let skipped = self.shared.stats.record_skipped();
                    log_tick_skipped(skipped, &CallbackError::TargetGone.to_string());
                }
                Err(e) => {
                    self.shared.stats.record_failed();
                    tracing::warn!(target: "ticker", error = %e, "update callback failed");
                }
            }

            deadline += self.interval;
            let now = Instant::now();
            if now >= deadline {
                // The callback ate the whole next interval; restart the schedule
                self.shared.stats.record_overrun();
                if self.report_overruns {
                    self.status.update_status(STATUS_OVERRUN);
                }
                deadline = now + self.interval;
            }
        }

        self.status.update_status(STATUS_STOPPED);
        drop(env);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{CallbackTarget, LocalRuntime, ManagedRuntime};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Weak;

    struct Counter {
        calls: AtomicU64,
        delay: Duration,
    }

    impl CallbackTarget for Counter {
        fn update_timer(&self) -> Result<(), CallbackError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                thread::sleep(self.delay);
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl StatusSink for Recorder {
        fn update_status(&self, message: &str) {
            self.0.lock().push(message.to_string());
        }
    }

    fn config(interval_ms: u64) -> TickerConfig {
        TickerConfig {
            interval_ms,
            ..TickerConfig::default()
        }
    }

    fn spawn(
        shared: &Arc<TickerShared>,
        target: &Arc<Counter>,
        runtime: Arc<dyn ManagedRuntime>,
        status: Arc<Recorder>,
        interval_ms: u64,
    ) -> TickerThread {
        let weak: Weak<dyn CallbackTarget> = Arc::downgrade(target) as Weak<dyn CallbackTarget>;
        TickerThread::spawn(
            Arc::clone(shared),
            CallbackBridge::new(runtime, weak),
            status,
            &config(interval_ms),
            "11211",
        )
        .unwrap()
    }

    #[test]
    fn test_ticks_then_stops() {
        let shared = Arc::new(TickerShared::new());
        let target = Arc::new(Counter { calls: AtomicU64::new(0), delay: Duration::ZERO });
        let runtime = Arc::new(LocalRuntime::new());
        let status = Arc::new(Recorder::default());

        let worker = spawn(&shared, &target, runtime.clone(), status.clone(), 5);
        thread::sleep(Duration::from_millis(100));

        assert!(shared.request_stop());
        worker.join();
        shared.mark_idle();

        assert!(target.calls.load(Ordering::SeqCst) > 0);
        assert_eq!(shared.run_flag(), RunFlag::Idle);
        assert_eq!(runtime.attached_count(), 0);

        let lines = status.0.lock().clone();
        assert_eq!(lines.first().map(String::as_str), Some(STATUS_INITIALIZING));
        assert_eq!(lines.get(1).map(String::as_str), Some(STATUS_TICKING));
        assert_eq!(lines.last().map(String::as_str), Some(STATUS_STOPPED));
    }

    #[test]
    fn test_stop_interrupts_sleep() {
        let shared = Arc::new(TickerShared::new());
        let target = Arc::new(Counter { calls: AtomicU64::new(0), delay: Duration::ZERO });
        let worker = spawn(&shared, &target, Arc::new(LocalRuntime::new()), Arc::new(Recorder::default()), 60_000);

        thread::sleep(Duration::from_millis(20));
        let started = Instant::now();
        shared.request_stop();
        worker.join();

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(target.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_overrun_reported() {
        let shared = Arc::new(TickerShared::new());
        let target = Arc::new(Counter { calls: AtomicU64::new(0), delay: Duration::from_millis(30) });
        let status = Arc::new(Recorder::default());
        let worker = spawn(&shared, &target, Arc::new(LocalRuntime::new()), status.clone(), 5);

        thread::sleep(Duration::from_millis(150));
        shared.request_stop();
        worker.join();

        assert!(shared.stats().snapshot().overruns > 0);
        assert!(status.0.lock().iter().any(|line| line == STATUS_OVERRUN));
    }

    #[test]
    fn test_attach_failure_returns_to_idle() {
        let shared = Arc::new(TickerShared::new());
        let target = Arc::new(Counter { calls: AtomicU64::new(0), delay: Duration::ZERO });
        let runtime = Arc::new(LocalRuntime::new());
        runtime.shutdown();

        let worker = spawn(&shared, &target, runtime, Arc::new(Recorder::default()), 5);
        worker.join();

        assert_eq!(shared.run_flag(), RunFlag::Idle);
        assert_eq!(shared.stats().snapshot().attach_failures, 1);
        assert_eq!(target.calls.load(Ordering::SeqCst), 0);
    }
}
