use hello_jnicallback::{
    ActivityHost, CallbackError, CallbackTarget, LabelView, LifecycleController, LocalRuntime,
    LogStatus, RunFlag, StatusSink, TickerConfig, TimerActivity, UiThread,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;

#[derive(Default)]
struct Counter(AtomicU64);

impl CallbackTarget for Counter {
    fn update_timer(&self) -> Result<(), CallbackError> {
        self.0.fetch_add(1, Ordering::SeqCst);
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

fn fast_config() -> TickerConfig {
    TickerConfig::default().with_interval(Duration::from_millis(5))
}

fn weak(target: &Arc<Counter>) -> Weak<dyn CallbackTarget> {
    Arc::downgrade(target) as Weak<dyn CallbackTarget>
}

#[test]
fn test_no_callbacks_after_stop() {
    let runtime = Arc::new(LocalRuntime::new());
    let controller = LifecycleController::new(runtime.clone(), Arc::new(LogStatus), fast_config());
    let target = Arc::new(Counter::default());

    controller.start(weak(&target), "11211").unwrap();
    thread::sleep(Duration::from_millis(50));
    controller.stop();

    let at_stop = target.0.load(Ordering::SeqCst);
    assert!(at_stop > 0);

    thread::sleep(Duration::from_millis(50));
    assert_eq!(target.0.load(Ordering::SeqCst), at_stop);
    assert_eq!(controller.run_flag(), RunFlag::Idle);
    assert_eq!(runtime.attached_count(), 0);
}

#[test]
fn test_target_dropped_mid_run() {
    let runtime = Arc::new(LocalRuntime::new());
    let controller = LifecycleController::new(runtime.clone(), Arc::new(LogStatus), fast_config());
    let target = Arc::new(Counter::default());

    controller.start(weak(&target), "").unwrap();
    thread::sleep(Duration::from_millis(30));
    drop(target);
    thread::sleep(Duration::from_millis(30));

    // Ticker keeps running, skipping the dead target
    assert!(controller.is_running());
    controller.stop();

    let stats = controller.stats();
    assert!(stats.skipped > 0);
    assert_eq!(stats.failed, 0);
}

#[test]
fn test_attach_detach_balance_over_cycles() {
    let runtime = Arc::new(LocalRuntime::new());
    let controller = LifecycleController::new(runtime.clone(), Arc::new(LogStatus), fast_config());
    let target = Arc::new(Counter::default());

    for _ in 0..5 {
        controller.start(weak(&target), "").unwrap();
        controller.start(weak(&target), "").unwrap();
        thread::sleep(Duration::from_millis(10));
        controller.stop();
        controller.stop();
    }

    assert_eq!(controller.stats().spawned, 5);
    assert_eq!(runtime.total_attaches(), 5);
    assert_eq!(runtime.total_detaches(), 5);
    assert_eq!(runtime.attached_count(), 0);
}

#[test]
fn test_status_lines_per_run() {
    let status = Arc::new(Recorder::default());
    let controller = LifecycleController::new(Arc::new(LocalRuntime::new()), status.clone(), fast_config());
    let target = Arc::new(Counter::default());

    controller.start(weak(&target), "").unwrap();
    thread::sleep(Duration::from_millis(20));
    controller.stop();

    let lines = status.0.lock().clone();
    assert_eq!(lines[0], "TickerThread status: initializing...");
    assert_eq!(lines[1], "TickerThread status: start ticking ...");
    assert_eq!(lines.last().map(String::as_str), Some("TickerThread status: ticking stopped"));
}

#[test]
fn test_activity_resets_on_each_activation() {
    let ui = UiThread::spawn("ui-test").unwrap();
    let view = Arc::new(LabelView::new());
    let activity = Arc::new(TimerActivity::new(Arc::new(ui.handle()), view.clone()));
    let controller = LifecycleController::new(Arc::new(LocalRuntime::new()), Arc::new(LogStatus), fast_config());
    let host = ActivityHost::new(activity.clone(), controller);

    host.on_activate().unwrap();
    thread::sleep(Duration::from_millis(40));
    host.on_deactivate();
    assert!(activity.snapshot().elapsed() > 0);

    host.on_activate().unwrap();
    host.on_deactivate();
    let after_second = activity.snapshot().elapsed();

    ui.flush(Duration::from_secs(2));
    assert!(after_second < 40);
    assert!(view.renders() > 0);
    ui.shutdown();
}
