//! The activity side of the callback
//!
//! `TimerActivity` is the callback target: it owns the `TimerState`, advances
//! it on every `update_timer`, and posts the rendered text to the UI thread.
//! `ActivityHost` wires it to a `LifecycleController` through the resume and
//! pause hooks.

pub mod view;

pub use view::{LabelView, TickView};

use crate::bridge::CallbackTarget;
use crate::timer::TimerState;
use crate::dispatch::UiDispatcher;
use crate::errors::{CallbackError, StartError};
use crate::ffi::greeting;
use crate::lifecycle::LifecycleController;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

/// Startup token passed to `start`; accepted but inert
pub const DEFAULT_START_PARAM: &str = "11211";

pub struct TimerActivity {
    state: Mutex<TimerState>,
    ui: Arc<dyn UiDispatcher>,
    view: Arc<dyn TickView>,
}

impl TimerActivity {
    pub fn new(ui: Arc<dyn UiDispatcher>, view: Arc<dyn TickView>) -> Self {
        Self {
            state: Mutex::new(TimerState::new()),
            ui,
            view,
        }
    }

    /// Advance the timer by one unit and schedule a render of the new value.
    pub fn on_tick(&self) {
        let text = {
            let mut state = self.state.lock();
            state.tick();
            state.to_string()
        };

        let view = Arc::clone(&self.view);
        self.ui.post(Box::new(move || view.set_text(&text)));
    }

    pub fn reset(&self) {
        self.state.lock().reset();
    }

    /// Copy of the current counters
    pub fn snapshot(&self) -> TimerState {
        *self.state.lock()
    }
}

impl CallbackTarget for TimerActivity {
    fn update_timer(&self) -> Result<(), CallbackError> {
        self.on_tick();
        Ok(())
    }
}

/// Resume/pause glue between the activity and the controller.
pub struct ActivityHost {
    activity: Arc<TimerActivity>,
    controller: LifecycleController,
    start_param: String,
}

impl ActivityHost {
    pub fn new(activity: Arc<TimerActivity>, controller: LifecycleController) -> Self {
        Self {
            activity,
            controller,
            start_param: DEFAULT_START_PARAM.to_string(),
        }
    }

    pub fn with_start_param(mut self, param: impl Into<String>) -> Self {
        self.start_param = param.into();
        self
    }

    /// Resume hook: zero the timer, then make sure the ticker runs.
    pub fn on_activate(&self) -> Result<(), StartError> {
        self.activity.reset();
        let target: Weak<dyn CallbackTarget> = Arc::downgrade(&self.activity) as Weak<dyn CallbackTarget>;
        self.controller.start(target, &self.start_param)
    }

    /// Pause hook: returns once the ticker thread is gone.
    pub fn on_deactivate(&self) {
        self.controller.stop();
    }

    pub fn start_param(&self) -> &str {
        &self.start_param
    }

    /// Text for the greeting label
    pub fn greeting(&self) -> String {
        greeting()
    }

    pub fn activity(&self) -> &Arc<TimerActivity> {
        &self.activity
    }

    pub fn controller(&self) -> &LifecycleController {
        &self.controller
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{LocalRuntime, LogStatus};
    use crate::dispatch::UiThread;
    use crate::frontend::TickerConfig;
    use std::time::Duration;

    fn activity(ui: &UiThread, view: &Arc<LabelView>) -> Arc<TimerActivity> {
        Arc::new(TimerActivity::new(Arc::new(ui.handle()), view.clone()))
    }

    #[test]
    fn test_tick_renders_on_ui_thread() {
        let ui = UiThread::spawn("ui-test").unwrap();
        let view = Arc::new(LabelView::new());
        let activity = activity(&ui, &view);

        for _ in 0..61 {
            activity.on_tick();
        }
        assert!(ui.flush(Duration::from_secs(5)));

        assert_eq!(activity.snapshot().as_tuple(), (0, 1, 1));
        assert_eq!(view.text(), "0:1:1");
        assert_eq!(view.renders(), 61);
    }

    #[test]
    fn test_activate_resets_before_first_tick() {
        let ui = UiThread::spawn("ui-test").unwrap();
        let view = Arc::new(LabelView::new());
        let activity = activity(&ui, &view);
        for _ in 0..90 {
            activity.on_tick();
        }

        let config = TickerConfig {
            interval_ms: 60_000,
            ..TickerConfig::default()
        };
        let controller = LifecycleController::new(Arc::new(LocalRuntime::new()), Arc::new(LogStatus), config);
        let host = ActivityHost::new(activity.clone(), controller);

        host.on_activate().unwrap();
        assert_eq!(activity.snapshot(), TimerState::new());
        host.on_deactivate();
        assert_eq!(activity.snapshot(), TimerState::new());
    }

    #[test]
    fn test_start_param_passed_through() {
        let ui = UiThread::spawn("ui-test").unwrap();
        let view = Arc::new(LabelView::new());
        let runtime = Arc::new(LocalRuntime::new());
        let controller = LifecycleController::new(runtime.clone(), Arc::new(LogStatus), TickerConfig::default());

        let host = ActivityHost::new(activity(&ui, &view), controller);
        assert_eq!(host.start_param(), DEFAULT_START_PARAM);

        let host = host.with_start_param("create thread para");
        assert_eq!(host.start_param(), "create thread para");

        // Inert beyond logging: the ticker starts the same way
        host.on_activate().unwrap();
        assert!(host.controller().is_running());
        host.on_deactivate();
        assert_eq!(runtime.total_attaches(), 1);
    }
}
