//! hello-jnicallback - periodic callbacks from a native thread into a managed runtime
//!
//! A native ticker thread attaches to the runtime, ticks once per time unit,
//! invokes the activity's `updateTimer()` callback and detaches on exit.
//! `LifecycleController` keeps at most one ticker alive and makes `stop`
//! wait for it. With the `jni` feature the crate builds the Android JNI
//! library; without it, `LocalRuntime` stands in for the JVM.

pub mod timer;
pub mod bridge;
pub mod dispatch;
pub mod errors;
pub mod ffi;
pub mod frontend;
pub mod host;
pub mod infrastructure;
pub mod lifecycle;
pub mod ticker;

// Re-export commonly used items
pub use timer::TimerState;
pub use bridge::{
    AttachGuard, Attachment, CallbackBridge, CallbackTarget, LocalRuntime, LogStatus,
    ManagedRuntime, StatusSink,
};
pub use dispatch::{UiDispatcher, UiHandle, UiJob, UiThread};
pub use errors::{AttachError, CallbackError, ConfigError, StartError};
pub use ffi::greeting;
pub use frontend::{Config, TickerConfig};
pub use host::{ActivityHost, LabelView, TickView, TimerActivity};
pub use infrastructure::{
    init_dev_logging, init_file_logging, init_logging, LogConfig, LogFormat, LogOutput,
};
pub use lifecycle::LifecycleController;
pub use ticker::{RunFlag, StatsSnapshot, TickerThread};
