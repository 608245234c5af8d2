//! Human-readable status lines emitted by the ticker thread.

pub const STATUS_INITIALIZING: &str = "TickerThread status: initializing...";
pub const STATUS_TICKING: &str = "TickerThread status: start ticking ...";
pub const STATUS_STOPPED: &str = "TickerThread status: ticking stopped";
pub const STATUS_OVERRUN: &str = "TickerThread error: processing too long!";

/// Receiver for ticker status messages.
///
/// Called from the ticker thread while it is attached, so implementations
/// may call into the managed runtime.
pub trait StatusSink: Send + Sync {
    fn update_status(&self, message: &str);
}

/// Default sink: writes every status line to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogStatus;

impl StatusSink for LogStatus {
    fn update_status(&self, message: &str) {
        tracing::info!(target: "ticker", status = message, "ticker status");
    }
}
