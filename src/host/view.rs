//! Render targets for the tick text. Only ever touched from the UI thread.

use parking_lot::Mutex;

pub trait TickView: Send + Sync {
    fn set_text(&self, text: &str);
}

/// Keeps the last rendered text and a render count
#[derive(Debug, Default)]
pub struct LabelView {
    text: Mutex<String>,
    renders: Mutex<u64>,
}

impl LabelView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> String {
        self.text.lock().clone()
    }

    pub fn renders(&self) -> u64 {
        *self.renders.lock()
    }
}

impl TickView for LabelView {
    fn set_text(&self, text: &str) {
        *self.text.lock() = text.to_string();
        *self.renders.lock() += 1;
    }
}
