//! Scheduling work onto the UI thread
//!
//! Core code never touches UI state directly; it posts closures here. Jobs
//! run in FIFO order on one dedicated thread, fire-and-forget.

use crossbeam::channel::{self, Receiver, Sender};
use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// A unit of UI work
pub type UiJob = Box<dyn FnOnce() + Send + 'static>;

/// Anything that can run closures on the UI thread.
pub trait UiDispatcher: Send + Sync {
    fn post(&self, job: UiJob);
}

enum UiMessage {
    Run(UiJob),
    Quit,
}

/// Cloneable posting handle for a `UiThread`
#[derive(Clone)]
pub struct UiHandle {
    sender: Sender<UiMessage>,
}

impl UiDispatcher for UiHandle {
    fn post(&self, job: UiJob) {
        if self.sender.send(UiMessage::Run(job)).is_err() {
            tracing::debug!(target: "ui", "ui thread gone, dropping job");
        }
    }
}

/// The UI thread: drains posted jobs until shut down.
pub struct UiThread {
    handle: UiHandle,
    thread: Option<JoinHandle<()>>,
}

impl UiThread {
    pub fn spawn(name: &str) -> io::Result<Self> {
        let (sender, receiver) = channel::unbounded();
        let thread = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || Self::run(receiver))?;

        Ok(Self {
            handle: UiHandle { sender },
            thread: Some(thread),
        })
    }

    fn run(receiver: Receiver<UiMessage>) {
        while let Ok(message) = receiver.recv() {
            match message {
                UiMessage::Run(job) => job(),
                UiMessage::Quit => break,
            }
        }
        tracing::debug!(target: "ui", "ui thread exiting");
    }

    pub fn handle(&self) -> UiHandle {
        self.handle.clone()
    }

    /// Block until every job posted before this call has run.
    /// Returns false if the UI thread did not get there within `timeout`.
    pub fn flush(&self, timeout: Duration) -> bool {
        let (done, wait) = channel::bounded(1);
        self.handle.post(Box::new(move || {
            let _ = done.send(());
        }));
        wait.recv_timeout(timeout).is_ok()
    }

    /// Run what is already queued, then stop the thread and join it.
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.handle.sender.send(UiMessage::Quit);
            if thread.join().is_err() {
                tracing::error!(target: "ui", "ui thread panicked");
            }
        }
    }
}

impl UiDispatcher for UiThread {
    fn post(&self, job: UiJob) {
        self.handle.post(job);
    }
}

impl Drop for UiThread {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}
