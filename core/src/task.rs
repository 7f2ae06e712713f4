//! Background execution with results delivered to the UI thread.
//!
//! # Design
//! GUI frameworks allow mutation only from one designated thread, so every
//! API call runs on a worker thread and its outcome crosses back through a
//! single delivery channel: a queue of boxed callbacks that only the
//! coordinating thread drains. Producers hold a cloneable `UiHandle`; the
//! coordinating thread owns the sole `UiQueue`.
//!
//! `ApiTask` is the unit of work: one fallible operation plus one callback
//! per outcome. Running it consumes it, so a task cannot fire twice, and
//! the worker never lets an error escape; failure is just the other
//! callback.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use crate::error::{ApiError, Result};

type UiCallback = Box<dyn FnOnce() + Send>;

/// Sending half of the UI delivery channel. Cheap to clone; any thread may
/// post callbacks through it.
#[derive(Clone)]
pub struct UiHandle {
    tx: Sender<UiCallback>,
}

/// Receiving half of the UI delivery channel. Owned by the coordinating
/// thread, which is the only place queued callbacks ever run.
pub struct UiQueue {
    rx: Receiver<UiCallback>,
}

/// Creates the delivery channel for one coordinating thread.
pub fn ui_channel() -> (UiHandle, UiQueue) {
    let (tx, rx) = mpsc::channel();
    (UiHandle { tx }, UiQueue { rx })
}

impl UiHandle {
    /// Queues `callback` to run on the coordinating thread.
    pub fn run_later(&self, callback: impl FnOnce() + Send + 'static) {
        // A dropped queue means the UI is gone; there is nothing to notify.
        let _ = self.tx.send(Box::new(callback));
    }
}

impl UiQueue {
    /// Runs every callback queued so far and returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(callback) = self.rx.try_recv() {
            callback();
            ran += 1;
        }
        ran
    }

    /// Blocks for the next callback and runs it. Returns false once every
    /// handle has been dropped and the queue is empty.
    pub fn run_next(&self) -> bool {
        match self.rx.recv() {
            Ok(callback) => {
                callback();
                true
            }
            Err(_) => false,
        }
    }
}

/// One operation to run off the UI thread, with a callback per outcome.
///
/// Exactly one of `on_success` / `on_fail` fires per task, on the
/// coordinating thread, strictly after the operation finishes.
pub struct ApiTask<T> {
    action: Box<dyn FnOnce() -> Result<T> + Send>,
    on_success: Box<dyn FnOnce(T) + Send>,
    on_fail: Box<dyn FnOnce(ApiError) + Send>,
}

impl<T: Send + 'static> ApiTask<T> {
    pub fn new(
        action: impl FnOnce() -> Result<T> + Send + 'static,
        on_success: impl FnOnce(T) + Send + 'static,
        on_fail: impl FnOnce(ApiError) + Send + 'static,
    ) -> Self {
        Self {
            action: Box::new(action),
            on_success: Box::new(on_success),
            on_fail: Box::new(on_fail),
        }
    }

    /// Worker-side body: runs the operation, then posts its one callback.
    pub fn run(self, ui: &UiHandle) {
        match (self.action)() {
            Ok(value) => {
                let on_success = self.on_success;
                ui.run_later(move || on_success(value));
            }
            Err(err) => {
                tracing::debug!("task failed: {err}");
                let on_fail = self.on_fail;
                ui.run_later(move || on_fail(err));
            }
        }
    }

    /// Runs the task on a fresh worker thread.
    pub fn spawn(self, ui: UiHandle) -> thread::JoinHandle<()> {
        thread::spawn(move || self.run(&ui))
    }
}
