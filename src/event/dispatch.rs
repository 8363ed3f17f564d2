//! Batch dispatch for the emitter.
//!
//! An emit hands one batch (a snapshot of listeners plus the arguments) to
//! the dispatcher. The batch runs off the caller's thread and invokes its
//! listeners one after another, in snapshot order.

use crate::config::config::DEFAULT_THREAD_NAME;
use crate::config::{ConfigManager, DispatchMode, EmitterConfig};
use crate::event::event::EventArgs;
use crate::event::listener::Listener;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use tokio::runtime::Handle;

/// Listeners captured by one emit.
pub(crate) struct Batch {
    pub event_name: String,
    pub listeners: Vec<Listener>,
    pub args: EventArgs,
}

impl Batch {
    /// Invoke every listener in order. A panicking listener is logged and
    /// skipped; the rest of the batch still runs.
    pub fn run(self) {
        for listener in &self.listeners {
            let result = panic::catch_unwind(AssertUnwindSafe(|| listener.call(&self.args)));
            if let Err(payload) = result {
                log::error!(
                    "Listener {} for event '{}' panicked: {}",
                    listener.id(),
                    self.event_name,
                    panic_message(payload.as_ref())
                );
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "<non-string panic payload>"
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Dispatcher {
    mode: DispatchMode,
    thread_name: String,
    runtime: Option<Handle>,
}

impl Dispatcher {
    pub fn new(config: &EmitterConfig) -> Self {
        // Configs built in code skip ConfigManager validation, and
        // thread::Builder panics on a name with NUL bytes.
        let thread_name = match ConfigManager::validate_config(config) {
            Ok(()) => config.thread_name.clone(),
            Err(e) => {
                log::warn!("{}; using '{}' for dispatch threads", e, DEFAULT_THREAD_NAME);
                DEFAULT_THREAD_NAME.to_string()
            }
        };
        Dispatcher {
            mode: config.dispatch,
            thread_name,
            runtime: None,
        }
    }

    pub fn set_runtime(&mut self, handle: Handle) {
        self.runtime = Some(handle);
    }

    /// Schedule a batch and return without waiting for it.
    pub fn dispatch(&self, batch: Batch) {
        match self.mode {
            DispatchMode::Runtime => {
                let handle = self.runtime.clone().or_else(|| Handle::try_current().ok());
                match handle {
                    Some(handle) => self.spawn_on_runtime(&handle, batch),
                    None => {
                        log::debug!(
                            "No tokio runtime available, dispatching '{}' on a thread",
                            batch.event_name
                        );
                        self.spawn_thread(batch);
                    }
                }
            }
            DispatchMode::Thread => self.spawn_thread(batch),
        }
    }

    /// Run the batch on the runtime's blocking pool.
    ///
    /// A runtime that has shut down cancels the task before it starts, and
    /// `spawn_blocking` panics when the pool has no thread and the OS
    /// refuses a new one. Both cases are logged and the batch moves to a
    /// dedicated thread. A runtime that shuts down after accepting the task
    /// can still drop it unrun; that is not observable here.
    fn spawn_on_runtime(&self, handle: &Handle, batch: Batch) {
        let event_name = batch.event_name.clone();
        let slot = Arc::new(Mutex::new(Some(batch)));
        let task_slot = slot.clone();
        let spawned = panic::catch_unwind(AssertUnwindSafe(|| {
            handle.spawn_blocking(move || {
                let batch = task_slot
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .take();
                if let Some(batch) = batch {
                    batch.run();
                }
            })
        }));

        let reason = match spawned {
            // The JoinHandle is dropped on purpose: nobody waits on a batch.
            Ok(join) if !join.is_finished() => return,
            Ok(_) => "runtime cancelled the task".to_string(),
            Err(payload) => format!("spawn_blocking panicked: {}", panic_message(payload.as_ref())),
        };

        // A finished task that already took the batch ran normally.
        let unrun = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(batch) = unrun {
            log::error!(
                "Failed to schedule event '{}' on tokio runtime ({}), using a dispatch thread",
                event_name,
                reason
            );
            self.spawn_thread(batch);
        }
    }

    fn spawn_thread(&self, batch: Batch) {
        let event_name = batch.event_name.clone();
        let spawned = thread::Builder::new()
            .name(self.thread_name.clone())
            .spawn(move || batch.run());
        if let Err(e) = spawned {
            log::error!(
                "Failed to spawn dispatch thread for event '{}': {}",
                event_name,
                e
            );
        }
    }
}
