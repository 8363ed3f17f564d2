//! Event emitter registry.
//!
//! Maps event names to ordered listener sequences. Structural changes take
//! a short mutex; emit snapshots the sequence under that mutex, releases it
//! and hands the snapshot to the dispatcher, so listeners may call back
//! into the emitter.

use crate::config::EmitterConfig;
use crate::event::dispatch::{Batch, Dispatcher};
use crate::event::event::EventArgs;
use crate::event::listener::{Listener, ListenerId, ListenerKey};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;

struct Entry {
    listener: Listener,
    once: bool,
}

struct Registry {
    /// Invariant: every sequence in here is non-empty.
    events: HashMap<String, Vec<Entry>>,
    max_listeners: usize,
}

/// In-process event emitter.
///
/// Clones share the same registry.
#[derive(Clone)]
pub struct EventEmitter {
    registry: Arc<Mutex<Registry>>,
    dispatcher: Dispatcher,
}

impl EventEmitter {
    /// Create an emitter with the default configuration
    pub fn new() -> Self {
        EventEmitter::with_config(&EmitterConfig::default())
    }

    pub fn with_config(config: &EmitterConfig) -> Self {
        EventEmitter {
            registry: Arc::new(Mutex::new(Registry {
                events: HashMap::new(),
                max_listeners: config.max_listeners,
            })),
            dispatcher: Dispatcher::new(config),
        }
    }

    /// Pin runtime-mode dispatch to `handle` instead of the ambient runtime.
    /// Applies to this value and clones made from it afterwards.
    pub fn with_runtime(mut self, handle: Handle) -> Self {
        self.dispatcher.set_runtime(handle);
        self
    }

    // No user code runs under the lock, so a poisoned guard is still consistent.
    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert(&self, event_name: &str, listener: Listener, prepend: bool, once: bool) -> &Self {
        if listener.is_empty() {
            log::trace!("Ignoring empty listener for event '{}'", event_name);
            return self;
        }

        let mut guard = self.lock();
        let registry = &mut *guard;
        let entries = registry.events.entry(event_name.to_string()).or_default();
        let id = listener.id();
        let entry = Entry { listener, once };
        if prepend {
            entries.insert(0, entry);
        } else {
            entries.push(entry);
        }

        let count = entries.len();
        log::debug!(
            "Registered listener {} on '{}' (prepend: {}, once: {}, count: {})",
            id,
            event_name,
            prepend,
            once,
            count
        );
        if registry.max_listeners > 0 && count == registry.max_listeners + 1 {
            log::warn!(
                "Possible listener leak: event '{}' has {} listeners (max {})",
                event_name,
                count,
                registry.max_listeners
            );
        }
        self
    }

    /// Append a listener to the event's sequence.
    pub fn on(&self, event_name: &str, listener: Listener) -> &Self {
        self.insert(event_name, listener, false, false)
    }

    /// Synonym of [`EventEmitter::on`].
    pub fn add_listener(&self, event_name: &str, listener: Listener) -> &Self {
        self.on(event_name, listener)
    }

    /// Insert a listener at the front of the event's sequence.
    pub fn prepend_listener(&self, event_name: &str, listener: Listener) -> &Self {
        self.insert(event_name, listener, true, false)
    }

    /// Append a listener that is dropped from the registry by the next emit
    /// of this event, so it fires at most once.
    pub fn once(&self, event_name: &str, listener: Listener) -> &Self {
        self.insert(event_name, listener, false, true)
    }

    pub fn prepend_once_listener(&self, event_name: &str, listener: Listener) -> &Self {
        self.insert(event_name, listener, true, true)
    }

    /// Wrap `callback`, append it and return the handle for later removal.
    pub fn subscribe<F>(&self, event_name: &str, callback: F) -> ListenerId
    where
        F: Fn(&EventArgs) + Send + Sync + 'static,
    {
        let listener = Listener::new(callback);
        let id = listener.id();
        self.on(event_name, listener);
        id
    }

    /// Schedule every listener of `event_name` with `args`.
    ///
    /// Returns `false` without doing anything when the event has no
    /// listeners. Otherwise returns `true` as soon as the batch is
    /// scheduled; listeners run later, in registration order.
    pub fn emit(&self, event_name: &str, args: EventArgs) -> bool {
        let listeners = {
            let mut registry = self.lock();
            let Some(entries) = registry.events.get_mut(event_name) else {
                log::trace!("No listeners for event '{}'", event_name);
                return false;
            };
            let snapshot: Vec<Listener> = entries.iter().map(|e| e.listener.clone()).collect();
            entries.retain(|e| !e.once);
            let now_empty = entries.is_empty();
            if now_empty {
                registry.events.remove(event_name);
            }
            snapshot
        };

        log::trace!(
            "Emitting '{}' to {} listener(s) with {} argument(s)",
            event_name,
            listeners.len(),
            args.len()
        );
        self.dispatcher.dispatch(Batch {
            event_name: event_name.to_string(),
            listeners,
            args,
        });
        true
    }

    /// Remove the first entry matching `listener`, by listener value or by
    /// [`ListenerId`]. The empty listener removes nothing.
    pub fn remove_listener<K: ListenerKey>(&self, event_name: &str, listener: K) -> &Self {
        let Some(id) = listener.listener_id() else {
            return self;
        };

        let mut registry = self.lock();
        let now_empty = match registry.events.get_mut(event_name) {
            Some(entries) => match entries.iter().position(|e| e.listener.id() == id) {
                Some(index) => {
                    entries.remove(index);
                    log::debug!("Removed listener {} from '{}'", id, event_name);
                    entries.is_empty()
                }
                None => false,
            },
            None => false,
        };
        if now_empty {
            registry.events.remove(event_name);
        }
        self
    }

    /// Synonym of [`EventEmitter::remove_listener`].
    pub fn off<K: ListenerKey>(&self, event_name: &str, listener: K) -> &Self {
        self.remove_listener(event_name, listener)
    }

    /// Drop every listener of the named events, or of all events when
    /// `event_names` is empty.
    pub fn remove_all_listeners(&self, event_names: &[&str]) -> &Self {
        let mut registry = self.lock();
        if event_names.is_empty() {
            log::debug!("Removing listeners of all {} event(s)", registry.events.len());
            registry.events.clear();
        } else {
            for name in event_names {
                if registry.events.remove(*name).is_some() {
                    log::debug!("Removed all listeners from '{}'", name);
                }
            }
        }
        self
    }

    pub fn listener_count(&self, event_name: &str) -> usize {
        self.lock().events.get(event_name).map_or(0, |v| v.len())
    }

    /// Total number of listeners across all events
    pub fn total_listener_count(&self) -> usize {
        self.lock().events.values().map(|v| v.len()).sum()
    }

    /// Copy of the event's listener sequence
    pub fn listeners(&self, event_name: &str) -> Vec<Listener> {
        self.lock()
            .events
            .get(event_name)
            .map(|entries| entries.iter().map(|e| e.listener.clone()).collect())
            .unwrap_or_default()
    }

    /// Names of events with at least one listener, in no particular order
    pub fn event_names(&self) -> Vec<String> {
        self.lock().events.keys().cloned().collect()
    }

    pub fn set_max_listeners(&self, max_listeners: usize) -> &Self {
        self.lock().max_listeners = max_listeners;
        self
    }

    pub fn max_listeners(&self) -> usize {
        self.lock().max_listeners
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        EventEmitter::new()
    }
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.lock();
        f.debug_struct("EventEmitter")
            .field("events", &registry.events.len())
            .field("max_listeners", &registry.max_listeners)
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}
