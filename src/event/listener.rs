//! Listener definitions for the emitter.
//!
//! A listener wraps a callback together with a [`ListenerId`]. The id is
//! the listener's identity: clones share it, separately wrapped closures
//! never do, whatever they capture.

use crate::event::event::EventArgs;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Type alias for listener callback functions.
pub type ListenerCallback = Arc<dyn Fn(&EventArgs) + Send + Sync>;

/// Handle identifying one wrapped listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    fn new() -> Self {
        ListenerId(Uuid::new_v4())
    }

    /// The underlying UUID, e.g. for correlating log lines
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A callable registered against an event name.
///
/// `Listener::empty()` is the null listener: registering or removing it
/// does nothing.
#[derive(Clone)]
pub struct Listener {
    id: ListenerId,
    callback: Option<ListenerCallback>,
}

impl Listener {
    /// Wrap a closure into a new listener with a fresh id
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&EventArgs) + Send + Sync + 'static,
    {
        Listener::from_callback(Arc::new(callback))
    }

    /// Wrap an already shared callback. Each call yields a distinct identity,
    /// even for the same `Arc`.
    pub fn from_callback(callback: ListenerCallback) -> Self {
        Listener {
            id: ListenerId::new(),
            callback: Some(callback),
        }
    }

    /// The null listener
    pub fn empty() -> Self {
        Listener {
            id: ListenerId(Uuid::nil()),
            callback: None,
        }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn is_empty(&self) -> bool {
        self.callback.is_none()
    }

    /// Invoke the callback. The empty listener ignores the call.
    pub fn call(&self, args: &EventArgs) {
        if let Some(callback) = &self.callback {
            callback(args);
        }
    }
}

impl Default for Listener {
    fn default() -> Self {
        Listener::empty()
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Listener {}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("id", &self.id)
            .field("empty", &self.is_empty())
            .finish()
    }
}

/// Anything that can name a registered listener for removal.
pub trait ListenerKey {
    /// Identity to match against, `None` for the empty listener.
    fn listener_id(&self) -> Option<ListenerId>;
}

impl ListenerKey for Listener {
    fn listener_id(&self) -> Option<ListenerId> {
        if self.is_empty() {
            None
        } else {
            Some(self.id)
        }
    }
}

impl ListenerKey for ListenerId {
    fn listener_id(&self) -> Option<ListenerId> {
        Some(*self)
    }
}

impl<T: ListenerKey + ?Sized> ListenerKey for &T {
    fn listener_id(&self) -> Option<ListenerId> {
        (**self).listener_id()
    }
}
