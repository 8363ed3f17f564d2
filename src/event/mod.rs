//! Event system module for night-emitter.
//!
//! An in-memory publish-subscribe registry: listeners are registered
//! against string event names and invoked asynchronously on emit.

mod dispatch;
pub mod event;
pub mod listener;
pub mod system;

pub use event::Arg;
pub use event::EventArgs;
pub use listener::Listener;
pub use listener::ListenerCallback;
pub use listener::ListenerId;
pub use listener::ListenerKey;
pub use system::EventEmitter;
