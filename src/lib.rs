//! night-emitter: an in-process event emitter.
//!
//! Listeners are registered against string event names. `emit` snapshots
//! the listeners of one event and runs them off the caller's thread, in
//! registration order, returning immediately.
//!
//! ```no_run
//! use night_emitter::{args, EventEmitter, Listener};
//!
//! let emitter = EventEmitter::new();
//! emitter.on("hello", Listener::new(|args| {
//!     if let Some(name) = args.get::<&str>(0) {
//!         println!("hello {}", name);
//!     }
//! }));
//! assert!(emitter.emit("hello", args!["world"]));
//! ```

pub mod config;
pub mod event;
pub mod utils;

pub use config::{ConfigManager, DispatchMode, EmitterConfig};
pub use event::{Arg, EventArgs, EventEmitter, Listener, ListenerCallback, ListenerId, ListenerKey};
pub use utils::error::{EmitterError, Result};

use std::path::Path;

/// Load an emitter configuration file and build an emitter from it.
pub fn init<P: AsRef<Path>>(config_path: P) -> Result<EventEmitter> {
    let config = ConfigManager::load_config(config_path)?;
    log::info!(
        "Emitter initialized (dispatch: {:?}, max_listeners: {})",
        config.dispatch,
        config.max_listeners
    );
    Ok(EventEmitter::with_config(&config))
}
