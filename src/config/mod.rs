pub mod config;

pub use config::{ConfigManager, DispatchMode, EmitterConfig};
