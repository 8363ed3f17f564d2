use crate::utils::error::{EmitterError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_MAX_LISTENERS: usize = 10;
pub const DEFAULT_THREAD_NAME: &str = "night-emitter";

/// Where emit batches run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// Tokio blocking pool of the pinned or ambient runtime, with a thread
    /// fallback when there is none.
    #[default]
    Runtime,
    /// A dedicated OS thread per batch.
    Thread,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    pub dispatch: DispatchMode,
    /// Per-event listener count above which a warning is logged. 0 disables.
    pub max_listeners: usize,
    pub thread_name: String,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        EmitterConfig {
            dispatch: DispatchMode::default(),
            max_listeners: DEFAULT_MAX_LISTENERS,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }
}

pub struct ConfigManager;

impl ConfigManager {
    pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EmitterConfig> {
        let path_ref = path.as_ref();
        let extension = path_ref
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| EmitterError::Config("File has no extension".to_string()))?;

        let config_str = fs::read_to_string(path_ref)
            .map_err(|e| EmitterError::Config(format!("Failed to read config file: {}", e)))?;

        let config: EmitterConfig = match extension {
            "json" => serde_json::from_str(&config_str)?,
            "yaml" | "yml" => serde_yaml::from_str(&config_str)?,
            _ => {
                return Err(EmitterError::Config(format!(
                    "Unsupported file extension: {}",
                    extension
                )))
            }
        };

        Self::validate_config(&config)?;

        log::debug!(
            "Loaded emitter config from {}: {:?}",
            path_ref.display(),
            config
        );
        Ok(config)
    }

    pub fn validate_config(config: &EmitterConfig) -> Result<()> {
        if config.thread_name.trim().is_empty() {
            return Err(EmitterError::Config(
                "thread_name must not be empty".to_string(),
            ));
        }
        // std rejects thread names containing NUL when spawning
        if config.thread_name.contains('\0') {
            return Err(EmitterError::Config(
                "thread_name must not contain NUL bytes".to_string(),
            ));
        }

        Ok(())
    }
}
