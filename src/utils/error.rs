//! Error types for night-emitter.
//!
//! Registry operations never fail. Only configuration loading returns
//! these errors.

/// Errors produced while building an emitter from configuration.
#[derive(Debug, thiserror::Error)]
pub enum EmitterError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, EmitterError>;
