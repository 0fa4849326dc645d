use std::io;
use thiserror::Error;

/// Custom error type for the usage collector
#[derive(Error, Debug)]
pub enum UsageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid usage state: {0}")]
    InvalidState(String),

    #[error("Sample source error: {0}")]
    SampleSource(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for the usage collector
pub type Result<T> = std::result::Result<T, UsageError>;

impl UsageError {
    /// Create an invalid state error
    pub fn invalid_state<S: Into<String>>(msg: S) -> Self {
        UsageError::InvalidState(msg.into())
    }

    /// Create a sample source error
    pub fn sample_source<S: Into<String>>(msg: S) -> Self {
        UsageError::SampleSource(msg.into())
    }

    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        UsageError::Config(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        UsageError::Other(msg.into())
    }
}
