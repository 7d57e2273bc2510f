//! Error types for spam-guard

use thiserror::Error;

/// Result type alias for spam-guard operations
pub type Result<T> = std::result::Result<T, GuardError>;

/// spam-guard error types
#[derive(Error, Debug)]
pub enum GuardError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Pattern table could not be compiled
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// AI provider error
    #[error("AI provider error: {0}")]
    Provider(String),

    /// Transport collaborator error (privilege check, deletion)
    #[error("Channel action failed: {0}")]
    ChannelAction(String),
}

impl From<config::ConfigError> for GuardError {
    fn from(err: config::ConfigError) -> Self {
        GuardError::Config(err.to_string())
    }
}
