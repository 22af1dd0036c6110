//! Error types for autosuite operations

use crate::render::Unrenderable;

/// Result type for autosuite operations
pub type Result<T> = std::result::Result<T, AutosuiteError>;

/// Error types for the autosuite engine
#[derive(Debug, thiserror::Error)]
pub enum AutosuiteError {
    /// A module or function could not be found in the registry
    #[error("Not found: {0}")]
    NotFound(String),

    /// A module or qualified name is not a valid dotted identifier
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A value has no faithful literal form
    #[error(transparent)]
    Unrenderable(#[from] Unrenderable),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for AutosuiteError {
    fn from(s: String) -> Self {
        AutosuiteError::Other(s)
    }
}

impl From<&str> for AutosuiteError {
    fn from(s: &str) -> Self {
        AutosuiteError::Other(s.to_string())
    }
}
