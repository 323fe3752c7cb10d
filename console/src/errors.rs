//! Error types for the console client

use thiserror::Error;

use crate::validate::ValidationErrors;

/// Main error type for the console client
#[derive(Error, Debug)]
pub enum ConsoleError {
    /// No response was received
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A response arrived with a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The control proxy reached the remote host and it refused the request
    #[error("Control request rejected: {0}")]
    ControlRejected(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConsoleError {
    /// HTTP status carried by the error, 0 when no response was involved
    pub fn status(&self) -> u16 {
        match self {
            ConsoleError::Api { status, .. } => *status,
            ConsoleError::Transport(e) => e.status().map(|s| s.as_u16()).unwrap_or(0),
            _ => 0,
        }
    }

    /// Message suitable for an operator notification
    pub fn user_message(&self) -> String {
        match self {
            ConsoleError::Api { message, .. } => message.clone(),
            ConsoleError::ControlRejected(message) => message.clone(),
            ConsoleError::Transport(_) => "Network request failed".to_string(),
            other => other.to_string(),
        }
    }

    /// Whether the failure was resolved locally before any network call
    pub fn is_validation(&self) -> bool {
        matches!(self, ConsoleError::Validation(_))
    }
}

impl From<anyhow::Error> for ConsoleError {
    fn from(err: anyhow::Error) -> Self {
        ConsoleError::Internal(err.to_string())
    }
}

impl From<ValidationErrors> for ConsoleError {
    fn from(errors: ValidationErrors) -> Self {
        ConsoleError::Validation(errors)
    }
}
