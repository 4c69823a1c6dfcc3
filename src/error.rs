//! Error types for convo-relay.

/// Top-level error type for the relay.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    #[error("Send error: {0}")]
    Send(#[from] SendError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors surfaced synchronously by task control operations.
///
/// `NotFound` covers both unknown ids and ids owned by someone else; callers
/// cannot tell the two apart.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("Invalid task configuration: {field} is missing or invalid")]
    Validation { field: &'static str },

    #[error("Task {id} not found")]
    NotFound { id: String },
}

impl TaskError {
    pub fn not_found(id: impl ToString) -> Self {
        Self::NotFound { id: id.to_string() }
    }
}

/// Outcome of a failed send attempt. Recorded in the task log, never
/// propagated to a caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    #[error("rejected with status {status}")]
    Rejected { status: u16 },

    #[error("transport error: {0}")]
    Transport(String),
}

/// Result type alias for the relay.
pub type Result<T> = std::result::Result<T, Error>;
