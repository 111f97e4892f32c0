//! Backend and sink error types.

use thiserror::Error;

/// Errors that can occur while executing SQL against a backend.
///
/// The engine surfaces these as terminal execution errors; retry policy
/// (reconnects, backoff) belongs to the executor implementation, not here.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Failed to connect to the backend.
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    /// The backend rejected or failed the query.
    #[error("Execution failed on {dialect}: {message}")]
    ExecutionFailed { dialect: String, message: String },

    /// The query ran past its deadline.
    #[error("Query timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Generic backend error.
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl BackendError {
    /// Create a connection failed error.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            message: message.into(),
        }
    }

    /// Create an execution failed error.
    pub fn execution_failed(dialect: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            dialect: dialect.into(),
            message: message.into(),
        }
    }
}

/// Errors that can occur while recording a report.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Failed to write report for metric '{metric_id}': {message}")]
    WriteFailed { metric_id: String, message: String },

    #[error("Failed to serialize report: {0}")]
    Serialize(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl SinkError {
    /// Create a write failed error.
    pub fn write_failed(metric_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WriteFailed {
            metric_id: metric_id.into(),
            message: message.into(),
        }
    }
}
