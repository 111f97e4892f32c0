//! Collaborator traits and dialect profiles for the mend repair engine.
//!
//! This crate defines the narrow interface the engine depends on: an
//! Executor that runs SQL against a live backend. It also carries the static
//! conformance profile for each supported SQL dialect. The engine itself
//! never opens a connection; the executor is injected.

mod dialect;
mod error;
mod types;

pub use dialect::{DialectProfile, Marker, SqlDialect};
pub use error::{BackendError, SinkError};
pub use types::{ExecutionOutcome, ResultSet, ScalarValue};

use async_trait::async_trait;

/// Abstract interface for executing metric SQL against a backend.
///
/// Implementations own connection pooling, retries, and driver quirks.
/// The engine submits one query at a time and classifies the raw rows
/// itself; an `Err` here becomes a terminal `ExecutionOutcome::Error`.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Execute a query and return its raw rows.
    async fn execute(&self, dialect: SqlDialect, sql: &str) -> Result<ResultSet, BackendError>;
}
