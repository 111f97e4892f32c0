//! Engine error types.
//!
//! Per-metric failures are not errors here: they are terminal states
//! recorded in the metric's report. Only infrastructure failures that make
//! the whole run pointless surface as `EngineError`.

use mend_backend::SinkError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// The report sink rejected a report; the batch cannot usefully continue.
    #[error("Report sink failed: {0}")]
    Sink(#[from] SinkError),
}
