//! Per-metric reports and the sink collaborator interface.

use crate::generator::GeneratedSql;
use crate::metric::MetricDefinition;
use crate::repair::RepairAttempt;
use crate::validator::ValidationOutcome;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mend_backend::{ExecutionOutcome, SinkError};
use serde::{Deserialize, Serialize};

/// Terminal state of one metric's run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinalState {
    /// A usable value was obtained. `repaired` flags that the value came
    /// from rewritten SQL whose window or predicate differs from the
    /// original definition; consumers must not silently overwrite the
    /// stored query with it.
    Ok { repaired: bool },
    /// All repair rules were exhausted and the result is still empty.
    /// Not an error: the best attempted SQL and outcome are reported.
    Unrepaired,
    /// Validation failed or the executor reported a driver error.
    Error,
}

/// Everything observed for one metric in one run.
///
/// Built once, immutable after construction, handed to the sink exactly
/// once. `final_sql` always validates against the metric's dialect unless
/// the state is `Error`.
#[derive(Debug, Clone, Serialize)]
pub struct MetricReport {
    pub metric: MetricDefinition,
    pub generated: GeneratedSql,
    pub validation: ValidationOutcome,
    pub execution: ExecutionOutcome,
    pub repairs: Vec<RepairAttempt>,
    pub final_sql: String,
    /// Numeric view of the final observed value. Present for a genuine
    /// zero even though zero classifies as an empty result.
    pub final_value: Option<f64>,
    pub state: FinalState,
    pub recorded_at: DateTime<Utc>,
}

impl MetricReport {
    pub fn repaired(&self) -> bool {
        matches!(self.state, FinalState::Ok { repaired: true })
    }
}

/// Abstract interface for persisting reports.
///
/// Invoked once per metric per run; storage (file, database row, admin UI
/// store) is entirely the implementation's concern.
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Record one finished metric report.
    async fn record(&self, report: &MetricReport) -> Result<(), SinkError>;
}
