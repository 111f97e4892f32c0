//! Per-metric state machine and batch driver.
//!
//! Generated -> Validated -> Executed -> [Repairing]* -> Final. Generation,
//! validation, and repair are synchronous pure computations; the only
//! suspension points are the executor call (bounded by a timeout) and the
//! inter-metric delay. One metric's failure never aborts the batch, and
//! the batch is cancellable between metrics.

use crate::error::EngineError;
use crate::generator::{self, GenerationSource};
use crate::inspector;
use crate::metric::MetricDefinition;
use crate::repair::{self, RepairAttempt, RepairContext};
use crate::report::{FinalState, MetricReport, ReportSink};
use crate::tables::TableMap;
use crate::validator;
use chrono::Utc;
use mend_backend::{
    BackendError, DialectProfile, ExecutionOutcome, Executor, ResultSet, SqlDialect,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Tuning for one batch run.
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// Pause between metrics so the external databases are not hammered.
    pub inter_metric_delay: Duration,
    /// Deadline for each executor call.
    pub executor_timeout: Duration,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            inter_metric_delay: Duration::from_millis(250),
            executor_timeout: Duration::from_secs(30),
        }
    }
}

/// Cooperative cancellation flag, checked at the top of each metric's
/// state machine. Repair steps are sub-millisecond pure computation, so
/// mid-repair cancellation is not needed.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Counts accumulated over one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub ok: usize,
    pub repaired: usize,
    pub unrepaired: usize,
    pub errors: usize,
    pub fallback_generated: usize,
    pub cancelled: bool,
}

/// Drives the generate / validate / execute / repair cycle for a batch of
/// metrics. The executor and sink are injected; the runner owns no
/// connections and no persistence.
pub struct MetricRunner {
    executor: Arc<dyn Executor>,
    sink: Arc<dyn ReportSink>,
    table_map: TableMap,
    options: RunnerOptions,
    cancel: CancelFlag,
}

impl MetricRunner {
    pub fn new(
        executor: Arc<dyn Executor>,
        sink: Arc<dyn ReportSink>,
        table_map: TableMap,
        options: RunnerOptions,
    ) -> Self {
        Self {
            executor,
            sink,
            table_map,
            options,
            cancel: CancelFlag::new(),
        }
    }

    /// Handle for cancelling the batch from another task.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Process metrics sequentially, recording one report per metric.
    pub async fn run_batch(
        &self,
        metrics: &[MetricDefinition],
    ) -> Result<BatchSummary, EngineError> {
        let mut summary = BatchSummary::default();

        for (index, metric) in metrics.iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!(processed = summary.processed, "Batch cancelled");
                summary.cancelled = true;
                break;
            }
            if index > 0 && !self.options.inter_metric_delay.is_zero() {
                tokio::time::sleep(self.options.inter_metric_delay).await;
            }

            let report = self.run_metric(metric).await;

            if report.generated.source == GenerationSource::Fallback {
                summary.fallback_generated += 1;
            }
            match report.state {
                FinalState::Ok { repaired: false } => summary.ok += 1,
                FinalState::Ok { repaired: true } => summary.repaired += 1,
                FinalState::Unrepaired => summary.unrepaired += 1,
                FinalState::Error => summary.errors += 1,
            }

            self.sink.record(&report).await?;
            summary.processed += 1;
        }

        info!(
            processed = summary.processed,
            ok = summary.ok,
            repaired = summary.repaired,
            unrepaired = summary.unrepaired,
            errors = summary.errors,
            "Batch finished"
        );
        Ok(summary)
    }

    /// Run one metric through the full state machine.
    pub async fn run_metric(&self, metric: &MetricDefinition) -> MetricReport {
        let profile = DialectProfile::of(metric.dialect);

        let generated = generator::generate(metric, &self.table_map);
        match generated.source {
            GenerationSource::Fallback => {
                warn!(metric = %metric.id, "No keyword matched; default template used")
            }
            _ => debug!(metric = %metric.id, source = ?generated.source, "Generated SQL"),
        }

        let validation = validator::validate(profile, &generated.sql);
        if !validation.is_valid() {
            warn!(metric = %metric.id, ?validation, "Generated SQL failed validation");
            return MetricReport {
                metric: metric.clone(),
                final_sql: generated.sql.clone(),
                generated,
                validation,
                execution: ExecutionOutcome::Error("not executed: SQL failed validation".into()),
                repairs: Vec::new(),
                final_value: None,
                state: FinalState::Error,
                recorded_at: Utc::now(),
            };
        }

        let raw = self.execute(metric.dialect, &generated.sql).await;
        let mut observed = inspector::observed_value(&raw);
        let mut outcome = inspector::classify(&raw);
        let mut current_sql = generated.sql.clone();
        let mut repairs: Vec<RepairAttempt> = Vec::new();

        if outcome.is_empty() {
            debug!(metric = %metric.id, "Empty result; entering repair");
            let ctx = RepairContext::new(metric, &self.table_map);

            'rules: for rule in repair::RULES {
                loop {
                    if repairs.len() >= repair::MAX_REPAIR_ATTEMPTS {
                        break 'rules;
                    }
                    let Some(candidate) = rule.apply(&ctx, &current_sql) else {
                        break;
                    };
                    if candidate == current_sql {
                        break;
                    }
                    if !validator::validate(profile, &candidate).is_valid() {
                        warn!(metric = %metric.id, ?rule, "Rewrite failed validation; skipped");
                        break;
                    }

                    repairs.push(RepairAttempt {
                        rule: *rule,
                        input_sql: current_sql.clone(),
                        output_sql: candidate.clone(),
                        changed: true,
                    });
                    debug!(metric = %metric.id, ?rule, "Re-executing repaired query");

                    let raw = self.execute(metric.dialect, &candidate).await;
                    if let Some(value) = inspector::observed_value(&raw) {
                        observed = Some(value);
                    }
                    outcome = inspector::classify(&raw);
                    current_sql = candidate;

                    match outcome {
                        ExecutionOutcome::Success(_) | ExecutionOutcome::Error(_) => break 'rules,
                        ExecutionOutcome::Empty => {
                            if !rule.repeatable() {
                                break;
                            }
                        }
                    }
                }
            }
        }

        let state = match &outcome {
            ExecutionOutcome::Success(_) => FinalState::Ok {
                repaired: !repairs.is_empty(),
            },
            ExecutionOutcome::Error(_) => FinalState::Error,
            ExecutionOutcome::Empty => FinalState::Unrepaired,
        };
        // A genuine zero survives as the final value even though zero
        // classifies as empty.
        let final_value = match (&state, &outcome) {
            (FinalState::Error, _) => None,
            (_, ExecutionOutcome::Success(value)) => value.as_number(),
            _ => observed.as_ref().and_then(|value| value.as_number()),
        };

        match state {
            FinalState::Ok { repaired } => {
                info!(metric = %metric.id, repaired, value = ?final_value, "Metric resolved")
            }
            FinalState::Unrepaired => {
                warn!(metric = %metric.id, attempts = repairs.len(), "Repair exhausted; still empty")
            }
            FinalState::Error => warn!(metric = %metric.id, ?outcome, "Metric failed"),
        }

        MetricReport {
            metric: metric.clone(),
            generated,
            validation,
            execution: outcome,
            repairs,
            final_sql: current_sql,
            final_value,
            state,
            recorded_at: Utc::now(),
        }
    }

    /// One executor call, bounded by the configured timeout.
    async fn execute(&self, dialect: SqlDialect, sql: &str) -> Result<ResultSet, BackendError> {
        match tokio::time::timeout(
            self.options.executor_timeout,
            self.executor.execute(dialect, sql),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout {
                seconds: self.options.executor_timeout.as_secs(),
            }),
        }
    }
}
