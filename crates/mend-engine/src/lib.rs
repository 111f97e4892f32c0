//! SQL generation, validation, and self-healing repair for dashboard
//! metrics pulled from two heterogeneous backends.
//!
//! Given an abstract metric (name, chart group, target dialect) the engine
//! produces dialect-correct SQL, checks it against the dialect's
//! conformance rules, and, when execution yields an empty or zero result,
//! applies an ordered, bounded pipeline of semantic-preserving rewrites to
//! coax a value out, re-validating after every step. Query execution and
//! report persistence are injected collaborators; the engine itself is
//! pure computation around one async boundary.

pub mod error;
pub mod generator;
pub mod inspector;
pub mod metric;
pub mod repair;
pub mod report;
pub mod runner;
pub mod tables;
pub mod validator;

pub use error::EngineError;
pub use generator::{generate, GeneratedSql, GenerationSource, TemplateId};
pub use metric::MetricDefinition;
pub use repair::{RepairAttempt, RepairContext, RepairRuleId, MAX_REPAIR_ATTEMPTS};
pub use report::{FinalState, MetricReport, ReportSink};
pub use runner::{BatchSummary, CancelFlag, MetricRunner, RunnerOptions};
pub use tables::{Fact, FactSource, TableMap};
pub use validator::{validate, ValidationOutcome, ViolationKind};
