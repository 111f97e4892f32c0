//! Metric definitions as they arrive from the external catalog.

use mend_backend::SqlDialect;
use serde::{Deserialize, Serialize};

/// One abstract dashboard metric.
///
/// Created from an external catalog (CSV, table, or in-memory) and never
/// mutated by the engine; persistence of repaired SQL happens through the
/// report sink, not here. The dialect tag is already parsed; unknown tags
/// are rejected at the catalog boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDefinition {
    pub id: String,
    pub name: String,
    pub chart_group: String,
    pub variable_name: String,
    pub dialect: SqlDialect,
    /// Hand-tuned SQL carried over from the store; may be empty.
    #[serde(default)]
    pub raw_expression: String,
}

impl MetricDefinition {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        chart_group: impl Into<String>,
        variable_name: impl Into<String>,
        dialect: SqlDialect,
        raw_expression: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            chart_group: chart_group.into(),
            variable_name: variable_name.into(),
            dialect,
            raw_expression: raw_expression.into(),
        }
    }

    /// Lower-cased text the keyword classifier and repair fallback match on.
    pub fn classification_text(&self) -> String {
        format!("{} {} {}", self.variable_name, self.name, self.chart_group).to_lowercase()
    }
}
