//! Fixture-driven executor for offline runs.
//!
//! The real backends sit behind ODBC drivers this tool does not ship.
//! For demos, dry runs, and tests the executor is replayed from a YAML
//! fixture file: ordered `(contains, result)` rules matched against each
//! submitted SQL string, with a configurable default when nothing matches.

use crate::errors::CliError;
use anyhow::Result;
use async_trait::async_trait;
use mend_backend::{BackendError, Executor, ResultSet, ScalarValue, SqlDialect};
use serde::Deserialize;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureRule {
    /// Substring the submitted SQL must contain.
    pub contains: String,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct FixtureFile {
    #[serde(default)]
    pub rules: Vec<FixtureRule>,
    /// Default value when no rule matches; omitted means an empty result.
    #[serde(default)]
    pub default_value: Option<f64>,
}

/// Executor that replays canned outcomes instead of touching a database.
pub struct ReplayExecutor {
    fixtures: FixtureFile,
    calls: AtomicU64,
}

impl ReplayExecutor {
    pub fn new(fixtures: FixtureFile) -> Self {
        Self {
            fixtures,
            calls: AtomicU64::new(0),
        }
    }

    /// All submissions yield the default (empty) outcome.
    pub fn empty() -> Self {
        Self::new(FixtureFile::default())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CliError::FixtureLoadError {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        let fixtures: FixtureFile =
            serde_yaml::from_str(&content).map_err(|e| CliError::FixtureLoadError {
                path: path.to_path_buf(),
                source: e.into(),
            })?;
        Ok(Self::new(fixtures))
    }

    /// Number of queries submitted so far.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Executor for ReplayExecutor {
    async fn execute(&self, dialect: SqlDialect, sql: &str) -> Result<ResultSet, BackendError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        debug!(%dialect, %sql, "Replaying query");

        for rule in &self.fixtures.rules {
            if sql.contains(&rule.contains) {
                if let Some(message) = &rule.error {
                    return Err(BackendError::execution_failed(dialect.name(), message));
                }
                return Ok(match rule.value {
                    Some(n) => ResultSet::number(n),
                    None => ResultSet::scalar(ScalarValue::Null),
                });
            }
        }

        Ok(match self.fixtures.default_value {
            Some(n) => ResultSet::number(n),
            None => ResultSet::empty(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rules_match_in_order_and_default_is_empty() {
        let fixtures: FixtureFile = serde_yaml::from_str(
            r#"
rules:
  - contains: "-90"
    value: 57
  - contains: "oe_hdr"
    value: 128
"#,
        )
        .unwrap();
        let executor = ReplayExecutor::new(fixtures);

        let hit = executor
            .execute(SqlDialect::TSql, "SELECT ... -90 ... FROM dbo.oe_hdr")
            .await
            .unwrap();
        assert_eq!(hit, ResultSet::number(57.0));

        let miss = executor
            .execute(SqlDialect::TSql, "SELECT 1 AS value FROM dbo.other")
            .await
            .unwrap();
        assert_eq!(miss, ResultSet::empty());
        assert_eq!(executor.calls(), 2);
    }

    #[tokio::test]
    async fn error_rules_surface_as_backend_errors() {
        let fixtures: FixtureFile = serde_yaml::from_str(
            r#"
rules:
  - contains: "ar_open_items"
    error: "permission denied"
"#,
        )
        .unwrap();
        let executor = ReplayExecutor::new(fixtures);

        let result = executor
            .execute(SqlDialect::TSql, "SELECT x AS value FROM dbo.ar_open_items")
            .await;
        assert!(result.is_err());
    }
}
