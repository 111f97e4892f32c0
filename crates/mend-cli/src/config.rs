//! Project configuration (`mend.yml`).

use crate::errors::CliError;
use anyhow::Result;
use mend_engine::{Fact, FactSource, RunnerOptions, TableMap};
use mend_backend::SqlDialect;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub name: String,

    /// Pause between metrics, in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Deadline for each executor call, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Path to the metric catalog CSV, relative to the config file.
    #[serde(default = "default_catalog")]
    pub catalog: String,

    /// Path to replay fixtures for offline runs.
    #[serde(default)]
    pub fixtures: Option<String>,

    /// Path the JSON-lines report file is written to.
    #[serde(default = "default_report")]
    pub report: String,

    /// Physical-table overrides applied on top of the built-in map.
    #[serde(default)]
    pub tables: Vec<TableOverride>,
}

fn default_delay_ms() -> u64 {
    250
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_catalog() -> String {
    "metrics.csv".to_string()
}

fn default_report() -> String {
    "reports.jsonl".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TableOverride {
    pub dialect: String,
    pub fact: String,
    pub table: String,
    pub date_column: String,
    #[serde(default)]
    pub amount_column: String,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CliError::ConfigLoadError {
            path: path.to_path_buf(),
            source: e.into(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| {
            CliError::ConfigLoadError {
                path: path.to_path_buf(),
                source: e.into(),
            }
            .into()
        })
    }

    /// Defaults for running without a config file.
    pub fn fallback() -> Self {
        Self {
            name: "mend".to_string(),
            delay_ms: default_delay_ms(),
            timeout_secs: default_timeout_secs(),
            catalog: default_catalog(),
            fixtures: None,
            report: default_report(),
            tables: Vec::new(),
        }
    }

    pub fn runner_options(&self) -> RunnerOptions {
        RunnerOptions {
            inter_metric_delay: Duration::from_millis(self.delay_ms),
            executor_timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    /// Built-in table map with this project's overrides applied.
    pub fn table_map(&self) -> Result<TableMap, CliError> {
        let mut map = TableMap::new();
        for entry in &self.tables {
            let dialect =
                SqlDialect::parse(&entry.dialect).ok_or_else(|| CliError::BadTableOverride {
                    message: format!("unknown dialect '{}'", entry.dialect),
                })?;
            let fact: Fact = entry
                .fact
                .parse()
                .map_err(|message| CliError::BadTableOverride { message })?;
            map.set(
                dialect,
                fact,
                FactSource::new(&entry.table, &entry.date_column, &entry.amount_column),
            );
        }
        Ok(map)
    }
}
