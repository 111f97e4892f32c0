//! Report sinks: JSON-lines file and stdout summary.

use async_trait::async_trait;
use mend_engine::{FinalState, MetricReport, ReportSink};
use mend_backend::SinkError;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// Appends one JSON object per metric to a file.
pub struct JsonLinesSink {
    file: Mutex<File>,
}

impl JsonLinesSink {
    pub fn create(path: &Path) -> Result<Self, SinkError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| SinkError::write_failed("-", e.to_string()))?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

#[async_trait]
impl ReportSink for JsonLinesSink {
    async fn record(&self, report: &MetricReport) -> Result<(), SinkError> {
        let line = serde_json::to_string(report).map_err(|e| SinkError::Serialize(e.to_string()))?;
        let mut file = self
            .file
            .lock()
            .map_err(|_| SinkError::write_failed(&report.metric.id, "sink mutex poisoned"))?;
        writeln!(file, "{}", line)
            .map_err(|e| SinkError::write_failed(&report.metric.id, e.to_string()))
    }
}

/// Prints a one-line outcome per metric; used alongside the file sink
/// when running interactively.
pub struct StdoutSink;

#[async_trait]
impl ReportSink for StdoutSink {
    async fn record(&self, report: &MetricReport) -> Result<(), SinkError> {
        let status = match report.state {
            FinalState::Ok { repaired: false } => "ok",
            FinalState::Ok { repaired: true } => "repaired",
            FinalState::Unrepaired => "unrepaired",
            FinalState::Error => "error",
        };
        let value = report
            .final_value
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<24} {:<10} value={} attempts={}",
            report.metric.id,
            status,
            value,
            report.repairs.len()
        );
        Ok(())
    }
}

/// Fans one report out to several sinks.
pub struct MultiSink {
    sinks: Vec<Box<dyn ReportSink>>,
}

impl MultiSink {
    pub fn new(sinks: Vec<Box<dyn ReportSink>>) -> Self {
        Self { sinks }
    }
}

#[async_trait]
impl ReportSink for MultiSink {
    async fn record(&self, report: &MetricReport) -> Result<(), SinkError> {
        for sink in &self.sinks {
            sink.record(report).await?;
        }
        Ok(())
    }
}
