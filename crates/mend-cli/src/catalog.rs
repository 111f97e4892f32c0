//! CSV metric catalog loading.
//!
//! Five required columns (`id,name,chart_group,variable_name,dialect`)
//! plus optional `raw_expression`. Dialect tags are parsed strictly here,
//! at the construction boundary; the engine never sees an unknown tag.

use crate::errors::CliError;
use anyhow::Result;
use mend_backend::SqlDialect;
use mend_engine::MetricDefinition;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct CatalogRow {
    id: String,
    name: String,
    chart_group: String,
    variable_name: String,
    dialect: String,
    #[serde(default)]
    raw_expression: String,
}

/// Load the metric catalog from a CSV file.
pub fn load_catalog(path: &Path) -> Result<Vec<MetricDefinition>> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| CliError::CatalogLoadError {
        path: path.to_path_buf(),
        source: e.into(),
    })?;

    let mut metrics = Vec::new();
    for (index, record) in reader.deserialize::<CatalogRow>().enumerate() {
        let row = record.map_err(|e| CliError::CatalogLoadError {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        // Header is line 1
        let line = index + 2;
        let dialect = SqlDialect::parse(&row.dialect).ok_or(CliError::UnknownDialect {
            row: line,
            tag: row.dialect.clone(),
        })?;
        metrics.push(MetricDefinition::new(
            row.id,
            row.name,
            row.chart_group,
            row.variable_name,
            dialect,
            row.raw_expression,
        ));
    }
    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_catalog(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_rows_with_and_without_raw_expressions() {
        let file = write_catalog(
            "id,name,chart_group,variable_name,dialect,raw_expression\n\
             m1,Total Orders,Key Metrics,Total Orders,p21,\n\
             m2,Open Rentals,Rentals,Open Rentals,por,SELECT Count(*) as value FROM Rentals\n",
        );

        let metrics = load_catalog(file.path()).unwrap();
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0].dialect, SqlDialect::TSql);
        assert_eq!(metrics[0].raw_expression, "");
        assert_eq!(metrics[1].dialect, SqlDialect::Jet);
        assert!(metrics[1].raw_expression.contains("Rentals"));
    }

    #[test]
    fn unknown_dialect_tag_is_rejected_with_its_line() {
        let file = write_catalog(
            "id,name,chart_group,variable_name,dialect\n\
             m1,Total Orders,Key Metrics,Total Orders,oracle\n",
        );

        let err = load_catalog(file.path()).unwrap_err();
        assert!(err.to_string().contains("unknown dialect tag 'oracle'"));
        assert!(err.to_string().contains("row 2"));
    }
}
