use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Failed to load configuration file: {path}\n{source}")]
    ConfigLoadError {
        path: PathBuf,
        source: anyhow::Error,
    },

    #[error("Failed to load metric catalog: {path}\n{source}")]
    CatalogLoadError {
        path: PathBuf,
        source: anyhow::Error,
    },

    #[error("Catalog row {row}: unknown dialect tag '{tag}'\nHint: use 'p21'/'tsql' or 'por'/'jet'")]
    UnknownDialect { row: usize, tag: String },

    #[error("Bad table override: {message}")]
    BadTableOverride { message: String },

    #[error("Failed to load replay fixtures: {path}\n{source}")]
    FixtureLoadError {
        path: PathBuf,
        source: anyhow::Error,
    },
}
