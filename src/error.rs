use std::path::PathBuf;
use thiserror::Error;

use crate::constants::EXIT_FATAL;

/// Run-fatal failures. Anything that only affects a single row or record file
/// is reported as data instead (see `RejectedRow` and `ValidationIssue`).
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("source file is not valid tabular data: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("source header is missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("catalog directory {} is not accessible: {reason}", .path.display())]
    CatalogDirectory { path: PathBuf, reason: String },

    #[error("record schema error: {0}")]
    Schema(String),
}

impl CatalogError {
    /// Process exit code for a failure that aborted the run.
    pub fn exit_code(&self) -> i32 {
        EXIT_FATAL
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
