//! Exporter trait and shared output types

use crate::model::CollectionSnapshot;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Excel error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Writes a snapshot somewhere durable
///
/// Exporters only read the snapshot; they never alter or re-sort it.
pub trait SnapshotExporter {
    /// Short name used in log lines ("json", "csv", "xlsx")
    fn name(&self) -> &'static str;

    /// Writes the snapshot and returns the path of what was written
    fn export(&self, snapshot: &CollectionSnapshot) -> OutputResult<PathBuf>;
}

/// Base name shared by every file of one export: `filmow_{user}_{timestamp}`
///
/// Characters outside `[A-Za-z0-9_-]` in the username become `_`.
pub fn export_basename(snapshot: &CollectionSnapshot) -> String {
    let username: String = snapshot
        .username()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "filmow_{}_{}",
        username,
        snapshot.taken_at().format("%Y%m%d_%H%M%S")
    )
}

/// Creates `dir` (and parents) if missing
pub(crate) fn ensure_dir(dir: &Path) -> OutputResult<()> {
    std::fs::create_dir_all(dir).map_err(|e| {
        OutputError::Write(format!("Cannot create directory {}: {}", dir.display(), e))
    })
}
