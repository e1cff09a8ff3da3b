//! Output module for exporting run results
//!
//! This module handles:
//! - Writing snapshots as JSON documents
//! - Writing one CSV file per category
//! - Writing an Excel workbook with one sheet per category
//! - Printing a console summary of the run

mod csv_export;
mod json;
mod summary;
mod traits;
mod xlsx;

pub use csv_export::{write_items, CsvExporter};
pub use json::JsonExporter;
pub use xlsx::XlsxExporter;
pub use summary::{format_summary, print_summary};
pub use traits::{export_basename, OutputError, OutputResult, SnapshotExporter};

use crate::config::{ExportFormat, ExportOptions};
use crate::model::CollectionSnapshot;
use crate::site::SiteLanguage;
use std::path::PathBuf;

/// Builds the exporters selected by the export options
pub fn exporters_for(
    options: &ExportOptions,
    language: SiteLanguage,
) -> Vec<Box<dyn SnapshotExporter>> {
    options
        .formats
        .iter()
        .map(|format| -> Box<dyn SnapshotExporter> {
            match format {
                ExportFormat::Json => Box::new(JsonExporter::new(&options.output_dir, language)),
                ExportFormat::Csv => Box::new(CsvExporter::new(&options.output_dir)),
                ExportFormat::Xlsx => Box::new(XlsxExporter::new(&options.output_dir, language)),
            }
        })
        .collect()
}

/// Runs every selected exporter over the snapshot
///
/// # Returns
///
/// * `Ok(Vec<PathBuf>)` - Paths written, in exporter order
/// * `Err(OutputError)` - The first exporter that failed
pub fn export_snapshot(
    snapshot: &CollectionSnapshot,
    options: &ExportOptions,
    language: SiteLanguage,
) -> OutputResult<Vec<PathBuf>> {
    let mut written = Vec::new();
    for exporter in exporters_for(options, language) {
        tracing::debug!("Running {} exporter", exporter.name());
        written.push(exporter.export(snapshot)?);
    }
    Ok(written)
}
