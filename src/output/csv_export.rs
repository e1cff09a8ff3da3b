//! CSV export: one file per non-empty category

use crate::model::{CollectionSnapshot, MediaItem};
use crate::output::traits::{ensure_dir, export_basename, OutputResult, SnapshotExporter};
use csv::{Terminator, WriterBuilder};
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

/// Byte order mark so spreadsheet tools pick UTF-8
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

const HEADER: [&str; 9] = [
    "id",
    "title",
    "original_title",
    "year",
    "rating",
    "favorite_count",
    "favorite",
    "poster_url",
    "source_url",
];

/// Writes `filmow_{user}_{timestamp}_csv/{category-slug}.csv`
#[derive(Debug, Clone)]
pub struct CsvExporter {
    output_dir: PathBuf,
}

impl CsvExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

impl SnapshotExporter for CsvExporter {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn export(&self, snapshot: &CollectionSnapshot) -> OutputResult<PathBuf> {
        let dir = self
            .output_dir
            .join(format!("{}_csv", export_basename(snapshot)));
        ensure_dir(&dir)?;

        for (key, collection) in snapshot.categories() {
            if collection.items.is_empty() {
                continue;
            }

            let path = dir.join(format!("{}.csv", key.slug()));
            let mut file = File::create(&path)?;
            file.write_all(UTF8_BOM)?;
            write_items(file, &collection.items)?;
            tracing::debug!("CSV data exported to {}", path.display());
        }

        tracing::info!("All CSV files exported to {}", dir.display());
        Ok(dir)
    }
}

/// Writes the header and one CRLF-terminated row per item
pub fn write_items<W: Write>(w: W, items: &[MediaItem]) -> csv::Result<()> {
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::CRLF)
        .from_writer(w);
    writer.write_record(HEADER)?;

    for item in items {
        let row = [
            item.id.to_string(),
            item.title.clone(),
            item.original_title.clone(),
            item.year.map(|y| y.to_string()).unwrap_or_default(),
            item.rating.map(|r| r.to_string()).unwrap_or_default(),
            item.favorite_count.map(|c| c.to_string()).unwrap_or_default(),
            item.favorite.to_string(),
            item.poster_url.clone().unwrap_or_default(),
            item.source_url.clone().unwrap_or_default(),
        ];
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}
