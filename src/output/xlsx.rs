//! Excel export: one workbook, one worksheet per non-empty category

use crate::model::{CollectionSnapshot, MediaItem};
use crate::output::traits::{ensure_dir, export_basename, OutputResult, SnapshotExporter};
use crate::site::SiteLanguage;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::path::PathBuf;

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

/// Writes `filmow_{user}_{timestamp}.xlsx` into the output directory
///
/// Worksheets are named after the localized category labels.
#[derive(Debug, Clone)]
pub struct XlsxExporter {
    output_dir: PathBuf,
    language: SiteLanguage,
}

impl XlsxExporter {
    pub fn new(output_dir: impl Into<PathBuf>, language: SiteLanguage) -> Self {
        Self {
            output_dir: output_dir.into(),
            language,
        }
    }

    /// Builds the workbook in memory
    pub fn workbook(&self, snapshot: &CollectionSnapshot) -> Result<Workbook, XlsxError> {
        let mut workbook = Workbook::new();
        let bold = Format::new().set_bold();

        let mut sheets = 0;
        for (key, collection) in snapshot.categories() {
            if collection.items.is_empty() {
                continue;
            }

            let worksheet = workbook.add_worksheet();
            worksheet.set_name(self.language.category_label(key))?;
            write_sheet(worksheet, &collection.items, &bold)?;
            sheets += 1;
        }

        // A workbook needs at least one sheet
        if sheets == 0 {
            workbook.add_worksheet();
        }

        Ok(workbook)
    }
}

impl SnapshotExporter for XlsxExporter {
    fn name(&self) -> &'static str {
        "xlsx"
    }

    fn export(&self, snapshot: &CollectionSnapshot) -> OutputResult<PathBuf> {
        ensure_dir(&self.output_dir)?;
        let path = self
            .output_dir
            .join(format!("{}.xlsx", export_basename(snapshot)));

        let mut workbook = self.workbook(snapshot)?;
        workbook.save(&path)?;

        tracing::info!("Excel data exported to {}", path.display());
        Ok(path)
    }
}

fn write_sheet(
    worksheet: &mut Worksheet,
    items: &[MediaItem],
    bold: &Format,
) -> Result<(), XlsxError> {
    for (col, name) in HEADER.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *name, bold)?;
    }

    for (index, item) in items.iter().enumerate() {
        let row = index as u32 + 1;

        worksheet.write_number(row, 0, item.id as f64)?;
        worksheet.write_string(row, 1, item.title.as_str())?;
        worksheet.write_string(row, 2, item.original_title.as_str())?;
        if let Some(year) = item.year {
            worksheet.write_number(row, 3, year)?;
        }
        if let Some(rating) = item.rating {
            worksheet.write_number(row, 4, rating)?;
        }
        if let Some(count) = item.favorite_count {
            worksheet.write_number(row, 5, count)?;
        }
        worksheet.write_boolean(row, 6, item.favorite)?;
        if let Some(poster) = &item.poster_url {
            worksheet.write_string(row, 7, poster.as_str())?;
        }
        if let Some(source) = &item.source_url {
            worksheet.write_string(row, 8, source.as_str())?;
        }
    }

    Ok(())
}
