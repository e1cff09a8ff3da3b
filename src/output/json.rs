//! JSON export
//!
//! Writes one pretty-printed document per run:
//!
//! ```json
//! {
//!   "username": "alice",
//!   "exported_at": "2024-03-09T14:05:07Z",
//!   "language": "pt",
//!   "collections": { "Filmes - Já vi": [ ... ], ... },
//!   "stats": { "movies-watched": { ... }, ... }
//! }
//! ```

use crate::model::{CategoryKey, CategoryStats, CollectionSnapshot, MediaItem};
use crate::output::traits::{ensure_dir, export_basename, OutputResult, SnapshotExporter};
use crate::site::SiteLanguage;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

#[derive(Serialize)]
struct JsonDocument<'a> {
    username: &'a str,
    exported_at: DateTime<Utc>,
    language: SiteLanguage,
    collections: LabeledCollections<'a>,
    stats: BTreeMap<CategoryKey, &'a CategoryStats>,
}

/// Category lists keyed by their localized label, in category order
struct LabeledCollections<'a>(Vec<(&'static str, &'a [MediaItem])>);

impl Serialize for LabeledCollections<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(label, items)| (label, items)))
    }
}

/// Writes `filmow_{user}_{timestamp}.json` into the output directory
#[derive(Debug, Clone)]
pub struct JsonExporter {
    output_dir: PathBuf,
    language: SiteLanguage,
}

impl JsonExporter {
    pub fn new(output_dir: impl Into<PathBuf>, language: SiteLanguage) -> Self {
        Self {
            output_dir: output_dir.into(),
            language,
        }
    }

    /// Renders the document without touching the filesystem
    pub fn render(&self, snapshot: &CollectionSnapshot) -> OutputResult<String> {
        let document = JsonDocument {
            username: snapshot.username(),
            exported_at: snapshot.taken_at(),
            language: self.language,
            collections: LabeledCollections(
                snapshot
                    .categories()
                    .map(|(key, collection)| {
                        (self.language.category_label(key), collection.items.as_slice())
                    })
                    .collect(),
            ),
            stats: snapshot
                .categories()
                .map(|(key, collection)| (key, &collection.stats))
                .collect(),
        };

        Ok(serde_json::to_string_pretty(&document)?)
    }
}

impl SnapshotExporter for JsonExporter {
    fn name(&self) -> &'static str {
        "json"
    }

    fn export(&self, snapshot: &CollectionSnapshot) -> OutputResult<PathBuf> {
        ensure_dir(&self.output_dir)?;
        let path = self
            .output_dir
            .join(format!("{}.json", export_basename(snapshot)));

        let content = self.render(snapshot)?;
        let mut writer = BufWriter::new(File::create(&path)?);
        writer.write_all(content.as_bytes())?;
        writer.flush()?;

        tracing::info!("JSON data exported to {}", path.display());
        Ok(path)
    }
}
