//! Console summary of a finished run

use crate::model::CategoryStatus;
use crate::pipeline::{RunOutcome, RunReport};
use crate::site::SiteLanguage;

/// Formats per-category counts, statuses and failed pages
pub fn format_summary(report: &RunReport, language: SiteLanguage) -> String {
    let snapshot = &report.snapshot;
    let mut out = String::new();

    out.push_str(&format!(
        "=== Filmow Export: {} ===\n\n",
        snapshot.username()
    ));

    for (key, collection) in snapshot.categories() {
        let stats = &collection.stats;
        let status = match stats.status {
            CategoryStatus::Complete => "complete",
            CategoryStatus::Partial => "partial",
            CategoryStatus::Failed => "failed",
        };
        out.push_str(&format!(
            "  {:<22} {:>5} item(s)  {}/{} page(s)  [{}]\n",
            language.category_label(key),
            collection.items.len(),
            stats.pages_fetched,
            stats.pages_expected,
            status
        ));

        if !stats.failed_pages.is_empty() {
            let pages: Vec<String> = stats.failed_pages.iter().map(|p| p.to_string()).collect();
            out.push_str(&format!("  {:<22} failed pages: {}\n", "", pages.join(", ")));
        }
    }

    out.push('\n');
    out.push_str(&format!("Total: {} item(s)\n", snapshot.total_items()));

    match &report.outcome {
        RunOutcome::Complete => out.push_str("All categories complete\n"),
        RunOutcome::Incomplete { partial, failed } => {
            out.push_str(&format!(
                "Incomplete: {} partial, {} failed\n",
                partial.len(),
                failed.len()
            ));
        }
    }

    out
}

/// Prints the run summary to stdout
pub fn print_summary(report: &RunReport, language: SiteLanguage) {
    print!("{}", format_summary(report, language));
}
