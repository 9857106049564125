//! Per-job result report
//!
//! Printed after each job so an operator can see where the data went and
//! whether anything was lost.

use crate::crawler::CrawlOutcome;
use std::fmt::Write;

/// Formats the report for one finished job
pub fn format_report(outcome: &CrawlOutcome) -> String {
    let mut out = String::new();

    // Writing into a String cannot fail
    let _ = writeln!(out, "=== {} ===", outcome.query);
    let _ = writeln!(out, "  Mode: {}", outcome.mode);
    let _ = writeln!(out, "  Stopped: {}", outcome.stop_reason);
    let _ = writeln!(
        out,
        "  Pages: {} visited of {}",
        outcome.pages_visited, outcome.total_pages
    );
    let _ = writeln!(out, "  Records extracted: {}", outcome.records);
    let _ = writeln!(out, "  Records persisted: {}", outcome.persisted);

    match outcome.stored_rows {
        Some(rows) => {
            let _ = writeln!(out, "  Rows in dataset: {}", rows);
            if rows == 0 && outcome.records > 0 {
                let _ = writeln!(
                    out,
                    "  Warning: the dataset is empty although records were extracted"
                );
            }
        }
        None => {
            let _ = writeln!(out, "  Rows in dataset: unavailable");
        }
    }

    if outcome.failed_extractions > 0 {
        let _ = writeln!(out, "  Failed detail extractions: {}", outcome.failed_extractions);
    }
    if outcome.lost_records > 0 {
        let _ = writeln!(out, "  Records lost: {}", outcome.lost_records);
    }

    let _ = writeln!(out, "  Dataset: {}", outcome.dataset_path.display());
    for path in &outcome.fallback_paths {
        let _ = writeln!(out, "  Backup dataset: {}", path.display());
    }
    match &outcome.document_path {
        Some(path) => {
            let _ = writeln!(out, "  Document: {}", path.display());
        }
        None => {
            let _ = writeln!(out, "  Document: not written");
        }
    }

    out
}

/// Prints the report for one finished job to stdout
pub fn print_report(outcome: &CrawlOutcome) {
    print!("{}", format_report(outcome));
    println!();
}
