//! Markdown document generation
//!
//! This module renders a dataset as a human-readable Markdown document: one
//! section per listing with an overview table and the free-text fields.

use crate::output::{OutputError, OutputResult};
use crate::storage::JobRecord;
use std::fs;
use std::path::{Path, PathBuf};

/// Renders the document for `query` from its dataset rows
///
/// # Arguments
///
/// * `query` - The search query, used in the top-level heading
/// * `records` - Dataset rows in file order
///
/// # Returns
///
/// The complete Markdown text
pub fn render_document(query: &str, records: &[JobRecord]) -> String {
    let mut md = String::new();

    md.push_str(&format!("# {} job listings\n\n", query));

    if records.is_empty() {
        md.push_str("*No job records found.*\n");
        return md;
    }

    for record in records {
        md.push_str(&format!("## {} - {}\n\n", record.title, record.company));

        // Overview
        md.push_str("### Overview\n\n");
        md.push_str("| Item | Value |\n");
        md.push_str("|------|-------|\n");
        for (label, value) in [
            ("Salary", &record.salary),
            ("Company size", &record.company_size),
            ("Funding stage", &record.funding_stage),
            ("Industry", &record.industry),
            ("Experience", &record.experience),
            ("Education", &record.education),
            ("Work address", &record.work_address),
        ] {
            md.push_str(&format!("| {} | {} |\n", label, escape_cell(value)));
        }
        md.push('\n');

        for (heading, text) in [
            ("Tags", &record.tags),
            ("Description", &record.description),
            ("Responsibilities", &record.responsibilities),
            ("Requirements", &record.requirements),
            ("Benefits", &record.benefits),
            ("Interview address", &record.interview_address),
        ] {
            if !text.is_empty() {
                md.push_str(&format!("### {}\n\n{}\n\n", heading, text));
            }
        }

        md.push_str("---\n\n");
    }

    md
}

/// Keeps a value on one table row
fn escape_cell(value: &str) -> String {
    value
        .replace('|', "\\|")
        .replace("\r\n", "<br>")
        .replace('\n', "<br>")
}

/// Writes the document, falling back to `fallback` if `primary` is unwritable
///
/// # Returns
///
/// * `Ok(PathBuf)` - The path the document ended up at
/// * `Err(OutputError::Write)` - Neither location could be written
pub fn write_document(
    query: &str,
    records: &[JobRecord],
    primary: &Path,
    fallback: &Path,
) -> OutputResult<PathBuf> {
    let markdown = render_document(query, records);

    let primary_error = match write_file(primary, &markdown) {
        Ok(()) => {
            tracing::info!(
                records = records.len(),
                "Wrote document {}",
                primary.display()
            );
            return Ok(primary.to_path_buf());
        }
        Err(e) => e,
    };

    tracing::warn!(
        "Could not write {}: {}; trying {}",
        primary.display(),
        primary_error,
        fallback.display()
    );

    write_file(fallback, &markdown).map_err(|fallback_error| {
        OutputError::Write(format!(
            "{} ({}); backup {} ({})",
            primary.display(),
            primary_error,
            fallback.display(),
            fallback_error
        ))
    })?;

    tracing::info!("Wrote document to backup {}", fallback.display());
    Ok(fallback.to_path_buf())
}

fn write_file(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, content)
}
