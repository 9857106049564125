//! Storage module for persisting extracted records
//!
//! This module handles all dataset operations for the crawler, including:
//! - The fixed CSV layout of a dataset
//! - All-or-nothing batch appends with a backup location
//! - Reading a dataset back and deriving its Markdown document
//! - Naming datasets after their query and filters

mod csv_store;
mod schema;
mod traits;

pub use csv_store::CsvStore;
pub use schema::{JobRecord, BOM, COLUMN_COUNT, HEADER};
pub use traits::{AppendOutcome, RecordSink, StorageError, StorageResult};

use crate::config::FilterCriteria;

/// Characters that cannot appear in a file name on common platforms
const RESERVED: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Builds the dataset name for a query and its filters
///
/// The name is the sanitized query followed by one `_<tag>` segment per
/// non-default filter, so runs with different filters never share a file.
///
/// # Example
///
/// ```
/// use job_harvest::config::FilterCriteria;
/// use job_harvest::storage::dataset_name;
///
/// assert_eq!(dataset_name("Data Analyst", &FilterCriteria::default()), "Data Analyst");
/// ```
pub fn dataset_name(query: &str, filters: &FilterCriteria) -> String {
    let mut name: String = query
        .trim()
        .chars()
        .map(|c| {
            if RESERVED.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    if name.trim_matches(|c| c == '_' || c == '.').is_empty() {
        name = "jobs".to_string();
    }

    for tag in filters.file_tags() {
        name.push('_');
        name.push_str(&tag);
    }
    name
}
