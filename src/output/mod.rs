//! Output module for derived documents and run reports
//!
//! This module handles:
//! - Rendering a dataset as a Markdown document
//! - Writing the document with a backup location
//! - Formatting the per-job result report

mod markdown;
pub mod report;

pub use markdown::{render_document, write_document};
pub use report::{format_report, print_report};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
