//! Storage traits and error types
//!
//! This module defines the trait interface for record sinks and
//! associated error types.

use crate::output::OutputError;
use crate::storage::JobRecord;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Batch of {count} records lost: primary failed ({primary}), fallback failed ({fallback})")]
    BatchLost {
        count: usize,
        primary: String,
        fallback: String,
    },

    #[error("No dataset has been initialized")]
    NotInitialized,

    #[error("Document error: {0}")]
    Document(#[from] OutputError),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Where an appended batch ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The batch is in the dataset file
    Primary,
    /// The dataset was unwritable; the batch is in this backup file
    Fallback(PathBuf),
}

/// Durable destination for extracted records
///
/// Appends are all-or-nothing per batch. A sink is owned by a single crawl
/// session.
pub trait RecordSink: Send {
    /// Creates or truncates the dataset and writes its header
    ///
    /// # Returns
    ///
    /// The path of the dataset file
    fn initialize(&mut self, dataset: &str) -> StorageResult<PathBuf>;

    /// Path of the dataset file, once a dataset is selected
    fn dataset_path(&self) -> Option<PathBuf>;

    /// Appends a batch, falling back to the backup location once
    ///
    /// # Returns
    ///
    /// * `Ok(AppendOutcome)` - The whole batch was written somewhere
    /// * `Err(StorageError::BatchLost)` - Neither location accepted the batch
    fn append(&mut self, records: &[JobRecord]) -> StorageResult<AppendOutcome>;

    /// Reads back every well-formed row of the dataset
    fn load(&self) -> StorageResult<Vec<JobRecord>>;

    /// Number of well-formed rows currently stored
    fn count_rows(&self) -> StorageResult<usize> {
        Ok(self.load()?.len())
    }

    /// Writes the Markdown document derived from the dataset
    ///
    /// # Arguments
    ///
    /// * `query` - The search query, used as the document heading
    ///
    /// # Returns
    ///
    /// The path the document was written to
    fn derive_document(&self, query: &str) -> StorageResult<PathBuf>;
}
