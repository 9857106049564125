//! CSV-backed record sink

use crate::output::write_document;
use crate::storage::schema::{BOM, HEADER};
use crate::storage::traits::{AppendOutcome, RecordSink, StorageError, StorageResult};
use crate::storage::JobRecord;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Appends records to `<directory>/<dataset>.csv`
///
/// When the dataset cannot be written, batches go to
/// `<fallback_directory>/backup_<dataset>.csv` instead. The derived document
/// follows the same rule with a `.md` extension.
#[derive(Debug, Clone)]
pub struct CsvStore {
    directory: PathBuf,
    fallback_directory: PathBuf,
    dataset: Option<String>,
}

impl CsvStore {
    pub fn new(directory: impl Into<PathBuf>, fallback_directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            fallback_directory: fallback_directory.into(),
            dataset: None,
        }
    }

    /// Attaches to an existing dataset without truncating it
    pub fn open(
        directory: impl Into<PathBuf>,
        fallback_directory: impl Into<PathBuf>,
        dataset: &str,
    ) -> Self {
        Self {
            dataset: Some(dataset.to_string()),
            ..Self::new(directory, fallback_directory)
        }
    }

    pub fn primary_path(&self) -> Option<PathBuf> {
        self.dataset
            .as_ref()
            .map(|name| self.directory.join(format!("{}.csv", name)))
    }

    pub fn fallback_path(&self) -> Option<PathBuf> {
        self.dataset
            .as_ref()
            .map(|name| self.fallback_directory.join(format!("backup_{}.csv", name)))
    }

    pub fn document_path(&self) -> Option<PathBuf> {
        self.dataset
            .as_ref()
            .map(|name| self.directory.join(format!("{}.md", name)))
    }

    pub fn fallback_document_path(&self) -> Option<PathBuf> {
        self.dataset
            .as_ref()
            .map(|name| self.fallback_directory.join(format!("backup_{}.md", name)))
    }

    fn require_paths(&self) -> StorageResult<(PathBuf, PathBuf)> {
        match (self.primary_path(), self.fallback_path()) {
            (Some(primary), Some(fallback)) => Ok((primary, fallback)),
            _ => Err(StorageError::NotInitialized),
        }
    }
}

/// Serializes rows into memory so a batch is written with a single call
fn encode_rows<'a>(rows: impl IntoIterator<Item = [&'a str; 15]>) -> StorageResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| StorageError::Io(e.into_error()))
}

fn header_bytes() -> StorageResult<Vec<u8>> {
    let mut bytes = BOM.to_vec();
    bytes.extend(encode_rows([HEADER])?);
    Ok(bytes)
}

/// A writable file that can be cut back to an earlier length
trait Truncate: Write {
    fn current_len(&self) -> io::Result<u64>;
    fn truncate_to(&mut self, len: u64) -> io::Result<()>;
}

impl Truncate for File {
    fn current_len(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

/// Writes the whole batch or leaves the file at its previous length
fn write_batch<F: Truncate>(file: &mut F, bytes: &[u8]) -> io::Result<()> {
    let previous = file.current_len()?;
    if let Err(e) = file.write_all(bytes).and_then(|()| file.flush()) {
        if let Err(rollback) = file.truncate_to(previous) {
            tracing::error!(len = previous, "Could not remove partial batch: {}", rollback);
        }
        return Err(e);
    }
    Ok(())
}

/// Appends to an existing file; never creates it
fn append_existing(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new().append(true).open(path)?;
    write_batch(&mut file, bytes)
}

/// Appends to a file, creating it with a header when it is new or empty
fn append_with_header(path: &Path, rows: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let is_new = file.metadata()?.len() == 0;

    let mut bytes = if is_new { header_bytes()? } else { Vec::new() };
    bytes.extend_from_slice(rows);
    write_batch(&mut file, &bytes)?;
    Ok(())
}

/// Reads a dataset file, skipping malformed rows
pub(crate) fn read_records(path: &Path) -> StorageResult<Vec<JobRecord>> {
    let bytes = fs::read(path)?;
    let content = bytes.strip_prefix(BOM).unwrap_or(&bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content);

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row?;
        match JobRecord::from_row(&row) {
            Some(record) => records.push(record),
            None => tracing::warn!(
                row = index + 1,
                fields = row.len(),
                "Skipping incomplete row in {}",
                path.display()
            ),
        }
    }
    Ok(records)
}

impl RecordSink for CsvStore {
    fn initialize(&mut self, dataset: &str) -> StorageResult<PathBuf> {
        self.dataset = Some(dataset.to_string());
        let (primary, _) = self.require_paths()?;

        fs::create_dir_all(&self.directory)?;
        let mut file = File::create(&primary)?;
        file.write_all(&header_bytes()?)?;
        file.flush()?;

        tracing::info!("Initialized dataset {}", primary.display());
        Ok(primary)
    }

    fn dataset_path(&self) -> Option<PathBuf> {
        self.primary_path()
    }

    fn append(&mut self, records: &[JobRecord]) -> StorageResult<AppendOutcome> {
        let (primary, fallback) = self.require_paths()?;
        if records.is_empty() {
            return Ok(AppendOutcome::Primary);
        }

        let rows = encode_rows(records.iter().map(JobRecord::to_row))?;

        let primary_error = match append_existing(&primary, &rows) {
            Ok(()) => {
                tracing::debug!(count = records.len(), "Appended batch to {}", primary.display());
                return Ok(AppendOutcome::Primary);
            }
            Err(e) => e,
        };

        tracing::warn!(
            "Could not append to {}: {}; trying {}",
            primary.display(),
            primary_error,
            fallback.display()
        );

        match append_with_header(&fallback, &rows) {
            Ok(()) => {
                tracing::info!(count = records.len(), "Saved batch to backup {}", fallback.display());
                Ok(AppendOutcome::Fallback(fallback))
            }
            Err(fallback_error) => {
                tracing::error!(
                    count = records.len(),
                    "Backup save also failed: {}",
                    fallback_error
                );
                Err(StorageError::BatchLost {
                    count: records.len(),
                    primary: primary_error.to_string(),
                    fallback: fallback_error.to_string(),
                })
            }
        }
    }

    fn load(&self) -> StorageResult<Vec<JobRecord>> {
        let (primary, _) = self.require_paths()?;
        read_records(&primary)
    }

    fn derive_document(&self, query: &str) -> StorageResult<PathBuf> {
        let (primary, fallback) = match (self.document_path(), self.fallback_document_path()) {
            (Some(primary), Some(fallback)) => (primary, fallback),
            _ => return Err(StorageError::NotInitialized),
        };
        let records = self.load()?;
        Ok(write_document(query, &records, &primary, &fallback)?)
    }
}
