//! Job-Harvest: a resilient job-listing harvester
//!
//! This crate crawls a paginated job search, extracts one structured record per
//! listing, deduplicates listings across pages, appends records to a CSV dataset
//! and derives a Markdown document from it, reporting progress to an observer
//! while tolerating transient page-load failures.

pub mod browser;
pub mod config;
pub mod crawler;
pub mod output;
pub mod progress;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Job-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Browser could not be acquired: {0}")]
    BrowserUnavailable(String),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Invalid phase transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlPhase,
        to: state::CrawlPhase,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Unknown region: {0}")]
    UnknownRegion(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),
}

/// Result type alias for Job-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{Config, FilterCriteria};
pub use crawler::{crawl, CrawlOutcome};
pub use progress::{ProgressEvent, ProgressReporter, StopHandle};
pub use state::{CrawlMode, CrawlPhase, StopReason};
pub use storage::JobRecord;
