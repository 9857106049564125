//! Configuration module for Job-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use job_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Jobs queued: {}", config.jobs.len());
//! ```

pub mod filters;
mod parser;
mod types;
mod validation;

// Re-export types
pub use filters::{FilterCriteria, Region};
pub use types::{
    BrowserBackend, BrowserSettings, Config, CrawlerConfig, Jitter, JobEntry, JobMode,
    OutputConfig, PacingConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
