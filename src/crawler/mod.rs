//! Crawler module for listing pages and detail views
//!
//! This module contains the core crawling logic, including:
//! - Listing page loading and verification
//! - Card and detail extraction
//! - Pacing and the reload policy
//! - Overall session coordination

mod coordinator;
mod detail;
mod fetcher;
mod listing;
mod pacing;
pub mod selectors;

#[cfg(test)]
pub(crate) mod testing;

pub use coordinator::{Coordinator, CrawlJob, CrawlOutcome, CrawlSettings};
pub use detail::{extract_detail, split_description, ExtractionFailure};
pub use fetcher::{NavigationFailure, PageFetcher};
pub use listing::{extract_cards, identity_key, JobCardSummary};
pub use pacing::{pause, Pacer, RetryPolicy};

use crate::browser::launch_navigator;
use crate::config::{Config, JobEntry};
use crate::progress::{ProgressEvent, ProgressReporter, StopHandle};
use crate::state::CrawlPhase;
use crate::storage::{dataset_name, CsvStore};
use crate::url::SearchTarget;
use crate::{HarvestError, Result};
use chrono::Utc;
use std::sync::Arc;

/// Runs one configured job from start to finish
///
/// This is the main entry point for a crawl. It will:
/// 1. Build the search target and name the dataset
/// 2. Acquire a navigator for the configured backend
/// 3. Run the session through a [`Coordinator`]
/// 4. Release the navigator
///
/// # Arguments
///
/// * `config` - The loaded configuration
/// * `job` - The job to run
/// * `reporter` - Receives every progress event
/// * `stop` - Cooperative stop request
///
/// # Returns
///
/// * `Ok(CrawlOutcome)` - The session ran; see the outcome for what it found
/// * `Err(HarvestError::BrowserUnavailable)` - No navigator could be acquired
/// * `Err(HarvestError)` - The job itself is invalid
pub async fn crawl(
    config: &Config,
    job: &JobEntry,
    reporter: Arc<dyn ProgressReporter>,
    stop: StopHandle,
) -> Result<CrawlOutcome> {
    let mode = job.crawl_mode()?;
    let target = SearchTarget::new(&config.crawler, &job.query, &config.filters)?;
    let dataset = dataset_name(target.query(), &config.filters);

    let navigator = match launch_navigator(&config.browser).await {
        Ok(navigator) => navigator,
        Err(e) => {
            tracing::error!("Failed to acquire browser: {}", e);
            reporter.report(ProgressEvent {
                status: format!("Aborted: browser unavailable ({})", e),
                phase: CrawlPhase::Aborted,
                total_pages: 0,
                current_page: 0,
                records: 0,
                target: 0,
                percentage: 100,
                emitted_at: Utc::now(),
            });
            return Err(HarvestError::BrowserUnavailable(e.to_string()));
        }
    };

    let store = CsvStore::new(
        config.output.directory.clone(),
        config.output.fallback_directory(),
    );
    let mut coordinator = Coordinator::new(
        navigator,
        Box::new(store),
        reporter,
        stop,
        CrawlSettings::from_config(config),
    );

    let result = coordinator
        .run(&CrawlJob {
            target,
            mode,
            dataset,
        })
        .await;

    let mut navigator = coordinator.into_navigator();
    if let Err(e) = navigator.quit().await {
        tracing::warn!("Failed to close browser: {}", e);
    }

    result
}
