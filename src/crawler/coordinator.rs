//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the session loop that coordinates one search, including:
//! - Reading the page count during initialization
//! - Loading each listing page with bounded reloads
//! - Extracting unseen cards and their detail views
//! - Evaluating the stopping condition of the crawl mode
//! - Flushing batches to the record sink and finalizing the dataset

use crate::browser::Navigator;
use crate::config::{Config, PacingConfig};
use crate::crawler::detail::extract_detail;
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::listing::{extract_cards, JobCardSummary};
use crate::crawler::pacing::{Pacer, RetryPolicy};
use crate::crawler::selectors::LISTING_CARD;
use crate::progress::{ProgressEvent, ProgressReporter, StopHandle};
use crate::state::{CrawlMode, CrawlPhase, CrawlSession, StopReason};
use crate::storage::{AppendOutcome, RecordSink};
use crate::url::SearchTarget;
use crate::Result;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Timeouts, pacing and thresholds for a session
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub page_timeout: Duration,
    pub detail_timeout: Duration,
    pub retry: RetryPolicy,
    pub pacing: PacingConfig,
    /// Cap on the page count read from pagination
    pub max_pages: u32,
    pub listings_per_page: u32,
    pub duplicate_threshold: u32,
    pub empty_threshold: u32,
}

impl CrawlSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            page_timeout: config.browser.page_timeout(),
            detail_timeout: config.browser.detail_timeout(),
            retry: RetryPolicy {
                max_reloads: config.crawler.max_reloads,
                backoff: config.pacing.reload_backoff,
            },
            pacing: config.pacing.clone(),
            max_pages: config.crawler.max_pages,
            listings_per_page: config.crawler.listings_per_page,
            duplicate_threshold: config.crawler.duplicate_threshold,
            empty_threshold: config.crawler.empty_threshold,
        }
    }
}

/// One search to run through a coordinator
#[derive(Debug, Clone)]
pub struct CrawlJob {
    pub target: SearchTarget,
    pub mode: CrawlMode,
    pub dataset: String,
}

/// What a finished session produced
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub query: String,
    pub mode: CrawlMode,
    pub dataset: String,
    pub dataset_path: PathBuf,
    /// Backup files that received batches the dataset refused
    pub fallback_paths: Vec<PathBuf>,
    pub document_path: Option<PathBuf>,
    pub stop_reason: StopReason,
    pub total_pages: u32,
    pub pages_visited: u32,
    /// Distinct records extracted
    pub records: usize,
    /// Records written to the dataset or a backup file
    pub persisted: usize,
    pub failed_extractions: usize,
    pub lost_records: usize,
    /// Rows read back from the dataset after the run
    pub stored_rows: Option<usize>,
}

/// How a single listing page ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageOutcome {
    /// Every card was processed
    Completed { new_records: usize },
    /// The page could not be loaded or showed no cards
    Failed,
    /// Paging must stop before the page was finished
    Halted(StopReason),
}

/// Drives one crawl session at a time
pub struct Coordinator {
    navigator: Box<dyn Navigator>,
    sink: Box<dyn RecordSink>,
    reporter: Arc<dyn ProgressReporter>,
    stop: StopHandle,
    settings: CrawlSettings,
    fetcher: PageFetcher,
    pacer: Pacer,
    fallback_paths: Vec<PathBuf>,
}

impl Coordinator {
    /// Creates a coordinator
    ///
    /// # Arguments
    ///
    /// * `navigator` - The browser, owned exclusively for the session
    /// * `sink` - Where extracted records are appended
    /// * `reporter` - Receives every progress event
    /// * `stop` - Polled between pages and after each record
    /// * `settings` - Timeouts, pacing and thresholds
    pub fn new(
        navigator: Box<dyn Navigator>,
        sink: Box<dyn RecordSink>,
        reporter: Arc<dyn ProgressReporter>,
        stop: StopHandle,
        settings: CrawlSettings,
    ) -> Self {
        let fetcher = PageFetcher::new(settings.page_timeout);
        let pacer = Pacer::new(settings.pacing.clone());
        Self {
            navigator,
            sink,
            reporter,
            stop,
            settings,
            fetcher,
            pacer,
            fallback_paths: Vec::new(),
        }
    }

    /// Hands back the navigator so the caller can release it
    pub fn into_navigator(self) -> Box<dyn Navigator> {
        self.navigator
    }

    /// Runs one session to completion
    ///
    /// Page and record failures never abort the session; they end up in the
    /// outcome and in the progress events. The reporter always receives a
    /// final event.
    pub async fn run(&mut self, job: &CrawlJob) -> Result<CrawlOutcome> {
        let mut session = CrawlSession::new(
            job.mode,
            self.settings.listings_per_page,
            self.settings.duplicate_threshold,
            self.settings.empty_threshold,
        );
        self.fallback_paths.clear();

        tracing::info!(
            query = job.target.query(),
            mode = %job.mode,
            "Starting crawl into dataset {}",
            job.dataset
        );
        self.emit(
            &mut session,
            format!("Starting '{}' ({})", job.target.query(), job.mode),
            0,
        );

        let dataset_path = match self.sink.initialize(&job.dataset) {
            Ok(path) => path,
            Err(e) => {
                tracing::error!("Failed to initialize dataset {}: {}", job.dataset, e);
                self.emit(
                    &mut session,
                    format!("Dataset could not be created ({}), using backup location", e),
                    0,
                );
                self.sink.dataset_path().unwrap_or_default()
            }
        };

        self.initialize(&mut session, job).await;

        session.transition(CrawlPhase::Paging)?;
        let (stop_reason, pages_visited) = self.page_loop(&mut session, job).await;
        tracing::info!(page = pages_visited, "Paging finished: {}", stop_reason);

        session.transition(CrawlPhase::Finalizing)?;
        self.flush(&mut session);
        debug_assert!(session.is_consistent());

        let stored_rows = match self.sink.count_rows() {
            Ok(rows) => Some(rows),
            Err(e) => {
                tracing::warn!("Could not read back dataset {}: {}", job.dataset, e);
                None
            }
        };
        if stored_rows == Some(0) && session.records() > 0 {
            tracing::warn!(
                "Dataset {} is empty although {} records were extracted",
                dataset_path.display(),
                session.records()
            );
        }

        let document_path = match self.sink.derive_document(job.target.query()) {
            Ok(path) => {
                tracing::info!("Wrote document {}", path.display());
                Some(path)
            }
            Err(e) => {
                tracing::error!("Failed to derive document for {}: {}", job.dataset, e);
                None
            }
        };

        session.transition(CrawlPhase::Done)?;
        let status = final_status(&session, stop_reason);
        self.emit_final(&mut session, status, pages_visited);

        Ok(CrawlOutcome {
            query: job.target.query().to_string(),
            mode: job.mode,
            dataset: job.dataset.clone(),
            dataset_path,
            fallback_paths: self.fallback_paths.clone(),
            document_path,
            stop_reason,
            total_pages: session.total_pages(),
            pages_visited,
            records: session.records(),
            persisted: session.persisted(),
            failed_extractions: session.failed_extractions(),
            lost_records: session.lost_records(),
            stored_rows,
        })
    }

    /// Reads the page count from the first result page
    async fn initialize(&mut self, session: &mut CrawlSession, job: &CrawlJob) {
        let first = job.target.page_url(1);
        if let Err(e) = self.navigator.get(first.as_str()).await {
            tracing::warn!(url = %first, "First page did not load: {}", e);
        }
        self.pacer.page_settle().await;

        let total = self
            .fetcher
            .total_pages(self.navigator.as_mut(), self.settings.max_pages)
            .await;
        session.set_total_pages(total);
        tracing::info!(total_pages = total, "Search has {} result pages", total);

        self.emit(
            session,
            format!("Preparing to crawl {} of {} pages", job.mode, total),
            0,
        );
    }

    /// Visits pages until the mode's stopping condition holds
    ///
    /// Returns the stop reason and the number of pages attempted.
    async fn page_loop(&mut self, session: &mut CrawlSession, job: &CrawlJob) -> (StopReason, u32) {
        let mut visited = 0;

        for page in 1..=session.page_limit() {
            if self.stop.is_stopped() {
                return (StopReason::Stopped, visited);
            }
            visited += 1;

            match self.crawl_page(session, job, page).await {
                PageOutcome::Completed { new_records } => {
                    let lost = self.flush(session);
                    let mut status = format!(
                        "Page {} done: {} new records, {} in total",
                        page,
                        new_records,
                        session.records()
                    );
                    if lost > 0 {
                        status.push_str(&format!(", {} records could not be saved", lost));
                    }
                    self.emit(session, status, page);

                    if let Some(reason) = session.page_finished(new_records) {
                        return (reason, visited);
                    }
                }
                PageOutcome::Failed => match session.mode() {
                    CrawlMode::ByPageCount(_) => {
                        if let Some(reason) = session.page_finished(0) {
                            return (reason, visited);
                        }
                    }
                    CrawlMode::ByTargetCount(_) | CrawlMode::ExhaustAll => {
                        return (StopReason::PageLoadFailed { page }, visited);
                    }
                },
                PageOutcome::Halted(reason) => {
                    self.flush(session);
                    return (reason, visited);
                }
            }
        }

        (StopReason::PagesExhausted, visited)
    }

    async fn crawl_page(
        &mut self,
        session: &mut CrawlSession,
        job: &CrawlJob,
        page: u32,
    ) -> PageOutcome {
        let url = job.target.page_url(page);
        self.emit(
            session,
            format!("Crawling page {}/{}", page, session.page_limit()),
            page,
        );

        if !self.load_page(session, &url, page).await {
            self.emit(session, format!("Page {} failed to load", page), page);
            return PageOutcome::Failed;
        }

        let cards = match self.read_cards(&url, page).await {
            Some(cards) => cards,
            None => {
                self.emit(session, format!("Page {} shows no listings", page), page);
                return PageOutcome::Failed;
            }
        };

        self.emit(
            session,
            format!("Parsing {} cards on page {}", cards.len(), page),
            page,
        );

        let mut new_records = 0;
        for (index, card) in cards.iter().enumerate() {
            let key = card.identity_key();
            if session.is_seen(&key) {
                tracing::trace!(page, card = index, "Skipping known listing {}", key);
                continue;
            }
            session.claim(key);

            match extract_detail(
                self.navigator.as_mut(),
                card,
                self.settings.detail_timeout,
                self.settings.pacing.detail_open,
            )
            .await
            {
                Ok(record) => {
                    session.buffer(record);
                    new_records += 1;
                    self.emit(
                        session,
                        format!("Extracted '{}' at {}", card.title, card.company),
                        page,
                    );
                }
                Err(e) => {
                    tracing::warn!(page, card = index, "Detail extraction failed: {}", e);
                    session.record_failed_extraction();
                    self.emit(
                        session,
                        format!(
                            "Detail of '{}' at {} failed: {}",
                            card.title, card.company, e
                        ),
                        page,
                    );
                }
            }

            if session.target_reached() {
                return PageOutcome::Halted(StopReason::TargetReached);
            }
            if self.stop.is_stopped() {
                return PageOutcome::Halted(StopReason::Stopped);
            }
        }

        PageOutcome::Completed { new_records }
    }

    /// Loads a page, reloading it up to the retry limit
    async fn load_page(&mut self, session: &mut CrawlSession, url: &Url, page: u32) -> bool {
        let retry = self.settings.retry;
        let mut result = self.fetcher.load(self.navigator.as_mut(), url, page).await;
        let mut attempt = 0;

        while let Err(failure) = result {
            if attempt >= retry.max_reloads {
                tracing::error!(page, url = %url, "Giving up on page: {}", failure);
                return false;
            }
            attempt += 1;
            tracing::warn!(page, attempt, "Page failed verification: {}", failure);
            self.emit(
                session,
                format!(
                    "Page {} did not load ({}), retry {}/{}",
                    page, failure, attempt, retry.max_reloads
                ),
                page,
            );

            tokio::time::sleep(retry.backoff_delay()).await;
            result = self.fetcher.reload(self.navigator.as_mut(), page).await;
        }

        self.pacer.page_settle().await;
        true
    }

    /// Scrolls the page and reads its cards, reloading once if none appear
    async fn read_cards(&mut self, url: &Url, page: u32) -> Option<Vec<JobCardSummary>> {
        self.pacer.settle_scroll(self.navigator.as_mut()).await;
        let mut elements = self.card_elements(page).await;

        if elements.is_empty() {
            tracing::warn!(page, "No listing cards found, reloading once");
            if let Err(e) = self.navigator.reload().await {
                tracing::warn!(page, "Reload failed: {}", e);
            }
            self.pacer.page_settle().await;
            self.pacer.settle_scroll(self.navigator.as_mut()).await;
            elements = self.card_elements(page).await;
        }

        if elements.is_empty() {
            return None;
        }
        Some(extract_cards(elements, url).collect())
    }

    async fn card_elements(&mut self, page: u32) -> Vec<crate::browser::Element> {
        match self.navigator.find_all(LISTING_CARD).await {
            Ok(elements) => elements,
            Err(e) => {
                tracing::warn!(page, "Failed to read listing cards: {}", e);
                Vec::new()
            }
        }
    }

    /// Appends the buffered batch to the sink
    ///
    /// Returns the number of records lost when neither location accepted
    /// the batch.
    fn flush(&mut self, session: &mut CrawlSession) -> usize {
        let batch = session.take_pending();
        if batch.is_empty() {
            return 0;
        }
        let count = batch.len();

        match self.sink.append(&batch) {
            Ok(AppendOutcome::Primary) => {
                session.mark_persisted(count);
                0
            }
            Ok(AppendOutcome::Fallback(path)) => {
                tracing::warn!(count, "Batch saved to backup {}", path.display());
                session.mark_persisted(count);
                if !self.fallback_paths.contains(&path) {
                    self.fallback_paths.push(path);
                }
                0
            }
            Err(e) => {
                tracing::error!(count, "Batch lost: {}", e);
                session.mark_lost(count);
                count
            }
        }
    }

    fn emit(&self, session: &mut CrawlSession, status: String, current_page: u32) {
        let event = ProgressEvent {
            status,
            phase: session.phase(),
            total_pages: session.total_pages(),
            current_page,
            records: session.records(),
            target: session.target_records(),
            percentage: session.percentage(),
            emitted_at: Utc::now(),
        };
        self.reporter.report(event);
    }

    fn emit_final(&self, session: &mut CrawlSession, status: String, current_page: u32) {
        let event = ProgressEvent {
            status,
            phase: session.phase(),
            total_pages: session.total_pages(),
            current_page,
            records: session.records(),
            target: session.final_target(),
            percentage: session.complete_percentage(),
            emitted_at: Utc::now(),
        };
        self.reporter.report(event);
    }
}

fn final_status(session: &CrawlSession, reason: StopReason) -> String {
    let mut status = format!("Finished: {}, {} records", reason, session.records());
    if session.lost_records() > 0 {
        status.push_str(&format!(
            ", {} records lost to storage failures",
            session.lost_records()
        ));
    }
    if session.failed_extractions() > 0 {
        status.push_str(&format!(
            ", {} detail pages failed",
            session.failed_extractions()
        ));
    }
    status
}
