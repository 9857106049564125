//! Mutable state of one crawl session
//!
//! The controller owns a single [`CrawlSession`] and passes it around by
//! `&mut`. Every record a session has claimed is accounted for exactly once:
//! persisted, still buffered, lost to a persistence failure, or a failed
//! extraction.

use super::identity::{IdentityKey, IdentityTracker};
use super::phase::CrawlPhase;
use crate::storage::JobRecord;
use crate::HarvestError;
use std::fmt;

/// How far a session crawls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlMode {
    /// Crawl the first `n` pages
    ByPageCount(u32),
    /// Stop as soon as `n` records are collected
    ByTargetCount(u32),
    /// Crawl every page until only duplicates remain
    ExhaustAll,
}

impl fmt::Display for CrawlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByPageCount(n) => write!(f, "first {} pages", n),
            Self::ByTargetCount(n) => write!(f, "target of {} records", n),
            Self::ExhaustAll => f.write_str("all pages"),
        }
    }
}

/// Why the paging loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Every page in range was visited
    PagesExhausted,
    /// The record target was met
    TargetReached,
    /// Too many consecutive pages yielded nothing
    EmptyStreakExceeded,
    /// Too many consecutive pages held only known listings
    DuplicateStreakExceeded,
    /// A page could not be loaded after all retries
    PageLoadFailed { page: u32 },
    /// The caller asked the session to stop
    Stopped,
}

impl StopReason {
    pub fn describe(&self) -> String {
        match self {
            Self::PagesExhausted => "all pages crawled".to_string(),
            Self::TargetReached => "target record count reached".to_string(),
            Self::EmptyStreakExceeded => "several consecutive pages yielded no data".to_string(),
            Self::DuplicateStreakExceeded => {
                "several consecutive pages held only duplicates".to_string()
            }
            Self::PageLoadFailed { page } => format!("page {} failed to load", page),
            Self::Stopped => "stopped by request".to_string(),
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// State of one crawl run
#[derive(Debug)]
pub struct CrawlSession {
    mode: CrawlMode,
    phase: CrawlPhase,
    identities: IdentityTracker,
    total_pages: u32,
    listings_per_page: u32,
    duplicate_threshold: u32,
    empty_threshold: u32,
    empty_streak: u32,
    duplicate_streak: u32,
    persisted: usize,
    pending: Vec<JobRecord>,
    failed_extractions: usize,
    lost_records: usize,
    last_percentage: u8,
}

impl CrawlSession {
    pub fn new(
        mode: CrawlMode,
        listings_per_page: u32,
        duplicate_threshold: u32,
        empty_threshold: u32,
    ) -> Self {
        Self {
            mode,
            phase: CrawlPhase::Initializing,
            identities: IdentityTracker::new(),
            total_pages: 1,
            listings_per_page,
            duplicate_threshold,
            empty_threshold,
            empty_streak: 0,
            duplicate_streak: 0,
            persisted: 0,
            pending: Vec::new(),
            failed_extractions: 0,
            lost_records: 0,
            last_percentage: 0,
        }
    }

    pub fn mode(&self) -> CrawlMode {
        self.mode
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    /// Moves to `next`, rejecting transitions the state machine does not allow
    pub fn transition(&mut self, next: CrawlPhase) -> Result<(), HarvestError> {
        if !self.phase.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::debug!(from = %self.phase, to = %next, "Phase transition");
        self.phase = next;
        Ok(())
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn set_total_pages(&mut self, total: u32) {
        self.total_pages = total.max(1);
    }

    /// Last page the paging loop may visit
    pub fn page_limit(&self) -> u32 {
        match self.mode {
            CrawlMode::ByPageCount(n) => n.min(self.total_pages),
            CrawlMode::ByTargetCount(_) | CrawlMode::ExhaustAll => self.total_pages,
        }
    }

    /// Number of records the session expects to collect
    pub fn target_records(&self) -> usize {
        let per_page = self.listings_per_page as usize;
        match self.mode {
            CrawlMode::ByPageCount(n) => n.min(self.total_pages) as usize * per_page,
            CrawlMode::ByTargetCount(n) => n as usize,
            CrawlMode::ExhaustAll => self.total_pages as usize * per_page,
        }
    }

    /// Target reported once the session is over; never below what was found
    pub fn final_target(&self) -> usize {
        self.target_records().max(self.records())
    }

    /// Distinct records extracted so far, whether or not they were persisted
    pub fn records(&self) -> usize {
        self.persisted + self.pending.len() + self.lost_records
    }

    pub fn persisted(&self) -> usize {
        self.persisted
    }

    pub fn buffered(&self) -> usize {
        self.pending.len()
    }

    pub fn failed_extractions(&self) -> usize {
        self.failed_extractions
    }

    pub fn lost_records(&self) -> usize {
        self.lost_records
    }

    pub fn is_seen(&self, key: &IdentityKey) -> bool {
        self.identities.seen(key)
    }

    /// Marks `key` as seen before its detail is extracted
    ///
    /// Returns false if the key was already known.
    pub fn claim(&mut self, key: IdentityKey) -> bool {
        self.identities.record(key)
    }

    /// Buffers a freshly extracted record
    pub fn buffer(&mut self, record: JobRecord) {
        self.pending.push(record);
    }

    pub fn record_failed_extraction(&mut self) {
        self.failed_extractions += 1;
    }

    /// Hands over the buffered batch for persistence
    pub fn take_pending(&mut self) -> Vec<JobRecord> {
        std::mem::take(&mut self.pending)
    }

    pub fn mark_persisted(&mut self, count: usize) {
        self.persisted += count;
    }

    pub fn mark_lost(&mut self, count: usize) {
        self.lost_records += count;
    }

    /// True when a target-count session has collected enough records
    pub fn target_reached(&self) -> bool {
        match self.mode {
            CrawlMode::ByTargetCount(n) => self.records() >= n as usize,
            _ => false,
        }
    }

    /// Progress percentage, never decreasing within the session
    pub fn percentage(&mut self) -> u8 {
        let target = self.target_records();
        let computed = if target == 0 {
            0
        } else {
            ((self.records() * 100) / target).min(100) as u8
        };
        self.last_percentage = self.last_percentage.max(computed);
        self.last_percentage
    }

    /// Pins progress at 100 for the terminal event
    pub fn complete_percentage(&mut self) -> u8 {
        self.last_percentage = 100;
        self.last_percentage
    }

    /// Updates the page streaks and decides whether paging must stop
    ///
    /// A page-count crawl tracks pages with no records at all; the other modes
    /// track pages whose listings were all duplicates. A failed page in a
    /// page-count crawl is reported here with zero new records.
    pub fn page_finished(&mut self, new_records: usize) -> Option<StopReason> {
        match self.mode {
            CrawlMode::ByPageCount(_) => {
                if new_records == 0 {
                    self.empty_streak += 1;
                    if self.empty_streak >= self.empty_threshold {
                        return Some(StopReason::EmptyStreakExceeded);
                    }
                } else {
                    self.empty_streak = 0;
                }
            }
            CrawlMode::ByTargetCount(_) | CrawlMode::ExhaustAll => {
                if new_records == 0 {
                    self.duplicate_streak += 1;
                    if self.duplicate_streak >= self.duplicate_threshold {
                        return Some(StopReason::DuplicateStreakExceeded);
                    }
                } else {
                    self.duplicate_streak = 0;
                }
            }
        }
        None
    }

    /// Every claimed identity is accounted for exactly once
    pub fn is_consistent(&self) -> bool {
        self.persisted + self.pending.len() + self.lost_records + self.failed_extractions
            == self.identities.len()
    }
}
