//! Progress reporting
//!
//! A crawl session announces every state change as a [`ProgressEvent`]
//! delivered synchronously, in order, to a [`ProgressReporter`]. Reporters must
//! not block. Provided implementations:
//! - [`LogReporter`], which logs each event through `tracing`
//! - any `Fn(ProgressEvent) + Send + Sync` closure
//! - an unbounded `tokio::sync::mpsc` sender
//! - a bounded sender, which drops events on a full queue
//!
//! [`StopHandle`] is the other direction: the caller asks the session to stop
//! and the session checks between pages and after each record.

use crate::state::CrawlPhase;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// A snapshot of session progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub status: String,
    pub phase: CrawlPhase,
    pub total_pages: u32,
    pub current_page: u32,
    /// Distinct records extracted so far
    pub records: usize,
    pub target: usize,
    /// 0 to 100, never decreasing within a session
    pub percentage: u8,
    pub emitted_at: DateTime<Utc>,
}

/// Receives progress events from a running session
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

impl<F> ProgressReporter for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn report(&self, event: ProgressEvent) {
        self(event)
    }
}

impl ProgressReporter for mpsc::UnboundedSender<ProgressEvent> {
    fn report(&self, event: ProgressEvent) {
        if self.send(event).is_err() {
            tracing::trace!("Progress receiver dropped");
        }
    }
}

impl ProgressReporter for mpsc::Sender<ProgressEvent> {
    fn report(&self, event: ProgressEvent) {
        match self.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                tracing::warn!(status = %event.status, "Progress queue full, dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::trace!("Progress receiver dropped");
            }
        }
    }
}

/// Logs every event at info level
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl ProgressReporter for LogReporter {
    fn report(&self, event: ProgressEvent) {
        tracing::info!(
            phase = %event.phase,
            page = event.current_page,
            total_pages = event.total_pages,
            records = event.records,
            target = event.target,
            "[{:>3}%] {}",
            event.percentage,
            event.status
        );
    }
}

/// Cooperative stop request shared between a caller and a session
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the session to stop at its next check
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
