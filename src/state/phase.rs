//! Session phase definitions
//!
//! A session moves `Initializing → Paging → Finalizing → Done`. `Aborted` is
//! reachable only from `Initializing`, when no browser could be acquired.

use std::fmt;

/// Represents the current phase of a crawl session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Acquiring the navigator and reading the page count
    Initializing,

    /// Iterating over listing pages
    Paging,

    /// Flushing buffered records and deriving the document
    Finalizing,

    // ===== Terminal States =====
    /// Session finished normally, including early stops
    Done,

    /// No browser could be acquired; no page was touched
    Aborted,
}

impl CrawlPhase {
    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }

    /// Returns true if `next` is a legal successor of this phase
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Initializing, Self::Paging)
                | (Self::Initializing, Self::Finalizing)
                | (Self::Initializing, Self::Aborted)
                | (Self::Paging, Self::Finalizing)
                | (Self::Finalizing, Self::Done)
        )
    }

    /// Short lowercase label used in logs and events
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Paging => "paging",
            Self::Finalizing => "finalizing",
            Self::Done => "done",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
