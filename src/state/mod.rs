//! State module for tracking crawl progress
//!
//! This module provides state management for a single crawl session.
//!
//! # Components
//!
//! - `CrawlPhase`: The session state machine (initializing, paging, finalizing, done)
//! - `IdentityTracker`: Set of listing identities seen during the session
//! - `CrawlSession`: Counters, streaks and the buffered batch of one run

mod identity;
mod phase;
mod session;

// Re-export main types
pub use identity::{IdentityKey, IdentityTracker};
pub use phase::CrawlPhase;
pub use session::{CrawlMode, CrawlSession, StopReason};
