//! Pacing and retry policy
//!
//! This module handles:
//! - Jittered pauses between browser actions
//! - Scroll stabilization so lazily rendered cards appear
//! - The bounded reload policy for pages that fail verification

use crate::browser::Navigator;
use crate::config::{Jitter, PacingConfig};
use std::time::Duration;

/// How many times a page is reloaded after failing verification
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_reloads: u32,
    pub backoff: Jitter,
}

impl RetryPolicy {
    pub fn backoff_delay(&self) -> Duration {
        self.backoff.sample_delay()
    }
}

/// Sleeps for a duration drawn from `range` (milliseconds)
pub async fn pause(range: Jitter) {
    let delay = range.sample_delay();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Applies the configured pacing to a navigator
#[derive(Debug, Clone)]
pub struct Pacer {
    config: PacingConfig,
}

impl Pacer {
    pub fn new(config: PacingConfig) -> Self {
        Self { config }
    }

    /// Waits for a freshly loaded page to settle
    pub async fn page_settle(&self) {
        pause(self.config.page_settle).await;
    }

    /// Scrolls the focused page in a few random steps, then to the bottom
    ///
    /// Script failures are logged and otherwise ignored.
    pub async fn settle_scroll(&self, navigator: &mut dyn Navigator) {
        for _ in 0..self.config.scroll_steps {
            let distance = self.config.scroll_distance.sample();
            let script = format!("window.scrollBy(0, {});", distance);
            if let Err(e) = navigator.execute_script(&script).await {
                tracing::debug!("Scroll step failed: {}", e);
            }
            pause(self.config.scroll_step).await;
        }

        if let Err(e) = navigator
            .execute_script("window.scrollTo(0, document.body.scrollHeight);")
            .await
        {
            tracing::debug!("Scroll to bottom failed: {}", e);
        }
        pause(self.config.scroll_settle).await;
    }
}
