//! Browser automation seam
//!
//! The crawler never talks to a concrete browser. Everything it needs from
//! browser automation is expressed by the [`Navigator`] trait:
//! - navigating the primary context and reloading it
//! - querying rendered elements, with bounded-wait variants
//! - running scripts (used for scroll stabilization)
//! - opening and closing a single secondary context for detail views
//!
//! Two backends are provided: [`ChromeNavigator`] drives a real Chromium
//! instance over CDP, and [`StaticNavigator`] serves server-rendered HTML
//! fetched through a [`PageSource`] (plain HTTP via [`HttpSource`]).

mod chrome;
mod element;
mod static_html;

pub use chrome::ChromeNavigator;
pub use element::Element;
pub use static_html::{build_http_client, HttpNavigator, HttpSource, PageSource, StaticNavigator};

use crate::config::{BrowserBackend, BrowserSettings};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use thiserror::Error;

/// How often the bounded-wait helpers re-query the page
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Errors raised by a navigator backend
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Timed out after {timeout:?} waiting for '{selector}'")]
    Timeout { selector: String, timeout: Duration },

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Script execution failed: {0}")]
    Script(String),

    #[error("No page is loaded in the active context")]
    NoDocument,

    #[error("No secondary context is open")]
    NoSecondaryContext,

    #[error("A secondary context is already open")]
    SecondaryContextOpen,

    #[error("Browser protocol error: {0}")]
    Protocol(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type for navigator operations
pub type BrowserResult<T> = Result<T, BrowserError>;

/// The browser capability the crawler depends on
///
/// A navigator has one primary context and at most one secondary context.
/// All queries run against the context that currently has focus. Opening a
/// secondary context focuses it; closing it returns focus to the primary
/// context, and [`Navigator::switch_to_primary`] is idempotent.
#[async_trait]
pub trait Navigator: Send {
    /// Navigates the focused context to `url`
    async fn get(&mut self, url: &str) -> BrowserResult<()>;

    /// Reloads the focused context
    async fn reload(&mut self) -> BrowserResult<()>;

    /// Returns the URL of the focused context, if any page is loaded
    async fn current_url(&mut self) -> BrowserResult<Option<String>>;

    /// Returns the first element matching `selector`, if any
    async fn find_one(&mut self, selector: &str) -> BrowserResult<Option<Element>>;

    /// Returns every element matching `selector`, in document order
    async fn find_all(&mut self, selector: &str) -> BrowserResult<Vec<Element>>;

    /// Runs a script in the focused context, discarding its result
    async fn execute_script(&mut self, script: &str) -> BrowserResult<()>;

    /// Opens `url` in a new secondary context and focuses it
    async fn open_secondary(&mut self, url: &str) -> BrowserResult<()>;

    /// Closes the secondary context and returns focus to the primary one
    async fn close_secondary(&mut self) -> BrowserResult<()>;

    /// Moves focus back to the primary context
    async fn switch_to_primary(&mut self) -> BrowserResult<()>;

    /// Releases the underlying browser resource
    async fn quit(&mut self) -> BrowserResult<()> {
        Ok(())
    }

    /// Waits until `selector` matches, up to `timeout`
    async fn wait_for_one(&mut self, selector: &str, timeout: Duration) -> BrowserResult<Element> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(element) = self.find_one(selector).await? {
                return Ok(element);
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::Timeout {
                    selector: selector.to_string(),
                    timeout,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Waits until `selector` matches at least one element, up to `timeout`
    async fn wait_for_all(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> BrowserResult<Vec<Element>> {
        let deadline = Instant::now() + timeout;
        loop {
            let elements = self.find_all(selector).await?;
            if !elements.is_empty() {
                return Ok(elements);
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::Timeout {
                    selector: selector.to_string(),
                    timeout,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

/// Acquires the navigator selected by the browser settings
///
/// This is the only step of a session whose failure is fatal: it happens
/// before any page is touched.
pub async fn launch_navigator(settings: &BrowserSettings) -> BrowserResult<Box<dyn Navigator>> {
    match settings.backend {
        BrowserBackend::Chrome => {
            tracing::info!(headless = settings.headless, "Launching Chromium");
            let navigator = ChromeNavigator::launch(settings).await?;
            Ok(Box::new(navigator))
        }
        BrowserBackend::Http => {
            tracing::info!("Using static HTML navigator");
            let client = build_http_client(settings)?;
            Ok(Box::new(StaticNavigator::new(HttpSource::new(client))))
        }
    }
}
