//! Listing page fetcher
//!
//! This module handles loading listing pages through a navigator, including:
//! - Navigating to a constructed page URL
//! - Verifying the listing rendered and the expected page is shown
//! - Reading the total page count from the pagination bar
//!
//! The fetcher performs no retries itself; the coordinator owns that policy.

use crate::browser::{BrowserError, Navigator};
use crate::crawler::selectors::{CURRENT_PAGE, LISTING_CARD, PAGINATION, PAGINATION_LINKS};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Why a listing page did not load as expected
#[derive(Debug, Error)]
pub enum NavigationFailure {
    #[error("navigation failed: {0}")]
    Navigation(#[source] BrowserError),

    #[error("no listings rendered within {0:?}")]
    ListingTimeout(Duration),

    #[error("expected page {expected}, browser shows page {found}")]
    PageMismatch { expected: u32, found: u32 },

    #[error("page indicator missing or unreadable, expected page {expected}")]
    IndicatorMissing { expected: u32 },

    #[error("browser error while verifying page: {0}")]
    Browser(#[source] BrowserError),
}

/// Loads and verifies listing pages
#[derive(Debug, Clone)]
pub struct PageFetcher {
    timeout: Duration,
}

impl PageFetcher {
    /// Creates a fetcher that waits up to `timeout` for listings to render
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Navigates to `url` and verifies page `expected_page` rendered
    ///
    /// # Arguments
    ///
    /// * `navigator` - The browser to drive
    /// * `url` - The listing page URL
    /// * `expected_page` - The 1-based page number the URL asks for
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The listing is on screen and shows the right page
    /// * `Err(NavigationFailure)` - Navigation or verification failed
    pub async fn load(
        &self,
        navigator: &mut dyn Navigator,
        url: &Url,
        expected_page: u32,
    ) -> Result<(), NavigationFailure> {
        tracing::debug!(page = expected_page, url = %url, "Loading listing page");
        navigator
            .get(url.as_str())
            .await
            .map_err(NavigationFailure::Navigation)?;
        self.verify(navigator, expected_page).await
    }

    /// Reloads the current page and verifies it again
    pub async fn reload(
        &self,
        navigator: &mut dyn Navigator,
        expected_page: u32,
    ) -> Result<(), NavigationFailure> {
        navigator
            .reload()
            .await
            .map_err(NavigationFailure::Navigation)?;
        self.verify(navigator, expected_page).await
    }

    /// Checks the listing marker and the current-page indicator
    ///
    /// Single-page results carry no pagination bar, so a missing indicator
    /// is accepted for page 1 only.
    pub async fn verify(
        &self,
        navigator: &mut dyn Navigator,
        expected_page: u32,
    ) -> Result<(), NavigationFailure> {
        match navigator.wait_for_one(LISTING_CARD, self.timeout).await {
            Ok(_) => {}
            Err(BrowserError::Timeout { .. }) => {
                return Err(NavigationFailure::ListingTimeout(self.timeout))
            }
            Err(e) => return Err(NavigationFailure::Browser(e)),
        }

        let indicator = navigator
            .find_one(CURRENT_PAGE)
            .await
            .map_err(NavigationFailure::Browser)?;

        match indicator.and_then(|el| el.text().trim().parse::<u32>().ok()) {
            Some(found) if found == expected_page => Ok(()),
            Some(found) => Err(NavigationFailure::PageMismatch {
                expected: expected_page,
                found,
            }),
            None if expected_page == 1 => Ok(()),
            None => Err(NavigationFailure::IndicatorMissing {
                expected: expected_page,
            }),
        }
    }

    /// Reads the number of result pages from the pagination bar
    ///
    /// Takes the largest number among the pagination links and clamps it to
    /// `1..=cap`. Any failure yields 1.
    pub async fn total_pages(&self, navigator: &mut dyn Navigator, cap: u32) -> u32 {
        if let Err(e) = navigator.wait_for_one(PAGINATION, self.timeout).await {
            tracing::debug!("No pagination bar, assuming a single page: {}", e);
            return 1;
        }

        let links = match navigator.find_all(PAGINATION_LINKS).await {
            Ok(links) => links,
            Err(e) => {
                tracing::warn!("Failed to read pagination links: {}", e);
                return 1;
            }
        };

        let max = links
            .iter()
            .filter_map(|link| link.text().trim().parse::<u32>().ok())
            .max()
            .unwrap_or(1);

        max.clamp(1, cap.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::StaticNavigator;
    use crate::crawler::testing::{FixtureSite, LISTING_URL};

    fn create_test_fetcher() -> PageFetcher {
        PageFetcher::new(Duration::from_millis(50))
    }

    fn page_url(page: u32) -> Url {
        Url::parse(&format!("{}?query=analyst&page={}", LISTING_URL, page)).unwrap()
    }

    #[tokio::test]
    async fn test_load_verifies_page() {
        let site = FixtureSite::with_pages(3, 5);
        let mut nav = StaticNavigator::new(site);
        let fetcher = create_test_fetcher();

        assert!(fetcher.load(&mut nav, &page_url(2), 2).await.is_ok());
    }

    #[tokio::test]
    async fn test_load_detects_mismatch() {
        let site = FixtureSite::with_pages(3, 5);
        site.serve_stale(2, 1);
        let mut nav = StaticNavigator::new(site);
        let fetcher = create_test_fetcher();

        let result = fetcher.load(&mut nav, &page_url(2), 2).await;
        assert!(matches!(
            result,
            Err(NavigationFailure::PageMismatch { expected: 2, .. })
        ));

        // The stale copy is served once; a reload recovers
        assert!(fetcher.reload(&mut nav, 2).await.is_ok());
    }

    #[tokio::test]
    async fn test_load_navigation_error() {
        let site = FixtureSite::with_pages(3, 5);
        site.fail_page(2);
        let mut nav = StaticNavigator::new(site);
        let fetcher = create_test_fetcher();

        let result = fetcher.load(&mut nav, &page_url(2), 2).await;
        assert!(matches!(result, Err(NavigationFailure::Navigation(_))));
    }

    #[tokio::test]
    async fn test_missing_listing_times_out() {
        let site = FixtureSite::with_pages(3, 5);
        site.blank_page(2);
        let mut nav = StaticNavigator::new(site);
        let fetcher = create_test_fetcher();

        let result = fetcher.load(&mut nav, &page_url(2), 2).await;
        assert!(matches!(result, Err(NavigationFailure::ListingTimeout(_))));
    }

    #[tokio::test]
    async fn test_single_page_without_pagination() {
        let site = FixtureSite::with_pages(1, 3);
        site.hide_pagination();
        let mut nav = StaticNavigator::new(site);
        let fetcher = create_test_fetcher();

        assert!(fetcher.load(&mut nav, &page_url(1), 1).await.is_ok());
        assert_eq!(fetcher.total_pages(&mut nav, 30).await, 1);
    }

    #[tokio::test]
    async fn test_total_pages_read_and_capped() {
        let site = FixtureSite::with_pages(3, 2);
        let mut nav = StaticNavigator::new(site.clone());
        let fetcher = create_test_fetcher();

        fetcher.load(&mut nav, &page_url(1), 1).await.unwrap();
        assert_eq!(fetcher.total_pages(&mut nav, 30).await, 3);

        site.set_advertised_pages(45);
        nav.reload().await.unwrap();
        assert_eq!(fetcher.total_pages(&mut nav, 30).await, 30);
    }
}
