//! URL handling module for Job-Harvest
//!
//! This module provides:
//! - Construction of listing-page URLs from a query, filters and page number
//! - Resolution of detail links found on listing cards

use crate::config::{CrawlerConfig, FilterCriteria};
use crate::{UrlError, UrlResult};
use url::Url;

/// A search against the listing source, ready to produce page URLs
#[derive(Debug, Clone)]
pub struct SearchTarget {
    endpoint: Url,
    query: String,
    filters: FilterCriteria,
}

impl SearchTarget {
    /// Creates a search target for `query`
    ///
    /// # Arguments
    ///
    /// * `crawler` - Supplies the base URL and the listing path
    /// * `query` - The search keywords
    /// * `filters` - Search refinements appended to every page URL
    ///
    /// # Returns
    ///
    /// * `Ok(SearchTarget)` - The endpoint resolved and uses http(s)
    /// * `Err(UrlError)` - The base URL is unusable
    pub fn new(crawler: &CrawlerConfig, query: &str, filters: &FilterCriteria) -> UrlResult<Self> {
        let base = Url::parse(&crawler.base_url).map_err(|e| UrlError::Parse(e.to_string()))?;
        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(UrlError::InvalidScheme(base.scheme().to_string()));
        }
        let endpoint = base
            .join(&crawler.listing_path)
            .map_err(|e| UrlError::Parse(e.to_string()))?;

        Ok(Self {
            endpoint,
            query: query.trim().to_string(),
            filters: filters.clone(),
        })
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Builds the URL of listing page `page` (1-based)
    ///
    /// Parameter order is query, filters, then page.
    pub fn page_url(&self, page: u32) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.clear();
            pairs.append_pair("query", &self.query);
            for (name, value) in self.filters.query_params() {
                pairs.append_pair(name, &value);
            }
            pairs.append_pair("page", &page.to_string());
        }
        url
    }
}

/// Resolves a card's link to an absolute http(s) URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only or empty links
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            Some(absolute)
        }
        _ => None,
    }
}
