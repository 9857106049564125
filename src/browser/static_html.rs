//! Static HTML navigator
//!
//! Serves server-rendered documents fetched through a [`PageSource`]. There
//! is no script engine: `execute_script` is a no-op, and what the source
//! returns is what the crawler sees.

use super::element::{render_text, Element};
use super::{BrowserError, BrowserResult, Navigator};
use crate::config::BrowserSettings;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use url::Url;

/// Something that can produce the HTML of a URL
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetches the document at `url`
    async fn fetch(&self, url: &Url) -> BrowserResult<String>;
}

/// Builds the HTTP client used by [`HttpSource`]
///
/// # Arguments
///
/// * `settings` - Browser settings (user agent and page timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(BrowserError::Http)` - Failed to build client
pub fn build_http_client(settings: &BrowserSettings) -> BrowserResult<Client> {
    let client = Client::builder()
        .user_agent(settings.user_agent.as_str())
        .timeout(Duration::from_secs(settings.page_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()?;
    Ok(client)
}

/// Fetches documents over plain HTTP
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageSource for HttpSource {
    async fn fetch(&self, url: &Url) -> BrowserResult<String> {
        let response = self.client.get(url.as_str()).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(BrowserError::Navigation {
                url: url.to_string(),
                message: format!("HTTP {}", status),
            });
        }

        Ok(response.text().await?)
    }
}

/// A navigator over static HTML served by plain HTTP
pub type HttpNavigator = StaticNavigator<HttpSource>;

#[derive(Debug, Clone)]
struct Document {
    url: Url,
    html: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Primary,
    Secondary,
}

/// Navigator that keeps the fetched documents in memory
///
/// A failed fetch still moves the context to the requested URL with an empty
/// document, the way a browser lands on an error page. Reloading retries it.
pub struct StaticNavigator<S> {
    source: S,
    primary: Option<Document>,
    secondary: Option<Document>,
    focus: Focus,
}

impl<S: PageSource> StaticNavigator<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            primary: None,
            secondary: None,
            focus: Focus::Primary,
        }
    }

    fn active(&self) -> Option<&Document> {
        match self.focus {
            Focus::Primary => self.primary.as_ref(),
            Focus::Secondary => self.secondary.as_ref(),
        }
    }

    fn active_slot(&mut self) -> &mut Option<Document> {
        match self.focus {
            Focus::Primary => &mut self.primary,
            Focus::Secondary => &mut self.secondary,
        }
    }

    /// Fetches `url` and stores the result in the focused context
    async fn load_into_active(&mut self, url: Url) -> BrowserResult<()> {
        let fetched = self.source.fetch(&url).await;
        let (html, result) = match fetched {
            Ok(html) => (html, Ok(())),
            Err(e) => (String::new(), Err(e)),
        };
        *self.active_slot() = Some(Document { url, html });
        result
    }

    fn query(&self, selector: &str) -> BrowserResult<Vec<Element>> {
        let document = self.active().ok_or(BrowserError::NoDocument)?;
        select_elements(&document.html, selector)
    }
}

fn parse_url(url: &str) -> BrowserResult<Url> {
    Url::parse(url).map_err(|e| BrowserError::Navigation {
        url: url.to_string(),
        message: e.to_string(),
    })
}

/// Runs a CSS query over a document and snapshots the matches
///
/// Kept synchronous so the parsed tree never lives across an await point.
fn select_elements(html: &str, selector: &str) -> BrowserResult<Vec<Element>> {
    let parsed =
        Selector::parse(selector).map_err(|_| BrowserError::InvalidSelector(selector.to_string()))?;
    let document = Html::parse_document(html);

    Ok(document
        .select(&parsed)
        .map(|node| Element::new(render_text(node), node.html()))
        .collect())
}

#[async_trait]
impl<S: PageSource> Navigator for StaticNavigator<S> {
    async fn get(&mut self, url: &str) -> BrowserResult<()> {
        let url = parse_url(url)?;
        tracing::trace!(url = %url, "Fetching document");
        self.load_into_active(url).await
    }

    async fn reload(&mut self) -> BrowserResult<()> {
        let url = self
            .active()
            .map(|doc| doc.url.clone())
            .ok_or(BrowserError::NoDocument)?;
        tracing::trace!(url = %url, "Reloading document");
        self.load_into_active(url).await
    }

    async fn current_url(&mut self) -> BrowserResult<Option<String>> {
        Ok(self.active().map(|doc| doc.url.to_string()))
    }

    async fn find_one(&mut self, selector: &str) -> BrowserResult<Option<Element>> {
        Ok(self.query(selector)?.into_iter().next())
    }

    async fn find_all(&mut self, selector: &str) -> BrowserResult<Vec<Element>> {
        self.query(selector)
    }

    async fn execute_script(&mut self, script: &str) -> BrowserResult<()> {
        tracing::trace!(script, "Ignoring script on static document");
        Ok(())
    }

    async fn open_secondary(&mut self, url: &str) -> BrowserResult<()> {
        if self.secondary.is_some() {
            return Err(BrowserError::SecondaryContextOpen);
        }
        let url = parse_url(url)?;
        self.focus = Focus::Secondary;
        self.load_into_active(url).await
    }

    async fn close_secondary(&mut self) -> BrowserResult<()> {
        self.focus = Focus::Primary;
        match self.secondary.take() {
            Some(_) => Ok(()),
            None => Err(BrowserError::NoSecondaryContext),
        }
    }

    async fn switch_to_primary(&mut self) -> BrowserResult<()> {
        self.focus = Focus::Primary;
        Ok(())
    }
}
