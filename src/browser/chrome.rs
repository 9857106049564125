//! Chromium navigator over the DevTools protocol

use super::{BrowserError, BrowserResult, Element, Navigator};
use crate::config::BrowserSettings;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element as Node;
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;

impl From<CdpError> for BrowserError {
    fn from(e: CdpError) -> Self {
        BrowserError::Protocol(e.to_string())
    }
}

/// Drives a real Chromium instance
///
/// The primary context is the first tab. A secondary context is a separate
/// tab opened on demand and closed when the detail view is done.
pub struct ChromeNavigator {
    browser: Browser,
    handler: JoinHandle<()>,
    primary: Page,
    secondary: Option<Page>,
    on_secondary: bool,
}

impl ChromeNavigator {
    /// Launches Chromium according to `settings`
    pub async fn launch(settings: &BrowserSettings) -> BrowserResult<Self> {
        let mut builder = BrowserConfig::builder()
            .arg(format!("--user-agent={}", settings.user_agent))
            .window_size(1400, 900);
        if !settings.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(BrowserError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        // The handler stream must be polled for the browser to make progress
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let primary = browser.new_page("about:blank").await?;

        Ok(Self {
            browser,
            handler,
            primary,
            secondary: None,
            on_secondary: false,
        })
    }

    fn active(&self) -> &Page {
        match (&self.secondary, self.on_secondary) {
            (Some(page), true) => page,
            _ => &self.primary,
        }
    }
}

/// Copies the rendered text and markup of a node
async fn snapshot(node: &Node) -> BrowserResult<Element> {
    let text = node.inner_text().await?.unwrap_or_default();
    let html = node.outer_html().await?.unwrap_or_default();
    Ok(Element::new(text, html))
}

#[async_trait]
impl Navigator for ChromeNavigator {
    async fn get(&mut self, url: &str) -> BrowserResult<()> {
        self.active()
            .goto(url)
            .await
            .map_err(|e| BrowserError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn reload(&mut self) -> BrowserResult<()> {
        let url = self.active().url().await?.ok_or(BrowserError::NoDocument)?;
        self.get(&url).await
    }

    async fn current_url(&mut self) -> BrowserResult<Option<String>> {
        Ok(self.active().url().await?)
    }

    async fn find_one(&mut self, selector: &str) -> BrowserResult<Option<Element>> {
        // Only the first match is resolved and read
        let node = match self.active().find_element(selector).await {
            Ok(node) => node,
            Err(e) => {
                tracing::trace!(selector, error = %e, "No element");
                return Ok(None);
            }
        };
        Ok(Some(snapshot(&node).await?))
    }

    async fn find_all(&mut self, selector: &str) -> BrowserResult<Vec<Element>> {
        // A missing match surfaces as a protocol error on some Chromium builds
        let nodes = match self.active().find_elements(selector).await {
            Ok(nodes) => nodes,
            Err(e) => {
                tracing::trace!(selector, error = %e, "No elements");
                return Ok(Vec::new());
            }
        };

        let mut elements = Vec::with_capacity(nodes.len());
        for node in &nodes {
            elements.push(snapshot(node).await?);
        }
        Ok(elements)
    }

    async fn execute_script(&mut self, script: &str) -> BrowserResult<()> {
        self.active()
            .evaluate(script)
            .await
            .map_err(|e| BrowserError::Script(e.to_string()))?;
        Ok(())
    }

    async fn open_secondary(&mut self, url: &str) -> BrowserResult<()> {
        if self.secondary.is_some() {
            return Err(BrowserError::SecondaryContextOpen);
        }
        let page = self.browser.new_page(url).await?;
        self.secondary = Some(page);
        self.on_secondary = true;
        Ok(())
    }

    async fn close_secondary(&mut self) -> BrowserResult<()> {
        self.on_secondary = false;
        let page = self.secondary.take().ok_or(BrowserError::NoSecondaryContext)?;
        page.close().await?;
        Ok(())
    }

    async fn switch_to_primary(&mut self) -> BrowserResult<()> {
        self.on_secondary = false;
        Ok(())
    }

    async fn quit(&mut self) -> BrowserResult<()> {
        if let Some(page) = self.secondary.take() {
            if let Err(e) = page.close().await {
                tracing::warn!("Failed to close detail tab: {}", e);
            }
        }
        self.browser.close().await?;
        if let Err(e) = self.browser.wait().await {
            tracing::warn!("Browser process did not exit cleanly: {}", e);
        }
        self.handler.abort();
        Ok(())
    }
}
