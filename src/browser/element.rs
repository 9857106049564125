//! Owned snapshots of rendered elements
//!
//! Backends hand out elements as plain data: the rendered text and the outer
//! HTML at the moment of the query. Sub-queries inside an element (a card's
//! title, its detail link) are answered locally with `scraper`, so a snapshot
//! stays valid after the page has moved on.

use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

/// Elements whose start begins a new line in rendered text
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "li", "ul", "ol", "section", "h1", "h2", "h3", "h4", "h5", "h6", "tr",
];

/// A rendered element captured from a navigator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    text: String,
    html: String,
}

impl Element {
    /// Creates a snapshot from rendered text and outer HTML
    pub fn new(text: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            html: html.into(),
        }
    }

    /// Rendered text of the element, lines separated by `\n`
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Outer HTML of the element
    pub fn html(&self) -> &str {
        &self.html
    }

    /// Returns the trimmed text of the first descendant matching `selector`
    ///
    /// Returns `None` when nothing matches or the match renders no text.
    pub fn select_text(&self, selector: &str) -> Option<String> {
        let selector = Selector::parse(selector).ok()?;
        let fragment = Html::parse_fragment(&self.html);
        let text = fragment.select(&selector).next().map(render_text)?;
        Some(text).filter(|t| !t.is_empty())
    }

    /// Returns an attribute of the first descendant matching `selector`
    pub fn select_attr(&self, selector: &str, attr: &str) -> Option<String> {
        let selector = Selector::parse(selector).ok()?;
        let fragment = Html::parse_fragment(&self.html);
        let value = fragment
            .select(&selector)
            .find_map(|node| node.value().attr(attr))
            .map(|value| value.trim().to_string());
        value.filter(|v| !v.is_empty())
    }
}

/// Renders an element's text the way a browser lays it out
///
/// Whitespace runs inside text nodes collapse to a single space; `<br>` and
/// block elements start new lines. Each line is trimmed.
pub(crate) fn render_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();

    for node in element.descendants() {
        match node.value() {
            Node::Text(text) => {
                let mut pending_space = false;
                for ch in text.chars() {
                    if ch.is_whitespace() {
                        pending_space = true;
                    } else {
                        if pending_space && !raw.is_empty() && !raw.ends_with('\n') {
                            raw.push(' ');
                        }
                        pending_space = false;
                        raw.push(ch);
                    }
                }
                if pending_space && !raw.is_empty() && !raw.ends_with('\n') {
                    raw.push(' ');
                }
            }
            Node::Element(el) if el.name() == "br" => raw.push('\n'),
            Node::Element(el) if BLOCK_ELEMENTS.contains(&el.name()) => {
                if !raw.is_empty() && !raw.ends_with('\n') {
                    raw.push('\n');
                }
            }
            _ => {}
        }
    }

    raw.lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
