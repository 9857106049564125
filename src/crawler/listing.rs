//! Listing card extraction
//!
//! Reads summary cards from a rendered listing page. A card yields a
//! [`JobCardSummary`] only when its title, company and detail link are all
//! readable; anything else is skipped on its own without affecting the rest
//! of the page.

use crate::browser::Element;
use crate::crawler::selectors::{CARD_COMPANY, CARD_LINK, CARD_TITLE};
use crate::state::IdentityKey;
use crate::url::resolve_link;
use url::Url;

/// A listing entry as shown on a search result page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobCardSummary {
    pub title: String,
    pub company: String,
    pub link: Url,
}

impl JobCardSummary {
    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey::new(&self.title, &self.company)
    }
}

/// Identity of a card for duplicate suppression
pub fn identity_key(card: &JobCardSummary) -> IdentityKey {
    card.identity_key()
}

/// Turns the card elements of one page into summaries
///
/// # Arguments
///
/// * `elements` - Card elements in page order
/// * `base` - URL of the listing page, used to resolve relative links
///
/// # Returns
///
/// A lazy iterator over the readable cards, in page order
pub fn extract_cards<'a>(
    elements: Vec<Element>,
    base: &'a Url,
) -> impl Iterator<Item = JobCardSummary> + 'a {
    elements
        .into_iter()
        .enumerate()
        .filter_map(move |(index, element)| read_card(index, &element, base))
}

fn read_card(index: usize, element: &Element, base: &Url) -> Option<JobCardSummary> {
    let Some(title) = element.select_text(CARD_TITLE) else {
        tracing::debug!(card = index, "Skipping card without a title");
        return None;
    };
    let Some(company) = element.select_text(CARD_COMPANY) else {
        tracing::debug!(card = index, title = %title, "Skipping card without a company");
        return None;
    };
    let link = element
        .select_attr(CARD_LINK, "href")
        .and_then(|href| resolve_link(&href, base));
    let Some(link) = link else {
        tracing::debug!(card = index, title = %title, "Skipping card without a detail link");
        return None;
    };

    Some(JobCardSummary {
        title,
        company,
        link,
    })
}
