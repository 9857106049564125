//! Detail view extraction
//!
//! Opens a card's detail page in the navigator's secondary context and reads
//! the full record. Each field is read on its own and degrades to an empty
//! string; only a detail view that cannot be opened or never renders fails
//! the extraction. Focus always returns to the listing page.

use crate::browser::{BrowserError, Navigator};
use crate::config::Jitter;
use crate::crawler::listing::JobCardSummary;
use crate::crawler::pacing::pause;
use crate::crawler::selectors::{
    BENEFIT_TAGS, COMPANY_TAGS, DESCRIPTION, DETAIL_COMPANY, DETAIL_ROOT, DETAIL_SALARY,
    DETAIL_TITLE, INTERVIEW_ADDRESS, JOB_TAGS, REQUIREMENT_TAGS, WORK_ADDRESS,
};
use crate::storage::JobRecord;
use std::time::Duration;
use thiserror::Error;

const RESPONSIBILITY_HEADINGS: &[&str] = &["岗位职责", "工作职责", "Responsibilities"];
const REQUIREMENT_HEADINGS: &[&str] = &["任职要求", "职位要求", "Requirements"];

/// A detail view that yielded no record
#[derive(Debug, Error)]
pub enum ExtractionFailure {
    #[error("could not open detail view {url}: {source}")]
    Open {
        url: String,
        #[source]
        source: BrowserError,
    },

    #[error("detail view {url} did not render: {source}")]
    NotRendered {
        url: String,
        #[source]
        source: BrowserError,
    },
}

/// Extracts the full record behind a listing card
///
/// # Arguments
///
/// * `navigator` - The browser; its primary context shows the listing page
/// * `card` - The card whose detail link is opened
/// * `timeout` - How long to wait for the detail view to render
/// * `settle` - Pause after opening the view, before reading it
///
/// # Returns
///
/// * `Ok(JobRecord)` - The record, with unreadable fields left empty
/// * `Err(ExtractionFailure)` - The detail view could not be used at all
pub async fn extract_detail(
    navigator: &mut dyn Navigator,
    card: &JobCardSummary,
    timeout: Duration,
    settle: Jitter,
) -> Result<JobRecord, ExtractionFailure> {
    let result = open_and_read(navigator, card, timeout, settle).await;
    restore_primary(navigator).await;
    result
}

async fn open_and_read(
    navigator: &mut dyn Navigator,
    card: &JobCardSummary,
    timeout: Duration,
    settle: Jitter,
) -> Result<JobRecord, ExtractionFailure> {
    let url = card.link.to_string();

    navigator
        .open_secondary(&url)
        .await
        .map_err(|source| ExtractionFailure::Open {
            url: url.clone(),
            source,
        })?;

    pause(settle).await;

    navigator
        .wait_for_one(DETAIL_ROOT, timeout)
        .await
        .map_err(|source| ExtractionFailure::NotRendered { url, source })?;

    Ok(read_record(navigator).await)
}

/// Closes the secondary context and refocuses the listing page
async fn restore_primary(navigator: &mut dyn Navigator) {
    if let Err(e) = navigator.close_secondary().await {
        tracing::debug!("Closing detail view: {}", e);
    }
    if let Err(e) = navigator.switch_to_primary().await {
        tracing::warn!("Failed to refocus listing page: {}", e);
    }
}

async fn read_record(navigator: &mut dyn Navigator) -> JobRecord {
    let mut record = JobRecord {
        title: read_text(navigator, DETAIL_TITLE).await,
        salary: read_text(navigator, DETAIL_SALARY).await,
        company: read_text(navigator, DETAIL_COMPANY).await,
        ..Default::default()
    };

    let company_tags = read_texts(navigator, COMPANY_TAGS).await;
    if let [size, funding, industry, ..] = company_tags.as_slice() {
        record.company_size = size.clone();
        record.funding_stage = funding.clone();
        record.industry = industry.clone();
    }

    let requirement_tags = read_texts(navigator, REQUIREMENT_TAGS).await;
    if let [experience, education, ..] = requirement_tags.as_slice() {
        record.experience = experience.clone();
        record.education = education.clone();
    }

    record.tags = read_texts(navigator, JOB_TAGS).await.join(" ");
    record.work_address = read_text(navigator, WORK_ADDRESS).await;

    record.description = read_text(navigator, DESCRIPTION).await;
    let (responsibilities, requirements) = split_description(&record.description);
    record.responsibilities = responsibilities;
    record.requirements = requirements;

    record.benefits = read_texts(navigator, BENEFIT_TAGS).await.join(" ");
    record.interview_address = read_text(navigator, INTERVIEW_ADDRESS).await;

    record
}

/// Reads one field; any failure yields an empty string
async fn read_text(navigator: &mut dyn Navigator, selector: &str) -> String {
    match navigator.find_one(selector).await {
        Ok(Some(element)) => element.text().trim().to_string(),
        Ok(None) => String::new(),
        Err(e) => {
            tracing::debug!(selector, "Field read failed: {}", e);
            String::new()
        }
    }
}

/// Reads a list field, dropping blank entries
async fn read_texts(navigator: &mut dyn Navigator, selector: &str) -> Vec<String> {
    match navigator.find_all(selector).await {
        Ok(elements) => elements
            .iter()
            .map(|el| el.text().trim().to_string())
            .filter(|text| !text.is_empty())
            .collect(),
        Err(e) => {
            tracing::debug!(selector, "Field read failed: {}", e);
            Vec::new()
        }
    }
}

fn contains_any(line: &str, tokens: &[&str]) -> bool {
    tokens.iter().any(|token| line.contains(token))
}

/// Splits a description into its responsibilities and requirements sections
///
/// The first line mentioning each heading opens that section; a section runs
/// until the other heading line or the end of the text. Lines before the
/// first heading belong to neither.
pub fn split_description(text: &str) -> (String, String) {
    let lines: Vec<&str> = text.lines().collect();
    let responsibilities = lines
        .iter()
        .position(|line| contains_any(line, RESPONSIBILITY_HEADINGS));
    let requirements = lines
        .iter()
        .position(|line| contains_any(line, REQUIREMENT_HEADINGS));

    let section = |heading: Option<usize>| -> String {
        let Some(start) = heading else {
            return String::new();
        };
        let end = [responsibilities, requirements]
            .into_iter()
            .flatten()
            .filter(|&h| h > start)
            .min()
            .unwrap_or(lines.len());
        lines[start + 1..end].join("\n")
    };

    (section(responsibilities), section(requirements))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::StaticNavigator;
    use crate::crawler::testing::{FixtureSite, BASE_URL, LISTING_URL};
    use url::Url;

    fn card(slug: &str, title: &str, company: &str) -> JobCardSummary {
        JobCardSummary {
            title: title.to_string(),
            company: company.to_string(),
            link: Url::parse(&format!("{}/job_detail/{}.html", BASE_URL, slug)).unwrap(),
        }
    }

    async fn create_test_navigator(site: FixtureSite) -> StaticNavigator<FixtureSite> {
        let mut nav = StaticNavigator::new(site);
        nav.get(&format!("{}?query=analyst&page=1", LISTING_URL))
            .await
            .unwrap();
        nav
    }

    #[test]
    fn test_split_both_sections() {
        let text = "About us\nResponsibilities:\nBuild reports\nOwn dashboards\nRequirements:\nSQL\nPython";
        let (resp, req) = split_description(text);
        assert_eq!(resp, "Build reports\nOwn dashboards");
        assert_eq!(req, "SQL\nPython");
    }

    #[test]
    fn test_split_requirements_first() {
        let text = "任职要求：\n本科以上\n岗位职责：\n数据分析";
        let (resp, req) = split_description(text);
        assert_eq!(resp, "数据分析");
        assert_eq!(req, "本科以上");
    }

    #[test]
    fn test_split_without_headings() {
        let (resp, req) = split_description("Just a paragraph\nof prose");
        assert!(resp.is_empty());
        assert!(req.is_empty());
    }

    #[test]
    fn test_split_only_one_heading() {
        let (resp, req) = split_description("工作职责\n负责报表\n维护看板");
        assert_eq!(resp, "负责报表\n维护看板");
        assert!(req.is_empty());
    }

    #[tokio::test]
    async fn test_extract_full_record() {
        let site = FixtureSite::with_pages(1, 2);
        let mut nav = create_test_navigator(site).await;

        let record = extract_detail(
            &mut nav,
            &card("p1-1", "Analyst 1-1", "Company 1-1"),
            Duration::from_millis(50),
            Jitter::new(0, 0),
        )
        .await
        .unwrap();

        assert_eq!(record.title, "Analyst 1-1");
        assert_eq!(record.salary, "15-25K");
        assert_eq!(record.company, "Company 1-1");
        assert_eq!(record.company_size, "Series B");
        assert_eq!(record.funding_stage, "100-499");
        assert_eq!(record.industry, "Internet");
        assert_eq!(record.experience, "3-5 years");
        assert_eq!(record.education, "Bachelor");
        assert!(record.tags.starts_with("SQL Python"));
        assert_eq!(record.benefits, "Meals Bonus");
        assert_eq!(record.work_address, "1 Century Avenue");
        assert_eq!(record.responsibilities, "Build weekly reports");
        assert_eq!(record.requirements, "Fluent SQL");
        assert!(record.interview_address.is_empty());

        // Focus is back on the listing page
        assert_eq!(nav.find_all(".job-card-wrapper").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_open_restores_focus() {
        let site = FixtureSite::with_pages(1, 2);
        site.break_detail("p1-1");
        let mut nav = create_test_navigator(site).await;

        let result = extract_detail(
            &mut nav,
            &card("p1-1", "Analyst 1-1", "Company 1-1"),
            Duration::from_millis(50),
            Jitter::new(0, 0),
        )
        .await;

        assert!(matches!(result, Err(ExtractionFailure::Open { .. })));
        assert_eq!(nav.find_all(".job-card-wrapper").await.unwrap().len(), 2);

        // The secondary context is free for the next card
        let next = extract_detail(
            &mut nav,
            &card("p1-2", "Analyst 1-2", "Company 1-2"),
            Duration::from_millis(50),
            Jitter::new(0, 0),
        )
        .await;
        assert!(next.is_ok());
    }

    #[tokio::test]
    async fn test_unrendered_detail_is_a_failure() {
        let site = FixtureSite::with_pages(1, 2);
        let mut nav = create_test_navigator(site).await;

        // The listing page itself has no detail marker
        let result = extract_detail(
            &mut nav,
            &JobCardSummary {
                title: "Analyst".to_string(),
                company: "Acme".to_string(),
                link: Url::parse(&format!("{}?query=analyst&page=1", LISTING_URL)).unwrap(),
            },
            Duration::from_millis(10),
            Jitter::new(0, 0),
        )
        .await;

        assert!(matches!(result, Err(ExtractionFailure::NotRendered { .. })));
        assert!(nav.find_one(".job-detail").await.unwrap().is_none());
    }
}
