//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small job site over HTTP and run whole
//! sessions through the static HTML navigator.

use job_harvest::config::{
    BrowserBackend, BrowserSettings, Config, CrawlerConfig, FilterCriteria, JobEntry, JobMode,
    OutputConfig, PacingConfig,
};
use job_harvest::progress::{ProgressEvent, ProgressReporter, StopHandle};
use job_harvest::storage::{CsvStore, RecordSink, BOM};
use job_harvest::{crawl, CrawlMode, CrawlPhase, StopReason};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, output: &Path, mode: JobMode, count: Option<u32>) -> Config {
    Config {
        output: OutputConfig {
            directory: output.join("results"),
            fallback_directory: Some(output.join("backup")),
        },
        browser: BrowserSettings {
            backend: BrowserBackend::Http,
            page_timeout_secs: 1,
            detail_timeout_secs: 1,
            ..Default::default()
        },
        crawler: CrawlerConfig {
            base_url: base_url.to_string(),
            ..Default::default()
        },
        pacing: PacingConfig::immediate(),
        filters: FilterCriteria::default(),
        jobs: vec![JobEntry {
            query: "Data Analyst".to_string(),
            mode,
            count,
        }],
    }
}

fn listing_page(page: u32, total: u32, cards: &[(&str, &str, &str)]) -> String {
    let mut html = String::from("<html><body><ul class=\"job-list\">");
    for (slug, title, company) in cards {
        html.push_str(&format!(
            r#"<li class="job-card-wrapper">
                 <a class="job-card-left" href="/job_detail/{}.html"><span class="job-title">{}</span></a>
                 <div class="company-name">{}</div>
               </li>"#,
            slug, title, company
        ));
    }
    html.push_str("</ul><div class=\"options-pages\">");
    for n in 1..=total {
        if n == page {
            html.push_str(&format!("<a class=\"selected\">{}</a>", n));
        } else {
            html.push_str(&format!("<a href=\"?page={}\">{}</a>", n, n));
        }
    }
    html.push_str("</div></body></html>");
    html
}

fn detail_page(title: &str, company: &str) -> String {
    format!(
        r#"<html><body>
        <div class="job-detail">
          <h1 class="name">{title}</h1><span class="salary">20-30K</span>
          <div class="tag-list"><span>1-3 years</span><span>Master</span></div>
          <div class="job-sec-text">We are hiring.<br>Responsibilities:<br>Model churn<br>Requirements:<br>Statistics</div>
        </div>
        <div class="job-tags"><span>R</span><span>SQL</span></div>
        <div class="company-info"><div class="name">{company}</div>
          <div class="tag-list"><span>Series C</span><span>500-999</span><span>Finance</span></div>
        </div>
        <div class="location-address">88 Harbour Road</div>
        <div class="interview-description">Video call</div>
        </body></html>"#
    )
}

async fn mount_listing(server: &MockServer, page: u32, body: String) {
    Mock::given(method("GET"))
        .and(path("/web/geek/job"))
        .and(query_param("page", page.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

async fn mount_detail(server: &MockServer, slug: &str, title: &str, company: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/job_detail/{}.html", slug)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(detail_page(title, company))
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

/// Two pages of two listings each
async fn create_two_page_site() -> MockServer {
    let server = MockServer::start().await;
    let page1 = [("a1", "Data Analyst", "Acme"), ("a2", "BI Analyst", "Globex")];
    let page2 = [("b1", "Data Scientist", "Initech"), ("b2", "Analytics Lead", "Umbrella")];

    mount_listing(&server, 1, listing_page(1, 2, &page1)).await;
    mount_listing(&server, 2, listing_page(2, 2, &page2)).await;
    for (slug, title, company) in page1.iter().chain(page2.iter()) {
        mount_detail(&server, slug, title, company).await;
    }
    server
}

fn collect_events() -> (Arc<dyn ProgressReporter>, mpsc::UnboundedReceiver<ProgressEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(tx), rx)
}

fn drain(mut rx: mpsc::UnboundedReceiver<ProgressEvent>) -> Vec<ProgressEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_full_crawl_writes_dataset_and_document() {
    let server = create_two_page_site().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), JobMode::All, None);
    let (reporter, rx) = collect_events();

    let outcome = crawl(&config, &config.jobs[0], reporter, StopHandle::new())
        .await
        .unwrap();

    assert_eq!(outcome.mode, CrawlMode::ExhaustAll);
    assert_eq!(outcome.stop_reason, StopReason::PagesExhausted);
    assert_eq!(outcome.total_pages, 2);
    assert_eq!(outcome.records, 4);
    assert_eq!(outcome.persisted, 4);
    assert_eq!(outcome.stored_rows, Some(4));
    assert_eq!(outcome.dataset, "Data Analyst");

    // Dataset: BOM, header, one row per record
    let bytes = std::fs::read(&outcome.dataset_path).unwrap();
    assert!(bytes.starts_with(BOM));
    let text = String::from_utf8(bytes[BOM.len()..].to_vec()).unwrap();
    assert!(text.starts_with("title,salary,company,company_size"));
    assert!(text.contains("Data Scientist,20-30K,Initech,Series C,500-999,Finance,1-3 years,Master"));

    // Derived document
    let document = std::fs::read_to_string(outcome.document_path.as_ref().unwrap()).unwrap();
    assert!(document.starts_with("# Data Analyst job listings"));
    assert!(document.contains("## Analytics Lead - Umbrella"));
    assert!(document.contains("Model churn"));
    assert!(document.contains("Video call"));

    let events = drain(rx);
    assert_eq!(events.first().unwrap().percentage, 0);
    let last = events.last().unwrap();
    assert_eq!(last.phase, CrawlPhase::Done);
    assert_eq!(last.percentage, 100);
    assert_eq!(last.records, 4);
}

#[tokio::test]
async fn test_record_fields_parsed_from_detail() {
    let server = create_two_page_site().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), JobMode::Pages, Some(1));
    let (reporter, _rx) = collect_events();

    let outcome = crawl(&config, &config.jobs[0], reporter, StopHandle::new())
        .await
        .unwrap();
    assert_eq!(outcome.pages_visited, 1);

    let store = CsvStore::open(
        config.output.directory.clone(),
        config.output.fallback_directory(),
        &outcome.dataset,
    );
    let records = store.load().unwrap();
    assert_eq!(records.len(), 2);

    let record = &records[0];
    assert_eq!(record.title, "Data Analyst");
    assert_eq!(record.company, "Acme");
    assert_eq!(record.experience, "1-3 years");
    assert_eq!(record.education, "Master");
    assert_eq!(record.industry, "Finance");
    assert_eq!(record.tags, "R SQL");
    assert!(record.benefits.is_empty());
    assert_eq!(record.work_address, "88 Harbour Road");
    assert_eq!(record.responsibilities, "Model churn");
    assert_eq!(record.requirements, "Statistics");
    assert!(record.description.starts_with("We are hiring."));
}

#[tokio::test]
async fn test_target_mode_stops_early() {
    let server = create_two_page_site().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), JobMode::Target, Some(3));
    let (reporter, _rx) = collect_events();

    let outcome = crawl(&config, &config.jobs[0], reporter, StopHandle::new())
        .await
        .unwrap();

    assert_eq!(outcome.stop_reason, StopReason::TargetReached);
    assert_eq!(outcome.records, 3);
    assert_eq!(outcome.stored_rows, Some(3));
    assert_eq!(outcome.pages_visited, 2);
}

#[tokio::test]
async fn test_broken_detail_does_not_stop_crawl() {
    let server = MockServer::start().await;
    let cards = [
        ("a1", "Data Analyst", "Acme"),
        ("a2", "BI Analyst", "Globex"),
        ("a3", "Data Engineer", "Hooli"),
    ];
    mount_listing(&server, 1, listing_page(1, 1, &cards)).await;
    mount_detail(&server, "a1", "Data Analyst", "Acme").await;
    mount_detail(&server, "a3", "Data Engineer", "Hooli").await;
    Mock::given(method("GET"))
        .and(path("/job_detail/a2.html"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), JobMode::All, None);
    let (reporter, _rx) = collect_events();

    let outcome = crawl(&config, &config.jobs[0], reporter, StopHandle::new())
        .await
        .unwrap();

    assert_eq!(outcome.records, 2);
    assert_eq!(outcome.failed_extractions, 1);
    assert_eq!(outcome.stored_rows, Some(2));
}

#[tokio::test]
async fn test_missing_page_stops_exhaust_all() {
    let server = MockServer::start().await;
    let cards = [("a1", "Data Analyst", "Acme")];
    mount_listing(&server, 1, listing_page(1, 3, &cards)).await;
    mount_detail(&server, "a1", "Data Analyst", "Acme").await;
    // Page 2 is never mounted: wiremock answers 404

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), JobMode::All, None);
    let (reporter, rx) = collect_events();

    let outcome = crawl(&config, &config.jobs[0], reporter, StopHandle::new())
        .await
        .unwrap();

    assert_eq!(outcome.stop_reason, StopReason::PageLoadFailed { page: 2 });
    assert_eq!(outcome.records, 1);
    assert_eq!(outcome.stored_rows, Some(1));

    let events = drain(rx);
    let retries = events
        .iter()
        .filter(|e| e.status.contains("retry"))
        .count();
    assert_eq!(retries, 3);
    assert_eq!(events.last().unwrap().percentage, 100);
}

#[tokio::test]
async fn test_export_regenerates_document() {
    let server = create_two_page_site().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), JobMode::All, None);
    let (reporter, _rx) = collect_events();

    let outcome = crawl(&config, &config.jobs[0], reporter, StopHandle::new())
        .await
        .unwrap();
    let document_path = outcome.document_path.unwrap();
    let original = std::fs::read_to_string(&document_path).unwrap();
    std::fs::remove_file(&document_path).unwrap();

    let store = CsvStore::open(
        config.output.directory.clone(),
        config.output.fallback_directory(),
        &outcome.dataset,
    );
    let regenerated = store.derive_document("Data Analyst").unwrap();

    assert_eq!(regenerated, document_path);
    assert_eq!(std::fs::read_to_string(&regenerated).unwrap(), original);
}
