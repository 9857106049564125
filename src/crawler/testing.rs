//! In-memory job site used by crawler tests

use crate::browser::{BrowserError, BrowserResult, PageSource};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use url::Url;

pub const BASE_URL: &str = "https://jobs.test";
pub const LISTING_PATH: &str = "/web/geek/job";
pub const LISTING_URL: &str = "https://jobs.test/web/geek/job";

#[derive(Debug, Clone)]
pub struct FixtureJob {
    pub slug: String,
    pub title: String,
    pub company: String,
}

impl FixtureJob {
    pub fn new(slug: &str, title: &str, company: &str) -> Self {
        Self {
            slug: slug.to_string(),
            title: title.to_string(),
            company: company.to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct SiteState {
    pages: Vec<Vec<FixtureJob>>,
    advertised_pages: u32,
    hide_pagination: bool,
    stale: HashMap<u32, u32>,
    failing: HashSet<u32>,
    blank: HashSet<u32>,
    broken_details: HashSet<String>,
    visits: Vec<String>,
}

/// A fake job site serving listing and detail pages
///
/// Pages past the last configured one repeat the last page, the way the real
/// site keeps returning results it already showed.
#[derive(Debug, Clone, Default)]
pub struct FixtureSite {
    state: Arc<Mutex<SiteState>>,
}

impl FixtureSite {
    /// `pages` pages of `per_page` distinct jobs each
    pub fn with_pages(pages: u32, per_page: u32) -> Self {
        let listings = (1..=pages)
            .map(|p| {
                (1..=per_page)
                    .map(|i| {
                        FixtureJob::new(
                            &format!("p{}-{}", p, i),
                            &format!("Analyst {}-{}", p, i),
                            &format!("Company {}-{}", p, i),
                        )
                    })
                    .collect()
            })
            .collect();
        Self::with_listings(listings)
    }

    pub fn with_listings(pages: Vec<Vec<FixtureJob>>) -> Self {
        let advertised_pages = pages.len().max(1) as u32;
        let state = SiteState {
            pages,
            advertised_pages,
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn set_advertised_pages(&self, pages: u32) {
        self.state.lock().unwrap().advertised_pages = pages;
    }

    pub fn hide_pagination(&self) {
        self.state.lock().unwrap().hide_pagination = true;
    }

    /// Serves `page` with a wrong page indicator for the next `times` loads
    pub fn serve_stale(&self, page: u32, times: u32) {
        self.state.lock().unwrap().stale.insert(page, times);
    }

    /// Every load of `page` fails with a server error
    pub fn fail_page(&self, page: u32) {
        self.state.lock().unwrap().failing.insert(page);
    }

    /// Every load of `page` returns a document without listings
    pub fn blank_page(&self, page: u32) {
        self.state.lock().unwrap().blank.insert(page);
    }

    pub fn break_detail(&self, slug: &str) {
        self.state
            .lock()
            .unwrap()
            .broken_details
            .insert(slug.to_string());
    }

    /// Every URL fetched so far, in order
    pub fn visits(&self) -> Vec<String> {
        self.state.lock().unwrap().visits.clone()
    }

    /// Listing pages fetched so far, by page number
    pub fn listing_visits(&self) -> Vec<u32> {
        self.visits()
            .iter()
            .filter_map(|v| Url::parse(v).ok())
            .filter(|u| u.path() == LISTING_PATH)
            .map(|u| page_param(&u))
            .collect()
    }

    pub fn detail_visits(&self) -> usize {
        self.visits()
            .iter()
            .filter(|v| v.contains("/job_detail/"))
            .count()
    }
}

fn page_param(url: &Url) -> u32 {
    url.query_pairs()
        .find(|(k, _)| k == "page")
        .and_then(|(_, v)| v.parse().ok())
        .unwrap_or(1)
}

fn server_error(url: &Url) -> BrowserError {
    BrowserError::Navigation {
        url: url.to_string(),
        message: "HTTP 503 Service Unavailable".to_string(),
    }
}

impl SiteState {
    fn listing(&mut self, url: &Url) -> BrowserResult<String> {
        let page = page_param(url);
        if self.failing.contains(&page) {
            return Err(server_error(url));
        }
        if self.blank.contains(&page) {
            return Ok("<html><body><p>Loading...</p></body></html>".to_string());
        }

        let mut indicator = page;
        if let Some(remaining) = self.stale.get_mut(&page) {
            if *remaining > 0 {
                *remaining -= 1;
                indicator = page + 100;
            }
        }

        let jobs = self
            .pages
            .get(page as usize - 1)
            .or_else(|| self.pages.last())
            .cloned()
            .unwrap_or_default();

        Ok(render_listing(
            &jobs,
            indicator,
            self.advertised_pages,
            !self.hide_pagination,
        ))
    }

    fn detail(&self, slug: &str, url: &Url) -> BrowserResult<String> {
        if self.broken_details.contains(slug) {
            return Err(server_error(url));
        }
        self.pages
            .iter()
            .flatten()
            .find(|job| job.slug == slug)
            .map(render_detail)
            .ok_or_else(|| BrowserError::Navigation {
                url: url.to_string(),
                message: "HTTP 404 Not Found".to_string(),
            })
    }
}

fn render_listing(jobs: &[FixtureJob], current: u32, advertised: u32, pagination: bool) -> String {
    let mut html = String::from("<html><body><ul class=\"job-list\">");
    for job in jobs {
        html.push_str(&format!(
            "<li class=\"job-card-wrapper\">\
               <a class=\"job-card-left\" href=\"/job_detail/{}.html\">\
                 <span class=\"job-title\">{}</span>\
               </a>\
               <div class=\"job-card-right\"><h3 class=\"company-name\"><a>{}</a></h3></div>\
             </li>",
            job.slug, job.title, job.company
        ));
    }
    html.push_str("</ul>");

    if pagination {
        html.push_str("<div class=\"options-pages\"><a>&lt;</a>");
        for n in 1..=advertised.min(10) {
            if n == current {
                html.push_str(&format!("<a class=\"selected\">{}</a>", n));
            } else {
                html.push_str(&format!("<a>{}</a>", n));
            }
        }
        if advertised > 10 {
            html.push_str(&format!("<a>...</a><a>{}</a>", advertised));
        }
        if current > advertised.min(10) {
            html.push_str(&format!("<a class=\"selected\">{}</a>", current));
        }
        html.push_str("<a>&gt;</a></div>");
    }

    html.push_str("</body></html>");
    html
}

fn render_detail(job: &FixtureJob) -> String {
    format!(
        "<html><body>\
         <div class=\"job-detail\">\
           <div class=\"info-primary\"><h1 class=\"name\">{title}</h1><span class=\"salary\">15-25K</span></div>\
           <div class=\"tag-list\"><span>3-5 years</span><span>Bachelor</span></div>\
           <div class=\"job-sec-text\">Responsibilities:<br>Build weekly reports<br>Requirements:<br>Fluent SQL</div>\
         </div>\
         <div class=\"job-tags\"><span>SQL</span><span>Python</span></div>\
         <div class=\"job-tags\"><div class=\"tag-list\"><span>Meals</span><span>Bonus</span></div></div>\
         <div class=\"company-info\"><div class=\"name\">{company}</div>\
           <div class=\"tag-list\"><span>Series B</span><span>100-499</span><span>Internet</span></div></div>\
         <div class=\"location-address\">1 Century Avenue</div>\
         </body></html>",
        title = job.title,
        company = job.company
    )
}

#[async_trait]
impl PageSource for FixtureSite {
    async fn fetch(&self, url: &Url) -> BrowserResult<String> {
        let mut state = self.state.lock().unwrap();
        state.visits.push(url.to_string());

        if url.path() == LISTING_PATH {
            return state.listing(url);
        }
        if let Some(slug) = url
            .path()
            .strip_prefix("/job_detail/")
            .and_then(|rest| rest.strip_suffix(".html"))
        {
            return state.detail(slug, url);
        }
        Err(BrowserError::Navigation {
            url: url.to_string(),
            message: "HTTP 404 Not Found".to_string(),
        })
    }
}
