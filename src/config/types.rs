use crate::config::filters::FilterCriteria;
use crate::state::CrawlMode;
use crate::ConfigError;
use rand::Rng;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Job-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub browser: BrowserSettings,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub filters: FilterCriteria,
    #[serde(rename = "job", default)]
    pub jobs: Vec<JobEntry>,
}

/// Which navigator backend drives the crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserBackend {
    /// A real Chromium instance over CDP
    #[default]
    Chrome,
    /// Plain HTTP fetches of server-rendered HTML
    Http,
}

/// Browser configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub backend: BrowserBackend,

    /// Run Chromium without a visible window
    pub headless: bool,

    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Bound on waiting for a listing page to render (seconds)
    #[serde(rename = "page-timeout-secs")]
    pub page_timeout_secs: u64,

    /// Bound on waiting for a detail view to render (seconds)
    #[serde(rename = "detail-timeout-secs")]
    pub detail_timeout_secs: u64,
}

impl BrowserSettings {
    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn detail_timeout(&self) -> Duration {
        Duration::from_secs(self.detail_timeout_secs)
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            backend: BrowserBackend::Chrome,
            headless: false,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            page_timeout_secs: 15,
            detail_timeout_secs: 10,
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Origin of the listing source
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path of the search results page
    #[serde(rename = "listing-path")]
    pub listing_path: String,

    /// Upper bound on the page count read from pagination
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Listings the source shows per page, used for target estimates
    #[serde(rename = "listings-per-page")]
    pub listings_per_page: u32,

    /// Consecutive pages without new records before stopping
    #[serde(rename = "duplicate-threshold")]
    pub duplicate_threshold: u32,

    /// Consecutive empty pages before a page-count crawl stops
    #[serde(rename = "empty-threshold")]
    pub empty_threshold: u32,

    /// Reload attempts after a page fails verification
    #[serde(rename = "max-reloads")]
    pub max_reloads: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.zhipin.com".to_string(),
            listing_path: "/web/geek/job".to_string(),
            max_pages: 30,
            listings_per_page: 30,
            duplicate_threshold: 3,
            empty_threshold: 3,
            max_reloads: 3,
        }
    }
}

/// A `[min, max]` range sampled uniformly for jitter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "[u64; 2]")]
pub struct Jitter {
    pub min: u64,
    pub max: u64,
}

impl From<[u64; 2]> for Jitter {
    fn from([min, max]: [u64; 2]) -> Self {
        Self { min, max }
    }
}

impl Jitter {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    /// Draws a value in `min..=max`
    pub fn sample(&self) -> u64 {
        if self.min >= self.max {
            return self.min;
        }
        rand::thread_rng().gen_range(self.min..=self.max)
    }

    /// Draws a delay, treating the range as milliseconds
    pub fn sample_delay(&self) -> Duration {
        Duration::from_millis(self.sample())
    }
}

/// Human-like pacing between browser actions
///
/// Ranges are milliseconds except `scroll-distance`, which is pixels.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    #[serde(rename = "page-settle")]
    pub page_settle: Jitter,

    #[serde(rename = "reload-backoff")]
    pub reload_backoff: Jitter,

    #[serde(rename = "scroll-steps")]
    pub scroll_steps: u32,

    #[serde(rename = "scroll-distance")]
    pub scroll_distance: Jitter,

    #[serde(rename = "scroll-step")]
    pub scroll_step: Jitter,

    #[serde(rename = "scroll-settle")]
    pub scroll_settle: Jitter,

    #[serde(rename = "detail-open")]
    pub detail_open: Jitter,
}

impl PacingConfig {
    /// Pacing without any waiting, for tests and static sources
    pub fn immediate() -> Self {
        Self {
            page_settle: Jitter::new(0, 0),
            reload_backoff: Jitter::new(0, 0),
            scroll_steps: 3,
            scroll_distance: Jitter::new(300, 700),
            scroll_step: Jitter::new(0, 0),
            scroll_settle: Jitter::new(0, 0),
            detail_open: Jitter::new(0, 0),
        }
    }

    /// Every millisecond range, with its configuration key
    pub(crate) fn delay_ranges(&self) -> [(&'static str, Jitter); 5] {
        [
            ("page-settle", self.page_settle),
            ("reload-backoff", self.reload_backoff),
            ("scroll-step", self.scroll_step),
            ("scroll-settle", self.scroll_settle),
            ("detail-open", self.detail_open),
        ]
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            page_settle: Jitter::new(3000, 5000),
            reload_backoff: Jitter::new(3000, 5000),
            scroll_steps: 3,
            scroll_distance: Jitter::new(300, 700),
            scroll_step: Jitter::new(500, 1500),
            scroll_settle: Jitter::new(2000, 4000),
            detail_open: Jitter::new(1000, 2000),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory holding datasets and derived documents
    pub directory: PathBuf,

    /// Where `backup_*` files go when the directory is unwritable
    /// (defaults to the working directory)
    #[serde(rename = "fallback-directory")]
    pub fallback_directory: Option<PathBuf>,
}

impl OutputConfig {
    pub fn fallback_directory(&self) -> PathBuf {
        self.fallback_directory
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./results"),
            fallback_directory: None,
        }
    }
}

/// How a job's `count` is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobMode {
    /// Crawl the first `count` pages
    Pages,
    /// Stop once `count` records are collected
    Target,
    /// Crawl until pages run out or only duplicates remain
    All,
}

/// One search to run
#[derive(Debug, Clone, Deserialize)]
pub struct JobEntry {
    pub query: String,
    pub mode: JobMode,
    #[serde(default)]
    pub count: Option<u32>,
}

impl JobEntry {
    /// Resolves the crawl mode, requiring a positive count where one applies
    pub fn crawl_mode(&self) -> Result<CrawlMode, ConfigError> {
        let count = || match self.count {
            Some(n) if n >= 1 => Ok(n),
            _ => Err(ConfigError::Validation(format!(
                "job '{}' in mode {:?} needs count >= 1",
                self.query, self.mode
            ))),
        };

        match self.mode {
            JobMode::Pages => Ok(CrawlMode::ByPageCount(count()?)),
            JobMode::Target => Ok(CrawlMode::ByTargetCount(count()?)),
            JobMode::All => Ok(CrawlMode::ExhaustAll),
        }
    }
}
