use crate::config::types::{BrowserSettings, Config, CrawlerConfig, JobEntry, PacingConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_browser_settings(&config.browser)?;
    validate_crawler_config(&config.crawler)?;
    validate_pacing_config(&config.pacing)?;
    validate_output_config(&config.output)?;
    validate_jobs(&config.jobs)?;
    Ok(())
}

/// Validates browser settings
fn validate_browser_settings(settings: &BrowserSettings) -> Result<(), ConfigError> {
    if settings.page_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "page-timeout-secs must be >= 1, got {}",
            settings.page_timeout_secs
        )));
    }

    if settings.detail_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "detail-timeout-secs must be >= 1, got {}",
            settings.detail_timeout_secs
        )));
    }

    if settings.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    if !config.listing_path.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "listing-path must start with '/', got '{}'",
            config.listing_path
        )));
    }

    if config.max_pages < 1 || config.max_pages > 100 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be between 1 and 100, got {}",
            config.max_pages
        )));
    }

    for (name, value) in [
        ("listings-per-page", config.listings_per_page),
        ("duplicate-threshold", config.duplicate_threshold),
        ("empty-threshold", config.empty_threshold),
    ] {
        if value < 1 {
            return Err(ConfigError::Validation(format!(
                "{} must be >= 1, got {}",
                name, value
            )));
        }
    }

    Ok(())
}

/// Validates pacing ranges
fn validate_pacing_config(config: &PacingConfig) -> Result<(), ConfigError> {
    let ranges = config
        .delay_ranges()
        .into_iter()
        .chain([("scroll-distance", config.scroll_distance)]);

    for (name, range) in ranges {
        if range.min > range.max {
            return Err(ConfigError::Validation(format!(
                "{} range is inverted: [{}, {}]",
                name, range.min, range.max
            )));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &crate::config::types::OutputConfig) -> Result<(), ConfigError> {
    if config.directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the job queue
fn validate_jobs(jobs: &[JobEntry]) -> Result<(), ConfigError> {
    if jobs.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[job]] is required".to_string(),
        ));
    }

    for job in jobs {
        if job.query.trim().is_empty() {
            return Err(ConfigError::Validation(
                "job query cannot be empty".to_string(),
            ));
        }
        job.crawl_mode()?;
    }

    Ok(())
}
