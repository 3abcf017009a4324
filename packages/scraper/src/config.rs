//! Scrape configuration.
//!
//! Every value is fixed before the run starts. Defaults target
//! `http://books.toscrape.com/`; a TOML file can override any subset of
//! fields, and the CLI layers its flags on top through the `with_*`
//! builders.

use std::path::Path;
use std::time::Duration;

use catalog_scrape_models::LANDING_CATEGORY;
use scraper::Selector;
use serde::Deserialize;

use crate::wait::WaitPolicy;

/// Default landing page of the catalog.
pub const DEFAULT_START_URL: &str = "http://books.toscrape.com/";

/// Default address of a locally running WebDriver server.
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:4444";

/// Errors raised while loading or checking a [`ScrapeConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML for this schema.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A configured CSS selector does not parse.
    #[error("invalid selector for {field} ('{selector}'): {message}")]
    Selector {
        /// Name of the selector field.
        field: &'static str,
        /// The selector as written.
        selector: String,
        /// Parser diagnostic.
        message: String,
    },

    /// A value is outside its allowed range.
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        /// Name of the offending field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

/// CSS selectors locating each piece of the catalog page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Selectors {
    /// One item container per product.
    pub item: String,
    /// Link inside an item whose attribute holds the full title.
    pub title: String,
    /// Attribute of the title link holding the untruncated title.
    pub title_attribute: String,
    /// Displayed price inside an item.
    pub price: String,
    /// Rating element whose class list carries the rating word.
    pub rating: String,
    /// Stock-status element inside an item.
    pub availability: String,
    /// Entries of the breadcrumb trail.
    pub breadcrumb: String,
    /// Link inside a breadcrumb entry.
    pub breadcrumb_link: String,
    /// The "next page" control.
    pub next: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            item: "article.product_pod".to_owned(),
            title: "h3 a".to_owned(),
            title_attribute: "title".to_owned(),
            price: "p.price_color".to_owned(),
            rating: "p.star-rating".to_owned(),
            availability: "p.availability".to_owned(),
            breadcrumb: "ul.breadcrumb > li".to_owned(),
            breadcrumb_link: "a".to_owned(),
            next: "li.next > a".to_owned(),
        }
    }
}

impl Selectors {
    fn entries(&self) -> [(&'static str, &str); 8] {
        [
            ("item", &self.item),
            ("title", &self.title),
            ("price", &self.price),
            ("rating", &self.rating),
            ("availability", &self.availability),
            ("breadcrumb", &self.breadcrumb),
            ("breadcrumb_link", &self.breadcrumb_link),
            ("next", &self.next),
        ]
    }
}

/// Configuration for one scrape run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Catalog landing page. Also decides the landing-page category
    /// fallback.
    pub start_url: String,
    /// Maximum number of pages to scrape.
    pub max_pages: u32,
    /// How long to wait for item containers to appear on a page.
    pub item_timeout_ms: u64,
    /// How long to wait for the breadcrumb trail and the next control.
    pub lookup_timeout_ms: u64,
    /// Pause between probes of a bounded wait.
    pub poll_interval_ms: u64,
    /// Pause after loading a page so it can finish rendering.
    pub settle_delay_ms: u64,
    /// Currency symbol stripped from displayed prices.
    pub currency_symbol: String,
    /// Category assigned on the landing page when no breadcrumb exists.
    pub landing_category: String,
    /// Page selectors.
    pub selectors: Selectors,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            start_url: DEFAULT_START_URL.to_owned(),
            max_pages: 5,
            item_timeout_ms: 10_000,
            lookup_timeout_ms: 5_000,
            poll_interval_ms: 500,
            settle_delay_ms: 2_000,
            currency_symbol: "£".to_owned(),
            landing_category: LANDING_CATEGORY.to_owned(),
            selectors: Selectors::default(),
        }
    }
}

impl ScrapeConfig {
    /// Creates a `ScrapeConfig` for the given landing URL with default
    /// limits and selectors.
    #[must_use]
    pub fn new(url: &str) -> Self {
        Self {
            start_url: url.to_owned(),
            ..Self::default()
        }
    }

    /// Parses a config from TOML text. Missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] if the text does not match the schema.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Loads a config from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Sets the landing URL.
    #[must_use]
    pub fn with_start_url(mut self, url: &str) -> Self {
        url.clone_into(&mut self.start_url);
        self
    }

    /// Sets the maximum number of pages to scrape.
    #[must_use]
    pub const fn with_max_pages(mut self, max: u32) -> Self {
        self.max_pages = max;
        self
    }

    /// Sets the item wait and lookup wait timeouts.
    #[must_use]
    pub const fn with_timeouts_ms(mut self, item_ms: u64, lookup_ms: u64) -> Self {
        self.item_timeout_ms = item_ms;
        self.lookup_timeout_ms = lookup_ms;
        self
    }

    /// Sets the poll interval used by bounded waits.
    #[must_use]
    pub const fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Sets the pause after each page load.
    #[must_use]
    pub const fn with_settle_delay_ms(mut self, ms: u64) -> Self {
        self.settle_delay_ms = ms;
        self
    }

    /// Replaces the page selectors.
    #[must_use]
    pub fn with_selectors(mut self, selectors: Selectors) -> Self {
        self.selectors = selectors;
        self
    }

    /// Wait policy for item containers.
    #[must_use]
    pub const fn item_wait(&self) -> WaitPolicy {
        WaitPolicy::new(
            Duration::from_millis(self.item_timeout_ms),
            Duration::from_millis(self.poll_interval_ms),
        )
    }

    /// Wait policy for the breadcrumb trail and the next control.
    #[must_use]
    pub const fn lookup_wait(&self) -> WaitPolicy {
        WaitPolicy::new(
            Duration::from_millis(self.lookup_timeout_ms),
            Duration::from_millis(self.poll_interval_ms),
        )
    }

    /// Pause after each page load.
    #[must_use]
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Whether `location` is the configured landing page. A trailing `/`
    /// on either side is ignored.
    #[must_use]
    pub fn is_landing_page(&self, location: &str) -> bool {
        location.trim_end_matches('/') == self.start_url.trim_end_matches('/')
    }

    /// Checks that the config can drive a run.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an empty start URL, a zero page limit, or
    /// a selector that does not parse.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "start_url",
                message: "must not be empty".to_owned(),
            });
        }
        if self.max_pages == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_pages",
                message: "must be at least 1".to_owned(),
            });
        }
        for (field, selector) in self.selectors.entries() {
            Selector::parse(selector).map_err(|e| ConfigError::Selector {
                field,
                selector: selector.to_owned(),
                message: e.to_string(),
            })?;
        }
        Ok(())
    }
}
