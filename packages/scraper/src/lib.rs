#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Browser-driven scraping of a paginated product catalog.
//!
//! The browser itself is an external capability described by the
//! [`Browser`] and [`Element`] traits. Two backends implement it: the
//! [`static_site`] backend answers CSS lookups against fetched HTML
//! snapshots, and the [`webdriver`] backend (feature `webdriver`) drives a
//! real browser session through a WebDriver server.
//!
//! On top of that capability this crate provides the bounded polling
//! [`wait`] helpers, the per-item [`extract`]or, the breadcrumb
//! [`category`] resolver, and the [`paginate`] state machine that ties them
//! together into a single [`ScrapeOutcome`].

pub mod browser;
pub mod category;
pub mod config;
pub mod extract;
pub mod paginate;
pub mod progress;
pub mod static_site;
pub mod wait;

#[cfg(feature = "webdriver")]
pub mod webdriver;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use browser::{Browser, BrowserError, Element};
pub use config::{ConfigError, ScrapeConfig, Selectors};
pub use paginate::{ScrapeOutcome, StopReason, scrape_catalog};

/// Errors that abort a scrape.
///
/// Lookup timeouts and field-level failures never surface here; they end
/// pagination or default a field instead.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// The browser capability failed.
    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    /// The scrape configuration is unusable.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}
