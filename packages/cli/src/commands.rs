//! Subcommand implementations shared by the flag-driven and interactive
//! front ends.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use catalog_scrape_cli_utils::{IndicatifProgress, MultiProgress};
use catalog_scrape_export::{DEFAULT_EXPORT_FILE, read_csv};
use catalog_scrape_scraper::config::DEFAULT_WEBDRIVER_URL;
use catalog_scrape_scraper::progress::ProgressCallback;
use catalog_scrape_scraper::static_site::{HttpPages, StaticBrowser};
use catalog_scrape_scraper::ScrapeConfig;
use catalog_scrape_validate::{ValidationReport, validate};

use crate::CliError;
use crate::pipeline::{self, RunReport};

/// Which browser implementation drives the scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Backend {
    /// Fetch pages over HTTP and query parsed snapshots.
    Static,
    /// Drive a real browser through a WebDriver server.
    #[default]
    #[value(name = "webdriver")]
    WebDriver,
}

impl Backend {
    pub const ALL: &[Self] = &[Self::WebDriver, Self::Static];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::WebDriver => "WebDriver (real browser session)",
            Self::Static => "Static (HTTP snapshots, no browser)",
        }
    }
}

/// Options for one `scrape` run.
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    pub config: ScrapeConfig,
    pub output: PathBuf,
    pub backend: Backend,
    pub webdriver_url: String,
    pub headless: bool,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            config: ScrapeConfig::default(),
            output: PathBuf::from(DEFAULT_EXPORT_FILE),
            backend: Backend::default(),
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_owned(),
            headless: false,
        }
    }
}

/// Loads the scrape config from `path`, or the defaults when no file is
/// given.
///
/// # Errors
///
/// Returns [`CliError::Config`] if the file cannot be read or parsed.
pub fn load_config(path: Option<&Path>) -> Result<ScrapeConfig, CliError> {
    match path {
        Some(path) => {
            log::info!("Loading scrape config from {}", path.display());
            Ok(ScrapeConfig::from_file(path)?)
        }
        None => Ok(ScrapeConfig::default()),
    }
}

/// Opens the selected backend and runs the pipeline.
///
/// # Errors
///
/// Returns [`CliError`] if the browser cannot be opened. Failures after
/// that, including an invalid config, are recorded in the [`RunReport`].
pub async fn run_scrape(
    options: &ScrapeOptions,
    multi: &MultiProgress,
) -> Result<RunReport, CliError> {
    let progress = IndicatifProgress::pages_bar(multi, "Opening browser");

    match options.backend {
        Backend::Static => {
            let browser = StaticBrowser::new(HttpPages::new()?);
            Ok(pipeline::run(browser, &options.config, &options.output, &progress).await)
        }
        Backend::WebDriver => run_webdriver(options, &progress).await,
    }
}

#[cfg(feature = "webdriver")]
async fn run_webdriver(
    options: &ScrapeOptions,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<RunReport, CliError> {
    use catalog_scrape_scraper::webdriver::{WebDriverBrowser, WebDriverOptions};

    let browser = WebDriverBrowser::connect(&WebDriverOptions {
        server_url: options.webdriver_url.clone(),
        headless: options.headless,
        ..WebDriverOptions::default()
    })
    .await?;
    Ok(pipeline::run(browser, &options.config, &options.output, progress).await)
}

#[cfg(not(feature = "webdriver"))]
#[allow(clippy::unused_async)]
async fn run_webdriver(
    _options: &ScrapeOptions,
    _progress: &Arc<dyn ProgressCallback>,
) -> Result<RunReport, CliError> {
    Err(CliError::BackendUnavailable("webdriver"))
}

/// Validates a previously exported CSV file.
///
/// # Errors
///
/// Returns [`CliError::Export`] if the file cannot be read or is not an
/// export.
pub fn run_validate(path: &Path) -> Result<ValidationReport, CliError> {
    let rows = read_csv(path)?;
    log::info!("Read {} rows from '{}'", rows.len(), path.display());

    let report = validate(&rows);
    report.log();
    Ok(report)
}
