//! End-to-end run: open the catalog, scrape, export, validate, close.
//!
//! The browser is owned by [`run`] and released through
//! [`Browser::close`] on every path, including a panic inside the scrape.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;

use catalog_scrape_export::{ExportSummary, write_csv};
use catalog_scrape_models::Record;
use catalog_scrape_scraper::progress::ProgressCallback;
use catalog_scrape_scraper::{Browser, ScrapeConfig, ScrapeError, StopReason, scrape_catalog};
use catalog_scrape_validate::{ValidationReport, validate};
use futures::FutureExt;
use serde::Serialize;

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    #[serde(skip)]
    pub records: Vec<Record>,
    pub record_count: usize,
    pub pages_scraped: u32,
    pub stop_reason: Option<StopReason>,
    /// Number of fields that fell back to a default.
    pub warnings: usize,
    pub export: Option<ExportSummary>,
    pub export_error: Option<String>,
    pub validation: Option<ValidationReport>,
    /// Set when the run was aborted by an error or panic.
    pub failure: Option<String>,
    pub browser_closed: bool,
}

impl RunReport {
    fn failed(message: String) -> Self {
        Self {
            records: Vec::new(),
            record_count: 0,
            pages_scraped: 0,
            stop_reason: None,
            warnings: 0,
            export: None,
            export_error: None,
            validation: None,
            failure: Some(message),
            browser_closed: false,
        }
    }

    /// True when the run completed, the export (if any) was written, and
    /// every validation rule passed.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
            && self.export_error.is_none()
            && self
                .validation
                .as_ref()
                .is_some_and(ValidationReport::is_valid)
    }
}

/// Runs the whole pipeline against `browser` and closes it afterwards.
///
/// Never returns an error: scrape failures and panics are logged and
/// recorded in the report.
pub async fn run<B: Browser>(
    mut browser: B,
    config: &ScrapeConfig,
    output: &Path,
    progress: &Arc<dyn ProgressCallback>,
) -> RunReport {
    let result = AssertUnwindSafe(execute(&mut browser, config, output, progress))
        .catch_unwind()
        .await;

    let mut report = match result {
        Ok(Ok(report)) => report,
        Ok(Err(e)) => {
            log::error!("An unexpected error occurred during the run: {e}");
            RunReport::failed(e.to_string())
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            log::error!("The run panicked: {message}");
            RunReport::failed(message)
        }
    };

    report.browser_closed = match browser.close().await {
        Ok(()) => true,
        Err(e) => {
            log::error!("Failed to close browser: {e}");
            false
        }
    };

    report
}

async fn execute<B: Browser>(
    browser: &mut B,
    config: &ScrapeConfig,
    output: &Path,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<RunReport, ScrapeError> {
    config.validate()?;

    browser.navigate(&config.start_url).await?;
    browser.maximize().await?;
    log::info!("Browser opened and navigated to {}", config.start_url);

    let settle = config.settle_delay();
    if !settle.is_zero() {
        tokio::time::sleep(settle).await;
    }

    let outcome = scrape_catalog(browser, config, progress).await?;

    let (export, export_error) = match write_csv(output, &outcome.records) {
        Ok(summary) => (summary, None),
        Err(e) => {
            log::error!("Error saving data to CSV: {e}");
            (None, Some(e.to_string()))
        }
    };

    let validation = validate(&outcome.records);
    validation.log();

    Ok(RunReport {
        record_count: outcome.records.len(),
        records: outcome.records,
        pages_scraped: outcome.pages_scraped,
        stop_reason: Some(outcome.stop_reason),
        warnings: outcome.warnings.len(),
        export,
        export_error,
        validation: Some(validation),
        failure: None,
        browser_closed: false,
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use catalog_scrape_export::read_csv;
    use catalog_scrape_scraper::BrowserError;
    use catalog_scrape_scraper::fixtures::{FIXTURE_ROOT, FixturePage, catalog_site};
    use catalog_scrape_scraper::progress::null_progress;
    use catalog_scrape_scraper::static_site::{FixturePages, SnapshotElement, StaticBrowser};

    use super::*;

    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Fault {
        None,
        Error,
        Panic,
    }

    /// Static browser that counts `close` calls and can fail lookups.
    struct TrackedBrowser {
        inner: StaticBrowser<FixturePages>,
        closes: Arc<AtomicUsize>,
        fault: Fault,
    }

    impl TrackedBrowser {
        fn new(site: FixturePages, fault: Fault) -> (Self, Arc<AtomicUsize>) {
            let closes = Arc::new(AtomicUsize::new(0));
            let browser = Self {
                inner: StaticBrowser::new(site),
                closes: Arc::clone(&closes),
                fault,
            };
            (browser, closes)
        }
    }

    impl Browser for TrackedBrowser {
        type Element = SnapshotElement;

        async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
            self.inner.navigate(url).await
        }

        async fn maximize(&mut self) -> Result<(), BrowserError> {
            self.inner.maximize().await
        }

        async fn find_all(&self, selector: &str) -> Result<Vec<SnapshotElement>, BrowserError> {
            match self.fault {
                Fault::None => self.inner.find_all(selector).await,
                Fault::Error => Err(BrowserError::NoPage),
                Fault::Panic => panic!("lookup crashed"),
            }
        }

        async fn click(&mut self, element: &SnapshotElement) -> Result<(), BrowserError> {
            self.inner.click(element).await
        }

        async fn current_location(&self) -> Result<String, BrowserError> {
            self.inner.current_location().await
        }

        async fn close(self) -> Result<(), BrowserError> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            self.inner.close().await
        }
    }

    fn config(max_pages: u32) -> ScrapeConfig {
        ScrapeConfig::new(FIXTURE_ROOT)
            .with_max_pages(max_pages)
            .with_timeouts_ms(0, 0)
            .with_settle_delay_ms(0)
    }

    fn output(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("catalog_scrape_cli_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let _ = std::fs::remove_file(&path);
        path
    }

    #[tokio::test]
    async fn five_page_run_exports_and_validates() {
        let path = output("five_pages.csv");
        let (browser, closes) = TrackedBrowser::new(catalog_site(7, 4, "Fiction"), Fault::None);

        let report = run(browser, &config(5), &path, &null_progress()).await;

        assert!(report.failure.is_none());
        assert_eq!(report.stop_reason, Some(StopReason::MaxPages));
        assert_eq!(report.pages_scraped, 5);
        assert_eq!(report.record_count, 20);
        assert_eq!(report.export.as_ref().unwrap().rows, 20);
        assert!(report.browser_closed);
        assert_eq!(closes.load(Ordering::SeqCst), 1);

        let rows = read_csv(&path).unwrap();
        assert_eq!(rows.len(), report.records.len());
        assert_eq!(rows[0].category, "Books/General");
        assert_eq!(rows[4].category, "Fiction");

        let header = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            header.lines().next(),
            Some("title,price,star_rating,availability,category")
        );

        assert!(report.succeeded());
        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn empty_first_page_writes_no_file() {
        let path = output("empty.csv");
        let site = FixturePages::new().with_page(FIXTURE_ROOT, FixturePage::default().to_html());
        let (browser, closes) = TrackedBrowser::new(site, Fault::None);

        let report = run(browser, &config(5), &path, &null_progress()).await;

        assert_eq!(report.stop_reason, Some(StopReason::NoItems));
        assert_eq!(report.record_count, 0);
        assert!(report.export.is_none());
        assert!(!path.exists());
        assert!(report.validation.as_ref().unwrap().is_valid());
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn export_failure_still_validates() {
        let path = output("no-such-dir").join("out.csv");
        let (browser, _) = TrackedBrowser::new(catalog_site(1, 2, "Fiction"), Fault::None);

        let report = run(browser, &config(1), &path, &null_progress()).await;

        assert!(report.export_error.is_some());
        assert!(report.validation.is_some());
        assert_eq!(report.record_count, 2);
        assert!(!report.succeeded());
    }

    #[tokio::test]
    async fn closes_browser_after_error() {
        let path = output("error.csv");
        let (browser, closes) = TrackedBrowser::new(catalog_site(2, 2, "Fiction"), Fault::Error);

        let report = run(browser, &config(5), &path, &null_progress()).await;

        assert!(report.failure.is_some());
        assert!(report.validation.is_none());
        assert!(!path.exists());
        assert!(report.browser_closed);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert!(!report.succeeded());
    }

    #[tokio::test]
    async fn closes_browser_after_panic() {
        let path = output("panic.csv");
        let (browser, closes) = TrackedBrowser::new(catalog_site(2, 2, "Fiction"), Fault::Panic);

        let report = run(browser, &config(5), &path, &null_progress()).await;

        assert_eq!(report.failure.as_deref(), Some("lookup crashed"));
        assert!(report.browser_closed);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalid_config_still_closes_browser() {
        let path = output("invalid.csv");
        let (browser, closes) = TrackedBrowser::new(catalog_site(1, 1, "Fiction"), Fault::None);

        let report = run(browser, &config(0), &path, &null_progress()).await;

        assert!(report.failure.unwrap().contains("max_pages"));
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }
}
