//! Page-by-page scrape loop.
//!
//! The loop is an explicit state machine:
//!
//! ```text
//! Loading ──items──▶ Extracting ──▶ AdvancingOrDone ──next──▶ Loading
//!    │                                    │
//!    └──no items──▶ Done ◀──limit/no next─┘
//! ```
//!
//! Records accumulate in a [`RunState`] that each stage takes by value and
//! hands back, so nothing outside the loop mutates them.

use std::sync::Arc;

use catalog_scrape_models::{DefaultReason, Record};
use serde::Serialize;
use strum_macros::{AsRefStr, Display};

use crate::browser::{Browser, BrowserError};
use crate::category::resolve_category;
use crate::config::ScrapeConfig;
use crate::extract::extract_item;
use crate::progress::ProgressCallback;
use crate::wait::{wait_for_clickable, wait_for_elements};
use crate::ScrapeError;

/// Why pagination stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StopReason {
    /// The configured page limit was reached.
    MaxPages,
    /// No clickable next control appeared within the lookup wait.
    LastPage,
    /// No item container appeared within the item wait.
    NoItems,
}

/// A field that was defaulted during extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionWarning {
    /// 1-based page number.
    pub page: u32,
    /// 1-based position of the item on its page.
    pub item: usize,
    /// Name of the defaulted field.
    pub field: &'static str,
    pub reason: DefaultReason,
}

impl std::fmt::Display for ExtractionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "item {} on page {}: {} defaulted ({})",
            self.item, self.page, self.field, self.reason
        )
    }
}

/// Accumulated state of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunState {
    /// Records in scrape order. Append-only.
    pub records: Vec<Record>,
    /// 1-based number of the page being visited.
    pub page: u32,
    /// Category of the page being visited.
    pub category: String,
    /// Number of pages whose items were extracted.
    pub pages_scraped: u32,
    pub warnings: Vec<ExtractionWarning>,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            page: 1,
            category: String::new(),
            pages_scraped: 0,
            warnings: Vec::new(),
        }
    }
}

/// Result of a completed scrape.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeOutcome {
    pub records: Vec<Record>,
    pub pages_scraped: u32,
    pub stop_reason: StopReason,
    pub warnings: Vec<ExtractionWarning>,
}

enum PageState<E> {
    Loading,
    Extracting(Vec<E>),
    AdvancingOrDone,
    Done(StopReason),
}

/// Scrapes the catalog starting from the browser's current page.
///
/// `config` must already have passed [`ScrapeConfig::validate`].
///
/// # Errors
///
/// Returns [`ScrapeError`] if the browser fails. Lookup timeouts end the
/// loop normally.
pub async fn scrape_catalog<B: Browser>(
    browser: &mut B,
    config: &ScrapeConfig,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<ScrapeOutcome, ScrapeError> {
    debug_assert!(config.validate().is_ok(), "scrape config not validated");
    progress.set_total(u64::from(config.max_pages));

    let mut state = RunState::default();
    let mut phase = PageState::Loading;

    let stop_reason = loop {
        phase = match phase {
            PageState::Loading => {
                log::info!("--- Scraping page {} ---", state.page);
                progress.set_message(format!("page {}", state.page));
                match wait_for_elements(&*browser, &config.selectors.item, config.item_wait())
                    .await?
                {
                    Some(items) => PageState::Extracting(items),
                    None => {
                        log::info!("No items found on page {}. Ending scrape.", state.page);
                        PageState::Done(StopReason::NoItems)
                    }
                }
            }
            PageState::Extracting(items) => {
                state = extract_page(&*browser, config, state, &items).await?;
                progress.inc(1);
                PageState::AdvancingOrDone
            }
            PageState::AdvancingOrDone => {
                let (next_state, next_phase) = advance(browser, config, state).await?;
                state = next_state;
                next_phase
            }
            PageState::Done(reason) => break reason,
        };
    };

    log::info!(
        "Finished scraping: {} records from {} page(s), stopped by {stop_reason}",
        state.records.len(),
        state.pages_scraped,
    );
    progress.finish(format!("{} records", state.records.len()));

    Ok(ScrapeOutcome {
        records: state.records,
        pages_scraped: state.pages_scraped,
        stop_reason,
        warnings: state.warnings,
    })
}

/// Resolves the page's category once, then extracts every item container
/// in page order.
async fn extract_page<B: Browser>(
    browser: &B,
    config: &ScrapeConfig,
    mut state: RunState,
    items: &[B::Element],
) -> Result<RunState, BrowserError> {
    log::info!("Found {} item(s) on page {}", items.len(), state.page);
    state.category = resolve_category(browser, config).await?;

    for (i, item) in items.iter().enumerate() {
        let fields = extract_item(item, config).await?;
        for (field, reason) in fields.defaults() {
            let warning = ExtractionWarning {
                page: state.page,
                item: i + 1,
                field,
                reason: reason.clone(),
            };
            log::warn!("Warning: {warning}");
            state.warnings.push(warning);
        }
        state.records.push(fields.into_record(&state.category));
    }

    state.pages_scraped += 1;
    Ok(state)
}

/// Stops at the page limit, otherwise follows the next control if one
/// becomes clickable within the lookup wait.
async fn advance<B: Browser>(
    browser: &mut B,
    config: &ScrapeConfig,
    mut state: RunState,
) -> Result<(RunState, PageState<B::Element>), BrowserError> {
    if state.page >= config.max_pages {
        log::info!(
            "Reached maximum page limit of {}. Stopping scrape.",
            config.max_pages
        );
        return Ok((state, PageState::Done(StopReason::MaxPages)));
    }

    let Some(next) =
        wait_for_clickable(&*browser, &config.selectors.next, config.lookup_wait()).await?
    else {
        log::info!("No clickable next control found. Assuming last page.");
        return Ok((state, PageState::Done(StopReason::LastPage)));
    };

    browser.click(&next).await?;
    state.page += 1;
    log::info!("Clicked next control. Navigating to page {}.", state.page);

    let settle = config.settle_delay();
    if !settle.is_zero() {
        tokio::time::sleep(settle).await;
    }

    Ok((state, PageState::Loading))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use catalog_scrape_models::{Availability, StarRating};

    use super::*;
    use crate::fixtures::{FIXTURE_ROOT, FixtureItem, FixturePage, catalog_site, page_url};
    use crate::progress::null_progress;
    use crate::static_site::{FixturePages, StaticBrowser};

    fn fast_config(max_pages: u32) -> ScrapeConfig {
        ScrapeConfig::new(FIXTURE_ROOT)
            .with_max_pages(max_pages)
            .with_timeouts_ms(0, 0)
            .with_settle_delay_ms(0)
    }

    async fn run(site: FixturePages, config: &ScrapeConfig) -> ScrapeOutcome {
        let mut browser = StaticBrowser::new(site);
        browser.navigate(FIXTURE_ROOT).await.unwrap();
        scrape_catalog(&mut browser, config, &null_progress())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn stops_at_page_limit_even_with_next_control() {
        let outcome = run(catalog_site(6, 3, "Books"), &fast_config(5)).await;

        assert_eq!(outcome.stop_reason, StopReason::MaxPages);
        assert_eq!(outcome.pages_scraped, 5);
        assert_eq!(outcome.records.len(), 15);
        assert_eq!(outcome.records[0].title, "Book 1-1");
        assert_eq!(outcome.records[14].title, "Book 5-3");
    }

    #[tokio::test]
    async fn records_follow_page_then_item_order() {
        let outcome = run(catalog_site(3, 2, "Books"), &fast_config(3)).await;
        let titles: Vec<&str> = outcome.records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(
            titles,
            ["Book 1-1", "Book 1-2", "Book 2-1", "Book 2-2", "Book 3-1", "Book 3-2"]
        );
    }

    #[tokio::test]
    async fn category_is_constant_within_each_page() {
        let outcome = run(catalog_site(3, 4, "Poetry"), &fast_config(3)).await;

        for chunk in outcome.records.chunks(4) {
            let categories: BTreeSet<&str> =
                chunk.iter().map(|r| r.category.as_str()).collect();
            assert_eq!(categories.len(), 1);
        }
        assert_eq!(outcome.records[0].category, "Books/General");
        assert_eq!(outcome.records[4].category, "Poetry");
        assert_eq!(outcome.records[8].category, "Poetry");
    }

    #[tokio::test]
    async fn empty_first_page_ends_with_no_records() {
        let site = FixturePages::new().with_page(FIXTURE_ROOT, FixturePage::default().to_html());
        let outcome = run(site, &fast_config(5)).await;

        assert_eq!(outcome.stop_reason, StopReason::NoItems);
        assert_eq!(outcome.pages_scraped, 0);
        assert!(outcome.records.is_empty());
    }

    #[tokio::test]
    async fn missing_next_control_is_last_page() {
        let last = FixturePage {
            items: vec![FixtureItem::book("Only", "£1.00", "One", "Out of stock")],
            ..FixturePage::default()
        };
        let site = FixturePages::new().with_page(FIXTURE_ROOT, last.to_html());
        let outcome = run(site, &fast_config(5)).await;

        assert_eq!(outcome.stop_reason, StopReason::LastPage);
        assert_eq!(outcome.pages_scraped, 1);
        assert_eq!(outcome.records[0].availability, Availability::OutOfStock);
    }

    #[tokio::test]
    async fn degraded_items_are_kept_and_reported() {
        let mut broken = FixtureItem::book("Broken", "free", "star-rating", "Pre-order");
        broken.rating_class = Some("star-rating".to_owned());
        let page = FixturePage {
            items: vec![
                FixtureItem::book("Fine", "£2.00", "Two", "In stock"),
                broken,
            ],
            ..FixturePage::default()
        };
        let site = FixturePages::new().with_page(FIXTURE_ROOT, page.to_html());
        let outcome = run(site, &fast_config(1)).await;

        assert_eq!(outcome.records.len(), 2);
        let record = &outcome.records[1];
        assert!(record.price.abs() < f64::EPSILON);
        assert_eq!(record.star_rating, StarRating::Unknown);
        assert_eq!(record.availability, Availability::Other("Pre-order".to_owned()));

        let fields: Vec<&str> = outcome.warnings.iter().map(|w| w.field).collect();
        assert_eq!(fields, ["price", "star_rating"]);
        assert!(outcome.warnings.iter().all(|w| w.page == 1 && w.item == 2));
    }

    #[tokio::test]
    async fn next_link_to_missing_page_is_an_error() {
        let site = catalog_site(2, 1, "Books");
        let mut browser = StaticBrowser::new(site);
        browser.navigate(FIXTURE_ROOT).await.unwrap();
        let err = scrape_catalog(&mut browser, &fast_config(3), &null_progress())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::Browser(BrowserError::Navigation { .. })
        ));
        assert_eq!(
            browser.current_location().await.unwrap(),
            page_url(2)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn settles_after_each_click() {
        let config = ScrapeConfig::new(FIXTURE_ROOT)
            .with_max_pages(3)
            .with_timeouts_ms(0, 0);
        let start = tokio::time::Instant::now();
        let outcome = run(catalog_site(3, 1, "Books"), &config).await;
        assert_eq!(outcome.pages_scraped, 3);
        assert_eq!(start.elapsed(), std::time::Duration::from_secs(4));
    }
}
