//! Category lookup from the page's breadcrumb trail.

use catalog_scrape_models::NOT_AVAILABLE;

use crate::browser::{Browser, BrowserError, Element};
use crate::config::ScrapeConfig;
use crate::wait::poll_until;

/// Resolves the category label for the current page.
///
/// Waits for the second-to-last breadcrumb entry to carry a link and reads
/// its text. Without a usable trail the landing page falls back to the configured landing
/// category and any other page to `N/A`.
///
/// # Errors
///
/// Returns [`BrowserError`] if the backend fails; a missing trail is not
/// an error.
pub async fn resolve_category<B: Browser>(
    browser: &B,
    config: &ScrapeConfig,
) -> Result<String, BrowserError> {
    let selectors = &config.selectors;

    let found = poll_until(config.lookup_wait(), move || async move {
        let trail = browser.find_all(&selectors.breadcrumb).await?;
        trail_label(&trail, &selectors.breadcrumb_link).await
    })
    .await?;

    if let Some(label) = found {
        log::info!("Detected category for current page: '{label}'");
        return Ok(label);
    }

    let location = browser.current_location().await?;
    let fallback = if config.is_landing_page(&location) {
        config.landing_category.clone()
    } else {
        NOT_AVAILABLE.to_owned()
    };
    log::debug!("No breadcrumb category at {location}, using '{fallback}'");
    Ok(fallback)
}

/// Link text of the entry just before the last one, trimmed.
async fn trail_label<E: Element>(trail: &[E], link_selector: &str) -> Result<Option<String>, BrowserError> {
    let Some(entry) = trail.len().checked_sub(2).and_then(|i| trail.get(i)) else {
        return Ok(None);
    };
    match entry.find(link_selector).await? {
        Some(link) => Ok(Some(link.text().await?.trim().to_owned())),
        None => Ok(None),
    }
}
