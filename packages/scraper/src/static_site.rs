//! Snapshot-backed browser.
//!
//! [`StaticBrowser`] loads page HTML from a [`PageSource`] and answers CSS
//! lookups against the parsed document. Elements are owned snapshots of
//! their outer HTML, so they stay valid after the browser moves on.
//! Clicking an element follows its `href`, resolved against the current
//! page.
//!
//! No script runs, so this backend only suits server-rendered catalogs.

use std::collections::BTreeMap;
use std::future::Future;

use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

use crate::browser::{Browser, BrowserError, Element};

/// Supplies the HTML for a URL.
pub trait PageSource: Send + Sync {
    /// Returns the page body at `url`.
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<String, BrowserError>> + Send;
}

/// In-memory pages keyed by absolute URL.
#[derive(Debug, Clone, Default)]
pub struct FixturePages {
    pages: BTreeMap<String, String>,
}

impl FixturePages {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the page served at `url`.
    #[must_use]
    pub fn with_page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(canonical(url), html.into());
        self
    }
}

impl PageSource for FixturePages {
    async fn fetch(&self, url: &Url) -> Result<String, BrowserError> {
        self.pages
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| BrowserError::Navigation {
                url: url.to_string(),
                message: "no fixture page at this address".to_owned(),
            })
    }
}

/// Pages fetched over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPages {
    client: reqwest::Client,
}

impl HttpPages {
    /// Builds an HTTP page source with a plain client.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::Http`] if the client cannot be built.
    pub fn new() -> Result<Self, BrowserError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("catalog_scrape/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl PageSource for HttpPages {
    async fn fetch(&self, url: &Url) -> Result<String, BrowserError> {
        log::debug!("GET {url}");
        let response = self.client.get(url.clone()).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

/// A page currently loaded in a [`StaticBrowser`].
#[derive(Debug, Clone)]
struct LoadedPage {
    url: Url,
    html: String,
}

/// Browser backed by HTML snapshots from a [`PageSource`].
#[derive(Debug)]
pub struct StaticBrowser<S> {
    source: S,
    current: Option<LoadedPage>,
}

impl<S: PageSource> StaticBrowser<S> {
    /// Creates a browser with no page loaded.
    pub const fn new(source: S) -> Self {
        Self {
            source,
            current: None,
        }
    }

    fn page(&self) -> Result<&LoadedPage, BrowserError> {
        self.current.as_ref().ok_or(BrowserError::NoPage)
    }

    async fn load(&mut self, url: Url) -> Result<(), BrowserError> {
        let html = self.source.fetch(&url).await?;
        log::debug!("Loaded {url} ({} bytes)", html.len());
        self.current = Some(LoadedPage { url, html });
        Ok(())
    }
}

impl<S: PageSource> Browser for StaticBrowser<S> {
    type Element = SnapshotElement;

    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        let target = Url::parse(url).map_err(|e| BrowserError::Navigation {
            url: url.to_owned(),
            message: e.to_string(),
        })?;
        self.load(target).await
    }

    async fn maximize(&mut self) -> Result<(), BrowserError> {
        Ok(())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<SnapshotElement>, BrowserError> {
        let page = self.page()?;
        select_in_document(&page.html, selector)
    }

    async fn click(&mut self, element: &SnapshotElement) -> Result<(), BrowserError> {
        let base = self.page()?.url.clone();
        let href = element.href().ok_or_else(|| BrowserError::Navigation {
            url: base.to_string(),
            message: format!("<{}> element has no href to follow", element.tag),
        })?;
        let target = base.join(href).map_err(|e| BrowserError::Navigation {
            url: href.to_owned(),
            message: e.to_string(),
        })?;
        self.load(target).await
    }

    async fn current_location(&self) -> Result<String, BrowserError> {
        Ok(self.page()?.url.to_string())
    }

    async fn close(self) -> Result<(), BrowserError> {
        log::debug!("Static browser closed");
        Ok(())
    }
}

/// Owned snapshot of one element on a loaded page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotElement {
    tag: String,
    attributes: BTreeMap<String, String>,
    text: String,
    outer_html: String,
}

impl SnapshotElement {
    fn from_ref(element: ElementRef<'_>) -> Self {
        let value = element.value();
        Self {
            tag: value.name().to_owned(),
            attributes: value
                .attrs()
                .map(|(name, val)| (name.to_owned(), val.to_owned()))
                .collect(),
            text: normalize_whitespace(&element.text().collect::<String>()),
            outer_html: element.html(),
        }
    }

    fn href(&self) -> Option<&str> {
        self.attributes
            .get("href")
            .map(String::as_str)
            .filter(|href| !href.trim().is_empty())
    }
}

impl Element for SnapshotElement {
    async fn find_all(&self, selector: &str) -> Result<Vec<Self>, BrowserError> {
        select_in_fragment(&self.outer_html, selector)
    }

    async fn attr(&self, name: &str) -> Result<Option<String>, BrowserError> {
        Ok(self.attributes.get(name).cloned())
    }

    async fn text(&self) -> Result<String, BrowserError> {
        Ok(self.text.clone())
    }

    async fn is_clickable(&self) -> Result<bool, BrowserError> {
        Ok(self.href().is_some() && !self.attributes.contains_key("disabled"))
    }
}

fn parse_selector(selector: &str) -> Result<Selector, BrowserError> {
    Selector::parse(selector).map_err(|e| BrowserError::Selector {
        selector: selector.to_owned(),
        message: e.to_string(),
    })
}

fn select_in_document(html: &str, selector: &str) -> Result<Vec<SnapshotElement>, BrowserError> {
    let sel = parse_selector(selector)?;
    let document = Html::parse_document(html);
    Ok(document.select(&sel).map(SnapshotElement::from_ref).collect())
}

/// Selects descendants of the element serialized in `outer_html`. The
/// element itself never matches, mirroring a WebDriver element search.
fn select_in_fragment(
    outer_html: &str,
    selector: &str,
) -> Result<Vec<SnapshotElement>, BrowserError> {
    let sel = parse_selector(selector)?;
    let fragment = Html::parse_fragment(outer_html);
    let Some(top) = fragment.root_element().child_elements().next() else {
        return Ok(Vec::new());
    };
    Ok(top
        .select(&sel)
        .filter(|found| found.id() != top.id())
        .map(SnapshotElement::from_ref)
        .collect())
}

/// Collapses runs of whitespace the way a browser renders text.
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn canonical(url: &str) -> String {
    Url::parse(url).map_or_else(|_| url.to_owned(), String::from)
}
