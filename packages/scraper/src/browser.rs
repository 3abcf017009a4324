//! The browser capability the scraper drives.
//!
//! Lookups return every match (possibly none) instead of failing on a
//! miss, so "not found" is an ordinary value. Bounded waits are layered on
//! top in [`crate::wait`].

use std::future::Future;

/// Errors raised by a browser backend.
#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    /// The WebDriver session reported an error.
    #[cfg(feature = "webdriver")]
    #[error("WebDriver error: {0}")]
    WebDriver(#[from] thirtyfour::error::WebDriverError),

    /// Fetching a page over HTTP failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A CSS selector could not be parsed.
    #[error("invalid CSS selector '{selector}': {message}")]
    Selector {
        /// The selector as written.
        selector: String,
        /// Parser diagnostic.
        message: String,
    },

    /// A navigation target could not be resolved or loaded.
    #[error("cannot navigate to '{url}': {message}")]
    Navigation {
        /// The requested location.
        url: String,
        /// What went wrong.
        message: String,
    },

    /// A lookup was attempted before any page was loaded.
    #[error("no page is loaded")]
    NoPage,
}

/// A node on the current page, such as one catalog item container.
pub trait Element: Send + Sync + Sized {
    /// Returns every descendant matching `selector`, in document order.
    fn find_all(
        &self,
        selector: &str,
    ) -> impl Future<Output = Result<Vec<Self>, BrowserError>> + Send;

    /// Returns the first descendant matching `selector`, if any.
    fn find(
        &self,
        selector: &str,
    ) -> impl Future<Output = Result<Option<Self>, BrowserError>> + Send {
        async move { Ok(self.find_all(selector).await?.into_iter().next()) }
    }

    /// Reads an attribute. `None` when the attribute is absent.
    fn attr(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<String>, BrowserError>> + Send;

    /// Returns the element's rendered text.
    fn text(&self) -> impl Future<Output = Result<String, BrowserError>> + Send;

    /// Whether activating the element would do something (visible and
    /// enabled, or a link with a target).
    fn is_clickable(&self) -> impl Future<Output = Result<bool, BrowserError>> + Send;
}

/// An exclusively owned browser session.
///
/// The session is released by [`Browser::close`], which consumes it, so a
/// session can be closed at most once.
pub trait Browser: Send + Sync + Sized {
    /// Element handle type produced by lookups.
    type Element: Element;

    /// Loads `url` as the current page.
    fn navigate(&mut self, url: &str) -> impl Future<Output = Result<(), BrowserError>> + Send;

    /// Maximizes the browser window.
    fn maximize(&mut self) -> impl Future<Output = Result<(), BrowserError>> + Send;

    /// Returns every element on the current page matching `selector`.
    fn find_all(
        &self,
        selector: &str,
    ) -> impl Future<Output = Result<Vec<Self::Element>, BrowserError>> + Send;

    /// Activates `element` (follows a link, presses a button).
    fn click(
        &mut self,
        element: &Self::Element,
    ) -> impl Future<Output = Result<(), BrowserError>> + Send;

    /// Returns the URL of the current page.
    fn current_location(&self) -> impl Future<Output = Result<String, BrowserError>> + Send;

    /// Ends the session.
    fn close(self) -> impl Future<Output = Result<(), BrowserError>> + Send;
}
