//! WebDriver-backed browser using `thirtyfour`.
//!
//! Connects to an already running WebDriver server (geckodriver by
//! default). Starting the driver binary is left to the caller.

use thirtyfour::prelude::*;

use crate::browser::{Browser, BrowserError, Element};
use crate::config::DEFAULT_WEBDRIVER_URL;

/// Options for a new WebDriver session.
#[derive(Debug, Clone)]
pub struct WebDriverOptions {
    /// Address of the WebDriver server.
    pub server_url: String,
    /// Run Firefox without a visible window.
    pub headless: bool,
    /// Initial window size, applied before maximizing.
    pub window_size: (u32, u32),
}

impl Default for WebDriverOptions {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_WEBDRIVER_URL.to_owned(),
            headless: false,
            window_size: (1920, 1080),
        }
    }
}

/// A Firefox session driven over the WebDriver protocol.
pub struct WebDriverBrowser {
    driver: WebDriver,
}

impl WebDriverBrowser {
    /// Opens a new Firefox session on the configured WebDriver server.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::WebDriver`] if the session cannot be created.
    pub async fn connect(options: &WebDriverOptions) -> Result<Self, BrowserError> {
        let mut caps = DesiredCapabilities::firefox();
        if options.headless {
            caps.set_headless()?;
        }

        log::info!("Opening Firefox session via {}", options.server_url);
        let driver = WebDriver::new(&options.server_url, caps).await?;

        let (width, height) = options.window_size;
        driver
            .set_window_rect(0, 0, width, height)
            .await?;

        Ok(Self { driver })
    }
}

impl Browser for WebDriverBrowser {
    type Element = WebElement;

    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.driver.goto(url).await?;
        Ok(())
    }

    async fn maximize(&mut self) -> Result<(), BrowserError> {
        self.driver.maximize_window().await?;
        Ok(())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<WebElement>, BrowserError> {
        Ok(self.driver.find_all(By::Css(selector)).await?)
    }

    async fn click(&mut self, element: &WebElement) -> Result<(), BrowserError> {
        element.click().await?;
        Ok(())
    }

    async fn current_location(&self) -> Result<String, BrowserError> {
        Ok(self.driver.current_url().await?.to_string())
    }

    async fn close(self) -> Result<(), BrowserError> {
        self.driver.quit().await?;
        log::info!("Browser session closed");
        Ok(())
    }
}

impl Element for WebElement {
    async fn find_all(&self, selector: &str) -> Result<Vec<Self>, BrowserError> {
        Ok(Self::find_all(self, By::Css(selector)).await?)
    }

    async fn attr(&self, name: &str) -> Result<Option<String>, BrowserError> {
        Ok(Self::attr(self, name).await?)
    }

    async fn text(&self) -> Result<String, BrowserError> {
        Ok(Self::text(self).await?)
    }

    async fn is_clickable(&self) -> Result<bool, BrowserError> {
        Ok(Self::is_clickable(self).await?)
    }
}
