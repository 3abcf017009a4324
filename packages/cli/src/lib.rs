#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Scrape a paginated book catalog to CSV and validate the result.
//!
//! [`pipeline::run`] drives one browser session end to end. The
//! [`commands`] module wires it to a concrete backend for the binary, and
//! [`interactive`] prompts for the same options when no subcommand is
//! given.

pub mod commands;
pub mod interactive;
pub mod pipeline;

use catalog_scrape_export::ExportError;
use catalog_scrape_scraper::{BrowserError, ConfigError};

/// Errors surfaced by the command-line front end.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The browser could not be opened.
    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// The requested backend was compiled out.
    #[error("the '{0}' backend is not available in this build")]
    BackendUnavailable(&'static str),
}
