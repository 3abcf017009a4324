//! Interactive mode, used when the binary runs without a subcommand.

use std::path::PathBuf;

use catalog_scrape_cli_utils::MultiProgress;
use catalog_scrape_export::DEFAULT_EXPORT_FILE;
use dialoguer::{Confirm, Input, Select};

use crate::commands::{self, Backend, ScrapeOptions};

enum Action {
    Scrape,
    Validate,
}

impl Action {
    const ALL: &[Self] = &[Self::Scrape, Self::Validate];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Scrape => "Scrape catalog to CSV",
            Self::Validate => "Validate an existing CSV export",
        }
    }
}

/// Prompts for an action and its options, then runs it.
///
/// Returns whether the run passed validation.
///
/// # Errors
///
/// Returns an error if a prompt fails or the chosen action cannot start.
pub async fn run(multi: &MultiProgress) -> Result<bool, Box<dyn std::error::Error>> {
    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Action::ALL[idx] {
        Action::Scrape => scrape(multi).await,
        Action::Validate => validate(),
    }
}

async fn scrape(multi: &MultiProgress) -> Result<bool, Box<dyn std::error::Error>> {
    let mut options = ScrapeOptions::default();

    options.config.start_url = Input::new()
        .with_prompt("Catalog URL")
        .default(options.config.start_url.clone())
        .interact_text()?;

    let max_pages_str: String = Input::new()
        .with_prompt("Maximum pages")
        .default(options.config.max_pages.to_string())
        .interact_text()?;
    options.config.max_pages = max_pages_str.parse().unwrap_or(options.config.max_pages);

    let output: String = Input::new()
        .with_prompt("Output CSV file")
        .default(DEFAULT_EXPORT_FILE.to_string())
        .interact_text()?;
    options.output = PathBuf::from(output);

    let backend_labels: Vec<&str> = Backend::ALL.iter().map(|b| b.label()).collect();
    let backend_idx = Select::new()
        .with_prompt("Browser backend")
        .items(&backend_labels)
        .default(0)
        .interact()?;
    options.backend = Backend::ALL[backend_idx];

    if options.backend == Backend::WebDriver {
        options.webdriver_url = Input::new()
            .with_prompt("WebDriver server URL")
            .default(options.webdriver_url.clone())
            .interact_text()?;
        options.headless = Confirm::new()
            .with_prompt("Run headless?")
            .default(false)
            .interact()?;
    }

    let report = commands::run_scrape(&options, multi).await?;
    Ok(report.succeeded())
}

fn validate() -> Result<bool, Box<dyn std::error::Error>> {
    let path: String = Input::new()
        .with_prompt("CSV file to validate")
        .default(DEFAULT_EXPORT_FILE.to_string())
        .interact_text()?;

    let report = commands::run_validate(&PathBuf::from(path))?;
    println!("{report}");
    Ok(report.is_valid())
}
