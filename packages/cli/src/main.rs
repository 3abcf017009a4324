#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the catalog scraper.
//!
//! Exits non-zero when the scraped or loaded data fails validation, so a
//! run can gate a CI job.

use std::path::PathBuf;
use std::process::ExitCode;

use catalog_scrape_cli::commands::{self, Backend, ScrapeOptions};
use catalog_scrape_cli::interactive;
use catalog_scrape_export::DEFAULT_EXPORT_FILE;
use catalog_scrape_scraper::config::DEFAULT_WEBDRIVER_URL;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "catalog_scrape",
    about = "Scrape a paginated book catalog to CSV and validate the data"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the catalog, export it to CSV, and validate the records
    Scrape {
        /// Catalog landing page (overrides the config file)
        #[arg(long)]
        url: Option<String>,
        /// Maximum number of pages to scrape (overrides the config file)
        #[arg(long)]
        max_pages: Option<u32>,
        /// CSV file to write
        #[arg(long, default_value = DEFAULT_EXPORT_FILE)]
        output: PathBuf,
        /// Browser backend
        #[arg(long, value_enum, default_value_t = Backend::default())]
        backend: Backend,
        /// WebDriver server address (webdriver backend only)
        #[arg(long, default_value = DEFAULT_WEBDRIVER_URL)]
        webdriver_url: String,
        /// Run the browser without a visible window (webdriver backend only)
        #[arg(long)]
        headless: bool,
        /// TOML file with timeouts, selectors, and limits
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate a previously exported CSV file
    Validate {
        /// Path to the CSV export
        csv: PathBuf,
        /// Print the validation report as JSON
        #[arg(long)]
        json: bool,
    },
}

const fn exit_code(passed: bool) -> ExitCode {
    if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let multi = catalog_scrape_cli_utils::init_logger();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return Ok(exit_code(interactive::run(&multi).await?));
    };

    match command {
        Commands::Scrape {
            url,
            max_pages,
            output,
            backend,
            webdriver_url,
            headless,
            config,
            json,
        } => {
            let mut scrape_config = commands::load_config(config.as_deref())?;
            if let Some(url) = url {
                scrape_config = scrape_config.with_start_url(&url);
            }
            if let Some(max_pages) = max_pages {
                scrape_config = scrape_config.with_max_pages(max_pages);
            }

            let options = ScrapeOptions {
                config: scrape_config,
                output,
                backend,
                webdriver_url,
                headless,
            };
            let report = commands::run_scrape(&options, &multi).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else if let Some(validation) = &report.validation {
                println!("{validation}");
            }
            if let Some(failure) = &report.failure {
                eprintln!("Run failed: {failure}");
            }

            Ok(exit_code(report.succeeded()))
        }
        Commands::Validate { csv, json } => {
            let report = commands::run_validate(&csv)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{report}");
            }
            Ok(exit_code(report.is_valid()))
        }
    }
}
