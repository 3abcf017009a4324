#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Data-quality rules over a scraped record set.
//!
//! Every rule runs over every record and collects all violations; nothing
//! short-circuits and records are never modified. Rules only read the
//! [`RecordFields`] view, so freshly scraped records and rows read back
//! from an export are checked the same way.

use std::fmt;

use catalog_scrape_models::{IN_STOCK, NOT_AVAILABLE, OUT_OF_STOCK, RecordFields, StarRating};
use serde::Serialize;
use strum_macros::{Display, EnumString};

/// A single validation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Rule {
    PriceNonNegative,
    TitleNotEmpty,
    StarRatingValid,
    AvailabilityFormat,
    CategoryPresent,
}

impl Rule {
    /// All rules, in the order they are reported.
    pub const ALL: [Self; 5] = [
        Self::PriceNonNegative,
        Self::TitleNotEmpty,
        Self::StarRatingValid,
        Self::AvailabilityFormat,
        Self::CategoryPresent,
    ];

    /// What the rule checks.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::PriceNonNegative => "Checking if all prices are non-negative",
            Self::TitleNotEmpty => "Checking if all book titles are not empty",
            Self::StarRatingValid => {
                "Checking if star ratings are valid (One, Two, Three, Four, Five, N/A)"
            }
            Self::AvailabilityFormat => "Checking if availability is a number, 'Yes', '0' or 'N/A'",
            Self::CategoryPresent => "Checking if category is not empty",
        }
    }

    const fn passed_message(self) -> &'static str {
        match self {
            Self::PriceNonNegative => "All prices are non-negative.",
            Self::TitleNotEmpty => "All book titles are not empty.",
            Self::StarRatingValid => "All star ratings are valid.",
            Self::AvailabilityFormat => "All availability entries are valid.",
            Self::CategoryPresent => "All categories are not empty or 'N/A'.",
        }
    }

    /// Checks one record, returning the violation message if any.
    fn check<R: RecordFields>(self, index: usize, record: &R) -> Option<String> {
        let title = record.title();
        match self {
            Self::PriceNonNegative => {
                let price = record.price();
                if price.is_nan() {
                    Some(format!("Price for '{title}' (Index {index}) is not a number"))
                } else if price < 0.0 {
                    Some(format!(
                        "Price for '{title}' (Index {index}) is negative: {price:.2}"
                    ))
                } else {
                    None
                }
            }
            Self::TitleNotEmpty => title
                .trim()
                .is_empty()
                .then(|| format!("Title for book at index {index} is empty or blank.")),
            Self::StarRatingValid => {
                let rating = record.star_rating();
                let known = StarRating::valid_labels()
                    .iter()
                    .any(|label| *label == &*rating);
                (!known).then(|| {
                    format!("Invalid star rating for '{title}' (Index {index}): '{rating}'")
                })
            }
            Self::AvailabilityFormat => {
                let availability = record.availability();
                (!is_valid_availability(&availability)).then(|| {
                    format!(
                        "Invalid availability format for '{title}' (Index {index}): '{availability}'"
                    )
                })
            }
            Self::CategoryPresent => {
                let category = record.category().trim();
                (category.is_empty() || category == NOT_AVAILABLE).then(|| {
                    format!("Category for '{title}' (Index {index}) is empty or 'N/A'.")
                })
            }
        }
    }
}

/// One of the three sentinels, or any integer once surrounding whitespace
/// is trimmed.
fn is_valid_availability(value: &str) -> bool {
    [NOT_AVAILABLE, IN_STOCK, OUT_OF_STOCK]
        .iter()
        .any(|sentinel| *sentinel == value)
        || is_integer(value.trim())
}

/// An optional sign followed by one or more ASCII digits, of any length.
fn is_integer(value: &str) -> bool {
    let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// A single rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub rule: Rule,
    /// Position of the offending record in scrape order, zero-based.
    pub index: usize,
    pub title: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation Error: {}", self.message)
    }
}

/// Outcome of one rule over the whole record set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleResult {
    pub rule: Rule,
    pub passed: bool,
    pub errors: Vec<ValidationError>,
}

/// Outcome of every rule over a record set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Number of records checked.
    pub records: usize,
    pub valid: bool,
    pub rules: Vec<RuleResult>,
}

impl ValidationReport {
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    /// All violations, grouped by rule in report order.
    pub fn errors(&self) -> impl Iterator<Item = &ValidationError> {
        self.rules.iter().flat_map(|result| result.errors.iter())
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.rules.iter().map(|result| result.errors.len()).sum()
    }

    /// Returns the result for a single rule.
    #[must_use]
    pub fn rule(&self, rule: Rule) -> Option<&RuleResult> {
        self.rules.iter().find(|result| result.rule == rule)
    }

    /// Logs the per-rule outcome and a summary line.
    pub fn log(&self) {
        for result in &self.rules {
            log::info!("Validation: {}...", result.rule.description());
            if result.passed {
                log::info!("  PASSED: {}", result.rule.passed_message());
            }
            for error in &result.errors {
                log::warn!("  FAILED: {error}");
            }
        }

        if self.valid {
            log::info!("All validations passed for {} records", self.records);
        } else {
            log::error!(
                "Validations failed with {} error(s) across {} records",
                self.error_count(),
                self.records
            );
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Data Validations ({} records) ---", self.records)?;
        for result in &self.rules {
            writeln!(f, "Validation: {}...", result.rule.description())?;
            if result.passed {
                writeln!(f, "  PASSED: {}", result.rule.passed_message())?;
            }
            for error in &result.errors {
                writeln!(f, "  FAILED: {error}")?;
            }
        }

        if self.valid {
            writeln!(f, "\n*** ALL VALIDATIONS PASSED! The data is valid. ***")
        } else {
            writeln!(
                f,
                "\n!!! VALIDATIONS FAILED! Found {} error(s). Please review. !!!",
                self.error_count()
            )?;
            for error in self.errors() {
                writeln!(f, " - {error}")?;
            }
            Ok(())
        }
    }
}

/// Runs every rule over `records`.
#[must_use]
pub fn validate<R: RecordFields>(records: &[R]) -> ValidationReport {
    let rules: Vec<RuleResult> = Rule::ALL
        .into_iter()
        .map(|rule| {
            let errors: Vec<ValidationError> = records
                .iter()
                .enumerate()
                .filter_map(|(index, record)| {
                    rule.check(index, record).map(|message| ValidationError {
                        rule,
                        index,
                        title: record.title().to_owned(),
                        message,
                    })
                })
                .collect();
            RuleResult {
                rule,
                passed: errors.is_empty(),
                errors,
            }
        })
        .collect();

    ValidationReport {
        records: records.len(),
        valid: rules.iter().all(|result| result.passed),
        rules,
    }
}
