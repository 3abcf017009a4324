//! Field extraction from one catalog item container.
//!
//! Each field is read and parsed independently. A missing sub-element or
//! an unparsable value defaults that field only, recorded as a
//! [`FieldOutcome::Defaulted`], so every container yields a record.

use std::sync::LazyLock;

use catalog_scrape_models::{
    Availability, DefaultReason, FieldOutcome, NOT_AVAILABLE, Record, StarRating,
};
use regex::Regex;

use crate::browser::{BrowserError, Element};
use crate::config::ScrapeConfig;

static AVAILABLE_COUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(([0-9]+) available\)").unwrap_or_else(|_| unreachable!())
});

/// The four item-level fields of one container.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFields {
    pub title: FieldOutcome<String>,
    pub price: FieldOutcome<f64>,
    pub star_rating: FieldOutcome<StarRating>,
    pub availability: FieldOutcome<Availability>,
}

impl ItemFields {
    /// Merges the item fields with the page's category into a [`Record`].
    #[must_use]
    pub fn into_record(self, category: &str) -> Record {
        Record {
            title: self.title.into_value(),
            price: self.price.into_value(),
            star_rating: self.star_rating.into_value(),
            availability: self.availability.into_value(),
            category: category.to_owned(),
        }
    }

    /// Fields that fell back to a default, with the reason.
    #[must_use]
    pub fn defaults(&self) -> Vec<(&'static str, &DefaultReason)> {
        [
            ("title", self.title.reason()),
            ("price", self.price.reason()),
            ("star_rating", self.star_rating.reason()),
            ("availability", self.availability.reason()),
        ]
        .into_iter()
        .filter_map(|(field, reason)| reason.map(|r| (field, r)))
        .collect()
    }
}

/// Parses a displayed price such as `£51.77`.
///
/// The currency symbol and surrounding whitespace are stripped. Anything
/// that does not parse as a finite, non-negative number defaults to `0.0`.
#[must_use]
pub fn parse_price(raw: &str, currency_symbol: &str) -> FieldOutcome<f64> {
    let cleaned = if currency_symbol.is_empty() {
        raw.trim().to_owned()
    } else {
        raw.replace(currency_symbol, "").trim().to_owned()
    };

    match cleaned.parse::<f64>() {
        Ok(price) if price.is_finite() && price >= 0.0 => FieldOutcome::Extracted(price),
        _ => FieldOutcome::defaulted(
            0.0,
            DefaultReason::UnparsablePrice {
                raw: raw.to_owned(),
            },
        ),
    }
}

/// Picks the rating word out of a class list such as `star-rating Three`.
///
/// The first of `One`..`Five` wins; with none present the rating is
/// [`StarRating::Unknown`].
#[must_use]
pub fn parse_star_rating(classes: &str) -> FieldOutcome<StarRating> {
    classes
        .split_whitespace()
        .find_map(StarRating::from_token)
        .map_or_else(
            || {
                FieldOutcome::defaulted(
                    StarRating::Unknown,
                    DefaultReason::NoRatingToken {
                        classes: classes.to_owned(),
                    },
                )
            },
            FieldOutcome::Extracted,
        )
}

/// Interprets stock-status text.
///
/// * `In stock (22 available)` gives `Count(22)`. A count beyond `u64`
///   keeps its digits as `Other`.
/// * `In stock` gives `InStock`.
/// * `Out of stock` gives `OutOfStock`.
/// * Anything else is kept verbatim (trimmed) as `Other`.
#[must_use]
pub fn parse_availability(text: &str) -> Availability {
    let text = text.trim();

    if text.contains("In stock") {
        return AVAILABLE_COUNT
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map_or(Availability::InStock, |digits| {
                let digits = digits.as_str();
                digits.parse::<u64>().map_or_else(
                    |_| Availability::Other(digits.trim_start_matches('0').to_owned()),
                    Availability::Count,
                )
            });
    }

    if text.contains("Out of stock") {
        return Availability::OutOfStock;
    }

    Availability::Other(text.to_owned())
}

/// Extracts the four item-level fields from one item container.
///
/// # Errors
///
/// Returns [`BrowserError`] only if the backend itself fails; missing
/// elements and bad values are defaulted.
pub async fn extract_item<E: Element>(
    item: &E,
    config: &ScrapeConfig,
) -> Result<ItemFields, BrowserError> {
    let selectors = &config.selectors;

    let title = match item.find(&selectors.title).await? {
        Some(link) => match link.attr(&selectors.title_attribute).await? {
            Some(title) => FieldOutcome::Extracted(title.trim().to_owned()),
            None => missing(
                NOT_AVAILABLE.to_owned(),
                &format!("{}[{}]", selectors.title, selectors.title_attribute),
            ),
        },
        None => missing(NOT_AVAILABLE.to_owned(), &selectors.title),
    };

    let price = match item.find(&selectors.price).await? {
        Some(element) => parse_price(&element.text().await?, &config.currency_symbol),
        None => missing(0.0, &selectors.price),
    };

    let star_rating = match item.find(&selectors.rating).await? {
        Some(element) => parse_star_rating(&element.attr("class").await?.unwrap_or_default()),
        None => missing(StarRating::Unknown, &selectors.rating),
    };

    let availability = match item.find(&selectors.availability).await? {
        Some(element) => FieldOutcome::Extracted(parse_availability(&element.text().await?)),
        None => missing(Availability::Unknown, &selectors.availability),
    };

    Ok(ItemFields {
        title,
        price,
        star_rating,
        availability,
    })
}

fn missing<T>(value: T, selector: &str) -> FieldOutcome<T> {
    FieldOutcome::defaulted(
        value,
        DefaultReason::MissingElement {
            selector: selector.to_owned(),
        },
    )
}
