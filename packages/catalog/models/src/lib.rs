#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Catalog record types shared across the catalog-scrape toolchain.
//!
//! A [`Record`] is one extracted catalog item. Every record carries all five
//! fields; extraction substitutes sentinels rather than omitting a field, and
//! [`FieldOutcome`] reports which fields were defaulted and why.

use std::borrow::Cow;

use serde::{Deserialize, Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumString};

/// Placeholder for a field whose value could not be determined.
pub const NOT_AVAILABLE: &str = "N/A";

/// Rendered availability for an item that is in stock with no count shown.
pub const IN_STOCK: &str = "Yes";

/// Rendered availability for an out-of-stock item.
pub const OUT_OF_STOCK: &str = "0";

/// Category assigned to items found on the catalog landing page.
pub const LANDING_CATEGORY: &str = "Books/General";

/// Column order of an exported record.
pub const COLUMNS: [&str; 5] = ["title", "price", "star_rating", "availability", "category"];

/// Star rating of a catalog item, parsed from the rating element's class list.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum StarRating {
    One,
    Two,
    Three,
    Four,
    Five,
    /// No rating token was present.
    #[serde(rename = "N/A")]
    #[strum(serialize = "N/A")]
    Unknown,
}

impl StarRating {
    /// The five concrete ratings, in ascending order.
    pub const RATED: [Self; 5] = [Self::One, Self::Two, Self::Three, Self::Four, Self::Five];

    /// Matches a single class token against the concrete ratings.
    ///
    /// Only `One` through `Five` match; the `N/A` sentinel is not a token the
    /// page ever carries.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        Self::RATED
            .into_iter()
            .find(|rating| AsRef::<str>::as_ref(rating) == token)
    }

    /// Every rendered value a valid record may carry.
    #[must_use]
    pub fn valid_labels() -> [&'static str; 6] {
        ["One", "Two", "Three", "Four", "Five", NOT_AVAILABLE]
    }
}

/// Stock state of a catalog item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    /// In stock with an explicit count (`In stock (22 available)`).
    Count(u64),
    /// In stock with no count shown.
    InStock,
    /// Out of stock. Renders as `"0"`, the same as `Count(0)`.
    OutOfStock,
    /// The stock element was missing.
    Unknown,
    /// Text kept verbatim: an unexpected format, or a count too large for
    /// [`Availability::Count`].
    Other(String),
}

impl Availability {
    /// Returns the text written to the export for this state.
    #[must_use]
    pub fn render(&self) -> Cow<'_, str> {
        match self {
            Self::Count(n) => Cow::Owned(n.to_string()),
            Self::InStock => Cow::Borrowed(IN_STOCK),
            Self::OutOfStock => Cow::Borrowed(OUT_OF_STOCK),
            Self::Unknown => Cow::Borrowed(NOT_AVAILABLE),
            Self::Other(raw) => Cow::Borrowed(raw.as_str()),
        }
    }
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

impl Serialize for Availability {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.render())
    }
}

/// One extracted catalog item.
///
/// Field order matches [`COLUMNS`], which is also the serialized column
/// order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub title: String,
    pub price: f64,
    pub star_rating: StarRating,
    pub availability: Availability,
    pub category: String,
}

/// Why an extracted field fell back to its default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultReason {
    /// The sub-element (or attribute) holding the field was not found.
    MissingElement {
        /// CSS selector that matched nothing.
        selector: String,
    },
    /// The price text did not parse as a non-negative number.
    UnparsablePrice {
        /// The displayed text as read from the page.
        raw: String,
    },
    /// The rating element carried no `One`..`Five` token.
    NoRatingToken {
        /// The full class attribute.
        classes: String,
    },
}

impl std::fmt::Display for DefaultReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingElement { selector } => write!(f, "no element matching '{selector}'"),
            Self::UnparsablePrice { raw } => write!(f, "could not convert price '{raw}' to a number"),
            Self::NoRatingToken { classes } => write!(f, "no rating token in class list '{classes}'"),
        }
    }
}

/// Result of extracting a single field: the value read from the page, or a
/// default substituted for it.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOutcome<T> {
    Extracted(T),
    Defaulted { value: T, reason: DefaultReason },
}

impl<T> FieldOutcome<T> {
    /// Builds a defaulted outcome.
    pub const fn defaulted(value: T, reason: DefaultReason) -> Self {
        Self::Defaulted { value, reason }
    }

    /// Returns the field value, extracted or defaulted.
    #[must_use]
    pub const fn value(&self) -> &T {
        match self {
            Self::Extracted(value) | Self::Defaulted { value, .. } => value,
        }
    }

    /// Consumes the outcome, returning the field value.
    #[must_use]
    pub fn into_value(self) -> T {
        match self {
            Self::Extracted(value) | Self::Defaulted { value, .. } => value,
        }
    }

    /// Returns the default reason, if the field was defaulted.
    #[must_use]
    pub const fn reason(&self) -> Option<&DefaultReason> {
        match self {
            Self::Extracted(_) => None,
            Self::Defaulted { reason, .. } => Some(reason),
        }
    }

    #[must_use]
    pub const fn is_defaulted(&self) -> bool {
        matches!(self, Self::Defaulted { .. })
    }
}

/// Read-only, text-level view of a record's five fields.
///
/// Implemented by the typed [`Record`] and by rows read back from an export,
/// so the same checks apply to both.
pub trait RecordFields {
    fn title(&self) -> &str;
    fn price(&self) -> f64;
    fn star_rating(&self) -> Cow<'_, str>;
    fn availability(&self) -> Cow<'_, str>;
    fn category(&self) -> &str;
}

impl RecordFields for Record {
    fn title(&self) -> &str {
        &self.title
    }

    fn price(&self) -> f64 {
        self.price
    }

    fn star_rating(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.star_rating.as_ref())
    }

    fn availability(&self) -> Cow<'_, str> {
        self.availability.render()
    }

    fn category(&self) -> &str {
        &self.category
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(availability: Availability) -> Record {
        Record {
            title: "A Light in the Attic".to_owned(),
            price: 51.77,
            star_rating: StarRating::Three,
            availability,
            category: LANDING_CATEGORY.to_owned(),
        }
    }

    #[test]
    fn star_rating_matches_only_concrete_tokens() {
        assert_eq!(StarRating::from_token("Three"), Some(StarRating::Three));
        assert_eq!(StarRating::from_token("star-rating"), None);
        assert_eq!(StarRating::from_token("N/A"), None);
        assert_eq!(StarRating::from_token("three"), None);
    }

    #[test]
    fn unknown_rating_renders_as_sentinel() {
        assert_eq!(StarRating::Unknown.as_ref(), NOT_AVAILABLE);
        assert_eq!(StarRating::Unknown.to_string(), NOT_AVAILABLE);
        assert_eq!(
            serde_json::to_string(&StarRating::Unknown).unwrap(),
            "\"N/A\""
        );
    }

    #[test]
    fn availability_renders_sentinels() {
        assert_eq!(Availability::Count(22).render(), "22");
        assert_eq!(Availability::InStock.render(), IN_STOCK);
        assert_eq!(Availability::OutOfStock.render(), OUT_OF_STOCK);
        assert_eq!(Availability::Unknown.render(), NOT_AVAILABLE);
        assert_eq!(
            Availability::Other("Pre-order".to_owned()).render(),
            "Pre-order"
        );
    }

    #[test]
    fn out_of_stock_and_zero_count_render_alike() {
        assert_ne!(Availability::OutOfStock, Availability::Count(0));
        assert_eq!(
            Availability::OutOfStock.render(),
            Availability::Count(0).render()
        );
    }

    #[test]
    fn record_serializes_in_column_order() {
        let json = serde_json::to_value(record(Availability::Count(22))).unwrap();
        let keys: Vec<&str> = json
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        let mut expected = COLUMNS.to_vec();
        expected.sort_unstable();
        let mut keys_sorted = keys;
        keys_sorted.sort_unstable();
        assert_eq!(keys_sorted, expected);
        assert_eq!(json["availability"], "22");
        assert_eq!(json["star_rating"], "Three");
    }

    #[test]
    fn record_fields_view_uses_rendered_text() {
        let rec = record(Availability::OutOfStock);
        assert_eq!(RecordFields::availability(&rec), "0");
        assert_eq!(RecordFields::star_rating(&rec), "Three");
        assert_eq!(RecordFields::category(&rec), LANDING_CATEGORY);
    }

    #[test]
    fn field_outcome_exposes_value_and_reason() {
        let extracted: FieldOutcome<f64> = FieldOutcome::Extracted(1.5);
        assert!(!extracted.is_defaulted());
        assert!(extracted.reason().is_none());

        let defaulted: FieldOutcome<f64> = FieldOutcome::defaulted(
            0.0,
            DefaultReason::UnparsablePrice {
                raw: "N/A".to_owned(),
            },
        );
        assert!(defaulted.is_defaulted());
        assert!((defaulted.value() - 0.0).abs() < f64::EPSILON);
        assert_eq!(
            defaulted.reason().unwrap().to_string(),
            "could not convert price 'N/A' to a number"
        );
    }
}
