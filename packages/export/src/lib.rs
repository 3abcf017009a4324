#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Flat CSV export of scraped records.
//!
//! The export has the header `title,price,star_rating,availability,category`
//! followed by one row per record in scrape order. An empty run writes no
//! file at all.

use std::borrow::Cow;
use std::io;
use std::path::{Path, PathBuf};

use catalog_scrape_models::{COLUMNS, Record, RecordFields};
use serde::{Deserialize, Serialize};

/// Default export file name.
pub const DEFAULT_EXPORT_FILE: &str = "scraped_books_data.csv";

/// Errors that can occur while writing or reading an export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// CSV encoding or decoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The file's header row is not the export header.
    #[error("unexpected header row: {found}")]
    Header {
        /// The header row as found, comma-joined.
        found: String,
    },
}

/// What a successful export wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub path: PathBuf,
    /// Data rows written, excluding the header.
    pub rows: usize,
}

/// One exported row, read back as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    pub title: String,
    pub price: f64,
    pub star_rating: String,
    pub availability: String,
    pub category: String,
}

impl RecordFields for ExportRow {
    fn title(&self) -> &str {
        &self.title
    }

    fn price(&self) -> f64 {
        self.price
    }

    fn star_rating(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.star_rating)
    }

    fn availability(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.availability)
    }

    fn category(&self) -> &str {
        &self.category
    }
}

/// Writes records as CSV to any writer. Returns the number of data rows.
///
/// # Errors
///
/// Returns [`ExportError`] if encoding or writing fails.
pub fn write_records<W: io::Write>(writer: W, records: &[Record]) -> Result<usize, ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(records.len())
}

/// Exports records to `path`.
///
/// Returns `Ok(None)` without touching the filesystem when `records` is
/// empty.
///
/// # Errors
///
/// Returns [`ExportError`] if the file cannot be created or written.
pub fn write_csv(path: &Path, records: &[Record]) -> Result<Option<ExportSummary>, ExportError> {
    if records.is_empty() {
        log::info!("No records scraped, so no CSV file was created");
        return Ok(None);
    }

    let file = std::fs::File::create(path)?;
    let rows = write_records(io::BufWriter::new(file), records)?;
    log::info!("Saved {rows} records to '{}'", path.display());

    Ok(Some(ExportSummary {
        path: path.to_path_buf(),
        rows,
    }))
}

/// Reads an export back from any reader.
///
/// # Errors
///
/// Returns [`ExportError::Header`] if the header row differs from the
/// export header, or [`ExportError::Csv`] if a row does not decode.
pub fn read_records<R: io::Read>(reader: R) -> Result<Vec<ExportRow>, ExportError> {
    let mut csv_reader = csv::Reader::from_reader(reader);

    let headers = csv_reader.headers()?;
    if !headers.iter().eq(COLUMNS) {
        return Err(ExportError::Header {
            found: headers.iter().collect::<Vec<_>>().join(","),
        });
    }

    csv_reader
        .deserialize()
        .map(|row| row.map_err(ExportError::from))
        .collect()
}

/// Reads the export at `path`.
///
/// # Errors
///
/// Returns [`ExportError`] if the file cannot be opened or decoded.
pub fn read_csv(path: &Path) -> Result<Vec<ExportRow>, ExportError> {
    let file = std::fs::File::open(path)?;
    read_records(io::BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use catalog_scrape_models::{Availability, StarRating};

    use super::*;

    fn record(title: &str, price: f64, availability: Availability) -> Record {
        Record {
            title: title.to_owned(),
            price,
            star_rating: StarRating::Three,
            availability,
            category: "Poetry".to_owned(),
        }
    }

    fn sample() -> Vec<Record> {
        vec![
            record("A Light in the Attic", 51.77, Availability::Count(22)),
            record("Tipping the Velvet", 53.74, Availability::InStock),
            record("Soumission, \"a novel\"", 0.0, Availability::OutOfStock),
        ]
    }

    fn temp_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("catalog_scrape_export_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let _ = std::fs::remove_file(&path);
        path
    }

    #[test]
    fn writes_exact_header_and_rows() {
        let mut out = Vec::new();
        let rows = write_records(&mut out, &sample()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(rows, 3);
        assert_eq!(lines[0], "title,price,star_rating,availability,category");
        assert_eq!(lines[1], "A Light in the Attic,51.77,Three,22,Poetry");
        assert_eq!(lines[2], "Tipping the Velvet,53.74,Three,Yes,Poetry");
        assert_eq!(lines[3], "\"Soumission, \"\"a novel\"\"\",0.0,Three,0,Poetry");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn empty_run_writes_no_file() {
        let path = temp_path("empty.csv");
        assert_eq!(write_csv(&path, &[]).unwrap(), None);
        assert!(!path.exists());
    }

    #[test]
    fn file_row_count_matches_record_count() {
        let path = temp_path("rows.csv");
        let records = sample();
        let summary = write_csv(&path, &records).unwrap().unwrap();
        assert_eq!(summary.rows, records.len());
        assert_eq!(summary.path, path);

        let rows = read_csv(&path).unwrap();
        assert_eq!(rows.len(), records.len());
        assert_eq!(rows[0].availability, "22");
        assert_eq!(rows[2].title, "Soumission, \"a novel\"");
        assert_eq!(RecordFields::availability(&rows[2]), "0");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn unwritable_path_is_an_error() {
        let path = temp_path("missing-dir").join("out.csv");
        assert!(matches!(
            write_csv(&path, &sample()),
            Err(ExportError::Io(_))
        ));
    }

    #[test]
    fn rejects_foreign_header() {
        let input = "name,cost\nx,1\n";
        let err = read_records(input.as_bytes()).unwrap_err();
        assert!(matches!(err, ExportError::Header { found } if found == "name,cost"));
    }

    #[test]
    fn rejects_non_numeric_price() {
        let input = "title,price,star_rating,availability,category\nx,cheap,One,1,Poetry\n";
        assert!(matches!(
            read_records(input.as_bytes()),
            Err(ExportError::Csv(_))
        ));
    }
}
