//! CSV readings → discretized transactions.
//!
//! Each data row becomes one transaction: the month name of its date is the
//! time period, a text column is the location, and every configured
//! pollutant contributes one banded item. Bands are equal-width ranges over
//! the pollutant's observed span, so the whole file is read before any row
//! is discretized.

use chrono::{Datelike, Month, NaiveDate};
use std::fs::File;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

use stmine::{Item, Itemset, Transaction};

use crate::config::InputConfig;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Row {row} has no column {column}")]
    MissingColumn { row: usize, column: usize },

    #[error("Row {row}: cannot parse date {value:?}")]
    BadDate { row: usize, value: String },

    #[error("No data rows in {0}")]
    NoRows(PathBuf),
}

/// One row before discretization.
struct RawReading {
    location: String,
    month: &'static str,
    values: Vec<f64>,
}

/// Read and discretize every row of the configured file.
pub fn load_transactions(input: &InputConfig) -> Result<Vec<Transaction>, IngestError> {
    let file = File::open(&input.path).map_err(|source| IngestError::Io {
        path: input.path.clone(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let mut readings = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        // Header is line 1.
        let row = i + 2;
        let field = |column: usize| {
            record
                .get(column)
                .ok_or(IngestError::MissingColumn { row, column })
        };

        let date = field(input.date_column)?;
        let month = month_name(date, &input.date_format).ok_or_else(|| IngestError::BadDate {
            row,
            value: date.to_string(),
        })?;

        let location = field(input.location_column)?.trim().to_string();

        let values = input
            .pollutants
            .iter()
            .map(|p| field(p.column).map(parse_reading))
            .collect::<Result<Vec<f64>, _>>()?;

        readings.push(RawReading {
            location,
            month,
            values,
        });
    }

    if readings.is_empty() {
        return Err(IngestError::NoRows(input.path.clone()));
    }

    let banded: Vec<Vec<u32>> = (0..input.pollutants.len())
        .map(|p| {
            let column: Vec<f64> = readings.iter().map(|r| r.values[p]).collect();
            discretize(&column, input.bands)
        })
        .collect();

    let transactions: Vec<Transaction> = readings
        .into_iter()
        .enumerate()
        .map(|(i, reading)| {
            let items: Itemset = input
                .pollutants
                .iter()
                .zip(&banded)
                .map(|(pollutant, bands)| Item::new(&pollutant.name, bands[i]))
                .collect();
            Transaction::new(items, reading.location, reading.month)
        })
        .collect();

    info!(
        path = %input.path.display(),
        rows = transactions.len(),
        pollutants = input.pollutants.len(),
        bands = input.bands,
        "Readings loaded"
    );
    Ok(transactions)
}

/// Unparsable and empty readings count as zero.
fn parse_reading(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

fn month_name(raw: &str, format: &str) -> Option<&'static str> {
    let date = NaiveDate::parse_from_str(raw.trim(), format).ok()?;
    let month = Month::try_from(u8::try_from(date.month()).ok()?).ok()?;
    Some(month.name())
}

/// Map values to bands `1..=bands` of equal width over their observed span.
///
/// A value falls in band `b` when it is below `min + b * width`; anything at
/// or past the last lower bound lands in the top band, including every value
/// of a constant column.
pub fn discretize(values: &[f64], bands: u32) -> Vec<u32> {
    let bands = bands.max(1);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = (max - min) / f64::from(bands);
    debug!(min, max, width, bands, "Discretizing column");

    values
        .iter()
        .map(|&v| {
            (1..bands)
                .find(|&b| v < min + f64::from(b) * width)
                .unwrap_or(bands)
        })
        .collect()
}
