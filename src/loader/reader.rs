//! Reading one station file into timestamped value columns.

use crate::constants::NULL_TOKENS;
use crate::error::{Result, SolarQcError};
use crate::models::parse_timestamp;
use chrono::{NaiveDateTime, Timelike};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Values of one file keyed by timestamp, one entry per requested column
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimedColumns {
    pub path: PathBuf,
    pub rows: BTreeMap<NaiveDateTime, Vec<Option<f64>>>,
}

impl TimedColumns {
    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.rows.keys().next().copied()
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.rows.keys().next_back().copied()
    }

    /// Value of the `position`-th requested column at `timestamp`
    pub fn value(&self, timestamp: NaiveDateTime, position: usize) -> Option<f64> {
        self.rows
            .get(&timestamp)
            .and_then(|values| values.get(position).copied().flatten())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Parse one numeric cell. Null tokens and NaN become `None`; a comma
/// decimal separator is accepted.
pub fn parse_value(column: &str, raw: Option<&str>) -> Result<Option<f64>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if NULL_TOKENS.contains(&trimmed) {
        return Ok(None);
    }

    let value: f64 = trimmed
        .replace(',', ".")
        .parse()
        .map_err(|_| SolarQcError::InvalidValue {
            column: column.to_string(),
            value: raw.to_string(),
        })?;

    Ok((!value.is_nan()).then_some(value))
}

/// Read a delimited file with every column as text
fn read_text_frame(path: &Path, separator: u8) -> Result<DataFrame> {
    if !path.exists() {
        return Err(SolarQcError::DataFileNotFound {
            path: path.to_path_buf(),
        });
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|options| options.with_separator(separator))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    debug!(
        "Read {} rows and {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(df)
}

fn text_column<'a>(df: &'a DataFrame, path: &Path, name: &str) -> Result<&'a StringChunked> {
    let column = df
        .column(name)
        .map_err(|_| SolarQcError::MissingColumn {
            path: path.to_path_buf(),
            column: name.to_string(),
        })?;
    Ok(column.str()?)
}

/// Read `time_column` and `value_columns` from a station file.
///
/// Rows with an empty timestamp are skipped. Duplicate timestamps and
/// timestamps off the whole hour are data-integrity errors.
pub fn read_timed_columns(
    path: &Path,
    separator: u8,
    time_column: &str,
    value_columns: &[&str],
) -> Result<TimedColumns> {
    let df = read_text_frame(path, separator)?;

    let times = text_column(&df, path, time_column)?;
    let columns = value_columns
        .iter()
        .map(|name| text_column(&df, path, name))
        .collect::<Result<Vec<_>>>()?;

    let mut rows = BTreeMap::new();
    for row in 0..df.height() {
        let Some(raw_time) = times.get(row).filter(|t| !t.trim().is_empty()) else {
            continue;
        };
        let timestamp = parse_timestamp(raw_time)?;
        if timestamp.minute() != 0 || timestamp.second() != 0 {
            return Err(SolarQcError::data_integrity(format!(
                "timestamp {} in {} is not on a whole hour",
                timestamp,
                path.display()
            )));
        }

        let values = value_columns
            .iter()
            .zip(&columns)
            .map(|(name, column)| parse_value(name, column.get(row)))
            .collect::<Result<Vec<_>>>()?;

        if rows.insert(timestamp, values).is_some() {
            return Err(SolarQcError::data_integrity(format!(
                "duplicate timestamp {} in {}",
                timestamp,
                path.display()
            )));
        }
    }

    Ok(TimedColumns {
        path: path.to_path_buf(),
        rows,
    })
}
