//! Flag statistics for reporting.
//!
//! Everything here is a read-only view over a flagged series: erroneous and
//! visual-review percentages, flag counts per period and the runs of
//! missing measurements.

use crate::constants::MONTH_NAMES;
use crate::error::{Result, SolarQcError};
use crate::flags::{FlagTable, Rule};
use crate::models::{DateRange, ObservationSeries};
use chrono::{Datelike, NaiveDateTime, TimeDelta};
use std::collections::BTreeMap;

/// Whether a table holds counts or percentages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummaryMode {
    #[default]
    Counts,
    Percent,
}

/// One labelled row of a summary table
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub label: String,
    pub values: Vec<Option<f64>>,
}

/// Per-rule statistics grouped by period
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryTable {
    /// Header of the label column ("Period", "Year" or "Month")
    pub label_header: String,
    pub columns: Vec<String>,
    pub rows: Vec<SummaryRow>,
}

impl SummaryTable {
    /// Value in the row labelled `label` under column `column`
    pub fn get(&self, label: &str, column: &str) -> Option<f64> {
        let position = self.columns.iter().position(|c| c == column)?;
        self.rows
            .iter()
            .find(|row| row.label == label)
            .and_then(|row| row.values[position])
    }
}

/// A maximal run of consecutive missing hours, both ends inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingPeriod {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl MissingPeriod {
    pub fn hours(&self) -> i64 {
        (self.end - self.start).num_hours() + 1
    }
}

/// Runs of null measured values inside the range
pub fn missing_periods(series: &ObservationSeries, range: &DateRange) -> Vec<MissingPeriod> {
    let mut periods: Vec<MissingPeriod> = Vec::new();
    let missing = series
        .records()
        .iter()
        .filter(|r| range.contains(r.timestamp) && r.measured.is_none())
        .map(|r| r.timestamp);

    for timestamp in missing {
        match periods.last_mut() {
            Some(period) if timestamp - period.end == TimeDelta::hours(1) => {
                period.end = timestamp;
            }
            _ => periods.push(MissingPeriod {
                start: timestamp,
                end: timestamp,
            }),
        }
    }
    periods
}

fn percent(hits: usize, total: usize) -> Option<f64> {
    (total > 0).then(|| hits as f64 / total as f64 * 100.0)
}

/// Statistics over a series and its flag table
#[derive(Debug, Clone, Copy)]
pub struct SummaryReporter<'a> {
    series: &'a ObservationSeries,
    flags: &'a FlagTable,
}

impl<'a> SummaryReporter<'a> {
    /// The flag table must be built on the same index as the series
    pub fn new(series: &'a ObservationSeries, flags: &'a FlagTable) -> Result<Self> {
        if flags.index() != series.index().as_slice() {
            return Err(SolarQcError::data_integrity(format!(
                "flag table ({} rows) is not aligned with the series ({} rows)",
                flags.len(),
                series.len()
            )));
        }
        Ok(Self { series, flags })
    }

    fn is_daytime(&self, row: usize) -> bool {
        self.series.records()[row].is_daytime()
    }

    /// Percentage of daytime hours flagged by a rule that excludes data
    /// automatically
    pub fn pesd(&self) -> Option<f64> {
        let daytime: Vec<usize> = (0..self.series.len())
            .filter(|row| self.is_daytime(*row))
            .collect();
        let erroneous = daytime
            .iter()
            .filter(|row| self.flags.is_erroneous(**row))
            .count();
        percent(erroneous, daytime.len())
    }

    /// Percentage of all hours flagged Offset or Consistency
    pub fn visual_review_percent(&self) -> Option<f64> {
        let review = (0..self.flags.len())
            .filter(|row| self.flags.needs_review(*row))
            .count();
        percent(review, self.flags.len())
    }

    /// Per-rule figures over a set of rows.
    ///
    /// Counts mode appends the sum of all rule counts. Percent mode reports
    /// Offset against all rows and every other rule against daytime rows.
    fn aggregate(&self, rows: &[usize], mode: SummaryMode) -> Vec<Option<f64>> {
        let daytime: Vec<usize> = rows
            .iter()
            .copied()
            .filter(|row| self.is_daytime(*row))
            .collect();

        let mut values: Vec<Option<f64>> = Vec::new();
        let mut sum = 0usize;
        for (rule, column) in self.flags.columns() {
            let hits_in = |subset: &[usize]| subset.iter().filter(|row| column[**row]).count();
            match mode {
                SummaryMode::Counts => {
                    let hits = hits_in(rows);
                    sum += hits;
                    values.push(Some(hits as f64));
                }
                SummaryMode::Percent if rule == Rule::Offset => {
                    values.push(percent(hits_in(rows), rows.len()));
                }
                SummaryMode::Percent => {
                    values.push(percent(hits_in(&daytime), daytime.len()));
                }
            }
        }
        if mode == SummaryMode::Counts {
            values.push(Some(sum as f64));
        }
        values
    }

    fn columns(&self, mode: SummaryMode) -> Vec<String> {
        let mut columns: Vec<String> = self.flags.rules().map(|r| r.name().to_string()).collect();
        if mode == SummaryMode::Counts {
            columns.push("Sum".to_string());
        }
        columns
    }

    fn rows_in(&self, range: &DateRange) -> Vec<usize> {
        self.flags
            .index()
            .iter()
            .enumerate()
            .filter(|(_, timestamp)| range.contains(**timestamp))
            .map(|(row, _)| row)
            .collect()
    }

    /// Per-rule figures over the whole range as one row
    pub fn flag_info(&self, range: &DateRange, mode: SummaryMode) -> SummaryTable {
        let rows = self.rows_in(range);
        SummaryTable {
            label_header: "Period".to_string(),
            columns: self.columns(mode),
            rows: vec![SummaryRow {
                label: "Total".to_string(),
                values: self.aggregate(&rows, mode),
            }],
        }
    }

    /// One row per calendar year present in the range
    pub fn counts_per_year(&self, range: &DateRange, mode: SummaryMode) -> SummaryTable {
        let mut years: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
        for row in self.rows_in(range) {
            years
                .entry(self.flags.index()[row].year())
                .or_default()
                .push(row);
        }

        SummaryTable {
            label_header: "Year".to_string(),
            columns: self.columns(mode),
            rows: years
                .into_iter()
                .map(|(year, rows)| SummaryRow {
                    label: year.to_string(),
                    values: self.aggregate(&rows, mode),
                })
                .collect(),
        }
    }

    /// One row per calendar month, January to December, pooled over years
    pub fn counts_per_month(&self, range: &DateRange, mode: SummaryMode) -> SummaryTable {
        let mut months: [Vec<usize>; 12] = Default::default();
        for row in self.rows_in(range) {
            let month0 = self.flags.index()[row].month0() as usize;
            months[month0].push(row);
        }

        SummaryTable {
            label_header: "Month".to_string(),
            columns: self.columns(mode),
            rows: MONTH_NAMES
                .iter()
                .zip(months.iter())
                .map(|(name, rows)| SummaryRow {
                    label: name.to_string(),
                    values: self.aggregate(rows, mode),
                })
                .collect(),
        }
    }

    pub fn missing_periods(&self, range: &DateRange) -> Vec<MissingPeriod> {
        missing_periods(self.series, range)
    }
}
