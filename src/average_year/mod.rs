//! Average-year reconstruction.
//!
//! Collapses a multi-year hourly series into one synthetic year. Every
//! (month, day, hour) slot holds the mean of all accepted observations
//! made at that hour-of-year; empty slots are interpolated from their
//! neighbours.
//!
//! The procedure:
//!
//! 1. Restrict the series to the requested date range
//! 2. With quality control on, drop hours flagged by any rule that excludes
//!    data automatically (everything except Offset and Consistency), and
//!    hours inside a visual-control exclusion range
//! 3. Average each hour-of-year slot across years, ignoring missing values
//! 4. Lay the slots out over the synthetic year [`SYNTHETIC_YEAR`]
//! 5. Fill empty slots with the mean of the nearest values before and after
//! 6. Drop February 29 unless the leap day is requested

pub mod fill;

#[cfg(test)]
mod tests;

use crate::constants::{HOURS_WITH_LEAP_DAY, SYNTHETIC_YEAR};
use crate::error::{Result, SolarQcError};
use crate::flags::FlagTable;
use crate::models::{DateRange, ExclusionRange, ObservationSeries};
use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta, Timelike};
use tracing::{debug, info};

/// First hour of the synthetic year
fn synthetic_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(SYNTHETIC_YEAR, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Position of a timestamp's (month, day, hour) within the synthetic year
fn slot_of(timestamp: NaiveDateTime) -> Option<usize> {
    let date = NaiveDate::from_ymd_opt(SYNTHETIC_YEAR, timestamp.month(), timestamp.day())?;
    Some(date.ordinal0() as usize * 24 + timestamp.hour() as usize)
}

/// Settings for one average-year computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AverageYearOptions {
    pub range: DateRange,
    pub exclusions: Vec<ExclusionRange>,
    pub quality_control: bool,
    pub include_leap_day: bool,
}

impl Default for AverageYearOptions {
    fn default() -> Self {
        Self {
            range: DateRange::full(),
            exclusions: Vec::new(),
            quality_control: true,
            include_leap_day: false,
        }
    }
}

impl AverageYearOptions {
    pub fn with_range(mut self, range: DateRange) -> Self {
        self.range = range;
        self
    }

    pub fn with_exclusions(mut self, exclusions: Vec<ExclusionRange>) -> Self {
        self.exclusions = exclusions;
        self
    }

    pub fn without_quality_control(mut self) -> Self {
        self.quality_control = false;
        self
    }

    pub fn with_leap_day(mut self) -> Self {
        self.include_leap_day = true;
        self
    }
}

/// Hourly profile over the synthetic year
#[derive(Debug, Clone, PartialEq)]
pub struct AverageYear {
    index: Vec<NaiveDateTime>,
    values: Vec<Option<f64>>,
}

impl AverageYear {
    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDateTime, Option<f64>)> + '_ {
        self.index.iter().copied().zip(self.values.iter().copied())
    }

    /// Value of one (month, day, hour) slot
    pub fn value_at(&self, month: u32, day: u32, hour: u32) -> Option<f64> {
        let timestamp = NaiveDate::from_ymd_opt(SYNTHETIC_YEAR, month, day)?.and_hms_opt(hour, 0, 0)?;
        let position = self.index.binary_search(&timestamp).ok()?;
        self.values[position]
    }

    /// Sum of all hourly values; null when the profile is empty
    pub fn total(&self) -> Option<f64> {
        let present: Vec<f64> = self.values.iter().flatten().copied().collect();
        if present.is_empty() {
            None
        } else {
            Some(present.iter().sum())
        }
    }

    /// Mean daily total for each month, in calendar order
    pub fn monthly_mean_daily_totals(&self) -> Vec<(u32, Option<f64>)> {
        let mut daily: Vec<(NaiveDate, Option<f64>)> = Vec::new();
        for (timestamp, value) in self.iter() {
            let date = timestamp.date();
            match daily.last_mut() {
                Some((current, total)) if *current == date => {
                    if let Some(v) = value {
                        *total = Some(total.unwrap_or(0.0) + v);
                    }
                }
                _ => daily.push((date, value)),
            }
        }

        (1..=12)
            .map(|month| {
                let totals: Vec<f64> = daily
                    .iter()
                    .filter(|(date, _)| date.month() == month)
                    .filter_map(|(_, total)| *total)
                    .collect();
                let mean = if totals.is_empty() {
                    None
                } else {
                    Some(totals.iter().sum::<f64>() / totals.len() as f64)
                };
                (month, mean)
            })
            .collect()
    }
}

/// Builds an [`AverageYear`] from a flagged series
#[derive(Debug, Clone, Default)]
pub struct AverageYearBuilder {
    options: AverageYearOptions,
}

impl AverageYearBuilder {
    pub fn new(options: AverageYearOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &AverageYearOptions {
        &self.options
    }

    pub fn build(&self, series: &ObservationSeries, flags: &FlagTable) -> Result<AverageYear> {
        let options = &self.options;
        if options.quality_control && flags.index() != series.index().as_slice() {
            return Err(SolarQcError::data_integrity(format!(
                "flag table ({} rows) is not aligned with the series ({} rows)",
                flags.len(),
                series.len()
            )));
        }

        let mut sums = vec![0.0; HOURS_WITH_LEAP_DAY];
        let mut counts = vec![0usize; HOURS_WITH_LEAP_DAY];
        let mut used = 0usize;
        let mut rejected = 0usize;

        for (row, record) in series.records().iter().enumerate() {
            if !options.range.contains(record.timestamp) {
                continue;
            }
            let Some(value) = record.measured else {
                continue;
            };
            if options.quality_control
                && (flags.is_erroneous(row)
                    || options
                        .exclusions
                        .iter()
                        .any(|range| range.contains(record.timestamp)))
            {
                rejected += 1;
                continue;
            }
            let Some(slot) = slot_of(record.timestamp) else {
                continue;
            };
            sums[slot] += value;
            counts[slot] += 1;
            used += 1;
        }

        let means: Vec<Option<f64>> = sums
            .iter()
            .zip(&counts)
            .map(|(sum, count)| (*count > 0).then(|| sum / *count as f64))
            .collect();
        let empty_slots = means.iter().filter(|m| m.is_none()).count();
        debug!(
            "Averaged {} observations ({} rejected), {} empty slots before filling",
            used, rejected, empty_slots
        );

        let filled = fill::fill_gaps(&means);

        let start = synthetic_start();
        let (index, values): (Vec<NaiveDateTime>, Vec<Option<f64>>) = filled
            .into_iter()
            .enumerate()
            .map(|(slot, value)| (start + TimeDelta::hours(slot as i64), value))
            .filter(|(timestamp, _)| {
                options.include_leap_day || !(timestamp.month() == 2 && timestamp.day() == 29)
            })
            .unzip();

        info!(
            "Built average year with {} hourly slots from {} observations",
            values.len(),
            used
        );

        Ok(AverageYear { index, values })
    }
}
