//! Per-calendar-day clearness index statistics used by L1 and Consistency.

use crate::models::ObservationSeries;
use chrono::NaiveDate;

/// Daytime clearness statistics of one calendar date
#[derive(Debug, Clone, PartialEq)]
pub struct DayStats {
    pub date: NaiveDate,
    /// Row positions of daytime hours with a measured value
    pub rows: Vec<usize>,
    /// Clearness index of each row in `rows`
    pub ratios: Vec<f64>,
}

impl DayStats {
    pub fn mean(&self) -> Option<f64> {
        if self.ratios.is_empty() {
            return None;
        }
        Some(self.ratios.iter().sum::<f64>() / self.ratios.len() as f64)
    }

    /// Sample standard deviation (n - 1); undefined below two values
    pub fn std(&self) -> Option<f64> {
        let n = self.ratios.len();
        if n < 2 {
            return None;
        }
        let mean = self.mean()?;
        let sum_sq: f64 = self.ratios.iter().map(|r| (r - mean).powi(2)).sum();
        Some((sum_sq / (n - 1) as f64).sqrt())
    }
}

/// Group daytime clearness indices by full calendar date.
///
/// The series is hourly and sorted, so each date is one contiguous run.
/// Dates without a usable daytime hour are omitted.
pub fn daily_clearness(series: &ObservationSeries) -> Vec<DayStats> {
    let mut days = Vec::new();
    let mut offset = 0;

    for run in series
        .records()
        .chunk_by(|a, b| a.timestamp.date() == b.timestamp.date())
    {
        let mut day = DayStats {
            date: run[0].timestamp.date(),
            rows: Vec::new(),
            ratios: Vec::new(),
        };
        for (i, record) in run.iter().enumerate() {
            if let Some(ratio) = record.clearness_index() {
                day.rows.push(offset + i);
                day.ratios.push(ratio);
            }
        }
        offset += run.len();

        if !day.rows.is_empty() {
            days.push(day);
        }
    }

    days
}
