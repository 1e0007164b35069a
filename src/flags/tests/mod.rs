//! Tests for the flag engine and its rules


use crate::models::{ObservationRecord, ObservationSeries};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

/// Timestamp helper
pub fn ts(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

/// Create a record with every field set
pub fn record(
    timestamp: NaiveDateTime,
    measured: Option<f64>,
    toa: Option<f64>,
    clear_sky: Option<f64>,
    zenith: Option<f64>,
) -> ObservationRecord {
    ObservationRecord {
        timestamp,
        measured,
        toa,
        clear_sky,
        zenith,
    }
}

/// Consecutive hourly records starting at `start`, built from
/// (measured, toa, zenith) triples with clear-sky far above measured
pub fn hourly_series(start: NaiveDateTime, rows: &[(Option<f64>, f64, f64)]) -> ObservationSeries {
    let records = rows
        .iter()
        .enumerate()
        .map(|(i, (measured, toa, zenith))| {
            record(
                start + TimeDelta::hours(i as i64),
                *measured,
                Some(*toa),
                Some(2000.0),
                Some(*zenith),
            )
        })
        .collect();
    ObservationSeries::new(records).unwrap()
}

/// One calendar day that passes every rule.
///
/// Night is 00-05 and 18-23 (TOA 0, zenith 100, measured 0). Daytime hours
/// 06-17 have TOA 1000, clear-sky 800, zenith 50 and clearness indices
/// rising from 0.30 to 0.74 in steps of 0.04.
pub fn clean_day(date: NaiveDate) -> Vec<ObservationRecord> {
    (0..24)
        .map(|hour| {
            let timestamp = date.and_hms_opt(hour, 0, 0).unwrap();
            if (6..18).contains(&hour) {
                let ratio = 0.30 + 0.04 * (hour - 6) as f64;
                record(
                    timestamp,
                    Some(ratio * 1000.0),
                    Some(1000.0),
                    Some(800.0),
                    Some(50.0),
                )
            } else {
                record(timestamp, Some(0.0), Some(0.0), Some(0.0), Some(100.0))
            }
        })
        .collect()
}

/// One calendar day whose daytime clearness indices all equal `ratio`
pub fn constant_day(date: NaiveDate, ratio: f64) -> Vec<ObservationRecord> {
    clean_day(date)
        .into_iter()
        .map(|mut r| {
            if r.is_daytime() {
                r.measured = Some(ratio * 1000.0);
            }
            r
        })
        .collect()
}

/// Several consecutive clean days starting at `first`
pub fn clean_days(first: NaiveDate, days: u64) -> ObservationSeries {
    let records = first
        .iter_days()
        .take(days as usize)
        .flat_map(clean_day)
        .collect();
    ObservationSeries::new(records).unwrap()
}
