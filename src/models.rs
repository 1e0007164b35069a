//! Core data structures for solar irradiance quality control.
//!
//! Defines the hourly observation series, station metadata and the
//! timestamp ranges used to restrict or exclude parts of a series.

use crate::constants::{DATE_FORMATS, TIMESTAMP_FORMATS};
use crate::error::{Result, SolarQcError};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use serde::{Deserialize, Serialize};

/// Station identity and location, used only for labelling output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationMetadata {
    pub name: String,
    pub id: u32,
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
    #[serde(rename = "hgt", default)]
    pub altitude: f64,
}

/// One hour of aligned station data
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservationRecord {
    pub timestamp: NaiveDateTime,
    /// Measured global horizontal irradiance (W/m²)
    pub measured: Option<f64>,
    /// Modelled top-of-atmosphere irradiance (W/m²)
    pub toa: Option<f64>,
    /// Modelled clear-sky irradiance (W/m²)
    pub clear_sky: Option<f64>,
    /// Solar zenith angle (degrees)
    pub zenith: Option<f64>,
}

impl ObservationRecord {
    pub fn new(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            measured: None,
            toa: None,
            clear_sky: None,
            zenith: None,
        }
    }

    /// The sun is above the modelled horizon
    pub fn is_daytime(&self) -> bool {
        matches!(self.toa, Some(toa) if toa > 0.0)
    }

    /// Measured over TOA irradiance, defined only for daytime hours
    pub fn clearness_index(&self) -> Option<f64> {
        match (self.measured, self.toa) {
            (Some(measured), Some(toa)) if toa > 0.0 => Some(measured / toa),
            _ => None,
        }
    }
}

/// Hourly, gap-free series of station records.
///
/// Missing hours are present with null values. The constructor guarantees
/// strictly increasing timestamps with exactly one hour between neighbours.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObservationSeries {
    records: Vec<ObservationRecord>,
}

impl ObservationSeries {
    /// Validate and wrap a sequence of records
    pub fn new(records: Vec<ObservationRecord>) -> Result<Self> {
        let step = TimeDelta::hours(1);
        for pair in records.windows(2) {
            let gap = pair[1].timestamp - pair[0].timestamp;
            if gap != step {
                return Err(SolarQcError::data_integrity(format!(
                    "series is not hourly between {} and {} (gap of {} minutes)",
                    pair[0].timestamp,
                    pair[1].timestamp,
                    gap.num_minutes()
                )));
            }
        }
        if let Some(first) = records.first() {
            let time = first.timestamp.time();
            if time.minute() != 0 || time.second() != 0 || time.nanosecond() != 0 {
                return Err(SolarQcError::data_integrity(format!(
                    "series timestamp {} is not on a whole hour",
                    first.timestamp
                )));
            }
        }
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ObservationRecord] {
        &self.records
    }

    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.records.first().map(|r| r.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.records.last().map(|r| r.timestamp)
    }

    /// Timestamps of the hourly index
    pub fn index(&self) -> Vec<NaiveDateTime> {
        self.records.iter().map(|r| r.timestamp).collect()
    }

    /// Measured irradiance column
    pub fn measured(&self) -> Vec<Option<f64>> {
        self.records.iter().map(|r| r.measured).collect()
    }

    /// Mutable access to the measured column only; the index stays fixed
    pub fn measured_mut(&mut self) -> impl Iterator<Item = &mut Option<f64>> {
        self.records.iter_mut().map(|r| &mut r.measured)
    }

    /// Replace measured values equal to a sentinel code with null.
    ///
    /// Returns the number of values replaced.
    pub fn nullify_sentinels(&mut self, sentinels: &[f64]) -> usize {
        let mut replaced = 0;
        for value in self.measured_mut() {
            if matches!(value, Some(v) if sentinels.contains(v)) {
                *value = None;
                replaced += 1;
            }
        }
        replaced
    }

    /// Drop a leading year that does not start on January 1 and a trailing
    /// year that does not end on December 31.
    ///
    /// Returns the years removed.
    pub fn trim_partial_years(&mut self) -> Vec<i32> {
        let mut removed = Vec::new();

        if let Some(first) = self.first_timestamp() {
            if first.ordinal() != 1 {
                let year = first.year();
                self.records.retain(|r| r.timestamp.year() != year);
                removed.push(year);
            }
        }

        if let Some(last) = self.last_timestamp() {
            let is_year_end = last.month() == 12 && last.day() == 31;
            if !is_year_end {
                let year = last.year();
                self.records.retain(|r| r.timestamp.year() != year);
                removed.push(year);
            }
        }

        removed
    }
}

/// Which end of an inclusive range a date-only string describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Start,
    End,
}

/// Parse a full timestamp in any of the accepted formats
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    let trimmed = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| SolarQcError::InvalidTimestamp {
            value: value.to_string(),
        })
}

fn parse_bound(value: &str, bound: Bound) -> Result<NaiveDateTime> {
    if let Ok(timestamp) = parse_timestamp(value) {
        return Ok(timestamp);
    }

    let trimmed = value.trim();
    let date = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| SolarQcError::InvalidTimestamp {
            value: value.to_string(),
        })?;

    let time = match bound {
        Bound::Start => NaiveTime::MIN,
        Bound::End => NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN),
    };
    Ok(date.and_time(time))
}

/// Optional inclusive time window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl DateRange {
    /// Range covering everything
    pub fn full() -> Self {
        Self::default()
    }

    /// Parse optional bounds; a date-only end covers that whole day
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self> {
        Ok(Self {
            start: start.map(|s| parse_bound(s, Bound::Start)).transpose()?,
            end: end.map(|s| parse_bound(s, Bound::End)).transpose()?,
        })
    }

    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        self.start.is_none_or(|start| timestamp >= start)
            && self.end.is_none_or(|end| timestamp <= end)
    }
}

/// A period removed by a human reviewer before averaging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExclusionRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl ExclusionRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Parse inclusive bounds such as `("1995-05-25", "1995-05-25")`
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Ok(Self {
            start: parse_bound(start, Bound::Start)?,
            end: parse_bound(end, Bound::End)?,
        })
    }

    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        parse_timestamp(s).unwrap()
    }

    fn hourly(start: &str, hours: usize) -> Vec<ObservationRecord> {
        let start = ts(start);
        (0..hours)
            .map(|h| ObservationRecord::new(start + TimeDelta::hours(h as i64)))
            .collect()
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(1995, 5, 25)
            .unwrap()
            .and_hms_opt(13, 0, 0)
            .unwrap();
        assert_eq!(ts("25.05.1995 13:00"), expected);
        assert_eq!(ts("1995-05-25 13:00:00"), expected);
        assert_eq!(ts("1995-05-25T13:00:00"), expected);
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_series_rejects_non_hourly_spacing() {
        let mut records = hourly("2000-01-01 00:00", 3);
        records[2].timestamp = ts("2000-01-01 03:00");
        let err = ObservationSeries::new(records).unwrap_err();
        assert!(matches!(err, SolarQcError::DataIntegrity { .. }));
    }

    #[test]
    fn test_series_rejects_unsorted_and_duplicate() {
        let mut records = hourly("2000-01-01 00:00", 3);
        records.swap(0, 1);
        assert!(ObservationSeries::new(records).is_err());

        let mut records = hourly("2000-01-01 00:00", 2);
        records[1].timestamp = records[0].timestamp;
        assert!(ObservationSeries::new(records).is_err());
    }

    #[test]
    fn test_series_rejects_off_hour_start() {
        let records = hourly("2000-01-01 00:30", 2);
        assert!(ObservationSeries::new(records).is_err());
    }

    #[test]
    fn test_empty_series_is_valid() {
        let series = ObservationSeries::new(Vec::new()).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn test_nullify_sentinels() {
        let mut records = hourly("2000-01-01 00:00", 3);
        records[0].measured = Some(-6999.0);
        records[1].measured = Some(6999.0);
        records[2].measured = Some(120.0);
        let mut series = ObservationSeries::new(records).unwrap();

        let replaced = series.nullify_sentinels(&[-6999.0, 6999.0]);

        assert_eq!(replaced, 2);
        assert_eq!(series.measured(), vec![None, None, Some(120.0)]);
    }

    #[test]
    fn test_trim_partial_years() {
        // 1999-07-01 .. 2002-03-01: 1999 and 2002 are partial
        let start = ts("1999-07-01 00:00");
        let end = ts("2002-03-01 00:00");
        let hours = (end - start).num_hours() as usize;
        let mut series = ObservationSeries::new(hourly("1999-07-01 00:00", hours)).unwrap();

        let removed = series.trim_partial_years();

        assert_eq!(removed, vec![1999, 2002]);
        assert_eq!(series.first_timestamp(), Some(ts("2000-01-01 00:00")));
        assert_eq!(series.last_timestamp(), Some(ts("2001-12-31 23:00")));
    }

    #[test]
    fn test_trim_keeps_complete_years() {
        let mut series = ObservationSeries::new(hourly("2001-01-01 00:00", 8760)).unwrap();
        assert!(series.trim_partial_years().is_empty());
        assert_eq!(series.len(), 8760);
    }

    #[test]
    fn test_date_only_bounds_cover_whole_day() {
        let range = ExclusionRange::parse("1995-05-25", "1995-05-25").unwrap();
        assert!(range.contains(ts("1995-05-25 00:00")));
        assert!(range.contains(ts("1995-05-25 23:00")));
        assert!(!range.contains(ts("1995-05-26 00:00")));
        assert!(!range.contains(ts("1995-05-24 23:00")));
    }

    #[test]
    fn test_date_range_open_ends() {
        let range = DateRange::parse(Some("2000-03-01"), None).unwrap();
        assert!(!range.contains(ts("2000-02-29 23:00")));
        assert!(range.contains(ts("2090-01-01 00:00")));
        assert!(DateRange::full().contains(ts("1900-01-01 00:00")));
    }

    #[test]
    fn test_clearness_index_requires_daytime() {
        let mut record = ObservationRecord::new(ts("2000-06-01 12:00"));
        record.measured = Some(400.0);
        record.toa = Some(800.0);
        assert_eq!(record.clearness_index(), Some(0.5));

        record.toa = Some(0.0);
        assert_eq!(record.clearness_index(), None);
        assert!(!record.is_daytime());
    }
}
