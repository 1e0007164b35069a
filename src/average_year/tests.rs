//! Tests for the average-year builder

use super::*;
use crate::constants::HOURS_WITHOUT_LEAP_DAY;
use crate::flags::Rule;
use crate::models::ObservationRecord;

fn ts(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

/// Hourly series over whole calendar years with measured = f(timestamp)
fn series_over_years(
    first_year: i32,
    last_year: i32,
    measured: impl Fn(NaiveDateTime) -> Option<f64>,
) -> ObservationSeries {
    let start = ts(first_year, 1, 1, 0);
    let end = ts(last_year + 1, 1, 1, 0);
    let hours = (end - start).num_hours();
    let records = (0..hours)
        .map(|h| {
            let timestamp = start + TimeDelta::hours(h);
            let mut record = ObservationRecord::new(timestamp);
            record.measured = measured(timestamp);
            record.toa = Some(1000.0);
            record
        })
        .collect();
    ObservationSeries::new(records).unwrap()
}

/// Flag table with every rule recorded and nothing flagged
fn quiet_flags(series: &ObservationSeries) -> FlagTable {
    let mut table = FlagTable::new(series.index());
    for rule in Rule::ALL {
        table.record(rule, vec![false; series.len()]).unwrap();
    }
    table
}

/// Flag table where `rule` flags exactly the given timestamps
fn flags_at(series: &ObservationSeries, rule: Rule, hits: &[NaiveDateTime]) -> FlagTable {
    let mut table = FlagTable::new(series.index());
    for other in Rule::ALL {
        let column = series
            .records()
            .iter()
            .map(|r| other == rule && hits.contains(&r.timestamp))
            .collect();
        table.record(other, column).unwrap();
    }
    table
}

/// 2001 reads 100 and 2002 reads 200 at every hour
fn two_level_series() -> ObservationSeries {
    series_over_years(2001, 2002, |t| {
        Some(if t.year() == 2001 { 100.0 } else { 200.0 })
    })
}

fn build(
    options: AverageYearOptions,
    series: &ObservationSeries,
    flags: &FlagTable,
) -> AverageYear {
    AverageYearBuilder::new(options).build(series, flags).unwrap()
}

fn assert_close(actual: Option<f64>, expected: f64) {
    let actual = actual.expect("slot should have a value");
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}

#[test]
fn test_length_without_leap_day() {
    let series = series_over_years(2001, 2003, |_| Some(1.0));
    let avg = build(AverageYearOptions::default(), &series, &quiet_flags(&series));

    assert_eq!(avg.len(), HOURS_WITHOUT_LEAP_DAY);
    assert_eq!(avg.index()[0], ts(2040, 1, 1, 0));
    assert_eq!(avg.index()[8759], ts(2040, 12, 31, 23));
    assert!(avg.index().iter().all(|t| !(t.month() == 2 && t.day() == 29)));
}

#[test]
fn test_length_with_leap_day() {
    // No leap year in the input: Feb 29 is filled from Feb 28 23:00 and Mar 1 00:00
    let series = series_over_years(2001, 2002, |t| Some(t.hour() as f64));
    let options = AverageYearOptions::default().with_leap_day();
    let avg = build(options, &series, &quiet_flags(&series));

    assert_eq!(avg.len(), 8784);
    assert_close(avg.value_at(2, 29, 0), 11.5);
    assert_close(avg.value_at(2, 29, 12), 11.5);
    assert_close(avg.value_at(3, 1, 12), 12.0);
}

#[test]
fn test_index_strictly_increasing_without_duplicates() {
    let series = series_over_years(2003, 2004, |_| Some(2.0));
    let avg = build(
        AverageYearOptions::default().with_leap_day(),
        &series,
        &quiet_flags(&series),
    );

    assert!(avg.index().windows(2).all(|w| w[1] - w[0] == TimeDelta::hours(1)));
}

#[test]
fn test_without_qc_slot_is_plain_mean_across_years() {
    let series = series_over_years(2001, 2003, |t| {
        Some(t.year() as f64 * 0.5 + t.hour() as f64 + t.ordinal() as f64 / 7.0)
    });
    let options = AverageYearOptions::default().without_quality_control();
    let avg = build(options, &series, &FlagTable::default());

    for (month, day, hour) in [(1, 1, 0), (6, 21, 12), (12, 31, 23), (3, 1, 5)] {
        let raw: Vec<f64> = series
            .records()
            .iter()
            .filter(|r| {
                r.timestamp.month() == month
                    && r.timestamp.day() == day
                    && r.timestamp.hour() == hour
            })
            .filter_map(|r| r.measured)
            .collect();
        let expected = raw.iter().sum::<f64>() / raw.len() as f64;
        assert_close(avg.value_at(month, day, hour), expected);
    }
}

#[test]
fn test_qc_excludes_automatic_flags() {
    let series = two_level_series();
    let flags = flags_at(&series, Rule::U1, &[ts(2001, 7, 4, 12)]);

    let avg = build(AverageYearOptions::default(), &series, &flags);

    assert_close(avg.value_at(7, 4, 12), 200.0);
    assert_close(avg.value_at(7, 4, 13), 150.0);
}

#[test]
fn test_qc_keeps_visual_review_flags() {
    let series = two_level_series();

    for rule in [Rule::Offset, Rule::Consistency] {
        let flags = flags_at(&series, rule, &[ts(2001, 7, 4, 12)]);
        let avg = build(AverageYearOptions::default(), &series, &flags);
        assert_close(avg.value_at(7, 4, 12), 150.0);
    }
}

#[test]
fn test_qc_off_ignores_flags() {
    let series = two_level_series();
    let flags = flags_at(&series, Rule::L2, &[ts(2001, 7, 4, 12)]);

    let avg = build(
        AverageYearOptions::default().without_quality_control(),
        &series,
        &flags,
    );

    assert_close(avg.value_at(7, 4, 12), 150.0);
}

#[test]
fn test_visual_exclusion_removes_whole_days() {
    let series = two_level_series();
    let exclusions = vec![
        ExclusionRange::parse("2001-05-25", "2001-05-25").unwrap(),
        // Outside the series: no effect
        ExclusionRange::parse("1980-01-01", "1980-12-31").unwrap(),
    ];
    let options = AverageYearOptions::default().with_exclusions(exclusions);

    let avg = build(options, &series, &quiet_flags(&series));

    for hour in 0..24 {
        assert_close(avg.value_at(5, 25, hour), 200.0);
    }
    assert_close(avg.value_at(5, 26, 0), 150.0);
}

#[test]
fn test_date_range_restricts_input() {
    let series = two_level_series();
    let range = DateRange::parse(Some("2002-01-01"), None).unwrap();
    let options = AverageYearOptions::default().with_range(range);

    let avg = build(options, &series, &quiet_flags(&series));

    assert!(avg.values().iter().all(|v| *v == Some(200.0)));
}

#[test]
fn test_empty_slot_filled_from_neighbours() {
    // 2001-03-10 11:00 is 0.4 and 13:00 is 0.6; 12:00 is missing in every year
    let series = series_over_years(2001, 2001, |t| {
        if t.month() == 3 && t.day() == 10 {
            match t.hour() {
                12 => None,
                11 => Some(0.4),
                13 => Some(0.6),
                _ => Some(1.0),
            }
        } else {
            Some(1.0)
        }
    });

    let avg = build(AverageYearOptions::default(), &series, &quiet_flags(&series));

    assert_close(avg.value_at(3, 10, 12), 0.5);
}

#[test]
fn test_partial_input_still_covers_whole_year() {
    let series = series_over_years(2001, 2001, |_| Some(3.0));
    let range = DateRange::parse(Some("2001-06-01"), Some("2001-06-30")).unwrap();
    let avg = build(
        AverageYearOptions::default().with_range(range),
        &series,
        &quiet_flags(&series),
    );

    assert_eq!(avg.len(), 8760);
    // Leading slots take the first value only; no wrap from December
    assert_close(avg.value_at(1, 1, 0), 3.0);
    assert_close(avg.value_at(12, 31, 23), 3.0);
}

#[test]
fn test_empty_series_gives_all_null_profile() {
    let series = ObservationSeries::default();
    let avg = build(AverageYearOptions::default(), &series, &FlagTable::default());

    assert_eq!(avg.len(), 8760);
    assert!(avg.values().iter().all(Option::is_none));
    assert_eq!(avg.total(), None);
}

#[test]
fn test_misaligned_flags_rejected() {
    let series = series_over_years(2001, 2001, |_| Some(3.0));
    let result = AverageYearBuilder::default().build(&series, &FlagTable::default());
    assert!(matches!(result, Err(SolarQcError::DataIntegrity { .. })));
}

#[test]
fn test_monthly_mean_daily_totals() {
    let series = series_over_years(2001, 2001, |t| {
        Some(if t.month() == 1 { 1.0 } else { 2.0 })
    });
    let avg = build(AverageYearOptions::default(), &series, &quiet_flags(&series));

    let monthly = avg.monthly_mean_daily_totals();

    assert_eq!(monthly.len(), 12);
    assert_eq!(monthly[0].0, 1);
    assert_close(monthly[0].1, 24.0);
    assert_close(monthly[5].1, 48.0);
    assert_close(avg.total(), 31.0 * 24.0 + 334.0 * 48.0);
}
