//! The individual quality control tests.
//!
//! Each rule reads the series and returns one boolean per row, true when
//! the row is suspect. A null measured value fails no rule except
//! [`Rule::MissingValues`]; a null model value makes the comparison that
//! needs it false.

use super::daily::daily_clearness;
use super::table::Rule;
use crate::config::QcConfig;
use crate::models::{ObservationRecord, ObservationSeries};

impl Rule {
    /// Evaluate this rule over the whole series
    pub fn evaluate(&self, series: &ObservationSeries, config: &QcConfig) -> Vec<bool> {
        match self {
            Rule::Offset => per_record(series, |r| offset(r, config)),
            Rule::U1 => per_record(series, upper_toa),
            Rule::U2 => per_record(series, |r| upper_clear_sky(r, config)),
            Rule::L1 => lower_daily_mean(series, config),
            Rule::L2 => per_record(series, |r| lower_instantaneous(r, config)),
            Rule::Difference => difference(series, config),
            Rule::Consistency => consistency(series, config),
            Rule::MissingValues => per_record(series, |r| r.measured.is_none()),
        }
    }
}

fn per_record(series: &ObservationSeries, test: impl Fn(&ObservationRecord) -> bool) -> Vec<bool> {
    series.records().iter().map(test).collect()
}

fn offset(record: &ObservationRecord, config: &QcConfig) -> bool {
    let Some(measured) = record.measured else {
        return false;
    };
    let night_reading = measured > config.offset_night_max
        && matches!(record.zenith, Some(z) if z > config.offset_night_zenith);
    night_reading || measured < config.offset_negative_min
}

fn upper_toa(record: &ObservationRecord) -> bool {
    match (record.measured, record.toa) {
        (Some(measured), Some(toa)) => measured > toa,
        _ => false,
    }
}

fn upper_clear_sky(record: &ObservationRecord, config: &QcConfig) -> bool {
    let (Some(measured), Some(clear_sky), Some(zenith)) =
        (record.measured, record.clear_sky, record.zenith)
    else {
        return false;
    };
    if zenith < config.u2_zenith_limit {
        measured > config.u2_high_sun_factor * clear_sky
    } else {
        measured > config.u2_low_sun_factor * clear_sky
    }
}

fn lower_instantaneous(record: &ObservationRecord, config: &QcConfig) -> bool {
    let (Some(measured), Some(toa), Some(zenith)) = (record.measured, record.toa, record.zenith)
    else {
        return false;
    };
    zenith <= config.l2_zenith_limit
        && measured < config.l2_factor * (config.l2_zenith_limit - zenith) * toa
}

fn lower_daily_mean(series: &ObservationSeries, config: &QcConfig) -> Vec<bool> {
    let mut flags = vec![false; series.len()];
    for day in daily_clearness(series) {
        if matches!(day.mean(), Some(mean) if mean < config.l1_min_daily_clearness) {
            for row in &day.rows {
                flags[*row] = true;
            }
        }
    }
    flags
}

fn consistency(series: &ObservationSeries, config: &QcConfig) -> Vec<bool> {
    let mut flags = vec![false; series.len()];
    for day in daily_clearness(series) {
        let (Some(mean), Some(std)) = (day.mean(), day.std()) else {
            continue;
        };
        let too_flat = std < mean / config.consistency_flat_divisor;
        let too_noisy = std > config.consistency_max_std;
        if too_flat || too_noisy {
            for row in &day.rows {
                flags[*row] = true;
            }
        }
    }
    flags
}

fn difference(series: &ObservationSeries, config: &QcConfig) -> Vec<bool> {
    let records = series.records();
    let mut flags = vec![false; records.len()];

    // The first row has no predecessor; its step is defined as 0
    for i in 1..records.len() {
        let step = match (records[i - 1].clearness_index(), records[i].clearness_index()) {
            (Some(previous), Some(current)) => (current - previous).abs(),
            _ => continue,
        };
        let high_sun = matches!(records[i].zenith, Some(z) if z < config.difference_zenith_limit);
        flags[i] = high_sun && step >= config.difference_max_step;
    }

    flags
}
