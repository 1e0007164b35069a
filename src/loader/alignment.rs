//! Joining the measured, TOA and clear-sky inputs on one hourly index.

use super::reader::TimedColumns;
use crate::error::Result;
use crate::models::{ObservationRecord, ObservationSeries};
use chrono::TimeDelta;
use tracing::{debug, warn};

// Positions of the value columns inside each input, in the order the
// loader requests them
pub const MEASURED: usize = 0;
pub const TOA: usize = 0;
pub const ZENITH: usize = 0;
pub const CLEAR_SKY: usize = 1;

/// Build the hourly series covered by all three inputs.
///
/// The index runs from the latest first timestamp to the earliest last
/// timestamp. Hours an input has no row for are null in that field.
pub fn align(
    raw: &TimedColumns,
    toa: &TimedColumns,
    clear_sky: &TimedColumns,
) -> Result<ObservationSeries> {
    let inputs = [raw, toa, clear_sky];
    if inputs.iter().any(|input| input.is_empty()) {
        warn!("At least one station input is empty, nothing to align");
        return Ok(ObservationSeries::default());
    }

    let start = inputs.iter().filter_map(|i| i.first_timestamp()).max();
    let end = inputs.iter().filter_map(|i| i.last_timestamp()).min();
    let (Some(start), Some(end)) = (start, end) else {
        return Ok(ObservationSeries::default());
    };
    if start > end {
        warn!(
            "Station inputs do not overlap (common span would be {} to {})",
            start, end
        );
        return Ok(ObservationSeries::default());
    }

    let hours = (end - start).num_hours();
    let records = (0..=hours)
        .map(|h| {
            let timestamp = start + TimeDelta::hours(h);
            ObservationRecord {
                timestamp,
                measured: raw.value(timestamp, MEASURED),
                toa: toa.value(timestamp, TOA),
                clear_sky: clear_sky.value(timestamp, CLEAR_SKY),
                zenith: clear_sky.value(timestamp, ZENITH),
            }
        })
        .collect();

    let series = ObservationSeries::new(records)?;
    debug!(
        "Aligned {} hourly rows from {} to {}",
        series.len(),
        start,
        end
    );
    Ok(series)
}
