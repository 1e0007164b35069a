//! Application constants for solar irradiance quality control
//!
//! This module contains default thresholds, file layout conventions and
//! calendar constants used throughout the crate.

// =============================================================================
// Station File Layout
// =============================================================================

/// Directory (under the data root) holding raw station observations
pub const RAW_DATA_DIR: &str = "raw_data";

/// Directory holding modelled top-of-atmosphere irradiance
pub const TOA_DIR: &str = "toa";

/// Directory holding modelled clear-sky irradiance and zenith angle
pub const CLEAR_SKY_DIR: &str = "clear_sky";

/// Suffix appended to the station name for the TOA file
pub const TOA_FILE_SUFFIX: &str = "toa.csv";

/// Suffix appended to the station name for the clear-sky file
pub const CLEAR_SKY_FILE_SUFFIX: &str = "clear.csv";

/// Default field separator of every station file
pub const DEFAULT_SEPARATOR: char = ';';

/// Default config file name searched for by the CLI
pub const CONFIG_FILE_NAME: &str = "stations.toml";

/// Application directory name used under the platform config directory
pub const APP_DIR_NAME: &str = "solar-qc";

// =============================================================================
// Column Names
// =============================================================================

pub mod columns {
    pub const RAW_TIME: &str = "time_measured";
    pub const MEASURED: &str = "qo";
    pub const TIME: &str = "time";
    pub const TOA: &str = "toa";
    pub const ZENITH: &str = "sza";
    pub const CLEAR_SKY: &str = "clear_sky";
    pub const AVERAGE: &str = "avg";
}

/// Cell contents read as a missing value
pub const NULL_TOKENS: &[&str] = &["", "NA", "NaN", "nan", "null", "NULL"];

/// Instrument codes written instead of a missing value
pub const DEFAULT_SENTINELS: &[f64] = &[-6999.0, 6999.0];

/// Timestamp formats accepted by the loader, tried in order
pub const TIMESTAMP_FORMATS: &[&str] = &[
    "%d.%m.%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Date-only formats, used for exclusion lists and date ranges
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y"];

/// Timestamp format used for every written output
pub const OUTPUT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// =============================================================================
// Quality Control Thresholds
// =============================================================================

pub mod thresholds {
    /// Offset: night readings above this are suspect (W/m²)
    pub const OFFSET_NIGHT_MAX: f64 = 6.0;
    /// Offset: zenith angle above which it is night (degrees)
    pub const OFFSET_NIGHT_ZENITH: f64 = 93.0;
    /// Offset: readings below this are suspect at any time (W/m²)
    pub const OFFSET_NEGATIVE_MIN: f64 = -12.0;

    /// U2: clear-sky multiplier while the sun is high
    pub const U2_HIGH_SUN_FACTOR: f64 = 1.1;
    /// U2: clear-sky multiplier near the horizon
    pub const U2_LOW_SUN_FACTOR: f64 = 2.0;
    /// U2: zenith angle separating the two multipliers (degrees)
    pub const U2_ZENITH_LIMIT: f64 = 88.0;

    /// L1: minimum daily mean clearness index
    pub const L1_MIN_DAILY_CLEARNESS: f64 = 0.03;

    /// L2: reference zenith angle of the instantaneous lower bound (degrees)
    pub const L2_ZENITH_LIMIT: f64 = 80.0;
    /// L2: scale of the instantaneous lower bound
    pub const L2_FACTOR: f64 = 1e-4;

    /// Difference: largest accepted hour-to-hour clearness index change
    pub const DIFFERENCE_MAX_STEP: f64 = 0.75;
    /// Difference: only tested below this zenith angle (degrees)
    pub const DIFFERENCE_ZENITH_LIMIT: f64 = 80.0;

    /// Consistency: daily std below mean / this divisor is too flat
    pub const CONSISTENCY_FLAT_DIVISOR: f64 = 16.0;
    /// Consistency: daily std above this is too noisy
    pub const CONSISTENCY_MAX_STD: f64 = 0.80;
}

// =============================================================================
// Average Year
// =============================================================================

/// Synthetic leap year every average-year profile is expressed in
pub const SYNTHETIC_YEAR: i32 = 2040;

/// Hour slots in the synthetic year including February 29
pub const HOURS_WITH_LEAP_DAY: usize = 8784;

/// Hour slots in the synthetic year without February 29
pub const HOURS_WITHOUT_LEAP_DAY: usize = 8760;

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];
