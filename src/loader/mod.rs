//! Station data loading.
//!
//! A station is stored as three `;`-separated files under the data root:
//!
//! | File | Columns |
//! |------|---------|
//! | `raw_data/<name>.csv` | `time_measured`, `qo` |
//! | `toa/<name>toa.csv` | `time`, `toa` |
//! | `clear_sky/<name>clear.csv` | `time`, `sza`, `clear_sky` |
//!
//! The loader reads all three, joins them on the hourly index they share,
//! turns instrument sentinel codes into nulls and optionally drops partial
//! first and last years.

pub mod alignment;
pub mod reader;


use crate::config::{LoaderConfig, SolarQcConfig};
use crate::constants::{
    CLEAR_SKY_DIR, CLEAR_SKY_FILE_SUFFIX, RAW_DATA_DIR, TOA_DIR, TOA_FILE_SUFFIX, columns,
};
use crate::error::{Result, SolarQcError};
use crate::models::{ObservationSeries, StationMetadata};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Locations of the three input files of one station
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationFiles {
    pub raw: PathBuf,
    pub toa: PathBuf,
    pub clear_sky: PathBuf,
}

impl StationFiles {
    pub fn for_station(data_dir: &Path, name: &str) -> Self {
        Self {
            raw: data_dir.join(RAW_DATA_DIR).join(format!("{}.csv", name)),
            toa: data_dir
                .join(TOA_DIR)
                .join(format!("{}{}", name, TOA_FILE_SUFFIX)),
            clear_sky: data_dir
                .join(CLEAR_SKY_DIR)
                .join(format!("{}{}", name, CLEAR_SKY_FILE_SUFFIX)),
        }
    }

    /// Paths that do not exist on disk
    pub fn missing(&self) -> Vec<&Path> {
        [&self.raw, &self.toa, &self.clear_sky]
            .into_iter()
            .filter(|p| !p.exists())
            .map(PathBuf::as_path)
            .collect()
    }
}

/// A station's metadata and its aligned, cleaned series
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedStation {
    pub metadata: StationMetadata,
    pub series: ObservationSeries,
    /// Measured values replaced by null because they matched a sentinel
    pub sentinels_replaced: usize,
    /// Calendar years dropped as incomplete
    pub trimmed_years: Vec<i32>,
}

/// Loads station series from the configured data root
#[derive(Debug, Clone)]
pub struct StationLoader {
    config: SolarQcConfig,
}

impl StationLoader {
    pub fn new(config: SolarQcConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolarQcConfig {
        &self.config
    }

    pub fn settings(&self) -> &LoaderConfig {
        &self.config.loader
    }

    /// File locations for a station name
    pub fn files(&self, name: &str) -> StationFiles {
        StationFiles::for_station(&self.config.data_dir, name)
    }

    /// Load a registered station by name
    pub fn load(&self, name: &str) -> Result<LoadedStation> {
        let metadata = self.config.station(name)?.clone();
        let files = self.files(&metadata.name);
        self.load_files(metadata, &files)
    }

    /// Load a station from explicit file locations
    pub fn load_files(&self, metadata: StationMetadata, files: &StationFiles) -> Result<LoadedStation> {
        let start_time = Instant::now();
        let settings = self.settings();
        let separator = settings.separator_byte()?;

        info!("Loading station {} (id {})", metadata.name, metadata.id);

        let raw = reader::read_timed_columns(
            &files.raw,
            separator,
            columns::RAW_TIME,
            &[columns::MEASURED],
        )?;
        let toa = reader::read_timed_columns(&files.toa, separator, columns::TIME, &[columns::TOA])?;
        let clear_sky = reader::read_timed_columns(
            &files.clear_sky,
            separator,
            columns::TIME,
            &[columns::ZENITH, columns::CLEAR_SKY],
        )?;
        debug!(
            "Read {} measured, {} TOA and {} clear-sky rows",
            raw.len(),
            toa.len(),
            clear_sky.len()
        );

        let mut series = alignment::align(&raw, &toa, &clear_sky)?;

        let sentinels_replaced = series.nullify_sentinels(&settings.sentinels);
        if sentinels_replaced > 0 {
            warn!(
                "Replaced {} sentinel values with null for station {}",
                sentinels_replaced, metadata.name
            );
        }

        let trimmed_years = if settings.remove_partial_years {
            series.trim_partial_years()
        } else {
            Vec::new()
        };
        if !trimmed_years.is_empty() {
            warn!(
                "Removed partial years {:?} from station {}",
                trimmed_years, metadata.name
            );
        }

        if series.is_empty() {
            warn!("Station {} has no overlapping hourly data", metadata.name);
        }

        info!(
            "Loaded {} hourly rows for station {} in {:.2?}",
            series.len(),
            metadata.name,
            start_time.elapsed()
        );

        Ok(LoadedStation {
            metadata,
            series,
            sentinels_replaced,
            trimmed_years,
        })
    }

    /// Registered stations whose three input files all exist
    pub fn available_stations(&self) -> Vec<&StationMetadata> {
        self.config
            .stations
            .iter()
            .filter(|s| self.files(&s.name).missing().is_empty())
            .collect()
    }

    /// Station names with a raw data file, registered or not
    pub fn discover_raw_files(&self) -> Result<Vec<String>> {
        let pattern = self.config.data_dir.join(RAW_DATA_DIR).join("*.csv");
        let pattern = pattern.to_string_lossy();
        let entries = glob::glob(&pattern).map_err(|e| {
            SolarQcError::configuration(format!("invalid data directory pattern '{}': {}", pattern, e))
        })?;

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|path| {
                path.file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
            })
            .collect();
        names.sort();
        Ok(names)
    }
}
