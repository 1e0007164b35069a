//! Solar QC Library
//!
//! Quality control for hourly solar irradiance series from weather stations.
//!
//! This library provides tools for:
//! - Loading station observations together with modelled top-of-atmosphere
//!   and clear-sky irradiance onto one hourly index
//! - Flagging suspect observations with physical-consistency tests
//! - Building a quality-controlled average year from a multi-year series
//! - Summarising flags per year and month and listing missing periods
//! - Comparing average years with relative error statistics
//! - Writing results as CSV or Parquet

pub mod average_year;
pub mod config;
pub mod constants;
pub mod error;
pub mod flags;
pub mod loader;
pub mod metrics;
pub mod models;
pub mod summary;
pub mod writer;

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use average_year::{AverageYear, AverageYearBuilder, AverageYearOptions};
pub use config::{LoaderConfig, QcConfig, SolarQcConfig, ZeroOutStage};
pub use error::{Result, SolarQcError};
pub use flags::{FlagEngine, FlagTable, Rule};
pub use loader::{LoadedStation, StationLoader};
pub use models::{DateRange, ExclusionRange, ObservationRecord, ObservationSeries, StationMetadata};
pub use summary::{SummaryMode, SummaryReporter};
pub use writer::{OutputFormat, OutputWriter};
