//! Error handling for solar irradiance quality control.
//!
//! Provides error types with context for station data loading,
//! series validation, configuration and output failures.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SolarQcError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Station not found in registry: {name}")]
    StationNotFound { name: String },

    #[error("Station data file not found: {path}")]
    DataFileNotFound { path: PathBuf },

    #[error("Column '{column}' missing from file: {path}")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Invalid timestamp '{value}'")]
    InvalidTimestamp { value: String },

    #[error("Invalid numeric value '{value}' in column '{column}'")]
    InvalidValue { column: String, value: String },

    #[error("Data integrity error: {reason}")]
    DataIntegrity { reason: String },
}

impl SolarQcError {
    /// Create a data integrity error
    pub fn data_integrity(reason: impl Into<String>) -> Self {
        Self::DataIntegrity {
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SolarQcError>;
