//! Configuration management and validation.
//!
//! Provides the station registry, loader settings and quality control
//! thresholds. Everything is read from one TOML file and passed explicitly
//! to the components that need it.

use crate::constants::{
    APP_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_SENTINELS, DEFAULT_SEPARATOR, thresholds,
};
use crate::error::{Result, SolarQcError};
use crate::flags::Rule;
use crate::models::StationMetadata;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// When the zero-out pre-processing runs relative to the rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroOutStage {
    /// Zero-out first, then evaluate every rule
    #[default]
    BeforeRules,
    /// Evaluate Offset on unmodified values, zero-out, then the other rules
    ///
    /// Not idempotent: a second run over the zeroed series no longer sees
    /// the night values Offset flagged. Run it on a freshly loaded series.
    AfterOffset,
    /// Never zero-out
    Disabled,
}

/// Thresholds and switches for the flag engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QcConfig {
    /// Rules evaluated by the engine, in evaluation order
    pub rules: Vec<Rule>,

    pub zero_out: ZeroOutStage,

    pub offset_night_max: f64,
    pub offset_night_zenith: f64,
    pub offset_negative_min: f64,

    pub u2_high_sun_factor: f64,
    pub u2_low_sun_factor: f64,
    pub u2_zenith_limit: f64,

    pub l1_min_daily_clearness: f64,

    pub l2_zenith_limit: f64,
    pub l2_factor: f64,

    pub difference_max_step: f64,
    pub difference_zenith_limit: f64,

    pub consistency_flat_divisor: f64,
    pub consistency_max_std: f64,
}

impl Default for QcConfig {
    fn default() -> Self {
        Self {
            rules: Rule::ALL.to_vec(),
            zero_out: ZeroOutStage::default(),
            offset_night_max: thresholds::OFFSET_NIGHT_MAX,
            offset_night_zenith: thresholds::OFFSET_NIGHT_ZENITH,
            offset_negative_min: thresholds::OFFSET_NEGATIVE_MIN,
            u2_high_sun_factor: thresholds::U2_HIGH_SUN_FACTOR,
            u2_low_sun_factor: thresholds::U2_LOW_SUN_FACTOR,
            u2_zenith_limit: thresholds::U2_ZENITH_LIMIT,
            l1_min_daily_clearness: thresholds::L1_MIN_DAILY_CLEARNESS,
            l2_zenith_limit: thresholds::L2_ZENITH_LIMIT,
            l2_factor: thresholds::L2_FACTOR,
            difference_max_step: thresholds::DIFFERENCE_MAX_STEP,
            difference_zenith_limit: thresholds::DIFFERENCE_ZENITH_LIMIT,
            consistency_flat_divisor: thresholds::CONSISTENCY_FLAT_DIVISOR,
            consistency_max_std: thresholds::CONSISTENCY_MAX_STD,
        }
    }
}

impl QcConfig {
    /// Evaluate only the given rules
    pub fn with_rules(mut self, rules: impl Into<Vec<Rule>>) -> Self {
        self.rules = rules.into();
        self
    }

    /// Choose when zero-out runs
    pub fn with_zero_out(mut self, stage: ZeroOutStage) -> Self {
        self.zero_out = stage;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for rule in &self.rules {
            if !seen.insert(rule) {
                return Err(SolarQcError::configuration(format!(
                    "rule '{}' listed more than once",
                    rule
                )));
            }
        }
        if self.u2_high_sun_factor <= 0.0 || self.u2_low_sun_factor <= 0.0 {
            return Err(SolarQcError::configuration(
                "U2 clear-sky factors must be positive",
            ));
        }
        if self.consistency_flat_divisor <= 0.0 {
            return Err(SolarQcError::configuration(
                "consistency divisor must be positive",
            ));
        }
        Ok(())
    }
}

/// How station files are found and read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Field separator of all three station files
    pub separator: char,

    /// Drop incomplete first and last calendar years
    pub remove_partial_years: bool,

    /// Measured values treated as missing
    pub sentinels: Vec<f64>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR,
            remove_partial_years: true,
            sentinels: DEFAULT_SENTINELS.to_vec(),
        }
    }
}

impl LoaderConfig {
    /// Keep incomplete first and last years
    pub fn with_partial_years(mut self) -> Self {
        self.remove_partial_years = false;
        self
    }

    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    /// Separator as the single byte polars expects
    ///
    /// Only ASCII characters are one byte in UTF-8 files.
    pub fn separator_byte(&self) -> Result<u8> {
        if !self.separator.is_ascii() {
            return Err(SolarQcError::configuration(format!(
                "separator '{}' is not a single-byte character",
                self.separator
            )));
        }
        Ok(self.separator as u8)
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolarQcConfig {
    /// Root directory holding raw_data/, toa/ and clear_sky/
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub loader: LoaderConfig,

    #[serde(default)]
    pub qc: QcConfig,

    /// Station registry
    #[serde(default, rename = "station")]
    pub stations: Vec<StationMetadata>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for SolarQcConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            loader: LoaderConfig::default(),
            qc: QcConfig::default(),
            stations: Vec::new(),
        }
    }
}

impl SolarQcConfig {
    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: SolarQcConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Read configuration from a file.
    ///
    /// A relative `data_dir` is resolved against the file's directory.
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&contents)?;

        if config.data_dir.is_relative() {
            if let Some(parent) = path.parent() {
                config.data_dir = parent.join(&config.data_dir);
            }
        }

        debug!(
            "Loaded configuration from {} ({} stations, data in {})",
            path.display(),
            config.stations.len(),
            config.data_dir.display()
        );
        Ok(config)
    }

    /// Candidate locations of the config file, most specific first
    pub fn default_locations() -> Vec<PathBuf> {
        let mut locations = vec![PathBuf::from("config").join(CONFIG_FILE_NAME)];
        if let Some(config_dir) = dirs::config_dir() {
            locations.push(config_dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME));
        }
        locations
    }

    /// Load from the first default location that exists, if any
    pub fn discover() -> Result<Option<Self>> {
        Self::default_locations()
            .iter()
            .find(|p| p.exists())
            .map(|path| Self::from_path(path))
            .transpose()
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_qc(mut self, qc: QcConfig) -> Self {
        self.qc = qc;
        self
    }

    pub fn with_loader(mut self, loader: LoaderConfig) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_station(mut self, station: StationMetadata) -> Self {
        self.stations.push(station);
        self
    }

    /// Look up a station by name (case-insensitive)
    pub fn station(&self, name: &str) -> Result<&StationMetadata> {
        self.stations
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| SolarQcError::StationNotFound {
                name: name.to_string(),
            })
    }

    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for station in &self.stations {
            if station.name.trim().is_empty() {
                return Err(SolarQcError::configuration("station with empty name"));
            }
            if !names.insert(station.name.to_lowercase()) {
                return Err(SolarQcError::configuration(format!(
                    "station '{}' defined more than once",
                    station.name
                )));
            }
        }
        self.loader.separator_byte()?;
        self.qc.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
data_dir = "/srv/solar"

[loader]
remove_partial_years = false

[qc]
zero_out = "after_offset"
rules = ["Offset", "U1", "MissingValues"]

[[station]]
name = "Aas"
id = 11
lat = 59.66
lon = 10.78
hgt = 94.0

[[station]]
name = "Kise"
id = 17
lat = 60.77
lon = 10.81
"#;

    #[test]
    fn test_parse_full_config() {
        let config = SolarQcConfig::from_toml_str(SAMPLE).unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/srv/solar"));
        assert!(!config.loader.remove_partial_years);
        assert_eq!(config.loader.separator, ';');
        assert_eq!(config.qc.zero_out, ZeroOutStage::AfterOffset);
        assert_eq!(
            config.qc.rules,
            vec![Rule::Offset, Rule::U1, Rule::MissingValues]
        );
        assert_eq!(config.qc.l1_min_daily_clearness, 0.03);
        assert_eq!(config.stations.len(), 2);
        assert_eq!(config.stations[1].altitude, 0.0);
    }

    #[test]
    fn test_station_lookup_is_case_insensitive() {
        let config = SolarQcConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.station("aas").unwrap().id, 11);
        assert!(matches!(
            config.station("Bergen"),
            Err(SolarQcError::StationNotFound { .. })
        ));
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        let config = SolarQcConfig::from_toml_str("").unwrap();
        assert_eq!(config, SolarQcConfig::default());
        assert_eq!(config.qc.rules.len(), 8);
        assert_eq!(config.qc.zero_out, ZeroOutStage::BeforeRules);
    }

    #[test]
    fn test_duplicate_station_rejected() {
        let toml = r#"
[[station]]
name = "Aas"
id = 1
lat = 0.0
lon = 0.0

[[station]]
name = "AAS"
id = 2
lat = 0.0
lon = 0.0
"#;
        assert!(matches!(
            SolarQcConfig::from_toml_str(toml),
            Err(SolarQcError::Configuration { .. })
        ));
    }

    #[test]
    fn test_duplicate_rule_rejected() {
        let qc = QcConfig::default().with_rules(vec![Rule::U1, Rule::U1]);
        assert!(qc.validate().is_err());
    }

    #[test]
    fn test_multibyte_separator_rejected() {
        let loader = LoaderConfig::default().with_separator('§');
        assert!(loader.separator_byte().is_err());
        let loader = LoaderConfig::default().with_separator('é');
        assert!(loader.separator_byte().is_err());
    }

    #[test]
    fn test_ascii_separators_accepted() {
        assert_eq!(LoaderConfig::default().separator_byte().unwrap(), b';');
        let loader = LoaderConfig::default().with_separator('\t');
        assert_eq!(loader.separator_byte().unwrap(), b'\t');
    }

    #[test]
    fn test_relative_data_dir_resolved_against_config_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("stations.toml");
        std::fs::write(&path, "data_dir = \"data\"\n").unwrap();

        let config = SolarQcConfig::from_path(&path).unwrap();

        assert_eq!(config.data_dir, dir.path().join("data"));
    }
}
