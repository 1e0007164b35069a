//! Command-line argument definitions for solar-qc
//!
//! This module defines the CLI interface using the clap derive API.

use crate::error::Result;
use crate::models::{DateRange, ExclusionRange};
use crate::writer::OutputFormat;
use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the solar irradiance quality control tool
#[derive(Debug, Clone, Parser)]
#[command(
    name = "solar-qc",
    version,
    about = "Quality control and average-year reconstruction for hourly solar irradiance series",
    long_about = "Flags suspect hourly global irradiance observations with physical-consistency \
                  tests against modelled top-of-atmosphere and clear-sky irradiance, builds a \
                  quality-controlled average year and reports flag statistics per station."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file with the station registry and thresholds
    ///
    /// Defaults to ./config/stations.toml, then the platform config directory.
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Override the data root holding raw_data/, toa/ and clear_sky/
    #[arg(long = "data-dir", value_name = "DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Increase logging verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    /// Log level derived from the verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    pub fn show_progress(&self) -> bool {
        !self.quiet
    }
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Run every quality control rule and write the flag table
    Flag(FlagArgs),
    /// Build a quality-controlled average year
    AverageYear(AverageYearArgs),
    /// Report flag statistics
    Summary(SummaryArgs),
    /// List periods with missing measurements
    Gaps(GapsArgs),
    /// List registered stations and their data files
    Stations,
    /// Compare two average-year files
    Compare(CompareArgs),
}

/// Optional inclusive date range
#[derive(Debug, Clone, Default, ClapArgs)]
pub struct RangeArgs {
    /// First timestamp or date to include
    #[arg(long, value_name = "DATE")]
    pub start: Option<String>,

    /// Last timestamp or date to include (a date covers the whole day)
    #[arg(long, value_name = "DATE")]
    pub end: Option<String>,
}

impl RangeArgs {
    pub fn to_range(&self) -> Result<DateRange> {
        DateRange::parse(self.start.as_deref(), self.end.as_deref())
    }
}

/// Arguments for the flag command
#[derive(Debug, Clone, Parser)]
pub struct FlagArgs {
    /// Station name from the registry
    #[arg(value_name = "STATION", required_unless_present = "all")]
    pub station: Option<String>,

    /// Flag every registered station
    #[arg(long, conflicts_with = "station")]
    pub all: bool,

    /// Directory for flag tables
    #[arg(short, long, value_name = "DIR", default_value = "output/flags")]
    pub output: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,
}

/// Arguments for the average-year command
#[derive(Debug, Clone, Parser)]
pub struct AverageYearArgs {
    #[arg(value_name = "STATION")]
    pub station: String,

    #[command(flatten)]
    pub range: RangeArgs,

    /// Period removed after visual review, as START,END (repeatable)
    #[arg(long, value_name = "START,END", value_parser = parse_exclusion)]
    pub exclude: Vec<ExclusionRange>,

    /// Average raw values without excluding flagged hours
    #[arg(long)]
    pub no_quality_control: bool,

    /// Keep February 29 in the output
    #[arg(long)]
    pub leap_day: bool,

    /// Output file (defaults to output/<STATION>_average_year.<format>)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,
}

/// How summary figures are grouped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Grouping {
    #[default]
    Total,
    Year,
    Month,
}

/// Arguments for the summary command
#[derive(Debug, Clone, Parser)]
pub struct SummaryArgs {
    #[arg(value_name = "STATION")]
    pub station: String,

    #[arg(long, value_enum, default_value_t = Grouping::Total)]
    pub by: Grouping,

    /// Report percentages instead of counts
    #[arg(long)]
    pub percent: bool,

    #[command(flatten)]
    pub range: RangeArgs,

    /// Also write the table to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,
}

/// Arguments for the gaps command
#[derive(Debug, Clone, Parser)]
pub struct GapsArgs {
    #[arg(value_name = "STATION")]
    pub station: String,

    #[command(flatten)]
    pub range: RangeArgs,

    /// Also write the periods to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,
}

/// Arguments for the compare command
#[derive(Debug, Clone, Parser)]
pub struct CompareArgs {
    /// Average-year CSV treated as the model
    #[arg(value_name = "MODEL")]
    pub model: PathBuf,

    /// Average-year CSV treated as the reference measurement
    #[arg(value_name = "MEASURED")]
    pub measured: PathBuf,
}

/// Parse `START,END` into an exclusion range
fn parse_exclusion(value: &str) -> std::result::Result<ExclusionRange, String> {
    let (start, end) = value
        .split_once(',')
        .ok_or_else(|| format!("expected START,END but got '{}'", value))?;
    ExclusionRange::parse(start, end).map_err(|e| e.to_string())
}
