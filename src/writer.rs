//! Output writing for flag tables, average years and summaries.
//!
//! Results are converted to polars DataFrames with a formatted `time`
//! column and written as `;`-separated CSV or Snappy-compressed Parquet.

use crate::average_year::AverageYear;
use crate::constants::{OUTPUT_TIMESTAMP_FORMAT, columns};
use crate::error::Result;
use crate::flags::FlagTable;
use crate::summary::{MissingPeriod, SummaryTable};
use chrono::NaiveDateTime;
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File format of written results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }
}

fn format_times(index: &[NaiveDateTime]) -> Vec<String> {
    index
        .iter()
        .map(|t| t.format(OUTPUT_TIMESTAMP_FORMAT).to_string())
        .collect()
}

/// Flag table as `time` plus one boolean column per rule
pub fn flag_table_frame(flags: &FlagTable) -> Result<DataFrame> {
    let mut frame_columns = vec![Column::new(columns::TIME.into(), format_times(flags.index()))];
    for (rule, column) in flags.columns() {
        frame_columns.push(Column::new(rule.name().into(), column));
    }
    Ok(DataFrame::new(frame_columns)?)
}

/// Average year as `time` and `avg`
pub fn average_year_frame(average: &AverageYear) -> Result<DataFrame> {
    Ok(DataFrame::new(vec![
        Column::new(columns::TIME.into(), format_times(average.index())),
        Column::new(columns::AVERAGE.into(), average.values()),
    ])?)
}

/// Summary table with its label column first
pub fn summary_frame(table: &SummaryTable) -> Result<DataFrame> {
    let labels: Vec<&str> = table.rows.iter().map(|r| r.label.as_str()).collect();
    let mut frame_columns = vec![Column::new(table.label_header.as_str().into(), labels)];
    for (position, name) in table.columns.iter().enumerate() {
        let values: Vec<Option<f64>> = table.rows.iter().map(|r| r.values[position]).collect();
        frame_columns.push(Column::new(name.as_str().into(), values));
    }
    Ok(DataFrame::new(frame_columns)?)
}

/// Missing periods as `start`, `end` and `hours`
pub fn missing_periods_frame(periods: &[MissingPeriod]) -> Result<DataFrame> {
    let starts: Vec<NaiveDateTime> = periods.iter().map(|p| p.start).collect();
    let ends: Vec<NaiveDateTime> = periods.iter().map(|p| p.end).collect();
    let hours: Vec<i64> = periods.iter().map(MissingPeriod::hours).collect();
    Ok(DataFrame::new(vec![
        Column::new("start".into(), format_times(&starts)),
        Column::new("end".into(), format_times(&ends)),
        Column::new("hours".into(), hours),
    ])?)
}

/// Writes DataFrames in one output format
#[derive(Debug, Clone)]
pub struct OutputWriter {
    format: OutputFormat,
    separator: u8,
}

impl OutputWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            separator: b';',
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// `<dir>/<stem>.<extension>`
    pub fn path_for(&self, dir: &Path, stem: &str) -> PathBuf {
        dir.join(format!("{}.{}", stem, self.format.extension()))
    }

    /// Write a frame, creating parent directories as needed
    pub fn write(&self, df: &mut DataFrame, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = File::create(path)?;
        match self.format {
            OutputFormat::Csv => {
                CsvWriter::new(&mut file)
                    .include_header(true)
                    .with_separator(self.separator)
                    .finish(df)?;
            }
            OutputFormat::Parquet => {
                ParquetWriter::new(&mut file)
                    .with_compression(ParquetCompression::Snappy)
                    .finish(df)?;
            }
        }

        debug!("Wrote {} rows to {}", df.height(), path.display());
        Ok(())
    }

    pub fn write_flags(&self, flags: &FlagTable, path: &Path) -> Result<()> {
        let mut df = flag_table_frame(flags)?;
        self.write(&mut df, path)?;
        info!("Flag table written to {}", path.display());
        Ok(())
    }

    pub fn write_average_year(&self, average: &AverageYear, path: &Path) -> Result<()> {
        let mut df = average_year_frame(average)?;
        self.write(&mut df, path)?;
        info!("Average year written to {}", path.display());
        Ok(())
    }

    pub fn write_summary(&self, table: &SummaryTable, path: &Path) -> Result<()> {
        let mut df = summary_frame(table)?;
        self.write(&mut df, path)
    }

    pub fn write_missing_periods(&self, periods: &[MissingPeriod], path: &Path) -> Result<()> {
        let mut df = missing_periods_frame(periods)?;
        self.write(&mut df, path)
    }
}

impl Default for OutputWriter {
    fn default() -> Self {
        Self::new(OutputFormat::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::Rule;
    use crate::summary::SummaryRow;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn ts(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2001, 6, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn sample_flags() -> FlagTable {
        let mut flags = FlagTable::new(vec![ts(10), ts(11)]);
        flags.record(Rule::U1, vec![false, true]).unwrap();
        flags.record(Rule::MissingValues, vec![true, false]).unwrap();
        flags
    }

    #[test]
    fn test_flag_table_frame_layout() {
        let df = flag_table_frame(&sample_flags()).unwrap();

        let names: Vec<String> = df.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["time", "U1", "Missing values"]);
        assert_eq!(df.height(), 2);
        let times = df.column("time").unwrap().str().unwrap();
        assert_eq!(times.get(1), Some("2001-06-01 11:00:00"));
    }

    #[test]
    fn test_csv_output() {
        let dir = TempDir::new().unwrap();
        let writer = OutputWriter::new(OutputFormat::Csv);
        let path = writer.path_for(&dir.path().join("flags"), "Aas");

        writer.write_flags(&sample_flags(), &path).unwrap();

        assert!(path.ends_with("flags/Aas.csv"));
        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some("time;U1;Missing values"));
        assert_eq!(lines.next(), Some("2001-06-01 10:00:00;false;true"));
    }

    #[test]
    fn test_parquet_output_reads_back() {
        let dir = TempDir::new().unwrap();
        let writer = OutputWriter::new(OutputFormat::Parquet);
        let path = writer.path_for(dir.path(), "Aas");

        writer.write_flags(&sample_flags(), &path).unwrap();

        let df = ParquetReader::new(File::open(&path).unwrap())
            .finish()
            .unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 3);
    }

    #[test]
    fn test_summary_frame_keeps_nulls() {
        let table = SummaryTable {
            label_header: "Month".to_string(),
            columns: vec!["Offset".to_string()],
            rows: vec![
                SummaryRow {
                    label: "January".to_string(),
                    values: vec![Some(12.5)],
                },
                SummaryRow {
                    label: "February".to_string(),
                    values: vec![None],
                },
            ],
        };

        let df = summary_frame(&table).unwrap();

        assert_eq!(df.column("Month").unwrap().str().unwrap().get(0), Some("January"));
        let offset = df.column("Offset").unwrap().f64().unwrap();
        assert_eq!(offset.get(0), Some(12.5));
        assert_eq!(offset.get(1), None);
    }

    #[test]
    fn test_missing_periods_frame() {
        let periods = [MissingPeriod {
            start: ts(3),
            end: ts(5),
        }];

        let df = missing_periods_frame(&periods).unwrap();

        assert_eq!(df.column("hours").unwrap().i64().unwrap().get(0), Some(3));
        assert_eq!(
            df.column("end").unwrap().str().unwrap().get(0),
            Some("2001-06-01 05:00:00")
        );
    }
}
