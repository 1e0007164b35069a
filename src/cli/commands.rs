//! Command implementations for the solar-qc CLI
//!
//! This module wires the library components together for each subcommand
//! and handles logging setup, progress reporting and console output.

use crate::average_year::{AverageYearBuilder, AverageYearOptions};
use crate::cli::args::{
    Args, AverageYearArgs, Commands, CompareArgs, FlagArgs, GapsArgs, Grouping, SummaryArgs,
};
use crate::config::SolarQcConfig;
use crate::constants::{MONTH_NAMES, columns};
use crate::flags::{FlagEngine, FlagTable};
use crate::loader::{LoadedStation, StationLoader, reader};
use crate::metrics::{Comparison, relative_change};
use crate::summary::{SummaryMode, SummaryReporter, SummaryTable, missing_periods};
use crate::writer::OutputWriter;
use anyhow::{Context, Result};
use colored::*;
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Main command runner
pub fn run(args: Args) -> Result<()> {
    setup_logging(&args)?;
    debug!("Command line arguments: {:?}", args);

    let Some(command) = &args.command else {
        return Ok(());
    };

    let config = load_configuration(&args)?;

    match command {
        Commands::Flag(flag_args) => run_flag(&args, &config, flag_args),
        Commands::AverageYear(avg_args) => run_average_year(&config, avg_args),
        Commands::Summary(summary_args) => run_summary(&config, summary_args),
        Commands::Gaps(gaps_args) => run_gaps(&config, gaps_args),
        Commands::Stations => run_stations(&config),
        Commands::Compare(compare_args) => run_compare(compare_args),
    }
}

/// Set up structured logging based on CLI arguments
fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("solar_qc={}", log_level)));

    // A subscriber set by an earlier run in this process stays in place
    let installed = if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    if installed.is_err() {
        debug!("Logging already initialized, keeping the existing subscriber");
    } else {
        debug!("Logging initialized at level: {}", log_level);
    }
    Ok(())
}

/// Load the configuration file and apply CLI overrides
fn load_configuration(args: &Args) -> Result<SolarQcConfig> {
    let mut config = match &args.config_file {
        Some(path) => {
            info!("Using config file: {}", path.display());
            SolarQcConfig::from_path(path)
                .with_context(|| format!("Failed to load config file {}", path.display()))?
        }
        None => match SolarQcConfig::discover()? {
            Some(config) => config,
            None => {
                warn!("No configuration file found, using defaults with an empty station registry");
                SolarQcConfig::default()
            }
        },
    };

    if let Some(data_dir) = &args.data_dir {
        config.data_dir = data_dir.clone();
    }

    debug!(
        "Data directory: {}, {} registered stations",
        config.data_dir.display(),
        config.stations.len()
    );
    Ok(config)
}

/// Load a station and run the flag engine over it
fn load_and_flag(loader: &StationLoader, station: &str) -> Result<(LoadedStation, FlagTable)> {
    let mut loaded = loader
        .load(station)
        .with_context(|| format!("Failed to load station {}", station))?;
    let engine = FlagEngine::new(loader.config().qc.clone())?;
    let flags = engine
        .run(&mut loaded.series)
        .with_context(|| format!("Quality control failed for station {}", station))?;
    Ok((loaded, flags))
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

fn format_percent(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2} %", v))
}

fn run_flag(args: &Args, config: &SolarQcConfig, flag_args: &FlagArgs) -> Result<()> {
    let start_time = Instant::now();
    let loader = StationLoader::new(config.clone());
    let writer = OutputWriter::new(flag_args.format);

    let stations: Vec<String> = match &flag_args.station {
        Some(name) => vec![name.clone()],
        None => config.stations.iter().map(|s| s.name.clone()).collect(),
    };
    if stations.is_empty() {
        anyhow::bail!("No stations registered in the configuration");
    }

    let progress =
        (stations.len() > 1 && args.show_progress()).then(|| progress_bar(stations.len()));
    let mut failures = 0usize;

    for (i, station) in stations.iter().enumerate() {
        if let Some(pb) = &progress {
            pb.set_position(i as u64);
            pb.set_message(format!("Flagging {}", station));
        }

        let result = load_and_flag(&loader, station).and_then(|(loaded, flags)| {
            let path = writer.path_for(&flag_args.output, &loaded.metadata.name);
            writer.write_flags(&flags, &path)?;
            let reporter = SummaryReporter::new(&loaded.series, &flags)?;
            Ok((path, reporter.pesd(), reporter.visual_review_percent()))
        });

        match result {
            Ok((path, pesd, visual)) => {
                let line = format!(
                    "{} {}  PESD {}  visual review {}  -> {}",
                    "✓".green(),
                    station.bright_cyan(),
                    format_percent(pesd).bright_white(),
                    format_percent(visual).bright_white(),
                    path.display()
                );
                match &progress {
                    Some(pb) => pb.println(line),
                    None => println!("{}", line),
                }
            }
            Err(e) => {
                error!("Failed to flag station {}: {:#}", station, e);
                failures += 1;
            }
        }
    }

    if let Some(pb) = &progress {
        pb.finish_with_message("Flagging complete");
    }

    info!(
        "Flagged {} stations in {}",
        stations.len() - failures,
        HumanDuration(start_time.elapsed())
    );
    if failures > 0 {
        anyhow::bail!("{} of {} stations failed", failures, stations.len());
    }
    Ok(())
}

fn run_average_year(config: &SolarQcConfig, avg_args: &AverageYearArgs) -> Result<()> {
    let loader = StationLoader::new(config.clone());
    let (loaded, flags) = load_and_flag(&loader, &avg_args.station)?;

    let mut options = AverageYearOptions::default()
        .with_range(avg_args.range.to_range()?)
        .with_exclusions(avg_args.exclude.clone());
    if avg_args.no_quality_control {
        options = options.without_quality_control();
    }
    if avg_args.leap_day {
        options = options.with_leap_day();
    }

    let average = AverageYearBuilder::new(options).build(&loaded.series, &flags)?;

    let writer = OutputWriter::new(avg_args.format);
    let path = avg_args.output.clone().unwrap_or_else(|| {
        writer.path_for(
            Path::new("output"),
            &format!("{}_average_year", loaded.metadata.name),
        )
    });
    writer.write_average_year(&average, &path)?;

    println!(
        "\n{} {}",
        "Average year for".bright_green().bold(),
        loaded.metadata.name.bright_cyan().bold()
    );
    println!("{}", "Mean daily total per month (Wh/m²):".bright_white());
    for (month, total) in average.monthly_mean_daily_totals() {
        let name = MONTH_NAMES[(month - 1) as usize];
        let value = total.map_or_else(|| "n/a".to_string(), |t| format!("{:.1}", t));
        println!("   {:<10} {:>10}", name, value);
    }
    if let Some(total) = average.total() {
        println!(
            "   {:<10} {:>10}",
            "Annual".bold(),
            format!("{:.1}", total / 1000.0).bold()
        );
        println!("   (annual total in kWh/m²)");
    }
    println!("Written to {}", path.display());
    Ok(())
}

fn print_table(table: &SummaryTable, mode: SummaryMode) {
    let width = table
        .columns
        .iter()
        .map(|c| c.len())
        .max()
        .unwrap_or(0)
        .max(9);

    let mut header = format!("{:<10}", table.label_header);
    for column in &table.columns {
        header.push_str(&format!(" {:>width$}", column, width = width));
    }
    println!("{}", header.bold());

    for row in &table.rows {
        let mut line = format!("{:<10}", row.label);
        for value in &row.values {
            let cell = match (value, mode) {
                (None, _) => "n/a".to_string(),
                (Some(v), SummaryMode::Counts) => format!("{:.0}", v),
                (Some(v), SummaryMode::Percent) => format!("{:.2}", v),
            };
            line.push_str(&format!(" {:>width$}", cell, width = width));
        }
        println!("{}", line);
    }
}

fn run_summary(config: &SolarQcConfig, summary_args: &SummaryArgs) -> Result<()> {
    let loader = StationLoader::new(config.clone());
    let (loaded, flags) = load_and_flag(&loader, &summary_args.station)?;
    let reporter = SummaryReporter::new(&loaded.series, &flags)?;

    let range = summary_args.range.to_range()?;
    let mode = if summary_args.percent {
        SummaryMode::Percent
    } else {
        SummaryMode::Counts
    };
    let table = match summary_args.by {
        Grouping::Total => reporter.flag_info(&range, mode),
        Grouping::Year => reporter.counts_per_year(&range, mode),
        Grouping::Month => reporter.counts_per_month(&range, mode),
    };

    println!(
        "\n{} {}",
        "Flag summary for".bright_green().bold(),
        loaded.metadata.name.bright_cyan().bold()
    );
    println!(
        "   Erroneous daytime data (PESD): {}",
        format_percent(reporter.pesd()).bright_white()
    );
    println!(
        "   Flagged for visual review:     {}",
        format_percent(reporter.visual_review_percent()).bright_white()
    );
    if !loaded.trimmed_years.is_empty() {
        println!(
            "   {} partial years removed: {:?}",
            "⚠".yellow(),
            loaded.trimmed_years
        );
    }
    println!();
    print_table(&table, mode);

    if let Some(path) = &summary_args.output {
        OutputWriter::new(summary_args.format).write_summary(&table, path)?;
        println!("\nWritten to {}", path.display());
    }
    Ok(())
}

fn run_gaps(config: &SolarQcConfig, gaps_args: &GapsArgs) -> Result<()> {
    let loader = StationLoader::new(config.clone());
    let loaded = loader
        .load(&gaps_args.station)
        .with_context(|| format!("Failed to load station {}", gaps_args.station))?;

    let periods = missing_periods(&loaded.series, &gaps_args.range.to_range()?);
    let hours: i64 = periods.iter().map(|p| p.hours()).sum();

    println!(
        "\n{} {}: {} periods, {} hours",
        "Missing measurements for".bright_green().bold(),
        loaded.metadata.name.bright_cyan().bold(),
        periods.len(),
        hours
    );
    for period in &periods {
        println!(
            "   {}  to  {}  ({} h)",
            period.start,
            period.end,
            period.hours()
        );
    }

    if let Some(path) = &gaps_args.output {
        OutputWriter::new(gaps_args.format).write_missing_periods(&periods, path)?;
        println!("\nWritten to {}", path.display());
    }
    Ok(())
}

fn run_stations(config: &SolarQcConfig) -> Result<()> {
    let loader = StationLoader::new(config.clone());

    println!(
        "{} ({})",
        "Registered stations".bright_green().bold(),
        config.data_dir.display()
    );
    if config.stations.is_empty() {
        println!("   none");
    }
    for station in &config.stations {
        let missing = loader.files(&station.name).missing().len();
        let status = if missing == 0 {
            "data ok".green()
        } else {
            format!("{} files missing", missing).red()
        };
        println!(
            "   {:>4}  {:<16} {:>8.3} {:>8.3} {:>7.1} m  {}",
            station.id,
            station.name.bright_cyan(),
            station.latitude,
            station.longitude,
            station.altitude,
            status
        );
    }

    let unregistered: Vec<String> = loader
        .discover_raw_files()?
        .into_iter()
        .filter(|name| config.station(name).is_err())
        .collect();
    if !unregistered.is_empty() {
        println!(
            "\n{} {}",
            "Raw data without registry entry:".yellow(),
            unregistered.join(", ")
        );
    }
    Ok(())
}

/// Read the `avg` column of an average-year CSV keyed by timestamp
fn read_profile(path: &Path) -> Result<reader::TimedColumns> {
    reader::read_timed_columns(path, b';', columns::TIME, &[columns::AVERAGE])
        .with_context(|| format!("Failed to read average year {}", path.display()))
}

fn run_compare(compare_args: &CompareArgs) -> Result<()> {
    let model = read_profile(&compare_args.model)?;
    let measured = read_profile(&compare_args.measured)?;

    let (model_values, measured_values): (Vec<Option<f64>>, Vec<Option<f64>>) = model
        .rows
        .keys()
        .filter(|timestamp| measured.rows.contains_key(timestamp))
        .map(|timestamp| (model.value(*timestamp, 0), measured.value(*timestamp, 0)))
        .unzip();

    let comparison = Comparison::compute(&model_values, &measured_values);
    let model_total: f64 = model_values.iter().flatten().sum();
    let measured_total: f64 = measured_values.iter().flatten().sum();

    println!("{}", "Average year comparison".bright_green().bold());
    println!("   Paired hours:     {}", comparison.pairs);
    println!("   MBD:              {}", format_percent(comparison.mbd));
    println!("   MAE:              {}", format_percent(comparison.mae));
    println!("   RMSD:             {}", format_percent(comparison.rmsd));
    println!(
        "   Annual change:    {}",
        format_percent(relative_change(model_total, measured_total))
    );
    Ok(())
}
