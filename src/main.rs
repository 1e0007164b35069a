use clap::Parser;
use solar_qc::cli::{args::Args, commands};
use std::process;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    if let Err(error) = commands::run(args) {
        eprintln!("Error: {:#}", error);
        process::exit(1);
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("solar-qc - Solar Irradiance Quality Control");
    println!("===========================================");
    println!();
    println!("Flag suspect hourly global irradiance observations and build a");
    println!("quality-controlled average year for each station.");
    println!();
    println!("USAGE:");
    println!("    solar-qc [OPTIONS] <COMMAND>");
    println!();
    println!("COMMANDS:");
    println!("    flag          Run the quality control rules and write the flag table");
    println!("    average-year  Build a quality-controlled average year");
    println!("    summary       Report flag statistics per period");
    println!("    gaps          List periods with missing measurements");
    println!("    stations      List registered stations and their data files");
    println!("    compare       Compare two average-year files");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <FILE>   Configuration file (default: config/stations.toml)");
    println!("        --data-dir <DIR>  Override the station data directory");
    println!("    -v, --verbose         Increase logging verbosity");
    println!("    -q, --quiet           Only log warnings and errors");
    println!("    -h, --help            Show help information");
    println!("    -V, --version         Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    # Flag every registered station as Parquet:");
    println!("    solar-qc flag --all --format parquet");
    println!();
    println!("    # Average year excluding a period found in visual review:");
    println!("    solar-qc average-year Aas --exclude 1995-05-25,1995-05-27");
    println!();
    println!("    # Monthly flag percentages:");
    println!("    solar-qc summary Aas --by month --percent");
    println!();
    println!("For detailed help on any command, use:");
    println!("    solar-qc <COMMAND> --help");
}
