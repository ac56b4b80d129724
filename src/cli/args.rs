//! Command-line argument definitions for the sunspot processor
//!
//! This module defines the complete CLI interface using the clap derive API.

use crate::butterfly::DateDelta;
use crate::config::CompressionAlgorithm;
use crate::models::DatasetKind;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the sunspot processor
///
/// Normalizes historical sunspot observation logs into validated canonical
/// Parquet datasets and derives sunspot numbers and butterfly diagrams.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sunspot_processor",
    version,
    about = "Normalize historical sunspot observation logs into validated Parquet datasets",
    long_about = "Reads monthly sunspot reports spanning three notation eras (handwritten \
                  notebooks, the old tabulated format and the new format), normalizes \
                  coordinates, dates and counts into one canonical model, merges groups \
                  split across report boundaries and audits the result. Derived products \
                  include daily and monthly sunspot numbers, butterfly diagrams and a \
                  comparison against the SILSO reference series."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a JSON configuration file
    ///
    /// If not specified, looks for config.json in the user config directory
    /// under sunspot-processor/, falling back to built-in defaults.
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        global = true,
        help = "Path to configuration file (JSON format)"
    )]
    pub config_file: Option<PathBuf>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output (quiet mode)
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Normalize a directory of monthly reports into Parquet outputs
    Process(ProcessArgs),
    /// Audit a persisted canonical table
    Validate(ValidateArgs),
    /// Build a latitude-time occupancy image from active-region tables
    Butterfly(ButterflyArgs),
    /// Compare monthly sunspot numbers against the SILSO series
    Compare(CompareArgs),
    /// Show the era and raw schema of a report month
    Classify(ClassifyArgs),
}

/// Arguments for the process command
#[derive(Debug, Clone, Parser)]
pub struct ProcessArgs {
    /// Directory of `{year}-{month}.csv` reports, or a single report
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output directory for generated files
    ///
    /// Defaults to `<INPUT>_parquet` next to the input.
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Dataset kind; detected from the input name or the first header when omitted
    #[arg(short = 'd', long = "dataset", value_enum)]
    pub dataset: Option<DatasetArg>,

    /// Parquet compression algorithm (snappy, zstd, lz4, none)
    #[arg(long = "compression", value_name = "ALGORITHM")]
    pub compression: Option<CompressionAlgorithm>,

    /// Fill missing last-seen dates with the end of the report month
    #[arg(long = "complement-last-seen")]
    pub complement_last_seen: bool,

    /// Output format for the validation reports
    #[arg(long = "format", value_enum, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for the validate command
#[derive(Debug, Clone, Parser)]
pub struct ValidateArgs {
    /// Parquet table written by the process command
    #[arg(value_name = "PARQUET")]
    pub table: PathBuf,

    /// Output format for the report
    #[arg(long = "format", value_enum, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for the butterfly command
#[derive(Debug, Clone, Parser)]
pub struct ButterflyArgs {
    /// Active-region tables; several inputs are merged bitwise, one bit each
    #[arg(value_name = "PARQUET", required = true, num_args = 1..)]
    pub inputs: Vec<PathBuf>,

    /// Output directory for butterfly.csv and butterfly.json
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    pub output: PathBuf,

    /// Southern end of the latitude axis in degrees
    #[arg(long = "lat-min", allow_negative_numbers = true)]
    pub lat_min: Option<i16>,

    /// Northern end of the latitude axis in degrees
    #[arg(long = "lat-max", allow_negative_numbers = true)]
    pub lat_max: Option<i16>,

    /// Bucket width as an ISO-8601 duration, e.g. P1M or P27D
    #[arg(long = "interval", value_name = "DURATION")]
    pub interval: Option<DateDelta>,

    /// First bucket start (YYYY-MM-DD); defaults to the earliest first-seen date
    #[arg(long = "start", value_name = "DATE")]
    pub start: Option<NaiveDate>,

    /// Last date covered (YYYY-MM-DD); defaults to the latest last-seen date
    #[arg(long = "end", value_name = "DATE")]
    pub end: Option<NaiveDate>,
}

/// Arguments for the compare command
#[derive(Debug, Clone, Parser)]
pub struct CompareArgs {
    /// Monthly sunspot-number table written by the process command
    #[arg(value_name = "MONTHLY_PARQUET")]
    pub monthly: PathBuf,

    /// SILSO monthly mean total sunspot number file
    #[arg(value_name = "SILSO_CSV")]
    pub reference: PathBuf,

    /// Output format for the comparison
    #[arg(long = "format", value_enum, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for the classify command
#[derive(Debug, Clone, Parser)]
pub struct ClassifyArgs {
    pub year: i32,

    #[arg(value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: u32,

    /// Only show the schema of one dataset kind
    #[arg(short = 'd', long = "dataset", value_enum)]
    pub dataset: Option<DatasetArg>,
}

/// Output format options for machine-readable results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON format for scripting
    Json,
}

/// Dataset kinds accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DatasetArg {
    ActiveRegion,
    SunspotCount,
}

impl From<DatasetArg> for DatasetKind {
    fn from(arg: DatasetArg) -> Self {
        match arg {
            DatasetArg::ActiveRegion => DatasetKind::ActiveRegion,
            DatasetArg::SunspotCount => DatasetKind::SunspotCount,
        }
    }
}

impl Args {
    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Check if we should show progress bars (not in quiet mode)
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }
}
