//! Shared utilities for the command implementations

use crate::cli::args::{Args, OutputFormat};
use crate::config::ProcessorConfig;
use crate::error::Result;
use crate::validation::ValidationReport;
use tracing::debug;

/// How a command finished when it did not fail outright
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Completed with nothing to report
    Success,
    /// Completed, but validation produced findings
    Findings,
}

impl CommandOutcome {
    pub fn from_reports(reports: &[ValidationReport]) -> Self {
        if reports.iter().all(ValidationReport::is_clean) {
            CommandOutcome::Success
        } else {
            CommandOutcome::Findings
        }
    }

    /// Process exit code
    pub fn exit_code(&self) -> i32 {
        match self {
            CommandOutcome::Success => 0,
            CommandOutcome::Findings => 2,
        }
    }
}

/// Set up logging based on command line arguments
pub fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sunspot_processor={}", log_level)));

    if args.quiet {
        // Minimal logging for quiet mode
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
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
            .init();
    }

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Configuration from `--config`, the user config file, or defaults
pub fn load_configuration(args: &Args) -> Result<ProcessorConfig> {
    let config = ProcessorConfig::load_or_default(args.config_file.as_deref())?;
    debug!("Loaded configuration: {:?}", config);
    Ok(config)
}

/// Print validation reports in the requested format
pub fn print_reports(reports: &[ValidationReport], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => {
            for report in reports {
                println!("{}", report);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(reports)?),
    }
    Ok(())
}
