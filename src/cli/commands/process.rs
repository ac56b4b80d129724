//! Process command: raw monthly reports to canonical Parquet outputs

use super::shared::{print_reports, CommandOutcome};
use crate::cli::args::{OutputFormat, ProcessArgs};
use crate::config::ProcessorConfig;
use crate::constants::MAX_REPORTED_ISSUES;
use crate::error::Result;
use crate::models::FieldIssue;
use crate::processor::SunspotProcessor;
use colored::*;
use tracing::info;

pub fn run_process(args: &ProcessArgs, config: ProcessorConfig, quiet: bool) -> Result<CommandOutcome> {
    let mut config = config;
    if let Some(compression) = args.compression {
        config = config.with_compression(compression);
    }
    if args.complement_last_seen {
        config = config.with_complement_last_seen();
    }
    config.validate()?;

    let mut processor = SunspotProcessor::new(args.input.clone(), args.output.clone())?.with_config(config);
    if let Some(dataset) = args.dataset {
        processor = processor.with_dataset(dataset.into());
    }
    if quiet || args.format == OutputFormat::Json {
        processor = processor.without_console();
    }

    info!("Processing {}", args.input.display());
    let stats = processor.process()?;

    if args.format == OutputFormat::Human && !quiet {
        print_issues(&stats.field_issues);
    }
    if !quiet {
        print_reports(&stats.reports, args.format)?;
    }

    Ok(CommandOutcome::from_reports(&stats.reports))
}

fn print_issues(issues: &[FieldIssue]) {
    if issues.is_empty() {
        return;
    }
    println!("\n{}", "Field Issues".bright_yellow().bold());
    for issue in issues.iter().take(MAX_REPORTED_ISSUES) {
        println!("  {}", issue);
    }
    if issues.len() > MAX_REPORTED_ISSUES {
        println!("  ... and {} more", issues.len() - MAX_REPORTED_ISSUES);
    }
}
