//! Main processing engine.
//!
//! Orchestrates the batch pipeline over one directory of monthly reports:
//! discovery, era dispatch, normalization, continuation merging, Parquet
//! output, derived sunspot numbers and validation. Files are processed one
//! at a time in chronological order.

pub mod discovery;
pub mod normalize;
pub mod reader;
pub mod writer;

#[cfg(test)]
pub mod tests;

use self::discovery::{DiscoveredFile, FileDiscovery};
use self::normalize::{normalize_counts, normalize_regions};
use self::writer::OutputWriter;

use crate::aggregate::{daily_counts, monthly_means};
use crate::config::ProcessorConfig;
use crate::error::{Result, SunspotError};
use crate::header::{read_header, read_raw_file, RawFile};
use crate::merge::merge_continuations;
use crate::models::{DailyGroupRecord, DatasetKind, GroupObservation, ProcessingStats};
use crate::parsing::{complement_last_seen, Grammar};
use crate::schema::{spec_for, EraSpec};
use crate::validation::Validator;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Main processor for sunspot report directories
#[derive(Debug)]
pub struct SunspotProcessor {
    input_path: PathBuf,
    output_dir: PathBuf,
    config: ProcessorConfig,
    dataset: Option<DatasetKind>,
    grammar: Grammar,
    file_discovery: FileDiscovery,
    writer: OutputWriter,
    console: bool,
}

impl SunspotProcessor {
    /// Create a new processor; outputs default to `<input>_parquet` next to the input
    pub fn new(input_path: PathBuf, output_dir: Option<PathBuf>) -> Result<Self> {
        if !input_path.exists() {
            return Err(SunspotError::DirectoryNotFound { path: input_path });
        }

        let output_dir = output_dir.unwrap_or_else(|| default_output_dir(&input_path));
        let config = ProcessorConfig::default();

        Ok(Self {
            file_discovery: FileDiscovery::new(input_path.clone()),
            writer: OutputWriter::new(output_dir.clone(), config.clone()),
            input_path,
            output_dir,
            config,
            dataset: None,
            grammar: Grammar::new()?,
            console: true,
        })
    }

    /// Configure the processor
    pub fn with_config(mut self, config: ProcessorConfig) -> Self {
        self.writer = OutputWriter::new(self.output_dir.clone(), config.clone());
        self.config = config;
        self
    }

    /// Force the dataset kind instead of detecting it
    pub fn with_dataset(mut self, dataset: DatasetKind) -> Self {
        self.dataset = Some(dataset);
        self
    }

    /// Print nothing to the terminal; logging is unaffected
    pub fn without_console(mut self) -> Self {
        self.console = false;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Main processing entry point
    pub fn process(&mut self) -> Result<ProcessingStats> {
        let start_time = Instant::now();
        self.say(format!("{}", "Starting sunspot report processing".bright_green().bold()));
        self.say(format!("  {} {}", "Input:".bright_cyan(), self.input_path.display()));
        self.say(format!("  {} {}", "Output:".bright_cyan(), self.output_dir.display()));

        // Step 1: Discover report files
        self.say(format!("\n{}", "Discovering report files...".bright_yellow()));
        let files = self.file_discovery.discover_csv_files()?;
        let mut stats = ProcessingStats {
            files_skipped: self.file_discovery.skipped().len(),
            ..ProcessingStats::default()
        };
        self.say(format!(
            "  {} {} report files",
            "Found".bright_green(),
            files.len().to_string().bright_white().bold()
        ));

        if files.is_empty() {
            stats.processing_time_ms = start_time.elapsed().as_millis();
            return Ok(stats);
        }

        // Step 2: Decide the dataset kind
        let dataset = self.detect_dataset(&files)?;
        self.say(format!("  {} {}", "Dataset type:".bright_cyan(), dataset));

        // Step 3: Normalize every file
        self.say(format!("\n{}", "Normalizing files...".bright_yellow()));
        let pb = self.progress_bar(files.len());
        let mut groups: Vec<GroupObservation> = Vec::new();
        let mut daily: Vec<DailyGroupRecord> = Vec::new();

        for file in &files {
            pb.set_message(file.report_month.to_string());
            let (spec, raw) = match self.read_file(file, dataset) {
                Ok(loaded) => loaded,
                Err(e) => {
                    warn!("Skipping {}: {}", file.path.display(), e);
                    stats.files_skipped += 1;
                    pb.inc(1);
                    continue;
                }
            };
            stats.rows_read += raw.records.len();

            let issues = match dataset {
                DatasetKind::ActiveRegion => {
                    let (rows, issues) = normalize_regions(&self.grammar, spec, &raw, &file.path);
                    groups.extend(rows);
                    issues
                }
                DatasetKind::SunspotCount => {
                    let (rows, issues) = normalize_counts(&self.grammar, spec, &raw, &file.path);
                    daily.extend(rows);
                    issues
                }
            };
            stats.field_issues.extend(issues);
            stats.files_processed += 1;
            pb.inc(1);
        }
        pb.finish_and_clear();

        // Step 4: Derive, write and audit
        self.say(format!("\n{}", "Writing outputs...".bright_yellow()));
        let validator = Validator::new(self.config.validation.clone());
        match dataset {
            DatasetKind::ActiveRegion => self.finish_regions(groups, &validator, &mut stats)?,
            DatasetKind::SunspotCount => self.finish_counts(daily, &validator, &mut stats)?,
        }

        stats.processing_time_ms = start_time.elapsed().as_millis();
        if self.console {
            print_summary(&stats);
        }
        Ok(stats)
    }

    /// Explicit kind, then the first readable header, then the input name
    fn detect_dataset(&self, files: &[DiscoveredFile]) -> Result<DatasetKind> {
        if let Some(dataset) = self.dataset {
            return Ok(dataset);
        }
        for file in files {
            match read_header(&file.path) {
                Ok(columns) => {
                    if let Some(dataset) = DatasetKind::from_columns(columns.names()) {
                        return Ok(dataset);
                    }
                }
                Err(e) => warn!("Could not read header of {}: {}", file.path.display(), e),
            }
        }
        if let Some(dataset) = DatasetKind::from_path(&self.input_path) {
            return Ok(dataset);
        }
        Err(SunspotError::UnknownDataset {
            path: self.input_path.clone(),
        })
    }

    fn read_file(&self, file: &DiscoveredFile, dataset: DatasetKind) -> Result<(&'static EraSpec, RawFile)> {
        let month = file.report_month;
        let spec = spec_for(month.year, month.month).ok_or_else(|| SunspotError::UnsupportedEra {
            path: file.path.clone(),
            year: month.year,
            month: month.month,
        })?;
        let raw = read_raw_file(&file.path, spec, dataset)?;
        Ok((spec, raw))
    }

    fn finish_regions(
        &self,
        groups: Vec<GroupObservation>,
        validator: &Validator,
        stats: &mut ProcessingStats,
    ) -> Result<()> {
        let (groups, merged) = merge_continuations(groups);
        stats.continuations_merged = merged;

        let groups = if self.config.complement_last_seen {
            complement_last_seen(groups)
        } else {
            groups
        };

        stats.outputs.push(self.writer.write_groups(&groups)?);
        stats.rows_written = groups.len();
        stats.reports.push(validator.validate_groups(&groups));
        info!("Wrote {} active-region rows", groups.len());
        Ok(())
    }

    fn finish_counts(
        &self,
        daily: Vec<DailyGroupRecord>,
        validator: &Validator,
        stats: &mut ProcessingStats,
    ) -> Result<()> {
        stats.outputs.push(self.writer.write_daily_groups(&daily)?);
        stats.reports.push(validator.validate_daily_groups(&daily));

        let counts = daily_counts(&daily);
        let monthly = monthly_means(&counts);
        stats.outputs.push(self.writer.write_daily_counts(&counts)?);
        stats.outputs.push(self.writer.write_monthly_counts(&monthly)?);
        stats.reports.push(validator.validate_counts(&counts));

        stats.rows_written = daily.len();
        info!(
            "Wrote {} group rows, {} daily and {} monthly sunspot numbers",
            daily.len(),
            counts.len(),
            monthly.len()
        );
        Ok(())
    }

    fn say(&self, line: String) {
        if self.console {
            println!("{}", line);
        }
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.console {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        let style = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
        pb.set_style(style);
        pb
    }
}

fn default_output_dir(input_path: &Path) -> PathBuf {
    let name = input_path
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    input_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!("{}_parquet", name))
}

fn print_summary(stats: &ProcessingStats) {
    println!("\n{}", "Processing Summary".bright_green().bold());
    println!(
        "  {} {}ms",
        "Time elapsed:".bright_cyan(),
        stats.processing_time_ms.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Files processed:".bright_cyan(),
        stats.files_processed.to_string().bright_white()
    );
    if stats.files_skipped > 0 {
        println!(
            "  {} {}",
            "Files skipped:".bright_red(),
            stats.files_skipped.to_string().bright_red().bold()
        );
    }
    println!(
        "  {} {} read, {} written",
        "Rows:".bright_cyan(),
        stats.rows_read.to_string().bright_white(),
        stats.rows_written.to_string().bright_white().bold()
    );
    if stats.continuations_merged > 0 {
        println!(
            "  {} {}",
            "Continuations merged:".bright_cyan(),
            stats.continuations_merged
        );
    }
    if !stats.field_issues.is_empty() {
        println!(
            "  {} {}",
            "Field issues:".bright_yellow(),
            stats.field_issues.len().to_string().bright_yellow().bold()
        );
    }
    println!(
        "  {} {}",
        "Validation findings:".bright_cyan(),
        stats.finding_count().to_string().bright_white()
    );
    for output in &stats.outputs {
        println!("  {} {}", "Wrote".bright_green(), output.display());
    }
}
