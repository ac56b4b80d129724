//! Validate command: audit a persisted canonical table

use super::shared::{print_reports, CommandOutcome};
use crate::cli::args::ValidateArgs;
use crate::config::ProcessorConfig;
use crate::error::{Result, SunspotError};
use crate::processor::reader::{read_daily_counts, read_daily_groups, read_frame, read_groups, TableKind};
use crate::validation::{ValidationReport, Validator};
use std::path::Path;
use tracing::info;

pub fn run_validate(args: &ValidateArgs, config: &ProcessorConfig) -> Result<CommandOutcome> {
    let report = validate_table(&args.table, config)?;
    print_reports(std::slice::from_ref(&report), args.format)?;
    Ok(CommandOutcome::from_reports(&[report]))
}

/// Audit one table, dispatching on the kind detected from its columns
pub fn validate_table(path: &Path, config: &ProcessorConfig) -> Result<ValidationReport> {
    let frame = read_frame(path)?;
    let kind = TableKind::detect(&frame).ok_or_else(|| SunspotError::UnknownDataset {
        path: path.to_path_buf(),
    })?;
    info!("Validating {} as {:?}", path.display(), kind);

    let validator = Validator::new(config.validation.clone());
    let report = match kind {
        TableKind::ActiveRegions => validator.validate_groups(&read_groups(path)?),
        TableKind::DailyGroups => validator.validate_daily_groups(&read_daily_groups(path)?),
        TableKind::DailyNumbers => validator.validate_counts(&read_daily_counts(path)?),
        TableKind::MonthlyNumbers => {
            return Err(SunspotError::ProcessingFailed {
                path: path.to_path_buf(),
                reason: "monthly means carry no validation rules".to_string(),
            });
        }
    };
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CoordinateRange, Era, GroupObservation, Hemisphere, ReportMonth};
    use crate::processor::writer::OutputWriter;
    use crate::validation::Rule;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    #[test]
    fn test_validate_persisted_groups() {
        let temp_dir = TempDir::new().unwrap();
        let writer = OutputWriter::new(temp_dir.path().to_path_buf(), ProcessorConfig::default());

        let mut obs = GroupObservation::empty(Era::New, ReportMonth::new(1990, 1));
        obs.group_serial = Some(1);
        obs.hemisphere = Some(Hemisphere::North);
        obs.latitude = Some(CoordinateRange::new(10, 12));
        obs.first_seen = NaiveDate::from_ymd_opt(1990, 1, 9);
        obs.last_seen = NaiveDate::from_ymd_opt(1990, 1, 3);
        let path = writer.write_groups(&[obs]).unwrap();

        let report = validate_table(&path, &ProcessorConfig::default()).unwrap();
        assert_eq!(report.table, "active_regions");
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].rule, Rule::ReversedIntervals);
    }

    #[test]
    fn test_monthly_table_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let writer = OutputWriter::new(temp_dir.path().to_path_buf(), ProcessorConfig::default());
        let path = writer.write_monthly_counts(&[]).unwrap();

        assert!(validate_table(&path, &ProcessorConfig::default()).is_err());
    }
}
