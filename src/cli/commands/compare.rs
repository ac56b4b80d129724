//! Compare command: observed monthly means against the SILSO series

use super::shared::CommandOutcome;
use crate::cli::args::{CompareArgs, OutputFormat};
use crate::error::Result;
use crate::processor::reader::read_monthly_counts;
use crate::reference::{compare_monthly, read_silso_monthly, Comparison};
use tracing::info;

pub fn run_compare(args: &CompareArgs) -> Result<CommandOutcome> {
    let comparison = comparison_for(args)?;
    match args.format {
        OutputFormat::Human => print!("{}", comparison),
        OutputFormat::Json => println!("{}", comparison.to_json()?),
    }
    Ok(CommandOutcome::Success)
}

fn comparison_for(args: &CompareArgs) -> Result<Comparison> {
    let observed = read_monthly_counts(&args.monthly)?;
    let reference = read_silso_monthly(&args.reference)?;
    info!(
        "Comparing {} observed months with {} reference months",
        observed.len(),
        reference.len()
    );
    Ok(compare_monthly(&observed, &reference))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProcessorConfig;
    use crate::models::MonthlyCount;
    use crate::processor::writer::OutputWriter;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn monthly(month: u32, total_relative: f64) -> MonthlyCount {
        MonthlyCount {
            month: NaiveDate::from_ymd_opt(1990, month, 1).unwrap(),
            days: 20,
            north_groups: 0.0,
            north_spots: 0.0,
            north_relative: 0.0,
            south_groups: 0.0,
            south_spots: 0.0,
            south_relative: 0.0,
            total_groups: 0.0,
            total_spots: 0.0,
            total_relative,
        }
    }

    #[test]
    fn test_compare_persisted_means() {
        let temp_dir = TempDir::new().unwrap();
        let writer = OutputWriter::new(temp_dir.path().to_path_buf(), ProcessorConfig::default());
        let monthly_path = writer
            .write_monthly_counts(&[monthly(1, 100.0), monthly(2, 50.0), monthly(3, 80.0)])
            .unwrap();

        let reference = temp_dir.path().join("SN_m_tot_V2.0.csv");
        std::fs::write(
            &reference,
            "1990;01;1990.042;  150.0;  14.1;  612;1\n\
             1990;02;1990.123;   75.0;  13.7;  580;1\n\
             1990;03;1990.204;   -1.0;  -1.0;   -1;0\n",
        )
        .unwrap();

        let args = CompareArgs {
            monthly: monthly_path,
            reference,
            format: OutputFormat::Json,
        };
        let comparison = comparison_for(&args).unwrap();
        assert_eq!(comparison.rows.len(), 2);
        assert_relative_eq!(comparison.scale_factor.unwrap(), 1.5, epsilon = 1e-9);
        assert_eq!(run_compare(&args).unwrap(), CommandOutcome::Success);
    }
}
