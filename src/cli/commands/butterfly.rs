//! Butterfly command: latitude-time occupancy images from active-region tables

use super::shared::CommandOutcome;
use crate::butterfly::{merge_images, ButterflyImage, ButterflyInfo};
use crate::cli::args::ButterflyArgs;
use crate::config::ProcessorConfig;
use crate::error::{Result, SunspotError};
use crate::models::GroupObservation;
use crate::parsing::complement_last_seen;
use crate::processor::reader::read_groups;
use crate::processor::writer::OutputWriter;
use chrono::NaiveDate;
use colored::*;
use tracing::info;

pub fn run_butterfly(args: &ButterflyArgs, config: &ProcessorConfig, quiet: bool) -> Result<CommandOutcome> {
    let tables = args
        .inputs
        .iter()
        .map(|path| read_groups(path).map(complement_last_seen))
        .collect::<Result<Vec<_>>>()?;

    let info = frame_for(args, config, &tables)?;
    info!(
        "Butterfly frame: lat {}..{}, {} to {} every {}",
        info.lat_min(),
        info.lat_max(),
        info.date_start(),
        info.date_end(),
        info.date_interval()
    );

    let mut images: Vec<ButterflyImage> = tables
        .iter()
        .map(|groups| ButterflyImage::build(info.clone(), groups))
        .collect();
    let image = if images.len() == 1 {
        images.remove(0)
    } else {
        merge_images(&images)?
    };

    let writer = OutputWriter::new(args.output.clone(), config.clone());
    let (matrix, frame) = writer.write_butterfly(&image)?;

    if !quiet {
        println!("{}", "Butterfly diagram".bright_green().bold());
        println!(
            "  {} {} x {} ({} occupied)",
            "Cells:".bright_cyan(),
            image.data.nrows(),
            image.data.ncols(),
            image.occupied()
        );
        println!("  {} {}", "Wrote".bright_green(), matrix.display());
        println!("  {} {}", "Wrote".bright_green(), frame.display());
    }
    Ok(CommandOutcome::Success)
}

/// Frame from the arguments, falling back to the config axis and the observed date span
fn frame_for(args: &ButterflyArgs, config: &ProcessorConfig, tables: &[Vec<GroupObservation>]) -> Result<ButterflyInfo> {
    let span = date_span(&tables.concat());
    let start = args.start.or(span.map(|(start, _)| start));
    let end = args.end.or(span.map(|(_, end)| end));

    let (Some(start), Some(end)) = (start, end) else {
        return Err(SunspotError::InvalidButterflyInfo {
            reason: "no dated groups; pass --start and --end".to_string(),
        });
    };

    ButterflyInfo::new(
        args.lat_min.unwrap_or(config.butterfly.lat_min),
        args.lat_max.unwrap_or(config.butterfly.lat_max),
        start,
        end,
        args.interval.unwrap_or(config.butterfly.interval),
    )
}

/// Earliest first-seen and latest last-seen date
fn date_span(groups: &[GroupObservation]) -> Option<(NaiveDate, NaiveDate)> {
    let start = groups.iter().filter_map(|g| g.first_seen).min()?;
    let end = groups.iter().filter_map(|g| g.last_seen.or(g.first_seen)).max()?;
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CoordinateRange, Era, ReportMonth};
    use crate::processor::reader::read_butterfly_info;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn group(first: NaiveDate, last: NaiveDate, lat: (i16, i16)) -> GroupObservation {
        let mut obs = GroupObservation::empty(Era::New, ReportMonth::from_date(first));
        obs.first_seen = Some(first);
        obs.last_seen = Some(last);
        obs.latitude = Some(CoordinateRange::new(lat.0, lat.1));
        obs
    }

    fn args(inputs: Vec<PathBuf>, output: PathBuf) -> ButterflyArgs {
        ButterflyArgs {
            inputs,
            output,
            lat_min: Some(-2),
            lat_max: Some(2),
            interval: None,
            start: None,
            end: None,
        }
    }

    #[test]
    fn test_frame_defaults_to_observed_span() {
        let groups = vec![
            group(ymd(2000, 1, 5), ymd(2000, 1, 9), (1, 2)),
            group(ymd(2000, 2, 10), ymd(2000, 3, 2), (-1, -1)),
        ];
        assert_eq!(date_span(&groups), Some((ymd(2000, 1, 5), ymd(2000, 3, 2))));

        let temp_dir = TempDir::new().unwrap();
        let args = args(vec![], temp_dir.path().to_path_buf());
        let info = frame_for(&args, &ProcessorConfig::default(), &[groups]).unwrap();
        assert_eq!(info.date_start(), ymd(2000, 1, 5));
        assert_eq!(info.date_end(), ymd(2000, 3, 2));
        assert_eq!(info.width(), 2);
    }

    #[test]
    fn test_frame_needs_dates() {
        let temp_dir = TempDir::new().unwrap();
        let args = args(vec![], temp_dir.path().to_path_buf());
        let result = frame_for(&args, &ProcessorConfig::default(), &[vec![]]);
        assert!(matches!(result, Err(SunspotError::InvalidButterflyInfo { .. })));
    }

    #[test]
    fn test_two_tables_are_merged_into_one_image() {
        let temp_dir = TempDir::new().unwrap();
        let config = ProcessorConfig::default();
        let north = OutputWriter::new(temp_dir.path().join("a"), config.clone())
            .write_groups(&[group(ymd(2000, 1, 1), ymd(2000, 1, 2), (2, 2))])
            .unwrap();
        let south = OutputWriter::new(temp_dir.path().join("b"), config.clone())
            .write_groups(&[group(ymd(2000, 1, 1), ymd(2000, 1, 2), (-2, -2))])
            .unwrap();

        let output = temp_dir.path().join("butterfly");
        let args = args(vec![north, south], output.clone());
        let outcome = run_butterfly(&args, &config, true).unwrap();
        assert_eq!(outcome, CommandOutcome::Success);

        let info = read_butterfly_info(&output.join("butterfly.json")).unwrap();
        assert_eq!(info.lat_max(), 2);

        let text = std::fs::read_to_string(output.join("butterfly.csv")).unwrap();
        let rows: Vec<&str> = text.lines().collect();
        // header plus nine half-degree rows; first input is bit 0, second bit 1
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[1], "2.0,1");
        assert_eq!(rows[9], "-2.0,2");
    }
}
