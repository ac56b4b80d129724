//! Parquet, CSV and JSON output for canonical tables.
//!
//! Converts record slices into typed polars frames and writes them with
//! the configured compression. Dates are stored as polars `Date` columns,
//! coordinates as `Int16` min/max pairs and hemispheres as `N`/`S`.

use crate::aggregate::asymmetry_index;
use crate::butterfly::ButterflyImage;
use crate::config::ProcessorConfig;
use crate::constants::{
    ACTIVE_REGIONS_FILE, BUTTERFLY_INFO_FILE, BUTTERFLY_MATRIX_FILE, DAILY_GROUPS_FILE,
    DAILY_NUMBERS_FILE, MONTHLY_NUMBERS_FILE,
};
use crate::error::{Result, SunspotError};
use crate::models::{CountObservation, DailyGroupRecord, GroupObservation, MonthlyCount};
use chrono::{Datelike, NaiveDate};
use polars::prelude::{
    Column, DataFrame, DataType, ParquetWriter as PolarsParquetWriter, StatisticsOptions,
};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Days from 0001-01-01 to the Unix epoch
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Days since the Unix epoch, the physical value of a polars `Date`
pub(crate) fn date_to_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

pub(crate) fn days_to_date(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
}

fn date_column(name: &str, dates: impl Iterator<Item = Option<NaiveDate>>) -> Result<Column> {
    let days: Vec<Option<i32>> = dates.map(|date| date.map(date_to_days)).collect();
    Ok(Column::new(name.into(), days).cast(&DataType::Date)?)
}

/// Active-region table as a typed frame
pub fn groups_frame(groups: &[GroupObservation]) -> Result<DataFrame> {
    let era: Vec<&str> = groups.iter().map(|g| g.era.as_str()).collect();
    let hemisphere: Vec<Option<&str>> = groups.iter().map(|g| g.hemisphere.map(|h| h.code())).collect();
    let serial: Vec<Option<u16>> = groups.iter().map(|g| g.group_serial).collect();
    let lat_min: Vec<Option<i16>> = groups.iter().map(|g| g.latitude.map(|r| r.min)).collect();
    let lat_max: Vec<Option<i16>> = groups.iter().map(|g| g.latitude.map(|r| r.max)).collect();
    let lon_min: Vec<Option<i16>> = groups.iter().map(|g| g.longitude.map(|r| r.min)).collect();
    let lon_max: Vec<Option<i16>> = groups.iter().map(|g| g.longitude.map(|r| r.max)).collect();
    let lat_uncertain: Vec<bool> = groups.iter().map(|g| g.latitude_uncertain).collect();
    let lon_uncertain: Vec<bool> = groups.iter().map(|g| g.longitude_uncertain).collect();
    let continuation: Vec<bool> = groups.iter().map(|g| g.continuation).collect();

    let df = DataFrame::new(vec![
        Column::new("era".into(), era),
        date_column("report_month", groups.iter().map(|g| g.report_month.first_day()))?,
        Column::new("hemisphere".into(), hemisphere),
        Column::new("group_serial".into(), serial),
        Column::new("lat_min".into(), lat_min),
        Column::new("lat_max".into(), lat_max),
        Column::new("lon_min".into(), lon_min),
        Column::new("lon_max".into(), lon_max),
        Column::new("lat_uncertain".into(), lat_uncertain),
        Column::new("lon_uncertain".into(), lon_uncertain),
        date_column("first_seen", groups.iter().map(|g| g.first_seen))?,
        date_column("last_seen", groups.iter().map(|g| g.last_seen))?,
        Column::new("continuation".into(), continuation),
    ])?;
    Ok(df)
}

/// Per-group daily rows as a typed frame
pub fn daily_groups_frame(records: &[DailyGroupRecord]) -> Result<DataFrame> {
    let era: Vec<&str> = records.iter().map(|r| r.era.as_str()).collect();
    let hemisphere: Vec<Option<&str>> = records.iter().map(|r| r.hemisphere.map(|h| h.code())).collect();
    let number: Vec<Option<u16>> = records.iter().map(|r| r.group_number).collect();
    let spots: Vec<Option<u16>> = records.iter().map(|r| r.spot_count).collect();

    let df = DataFrame::new(vec![
        Column::new("era".into(), era),
        date_column("date", records.iter().map(|r| r.date))?,
        Column::new("hemisphere".into(), hemisphere),
        Column::new("group_number".into(), number),
        Column::new("spot_count".into(), spots),
    ])?;
    Ok(df)
}

/// Daily sunspot numbers as a typed frame
pub fn daily_counts_frame(counts: &[CountObservation]) -> Result<DataFrame> {
    let value = |f: fn(&CountObservation) -> u32| -> Vec<u32> { counts.iter().map(f).collect() };
    let asymmetry: Vec<Option<f64>> = counts.iter().map(|c| c.asymmetry()).collect();

    let df = DataFrame::new(vec![
        date_column("date", counts.iter().map(|c| Some(c.date)))?,
        Column::new("north_groups".into(), value(|c| c.north.groups)),
        Column::new("north_spots".into(), value(|c| c.north.spots)),
        Column::new("north_relative".into(), value(|c| c.north.relative_number())),
        Column::new("south_groups".into(), value(|c| c.south.groups)),
        Column::new("south_spots".into(), value(|c| c.south.spots)),
        Column::new("south_relative".into(), value(|c| c.south.relative_number())),
        Column::new("total_groups".into(), value(|c| c.total.groups)),
        Column::new("total_spots".into(), value(|c| c.total.spots)),
        Column::new("total_relative".into(), value(|c| c.total.relative_number())),
        Column::new("asymmetry".into(), asymmetry),
    ])?;
    Ok(df)
}

/// Monthly means as a typed frame
pub fn monthly_counts_frame(monthly: &[MonthlyCount]) -> Result<DataFrame> {
    let value = |f: fn(&MonthlyCount) -> f64| -> Vec<f64> { monthly.iter().map(f).collect() };
    let days: Vec<u32> = monthly.iter().map(|m| m.days).collect();
    let asymmetry: Vec<Option<f64>> = monthly
        .iter()
        .map(|m| asymmetry_index(m.north_relative, m.south_relative))
        .collect();

    let df = DataFrame::new(vec![
        date_column("month", monthly.iter().map(|m| Some(m.month)))?,
        Column::new("days".into(), days),
        Column::new("north_groups".into(), value(|m| m.north_groups)),
        Column::new("north_spots".into(), value(|m| m.north_spots)),
        Column::new("north_relative".into(), value(|m| m.north_relative)),
        Column::new("south_groups".into(), value(|m| m.south_groups)),
        Column::new("south_spots".into(), value(|m| m.south_spots)),
        Column::new("south_relative".into(), value(|m| m.south_relative)),
        Column::new("total_groups".into(), value(|m| m.total_groups)),
        Column::new("total_spots".into(), value(|m| m.total_spots)),
        Column::new("total_relative".into(), value(|m| m.total_relative)),
        Column::new("asymmetry".into(), asymmetry),
    ])?;
    Ok(df)
}

/// Writes the canonical outputs into one directory
#[derive(Debug, Clone)]
pub struct OutputWriter {
    output_dir: PathBuf,
    config: ProcessorConfig,
}

impl OutputWriter {
    pub fn new(output_dir: PathBuf, config: ProcessorConfig) -> Self {
        Self { output_dir, config }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write a frame to `file_name` in the output directory
    pub fn write_frame(&self, mut df: DataFrame, file_name: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(file_name);

        let statistics = if self.config.enable_statistics {
            StatisticsOptions::full()
        } else {
            StatisticsOptions::empty()
        };

        let file = std::fs::File::create(&path)?;
        PolarsParquetWriter::new(file)
            .with_compression(self.config.compression.to_polars_compression())
            .with_statistics(statistics)
            .finish(&mut df)
            .map_err(|e| SunspotError::ProcessingFailed {
                path: path.clone(),
                reason: format!("Failed to write parquet: {}", e),
            })?;

        debug!("Wrote {} rows to {}", df.height(), path.display());
        Ok(path)
    }

    pub fn write_groups(&self, groups: &[GroupObservation]) -> Result<PathBuf> {
        self.write_frame(groups_frame(groups)?, ACTIVE_REGIONS_FILE)
    }

    pub fn write_daily_groups(&self, records: &[DailyGroupRecord]) -> Result<PathBuf> {
        self.write_frame(daily_groups_frame(records)?, DAILY_GROUPS_FILE)
    }

    pub fn write_daily_counts(&self, counts: &[CountObservation]) -> Result<PathBuf> {
        self.write_frame(daily_counts_frame(counts)?, DAILY_NUMBERS_FILE)
    }

    pub fn write_monthly_counts(&self, monthly: &[MonthlyCount]) -> Result<PathBuf> {
        self.write_frame(monthly_counts_frame(monthly)?, MONTHLY_NUMBERS_FILE)
    }

    /// Write the occupancy matrix as CSV and its frame as JSON
    pub fn write_butterfly(&self, image: &ButterflyImage) -> Result<(PathBuf, PathBuf)> {
        std::fs::create_dir_all(&self.output_dir)?;
        let matrix_path = self.output_dir.join(BUTTERFLY_MATRIX_FILE);
        let info_path = self.output_dir.join(BUTTERFLY_INFO_FILE);

        let mut writer = csv::Writer::from_path(&matrix_path)?;
        let mut header = vec!["latitude".to_string()];
        header.extend(image.info.bucket_starts().iter().map(|d| d.to_string()));
        writer.write_record(&header)?;

        for (row_index, row) in image.data.rows().into_iter().enumerate() {
            let mut record = vec![format!("{:.1}", image.info.latitude_at(row_index))];
            record.extend(row.iter().map(|cell| cell.to_string()));
            writer.write_record(&record)?;
        }
        writer.flush()?;

        let file = std::fs::File::create(&info_path)?;
        serde_json::to_writer_pretty(file, &image.info)?;

        debug!(
            "Wrote butterfly matrix {} and frame {}",
            matrix_path.display(),
            info_path.display()
        );
        Ok((matrix_path, info_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CoordinateRange, Era, Hemisphere, HemisphereCount, ReportMonth};
    use tempfile::TempDir;

    #[test]
    fn test_epoch_conversion() {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        assert_eq!(date_to_days(epoch), 0);
        let date = NaiveDate::from_ymd_opt(1953, 1, 1).unwrap();
        assert_eq!(days_to_date(date_to_days(date)), Some(date));
    }

    #[test]
    fn test_groups_frame_schema() {
        let mut obs = GroupObservation::empty(Era::Old, ReportMonth::new(1970, 3));
        obs.hemisphere = Some(Hemisphere::South);
        obs.latitude = Some(CoordinateRange::new(-12, -8));

        let df = groups_frame(&[obs]).unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(df.column("lat_min").unwrap().dtype(), &DataType::Int16);
        assert_eq!(df.column("group_serial").unwrap().dtype(), &DataType::UInt16);
        assert_eq!(df.column("first_seen").unwrap().dtype(), &DataType::Date);
        assert_eq!(df.column("report_month").unwrap().null_count(), 0);
        assert_eq!(df.column("lon_min").unwrap().null_count(), 1);
    }

    #[test]
    fn test_writes_all_outputs() {
        let temp_dir = TempDir::new().unwrap();
        let writer = OutputWriter::new(temp_dir.path().join("out"), ProcessorConfig::default());

        let day = NaiveDate::from_ymd_opt(1990, 6, 1).unwrap();
        let counts = vec![CountObservation::from_hemispheres(
            day,
            HemisphereCount { groups: 2, spots: 11 },
            HemisphereCount { groups: 1, spots: 8 },
        )];

        let path = writer.write_daily_counts(&counts).unwrap();
        assert!(path.ends_with(DAILY_NUMBERS_FILE));
        assert!(path.exists());

        let path = writer.write_groups(&[]).unwrap();
        assert!(path.exists());
    }
}
