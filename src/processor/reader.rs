//! Reading persisted canonical tables back into records.

use super::writer::days_to_date;
use crate::butterfly::ButterflyInfo;
use crate::error::{Result, SunspotError};
use crate::models::{
    CoordinateRange, CountObservation, DailyGroupRecord, Era, GroupObservation, Hemisphere,
    HemisphereCount, MonthlyCount, ReportMonth,
};
use chrono::NaiveDate;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Kind of canonical table, detected from its columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    ActiveRegions,
    DailyGroups,
    DailyNumbers,
    MonthlyNumbers,
}

impl TableKind {
    pub fn detect(df: &DataFrame) -> Option<Self> {
        let has = |name: &str| df.get_column_names().iter().any(|c| c.as_str() == name);

        if has("group_serial") {
            Some(TableKind::ActiveRegions)
        } else if has("group_number") {
            Some(TableKind::DailyGroups)
        } else if has("month") && has("total_relative") {
            Some(TableKind::MonthlyNumbers)
        } else if has("date") && has("total_relative") {
            Some(TableKind::DailyNumbers)
        } else {
            None
        }
    }
}

pub fn read_frame(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)?;
    let df = ParquetReader::new(file).finish()?;
    debug!("Read {} rows from {}", df.height(), path.display());
    Ok(df)
}

fn ints(df: &DataFrame, name: &str) -> Result<Vec<Option<i32>>> {
    let column = df.column(name)?.cast(&DataType::Int32)?;
    Ok(column.i32()?.into_iter().collect())
}

fn floats(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    Ok(column.f64()?.into_iter().collect())
}

fn bools(df: &DataFrame, name: &str) -> Result<Vec<Option<bool>>> {
    Ok(df.column(name)?.bool()?.into_iter().collect())
}

fn strings(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    Ok(df
        .column(name)?
        .str()?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect())
}

fn dates(df: &DataFrame, name: &str) -> Result<Vec<Option<NaiveDate>>> {
    Ok(ints(df, name)?
        .into_iter()
        .map(|days| days.and_then(days_to_date))
        .collect())
}

fn unsigned(values: Vec<Option<i32>>) -> Vec<Option<u16>> {
    values
        .into_iter()
        .map(|v| v.and_then(|v| u16::try_from(v).ok()))
        .collect()
}

fn count(value: Option<i32>) -> u32 {
    value.and_then(|v| u32::try_from(v).ok()).unwrap_or(0)
}

fn range(min: Option<i32>, max: Option<i32>) -> Option<CoordinateRange> {
    let min = i16::try_from(min?).ok()?;
    let max = i16::try_from(max?).ok()?;
    Some(CoordinateRange::new(min, max))
}

fn era_values(df: &DataFrame, path: &Path) -> Result<Vec<Era>> {
    strings(df, "era")?
        .into_iter()
        .map(|value| {
            value
                .unwrap_or_default()
                .parse::<Era>()
                .map_err(|reason| SunspotError::ProcessingFailed {
                    path: path.to_path_buf(),
                    reason,
                })
        })
        .collect()
}

fn hemispheres(df: &DataFrame) -> Result<Vec<Option<Hemisphere>>> {
    Ok(strings(df, "hemisphere")?
        .into_iter()
        .map(|value| value.as_deref().and_then(Hemisphere::from_code))
        .collect())
}

/// Read an active-region table
pub fn read_groups(path: &Path) -> Result<Vec<GroupObservation>> {
    let df = read_frame(path)?;

    let era = era_values(&df, path)?;
    let report_month = dates(&df, "report_month")?;
    let hemisphere = hemispheres(&df)?;
    let serial = unsigned(ints(&df, "group_serial")?);
    let (lat_min, lat_max) = (ints(&df, "lat_min")?, ints(&df, "lat_max")?);
    let (lon_min, lon_max) = (ints(&df, "lon_min")?, ints(&df, "lon_max")?);
    let lat_uncertain = bools(&df, "lat_uncertain")?;
    let lon_uncertain = bools(&df, "lon_uncertain")?;
    let first_seen = dates(&df, "first_seen")?;
    let last_seen = dates(&df, "last_seen")?;
    let continuation = bools(&df, "continuation")?;

    let mut groups = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let report_month = report_month[i].ok_or_else(|| SunspotError::ProcessingFailed {
            path: path.to_path_buf(),
            reason: format!("row {i} has no report month"),
        })?;

        groups.push(GroupObservation {
            era: era[i],
            report_month: ReportMonth::from_date(report_month),
            hemisphere: hemisphere[i],
            group_serial: serial[i],
            latitude: range(lat_min[i], lat_max[i]),
            longitude: range(lon_min[i], lon_max[i]),
            latitude_uncertain: lat_uncertain[i].unwrap_or(false),
            longitude_uncertain: lon_uncertain[i].unwrap_or(false),
            first_seen: first_seen[i],
            last_seen: last_seen[i],
            continuation: continuation[i].unwrap_or(false),
        });
    }
    Ok(groups)
}

/// Read the per-group daily rows
pub fn read_daily_groups(path: &Path) -> Result<Vec<DailyGroupRecord>> {
    let df = read_frame(path)?;

    let era = era_values(&df, path)?;
    let date = dates(&df, "date")?;
    let hemisphere = hemispheres(&df)?;
    let number = unsigned(ints(&df, "group_number")?);
    let spots = unsigned(ints(&df, "spot_count")?);

    Ok((0..df.height())
        .map(|i| DailyGroupRecord {
            era: era[i],
            date: date[i],
            hemisphere: hemisphere[i],
            group_number: number[i],
            spot_count: spots[i],
        })
        .collect())
}

/// Read the daily sunspot-number table
pub fn read_daily_counts(path: &Path) -> Result<Vec<CountObservation>> {
    let df = read_frame(path)?;
    let date = dates(&df, "date")?;
    let columns = [
        "north_groups",
        "north_spots",
        "south_groups",
        "south_spots",
        "total_groups",
        "total_spots",
    ];
    let values = columns
        .iter()
        .map(|name| ints(&df, name))
        .collect::<Result<Vec<_>>>()?;

    let mut counts = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let Some(date) = date[i] else {
            continue;
        };
        let pair = |g: usize, f: usize| HemisphereCount {
            groups: count(values[g][i]),
            spots: count(values[f][i]),
        };
        counts.push(CountObservation {
            date,
            north: pair(0, 1),
            south: pair(2, 3),
            total: pair(4, 5),
        });
    }
    Ok(counts)
}

/// Read the monthly means table
pub fn read_monthly_counts(path: &Path) -> Result<Vec<MonthlyCount>> {
    let df = read_frame(path)?;
    let month = dates(&df, "month")?;
    let days = ints(&df, "days")?;
    let names = [
        "north_groups",
        "north_spots",
        "north_relative",
        "south_groups",
        "south_spots",
        "south_relative",
        "total_groups",
        "total_spots",
        "total_relative",
    ];
    let values = names
        .iter()
        .map(|name| floats(&df, name))
        .collect::<Result<Vec<_>>>()?;

    let mut monthly = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let Some(month) = month[i] else {
            continue;
        };
        let v = |k: usize| values[k][i].unwrap_or(f64::NAN);
        monthly.push(MonthlyCount {
            month,
            days: count(days[i]),
            north_groups: v(0),
            north_spots: v(1),
            north_relative: v(2),
            south_groups: v(3),
            south_spots: v(4),
            south_relative: v(5),
            total_groups: v(6),
            total_spots: v(7),
            total_relative: v(8),
        });
    }
    Ok(monthly)
}

/// Read a butterfly frame written next to its matrix
pub fn read_butterfly_info(path: &Path) -> Result<ButterflyInfo> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(file)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::butterfly::{ButterflyImage, DateDelta};
    use crate::config::ProcessorConfig;
    use crate::processor::writer::OutputWriter;
    use tempfile::TempDir;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_groups_survive_parquet() {
        let temp_dir = TempDir::new().unwrap();
        let writer = OutputWriter::new(temp_dir.path().to_path_buf(), ProcessorConfig::default());

        let mut obs = GroupObservation::empty(Era::Old, ReportMonth::new(1970, 12));
        obs.hemisphere = Some(Hemisphere::South);
        obs.group_serial = Some(42);
        obs.latitude = Some(CoordinateRange::new(-12, -8));
        obs.longitude = Some(CoordinateRange::new(-30, 15));
        obs.latitude_uncertain = true;
        obs.first_seen = Some(ymd(1970, 12, 28));
        obs.last_seen = Some(ymd(1971, 1, 3));
        let sparse = GroupObservation::empty(Era::Notebook, ReportMonth::new(1955, 4));

        let path = writer.write_groups(&[obs.clone(), sparse.clone()]).unwrap();
        let df = read_frame(&path).unwrap();
        assert_eq!(TableKind::detect(&df), Some(TableKind::ActiveRegions));

        let groups = read_groups(&path).unwrap();
        assert_eq!(groups, vec![obs, sparse]);
    }

    #[test]
    fn test_daily_tables_survive_parquet() {
        let temp_dir = TempDir::new().unwrap();
        let writer = OutputWriter::new(temp_dir.path().to_path_buf(), ProcessorConfig::default());

        let records = vec![DailyGroupRecord {
            era: Era::New,
            date: Some(ymd(1990, 6, 1)),
            hemisphere: Some(Hemisphere::North),
            group_number: Some(1),
            spot_count: None,
        }];
        let path = writer.write_daily_groups(&records).unwrap();
        assert_eq!(TableKind::detect(&read_frame(&path).unwrap()), Some(TableKind::DailyGroups));
        assert_eq!(read_daily_groups(&path).unwrap(), records);

        let counts = vec![CountObservation::from_hemispheres(
            ymd(1990, 6, 1),
            HemisphereCount { groups: 2, spots: 11 },
            HemisphereCount { groups: 1, spots: 8 },
        )];
        let path = writer.write_daily_counts(&counts).unwrap();
        assert_eq!(TableKind::detect(&read_frame(&path).unwrap()), Some(TableKind::DailyNumbers));
        assert_eq!(read_daily_counts(&path).unwrap(), counts);
    }

    #[test]
    fn test_butterfly_frame_survives_json() {
        let temp_dir = TempDir::new().unwrap();
        let writer = OutputWriter::new(temp_dir.path().to_path_buf(), ProcessorConfig::default());
        let info = ButterflyInfo::new(-5, 5, ymd(1990, 1, 1), ymd(1990, 6, 1), DateDelta::new(0, 1, 15)).unwrap();
        let image = ButterflyImage::build(info.clone(), &[]);

        let (matrix, info_path) = writer.write_butterfly(&image).unwrap();
        assert!(matrix.exists());
        assert_eq!(read_butterfly_info(&info_path).unwrap(), info);

        let text = std::fs::read_to_string(matrix).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("latitude,1990-01-01,1990-02-16,1990-03-31,1990-05-16"));
        assert_eq!(lines.next(), Some("5.0,0,0,0,0"));
        assert_eq!(text.lines().count(), 1 + 21);
    }
}
