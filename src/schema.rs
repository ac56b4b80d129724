//! Era classification and raw schema tables.
//!
//! Every report month belongs to exactly one recording era. Each era maps
//! to a static [`EraSpec`] that carries the date strategy, the coordinate
//! axes and their bounds, and the raw column table for each dataset kind.
//! Everything downstream dispatches on that one lookup.

use crate::constants::{era_bounds, CARRINGTON_LONGITUDE_BOUNDS, CMD_LONGITUDE_BOUNDS, LATITUDE_LIMIT};
use crate::models::{Axis, DatasetKind, Era, ReportMonth};
use polars::prelude::*;

/// How dates are written in an era's raw files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// Bare day of month, year and month come from the file name
    DayOnly,
    /// `{mon}.{day}` with an English month abbreviation
    MonthName,
    /// `Y{sep}M{sep}D` with one of `-`, `/`, `.`, space
    FreeForm,
}

/// Semantic role of a raw column, which fixes its canonical dtype
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Serial,
    Hemisphere,
    Date,
    Coordinate(Axis),
    Count,
}

impl ColumnKind {
    /// Canonical dtype after normalization
    pub fn dtype(&self) -> DataType {
        match self {
            ColumnKind::Serial | ColumnKind::Count => DataType::UInt16,
            ColumnKind::Hemisphere => DataType::String,
            ColumnKind::Date => DataType::Date,
            ColumnKind::Coordinate(_) => DataType::Int16,
        }
    }
}

/// One raw column: header name plus semantic role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const fn col(name: &'static str, kind: ColumnKind) -> ColumnSpec {
    ColumnSpec { name, kind }
}

/// Strategy record for one recording era
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EraSpec {
    pub era: Era,
    /// First report month, inclusive
    pub start: ReportMonth,
    /// Last report month, inclusive
    pub end: ReportMonth,
    pub date_format: DateFormat,
    /// Coordinate axes transcribed in this era
    pub axes: &'static [Axis],
    /// Accepted longitude range, `None` when longitude is not recorded
    pub longitude_bounds: Option<(i16, i16)>,
    /// Raw columns of active-region files
    pub region_columns: &'static [ColumnSpec],
    /// Raw columns of sunspot-count files
    pub count_columns: &'static [ColumnSpec],
}

const NOTEBOOK_REGION_COLUMNS: &[ColumnSpec] = &[
    col("no", ColumnKind::Serial),
    col("ns", ColumnKind::Hemisphere),
    col("first", ColumnKind::Date),
    col("last", ColumnKind::Date),
    col("lat", ColumnKind::Coordinate(Axis::Latitude)),
];

const TABULATED_REGION_COLUMNS: &[ColumnSpec] = &[
    col("no", ColumnKind::Serial),
    col("ns", ColumnKind::Hemisphere),
    col("first", ColumnKind::Date),
    col("last", ColumnKind::Date),
    col("lat", ColumnKind::Coordinate(Axis::Latitude)),
    col("lon", ColumnKind::Coordinate(Axis::Longitude)),
];

const NOTEBOOK_COUNT_COLUMNS: &[ColumnSpec] = &[
    col("day", ColumnKind::Date),
    col("ns", ColumnKind::Hemisphere),
    col("no", ColumnKind::Serial),
    col("spots", ColumnKind::Count),
];

const TABULATED_COUNT_COLUMNS: &[ColumnSpec] = &[
    col("date", ColumnKind::Date),
    col("ns", ColumnKind::Hemisphere),
    col("no", ColumnKind::Serial),
    col("spots", ColumnKind::Count),
];

const fn month(bound: (i32, u32)) -> ReportMonth {
    ReportMonth::new(bound.0, bound.1)
}

/// Era table in chronological order
pub const ERA_SPECS: [EraSpec; 3] = [
    EraSpec {
        era: Era::Notebook,
        start: month(era_bounds::NOTEBOOK_START),
        end: month(era_bounds::NOTEBOOK_END),
        date_format: DateFormat::DayOnly,
        axes: &[Axis::Latitude],
        longitude_bounds: None,
        region_columns: NOTEBOOK_REGION_COLUMNS,
        count_columns: NOTEBOOK_COUNT_COLUMNS,
    },
    EraSpec {
        era: Era::Old,
        start: month(era_bounds::OLD_START),
        end: month(era_bounds::OLD_END),
        date_format: DateFormat::MonthName,
        axes: &[Axis::Latitude, Axis::Longitude],
        longitude_bounds: Some(CMD_LONGITUDE_BOUNDS),
        region_columns: TABULATED_REGION_COLUMNS,
        count_columns: TABULATED_COUNT_COLUMNS,
    },
    EraSpec {
        era: Era::New,
        start: month(era_bounds::NEW_START),
        end: month(era_bounds::NEW_END),
        date_format: DateFormat::FreeForm,
        axes: &[Axis::Latitude, Axis::Longitude],
        longitude_bounds: Some(CARRINGTON_LONGITUDE_BOUNDS),
        region_columns: TABULATED_REGION_COLUMNS,
        count_columns: TABULATED_COUNT_COLUMNS,
    },
];

/// Classify a report month into its era, `None` when unsupported
pub fn classify(year: i32, month: u32) -> Option<Era> {
    spec_for(year, month).map(|spec| spec.era)
}

/// Strategy record for a report month, `None` when unsupported
pub fn spec_for(year: i32, month: u32) -> Option<&'static EraSpec> {
    if !(1..=12).contains(&month) {
        return None;
    }
    let report = ReportMonth::new(year, month);
    ERA_SPECS
        .iter()
        .find(|spec| spec.start <= report && report <= spec.end)
}

/// Strategy record for an era
pub fn era_spec(era: Era) -> &'static EraSpec {
    match era {
        Era::Notebook => &ERA_SPECS[0],
        Era::Old => &ERA_SPECS[1],
        Era::New => &ERA_SPECS[2],
    }
}

impl EraSpec {
    /// Raw column table for a dataset kind
    pub fn columns(&self, kind: DatasetKind) -> &'static [ColumnSpec] {
        match kind {
            DatasetKind::ActiveRegion => self.region_columns,
            DatasetKind::SunspotCount => self.count_columns,
        }
    }

    /// Name of the first raw column with the given role
    pub fn column_for(&self, kind: DatasetKind, role: ColumnKind) -> Option<&'static str> {
        self.columns(kind)
            .iter()
            .find(|column| column.kind == role)
            .map(|column| column.name)
    }

    pub fn has_axis(&self, axis: Axis) -> bool {
        self.axes.contains(&axis)
    }

    /// Inclusive bounds for an axis, `None` when the era does not record it
    pub fn bounds(&self, axis: Axis) -> Option<(i16, i16)> {
        match axis {
            Axis::Latitude => Some((-LATITUDE_LIMIT, LATITUDE_LIMIT)),
            Axis::Longitude => self.longitude_bounds,
        }
    }

    /// Raw column table as a polars schema of canonical dtypes
    pub fn polars_schema(&self, kind: DatasetKind) -> Schema {
        Schema::from_iter(
            self.columns(kind)
                .iter()
                .map(|column| Field::new(column.name.into(), column.kind.dtype())),
        )
    }

    /// Print the era and its raw schema for a dataset kind
    pub fn report(&self, kind: DatasetKind) {
        println!("\n=== {} era ({} to {}) ===", self.era, self.start, self.end);
        println!("Date format: {:?}", self.date_format);
        let axes: Vec<&str> = self.axes.iter().map(|axis| axis.as_str()).collect();
        println!("Axes: {}", axes.join(", "));
        if let Some((low, high)) = self.longitude_bounds {
            println!("Longitude bounds: [{}, {}]", low, high);
        }

        println!("\n{} columns:", kind);
        for (name, data_type) in self.polars_schema(kind).iter() {
            println!("  {} -> {:?}", name, data_type);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_era_boundaries_are_inclusive() {
        assert_eq!(classify(1953, 1), Some(Era::Notebook));
        assert_eq!(classify(1964, 3), Some(Era::Notebook));
        assert_eq!(classify(1964, 4), Some(Era::Old));
        assert_eq!(classify(1978, 12), Some(Era::Old));
        assert_eq!(classify(1979, 1), Some(Era::New));
        assert_eq!(classify(2016, 12), Some(Era::New));
    }

    #[test]
    fn test_unsupported_months() {
        assert_eq!(classify(1952, 12), None);
        assert_eq!(classify(2017, 1), None);
        assert_eq!(classify(2000, 13), None);
        assert_eq!(classify(2000, 0), None);
    }

    #[test]
    fn test_era_table_is_contiguous() {
        for pair in ERA_SPECS.windows(2) {
            let end = pair[0].end;
            let next = pair[1].start;
            let expected = if end.month == 12 {
                ReportMonth::new(end.year + 1, 1)
            } else {
                ReportMonth::new(end.year, end.month + 1)
            };
            assert_eq!(next, expected, "gap after {:?}", pair[0].era);
        }
    }

    #[test]
    fn test_column_tables() {
        let notebook = era_spec(Era::Notebook);
        assert!(!notebook.has_axis(Axis::Longitude));
        assert_eq!(notebook.bounds(Axis::Longitude), None);
        let names: Vec<&str> = notebook
            .columns(DatasetKind::SunspotCount)
            .iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["day", "ns", "no", "spots"]);
        assert_eq!(
            notebook.column_for(DatasetKind::SunspotCount, ColumnKind::Date),
            Some("day")
        );

        let new = era_spec(Era::New);
        assert_eq!(new.bounds(Axis::Longitude), Some((0, 360)));
        let schema = new.polars_schema(DatasetKind::ActiveRegion);
        assert_eq!(schema.len(), 6);
        assert_eq!(schema.get("lon"), Some(&DataType::Int16));
        assert_eq!(schema.get("first"), Some(&DataType::Date));
    }

    #[test]
    fn test_spec_lookup_matches_era() {
        for era in Era::ALL {
            assert_eq!(era_spec(era).era, era);
        }
    }
}
