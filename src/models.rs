//! Core data structures and types for sunspot processing.
//!
//! Defines the recording eras, dataset kinds, the canonical record types
//! produced by normalization, and the processing statistics reported by
//! the pipeline.

use crate::validation::ValidationReport;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Historical recording-format eras
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Era {
    /// Handwritten notebooks, bare day-of-month dates, latitude only
    Notebook,
    /// Tabulated reports with `mon.day` dates and E/W longitudes
    Old,
    /// Tabulated reports with full dates and Carrington longitudes
    New,
}

impl Era {
    pub const ALL: [Era; 3] = [Era::Notebook, Era::Old, Era::New];

    pub fn as_str(&self) -> &'static str {
        match self {
            Era::Notebook => "notebook",
            Era::Old => "old",
            Era::New => "new",
        }
    }
}

impl fmt::Display for Era {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Era {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "notebook" => Ok(Era::Notebook),
            "old" => Ok(Era::Old),
            "new" => Ok(Era::New),
            other => Err(format!("unknown era '{other}'")),
        }
    }
}

/// Dataset kinds found in the archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatasetKind {
    /// One row per sunspot group lifetime with positions
    ActiveRegion,
    /// One row per group per day with spot counts
    SunspotCount,
}

impl DatasetKind {
    /// Detect dataset kind from the input's own name
    ///
    /// Only the last path component is inspected (the containing directory
    /// for a `.csv` file), split into words on anything non-alphanumeric.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = if path.extension().is_some_and(|ext| ext == "csv") {
            path.parent().and_then(Path::file_name)
        } else {
            path.file_name()
        }?;
        let name = name.to_string_lossy().to_lowercase();

        name.split(|c: char| !c.is_ascii_alphanumeric())
            .find_map(|word| match word {
                "region" | "regions" | "position" | "positions" => Some(DatasetKind::ActiveRegion),
                "count" | "counts" | "number" | "numbers" => Some(DatasetKind::SunspotCount),
                _ => None,
            })
    }

    /// Detect dataset kind from raw header names
    pub fn from_columns<'a>(mut names: impl Iterator<Item = &'a str>) -> Option<Self> {
        names.find_map(|name| match name {
            "lat" | "lon" | "first" | "last" => Some(DatasetKind::ActiveRegion),
            "spots" => Some(DatasetKind::SunspotCount),
            _ => None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::ActiveRegion => "active-region",
            DatasetKind::SunspotCount => "sunspot-count",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Solar hemisphere
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Hemisphere {
    North,
    South,
}

impl Hemisphere {
    /// Single-letter code used in raw files and Parquet output
    pub fn code(&self) -> &'static str {
        match self {
            Hemisphere::North => "N",
            Hemisphere::South => "S",
        }
    }

    /// Parse a single-letter code
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "N" | "n" => Some(Hemisphere::North),
            "S" | "s" => Some(Hemisphere::South),
            _ => None,
        }
    }
}

/// Coordinate axis of a position token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::Latitude => "latitude",
            Axis::Longitude => "longitude",
        }
    }
}

/// Signed coordinate interval in whole degrees, `min <= max`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoordinateRange {
    pub min: i16,
    pub max: i16,
}

impl CoordinateRange {
    /// Build a range from two ends given in any order
    pub fn new(a: i16, b: i16) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn point(value: i16) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    /// Extent in degrees, widened so extreme ends cannot overflow
    pub fn span(&self) -> i32 {
        i32::from(self.max) - i32::from(self.min)
    }

    /// Range mirrored through zero
    pub fn negated(&self) -> Self {
        Self::new(-self.max, -self.min)
    }
}

/// Calendar month of a raw report file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReportMonth {
    pub year: i32,
    pub month: u32,
}

impl ReportMonth {
    pub const fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// First day of the month, `None` for an invalid month number
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn from_date(date: NaiveDate) -> Self {
        use chrono::Datelike;
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for ReportMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

// =============================================================================
// Canonical Records
// =============================================================================

/// Canonical active-region observation: one sunspot group over its visible lifetime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupObservation {
    /// Era of the source report
    pub era: Era,
    /// Month of the source report
    pub report_month: ReportMonth,
    pub hemisphere: Option<Hemisphere>,
    /// Observer-assigned serial, unique within (hemisphere, era) before merging
    pub group_serial: Option<u16>,
    pub latitude: Option<CoordinateRange>,
    pub longitude: Option<CoordinateRange>,
    pub latitude_uncertain: bool,
    pub longitude_uncertain: bool,
    pub first_seen: Option<NaiveDate>,
    pub last_seen: Option<NaiveDate>,
    /// Unresolved fragment of a group split across two monthly reports
    pub continuation: bool,
}

impl GroupObservation {
    /// Empty observation for a report, every typed field null
    pub fn empty(era: Era, report_month: ReportMonth) -> Self {
        Self {
            era,
            report_month,
            hemisphere: None,
            group_serial: None,
            latitude: None,
            longitude: None,
            latitude_uncertain: false,
            longitude_uncertain: false,
            first_seen: None,
            last_seen: None,
            continuation: false,
        }
    }

    /// Observation span in days, when both ends are known
    pub fn interval_days(&self) -> Option<i64> {
        match (self.first_seen, self.last_seen) {
            (Some(first), Some(last)) => Some((last - first).num_days()),
            _ => None,
        }
    }

    /// Whether the observation overlaps the inclusive window `[start, end]`
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        match (self.first_seen, self.last_seen) {
            (Some(first), Some(last)) => first <= end && last >= start,
            (Some(first), None) => first >= start && first <= end,
            _ => false,
        }
    }
}

/// Canonical per-group daily row of the sunspot-count dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyGroupRecord {
    pub era: Era,
    pub date: Option<NaiveDate>,
    pub hemisphere: Option<Hemisphere>,
    /// Number given to the group on that day's sketch
    pub group_number: Option<u16>,
    pub spot_count: Option<u16>,
}

/// Group and spot totals for one partition of one day
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HemisphereCount {
    pub groups: u32,
    pub spots: u32,
}

impl HemisphereCount {
    /// Relative (Wolf) sunspot number, R = 10g + f
    pub fn relative_number(&self) -> u32 {
        10 * self.groups + self.spots
    }
}

impl std::ops::Add for HemisphereCount {
    type Output = HemisphereCount;

    fn add(self, rhs: Self) -> Self::Output {
        HemisphereCount {
            groups: self.groups + rhs.groups,
            spots: self.spots + rhs.spots,
        }
    }
}

/// One row of the daily sunspot-number dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountObservation {
    pub date: NaiveDate,
    pub north: HemisphereCount,
    pub south: HemisphereCount,
    pub total: HemisphereCount,
}

impl CountObservation {
    /// Build a row with the total derived from both hemispheres
    pub fn from_hemispheres(date: NaiveDate, north: HemisphereCount, south: HemisphereCount) -> Self {
        Self {
            date,
            north,
            south,
            total: north + south,
        }
    }
}

/// Monthly means of the daily sunspot-number values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyCount {
    /// First day of the month
    pub month: NaiveDate,
    /// Number of observed days contributing to the means
    pub days: u32,
    pub north_groups: f64,
    pub north_spots: f64,
    pub north_relative: f64,
    pub south_groups: f64,
    pub south_spots: f64,
    pub south_relative: f64,
    pub total_groups: f64,
    pub total_spots: f64,
    pub total_relative: f64,
}

// =============================================================================
// Parse Issues
// =============================================================================

/// Why a raw field could not be normalized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueKind {
    /// Token does not match the field grammar
    Malformed,
    /// Token parsed but its value is outside the accepted range
    OutOfRange,
    /// Token is a date that does not exist on the calendar
    InvalidDate,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            IssueKind::Malformed => "malformed",
            IssueKind::OutOfRange => "out of range",
            IssueKind::InvalidDate => "invalid date",
        };
        f.write_str(label)
    }
}

/// A field that normalized to a typed null, kept for operator review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub column: String,
    pub token: String,
    pub kind: IssueKind,
    /// Source file, filled in by the pipeline
    pub file: Option<PathBuf>,
    /// 1-based line in the source file
    pub line: usize,
}

impl FieldIssue {
    pub fn new(column: &str, token: &str, kind: IssueKind) -> Self {
        Self {
            column: column.to_string(),
            token: token.to_string(),
            kind,
            file: None,
            line: 0,
        }
    }

    pub fn at(mut self, file: &Path, line: usize) -> Self {
        self.file = Some(file.to_path_buf());
        self.line = line;
        self
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(
                f,
                "{}:{} column '{}' {} token '{}'",
                file.display(),
                self.line,
                self.column,
                self.kind,
                self.token
            ),
            None => write!(
                f,
                "line {} column '{}' {} token '{}'",
                self.line, self.column, self.kind, self.token
            ),
        }
    }
}

// =============================================================================
// Processing Statistics
// =============================================================================

/// Processing statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub files_processed: usize,
    pub files_skipped: usize,
    pub rows_read: usize,
    pub rows_written: usize,
    pub continuations_merged: usize,
    pub field_issues: Vec<FieldIssue>,
    pub outputs: Vec<PathBuf>,
    pub reports: Vec<ValidationReport>,
    pub processing_time_ms: u128,
}

impl ProcessingStats {
    /// Total validation findings across every audited table
    pub fn finding_count(&self) -> usize {
        self.reports.iter().map(|report| report.findings.len()).sum()
    }
}
