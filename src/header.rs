//! Raw report file reading.
//!
//! Extracts the report month from the `{year}-{month}.csv` file name,
//! reads the header row after any `#` comment lines, checks it against the
//! era's column table and returns the data rows as raw string records.

use crate::constants::sentinels::COMMENT_PREFIX;
use crate::error::{Result, SunspotError};
use crate::models::{DatasetKind, ReportMonth};
use crate::schema::EraSpec;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// One raw data row, fields addressed through the file's column mapping
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// 1-based line number in the source file
    pub line: usize,
    pub fields: Vec<String>,
}

/// A raw report file ready for normalization
#[derive(Debug, Clone)]
pub struct RawFile {
    pub report_month: ReportMonth,
    pub columns: ColumnMapping,
    pub records: Vec<RawRecord>,
}

impl RawFile {
    /// Token of `column` in `record`, empty when the column or cell is absent
    pub fn field<'a>(&self, record: &'a RawRecord, column: &str) -> &'a str {
        self.columns
            .index_of(column)
            .and_then(|index| record.fields.get(index))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// All tokens of one column in row order
    pub fn column_tokens<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.records.iter().map(move |record| self.field(record, column))
    }
}

/// Header name to field position
#[derive(Debug, Clone, Default)]
pub struct ColumnMapping {
    name_to_index: HashMap<String, usize>,
}

impl ColumnMapping {
    pub fn from_headers<'a, I>(headers: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let name_to_index = headers
            .into_iter()
            .enumerate()
            .map(|(index, name)| (name.trim().to_lowercase(), index))
            .collect();
        Self { name_to_index }
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.name_to_index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.name_to_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.name_to_index.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.name_to_index.keys().map(String::as_str)
    }
}

static REPORT_FILE_NAME: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{1,2})\.csv$"));

/// File-name pattern, compiled on first use
fn report_file_pattern() -> Result<&'static Regex> {
    Ok(REPORT_FILE_NAME.as_ref().map_err(Clone::clone)?)
}

/// Extract the report month from a `{year}-{month}.csv` file name
pub fn parse_report_month(path: &Path) -> Result<ReportMonth> {
    let invalid = || SunspotError::InvalidFileName {
        path: path.to_path_buf(),
    };

    let file_name = path.file_name().and_then(|n| n.to_str()).ok_or_else(invalid)?;
    let caps = report_file_pattern()?.captures(file_name).ok_or_else(invalid)?;

    let year: i32 = caps[1].parse().map_err(|_| invalid())?;
    let month: u32 = caps[2].parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }

    Ok(ReportMonth::new(year, month))
}

/// Read only the header row of a raw report file
pub fn read_header(path: &Path) -> Result<ColumnMapping> {
    let mut reader = csv::ReaderBuilder::new()
        .comment(Some(COMMENT_PREFIX as u8))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;
    let headers = reader.headers()?;
    Ok(ColumnMapping::from_headers(headers.iter()))
}

/// Read a raw report file and check its header against the era schema
pub fn read_raw_file(path: &Path, spec: &EraSpec, kind: DatasetKind) -> Result<RawFile> {
    let report_month = parse_report_month(path)?;

    let mut reader = csv::ReaderBuilder::new()
        .comment(Some(COMMENT_PREFIX as u8))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(SunspotError::EmptyFile {
            path: path.to_path_buf(),
        });
    }
    let columns = ColumnMapping::from_headers(headers.iter());

    let expected = spec.columns(kind);
    let missing: Vec<String> = expected
        .iter()
        .filter(|column| !columns.contains(column.name))
        .map(|column| column.name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(SunspotError::HeaderMismatch {
            path: path.to_path_buf(),
            era: spec.era.to_string(),
            missing,
        });
    }

    let extra: Vec<&str> = columns
        .names()
        .filter(|name| !expected.iter().any(|column| column.name == *name))
        .collect();
    if !extra.is_empty() {
        warn!(
            "Ignoring unexpected columns in {}: {:?}",
            path.display(),
            extra
        );
    }

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        let line = record
            .position()
            .map(|position| position.line() as usize)
            .unwrap_or(records.len() + 2);
        records.push(RawRecord {
            line,
            fields: record.iter().map(str::to_string).collect(),
        });
    }

    debug!(
        "Read {} rows from {} ({} era, {} columns)",
        records.len(),
        path.display(),
        spec.era,
        columns.len()
    );

    Ok(RawFile {
        report_month,
        columns,
        records,
    })
}
