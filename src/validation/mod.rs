//! Data-quality audit of canonical tables.
//!
//! Each rule is a pure function from a table (and an optional threshold)
//! to a list of findings naming the offending rows. Rules never fail and
//! an empty list means the table passes. [`Validator`] bundles the
//! thresholds and runs every rule that applies to a table.

pub mod report;
pub mod rules;

pub use report::ValidationReport;
pub use rules::*;

use crate::config::ValidationThresholds;
use crate::models::{Axis, CountObservation, DailyGroupRecord, GroupObservation};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use tracing::info;

/// Identifier of a validation rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    NullValues,
    ReversedIntervals,
    LongIntervals,
    OutOfRangeCoordinates,
    WideCoordinateSpans,
    HemisphereMismatches,
    DuplicateDates,
    InvalidGroupNumber,
    InconsistentTotals,
    GroupsExceedingSpots,
}

impl Rule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::NullValues => "null_values",
            Rule::ReversedIntervals => "reversed_intervals",
            Rule::LongIntervals => "long_intervals",
            Rule::OutOfRangeCoordinates => "out_of_range_coordinates",
            Rule::WideCoordinateSpans => "wide_coordinate_spans",
            Rule::HemisphereMismatches => "hemisphere_mismatches",
            Rule::DuplicateDates => "duplicate_dates",
            Rule::InvalidGroupNumber => "invalid_group_number",
            Rule::InconsistentTotals => "inconsistent_totals",
            Rule::GroupsExceedingSpots => "groups_exceeding_spots",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extra context attached to a finding
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FindingDetail {
    None,
    Message { text: String },
    GroupNumbering {
        date: NaiveDate,
        original: Vec<u16>,
        expected: Vec<u16>,
    },
}

impl fmt::Display for FindingDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindingDetail::None => Ok(()),
            FindingDetail::Message { text } => f.write_str(text),
            FindingDetail::GroupNumbering {
                date,
                original,
                expected,
            } => write!(f, "{date}: numbered {original:?}, expected {expected:?}"),
        }
    }
}

/// One rule violation: the rule, the 0-based rows involved and context
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationFinding {
    pub rule: Rule,
    pub rows: Vec<usize>,
    pub detail: FindingDetail,
}

impl ValidationFinding {
    pub fn new(rule: Rule, rows: Vec<usize>) -> Self {
        Self {
            rule,
            rows,
            detail: FindingDetail::None,
        }
    }

    pub fn with_message(mut self, text: impl Into<String>) -> Self {
        self.detail = FindingDetail::Message { text: text.into() };
        self
    }
}

/// Runs the rules for each table kind with a fixed set of thresholds
#[derive(Debug, Clone, Default)]
pub struct Validator {
    thresholds: ValidationThresholds,
}

impl Validator {
    pub fn new(thresholds: ValidationThresholds) -> Self {
        Self { thresholds }
    }

    /// Audit the active-region table
    pub fn validate_groups(&self, groups: &[GroupObservation]) -> ValidationReport {
        let mut findings = Vec::new();
        findings.extend(find_null_values(groups));
        findings.extend(find_reversed_intervals(groups));
        findings.extend(find_long_intervals(groups, self.thresholds.max_interval_days));
        findings.extend(find_out_of_range_coordinates(groups));
        findings.extend(find_wide_coordinate_spans(
            groups,
            Axis::Latitude,
            self.thresholds.max_latitude_span,
        ));
        findings.extend(find_wide_coordinate_spans(
            groups,
            Axis::Longitude,
            self.thresholds.max_longitude_span,
        ));
        findings.extend(find_hemisphere_mismatches(groups));

        self.finish("active_regions", groups.len(), findings)
    }

    /// Audit the per-group daily rows of the count dataset
    pub fn validate_daily_groups(&self, records: &[DailyGroupRecord]) -> ValidationReport {
        let findings = find_invalid_group_number(records);
        self.finish("daily_groups", records.len(), findings)
    }

    /// Audit the daily sunspot-number table
    pub fn validate_counts(&self, counts: &[CountObservation]) -> ValidationReport {
        let mut findings = Vec::new();
        findings.extend(find_duplicate_dates(counts));
        findings.extend(find_inconsistent_totals(counts));
        findings.extend(find_groups_exceeding_spots(counts));

        self.finish("sunspot_number_daily", counts.len(), findings)
    }

    fn finish(&self, table: &str, rows: usize, findings: Vec<ValidationFinding>) -> ValidationReport {
        info!(
            "Validated {} ({} rows): {} findings",
            table,
            rows,
            findings.len()
        );
        ValidationReport {
            table: table.to_string(),
            rows,
            findings,
        }
    }
}
