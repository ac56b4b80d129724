//! Comparison against the SILSO monthly sunspot number series.
//!
//! The reference file is semicolon separated without a header:
//! `year;month;decimal_year;value;std_dev;observations;definitive`.
//! A value of `-1` marks a month without data.

use crate::error::{Result, SunspotError};
use crate::models::MonthlyCount;
use chrono::NaiveDate;
use colored::Colorize;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// One month of the reference series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceMonth {
    /// First day of the month
    pub month: NaiveDate,
    /// Monthly mean total sunspot number, `None` when missing
    pub value: Option<f64>,
}

/// Read a SILSO monthly file
pub fn read_silso_monthly(path: &Path) -> Result<Vec<ReferenceMonth>> {
    let file = std::fs::File::open(path)?;
    parse_silso_monthly(file).map_err(|e| match e {
        SunspotError::ProcessingFailed { reason, .. } => SunspotError::ProcessingFailed {
            path: path.to_path_buf(),
            reason,
        },
        other => other,
    })
}

/// Parse SILSO monthly rows from any reader
pub fn parse_silso_monthly<R: Read>(input: R) -> Result<Vec<ReferenceMonth>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let mut months = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        let invalid = |reason: &str| SunspotError::ProcessingFailed {
            path: Default::default(),
            reason: format!("line {}: {}", index + 1, reason),
        };

        let year: i32 = record
            .get(0)
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| invalid("bad year"))?;
        let month: u32 = record
            .get(1)
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| invalid("bad month"))?;
        let value: f64 = record
            .get(3)
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| invalid("bad value"))?;
        let first_day = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| invalid("bad month"))?;

        months.push(ReferenceMonth {
            month: first_day,
            value: (value >= 0.0).then_some(value),
        });
    }

    debug!("Parsed {} reference months", months.len());
    Ok(months)
}

/// Observed and reference value of one month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub month: NaiveDate,
    pub observed: f64,
    pub reference: f64,
    /// `reference / observed`, `None` when nothing was observed
    pub ratio: Option<f64>,
}

/// Month-by-month comparison with the least-squares scale factor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub rows: Vec<ComparisonRow>,
    /// `k` minimizing `Σ(r - k·o)²`, i.e. `Σ(o·r) / Σ(o²)`
    pub scale_factor: Option<f64>,
}

/// Pair observed monthly means with the reference series
///
/// Months missing on either side, or with a non-finite observed mean, are
/// left out.
pub fn compare_monthly(observed: &[MonthlyCount], reference: &[ReferenceMonth]) -> Comparison {
    let reference: HashMap<NaiveDate, f64> = reference
        .iter()
        .filter_map(|month| month.value.map(|value| (month.month, value)))
        .collect();

    let rows: Vec<ComparisonRow> = observed
        .iter()
        .filter(|month| month.total_relative.is_finite())
        .filter_map(|month| {
            let reference = *reference.get(&month.month)?;
            let observed = month.total_relative;
            Some(ComparisonRow {
                month: month.month,
                observed,
                reference,
                ratio: (observed > 0.0).then(|| reference / observed),
            })
        })
        .collect();

    if rows.is_empty() {
        warn!("No months in common with the reference series");
    }

    let cross: f64 = rows.iter().map(|row| row.observed * row.reference).sum();
    let square: f64 = rows.iter().map(|row| row.observed * row.observed).sum();
    let scale_factor = (square > 0.0).then(|| cross / square);

    Comparison { rows, scale_factor }
}

impl Comparison {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "Reference comparison".bold())?;
        writeln!(f, "  {:<10} {:>10} {:>10} {:>8}", "month", "observed", "reference", "ratio")?;
        for row in &self.rows {
            let ratio = row
                .ratio
                .map(|r| format!("{:.3}", r))
                .unwrap_or_else(|| "-".to_string());
            writeln!(
                f,
                "  {:<10} {:>10.1} {:>10.1} {:>8}",
                row.month.format("%Y-%m"),
                row.observed,
                row.reference,
                ratio
            )?;
        }
        match self.scale_factor {
            Some(k) => writeln!(f, "  {} {:.4}", "Scale factor:".bright_cyan(), k),
            None => writeln!(f, "  {} {}", "Scale factor:".bright_cyan(), "undefined".yellow()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SILSO: &str = "\
1990;01;1990.042;  229.5;  14.1;  612;1
1990;02;1990.123;  220.2;  13.7;  580;1
1990;03;1990.204;   -1.0;  -1.0;   -1;0
";

    fn monthly(month: NaiveDate, total_relative: f64) -> MonthlyCount {
        MonthlyCount {
            month,
            days: 30,
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

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_silso_rows() {
        let months = parse_silso_monthly(SILSO.as_bytes()).unwrap();
        assert_eq!(months.len(), 3);
        assert_eq!(months[0].month, ymd(1990, 1, 1));
        assert_eq!(months[0].value, Some(229.5));
        assert_eq!(months[2].value, None);
    }

    #[test]
    fn test_malformed_row_is_rejected() {
        let result = parse_silso_monthly("1990;xx;1990.0;1.0\n".as_bytes());
        assert!(matches!(result, Err(SunspotError::ProcessingFailed { .. })));
    }

    #[test]
    fn test_comparison_and_scale_factor() {
        let reference = parse_silso_monthly(SILSO.as_bytes()).unwrap();
        let observed = vec![
            monthly(ymd(1990, 1, 1), 150.0),
            monthly(ymd(1990, 2, 1), 0.0),
            monthly(ymd(1990, 3, 1), 120.0),
            monthly(ymd(1990, 4, 1), 100.0),
        ];

        let comparison = compare_monthly(&observed, &reference);
        assert_eq!(comparison.rows.len(), 2);
        assert_relative_eq!(comparison.rows[0].ratio.unwrap(), 229.5 / 150.0);
        assert_eq!(comparison.rows[1].ratio, None);

        let expected = (150.0 * 229.5) / (150.0 * 150.0);
        assert_relative_eq!(comparison.scale_factor.unwrap(), expected);
    }

    #[test]
    fn test_scale_factor_undefined_without_overlap() {
        let comparison = compare_monthly(&[monthly(ymd(2000, 1, 1), 80.0)], &[]);
        assert!(comparison.rows.is_empty());
        assert_eq!(comparison.scale_factor, None);
    }
}
