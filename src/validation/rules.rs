//! Individual validation rules.

use super::{FindingDetail, Rule, ValidationFinding};
use crate::models::{Axis, CountObservation, DailyGroupRecord, GroupObservation, Hemisphere, HemisphereCount};
use crate::schema::era_spec;
use chrono::NaiveDate;
use std::collections::BTreeMap;

fn rows_where<T>(table: &[T], predicate: impl Fn(&T) -> bool) -> Vec<usize> {
    table
        .iter()
        .enumerate()
        .filter(|(_, row)| predicate(row))
        .map(|(index, _)| index)
        .collect()
}

fn finding_if_any(rule: Rule, rows: Vec<usize>, message: String) -> Option<ValidationFinding> {
    if rows.is_empty() {
        None
    } else {
        Some(ValidationFinding::new(rule, rows).with_message(message))
    }
}

/// Rows missing a field every group needs, one finding per field
pub fn find_null_values(groups: &[GroupObservation]) -> Vec<ValidationFinding> {
    let checks: [(&str, fn(&GroupObservation) -> bool); 5] = [
        ("group_serial", |g| g.group_serial.is_none()),
        ("hemisphere", |g| g.hemisphere.is_none()),
        ("latitude", |g| g.latitude.is_none()),
        ("first_seen", |g| g.first_seen.is_none()),
        ("last_seen", |g| g.last_seen.is_none()),
    ];

    checks
        .iter()
        .filter_map(|(field, is_null)| {
            finding_if_any(
                Rule::NullValues,
                rows_where(groups, is_null),
                format!("{field} is null"),
            )
        })
        .collect()
}

/// Rows whose first-seen date is after their last-seen date
pub fn find_reversed_intervals(groups: &[GroupObservation]) -> Vec<ValidationFinding> {
    let rows = rows_where(groups, |g| matches!((g.first_seen, g.last_seen), (Some(f), Some(l)) if f > l));
    finding_if_any(Rule::ReversedIntervals, rows, "first_seen after last_seen".to_string())
        .into_iter()
        .collect()
}

/// Rows observed for longer than `max_days`
pub fn find_long_intervals(groups: &[GroupObservation], max_days: i64) -> Vec<ValidationFinding> {
    let rows = rows_where(groups, |g| g.interval_days().is_some_and(|days| days > max_days));
    finding_if_any(
        Rule::LongIntervals,
        rows,
        format!("observed for more than {max_days} days"),
    )
    .into_iter()
    .collect()
}

/// Rows with a coordinate outside its era's bounds, one finding per axis
pub fn find_out_of_range_coordinates(groups: &[GroupObservation]) -> Vec<ValidationFinding> {
    [Axis::Latitude, Axis::Longitude]
        .into_iter()
        .filter_map(|axis| {
            let rows = rows_where(groups, |g| {
                let value = match axis {
                    Axis::Latitude => g.latitude,
                    Axis::Longitude => g.longitude,
                };
                match (value, era_spec(g.era).bounds(axis)) {
                    (Some(range), Some((low, high))) => range.min < low || range.max > high,
                    (Some(_), None) => true,
                    (None, _) => false,
                }
            });
            finding_if_any(
                Rule::OutOfRangeCoordinates,
                rows,
                format!("{} outside era bounds", axis.as_str()),
            )
        })
        .collect()
}

/// Rows whose extent on `axis` exceeds `max_span` degrees
pub fn find_wide_coordinate_spans(
    groups: &[GroupObservation],
    axis: Axis,
    max_span: i16,
) -> Vec<ValidationFinding> {
    let rows = rows_where(groups, |g| {
        let value = match axis {
            Axis::Latitude => g.latitude,
            Axis::Longitude => g.longitude,
        };
        value.is_some_and(|range| range.span() > i32::from(max_span))
    });
    finding_if_any(
        Rule::WideCoordinateSpans,
        rows,
        format!("{} span wider than {max_span} degrees", axis.as_str()),
    )
    .into_iter()
    .collect()
}

/// Rows whose latitude lies entirely in the opposite hemisphere
pub fn find_hemisphere_mismatches(groups: &[GroupObservation]) -> Vec<ValidationFinding> {
    let rows = rows_where(groups, |g| match (g.hemisphere, g.latitude) {
        (Some(Hemisphere::North), Some(range)) => range.max < 0,
        (Some(Hemisphere::South), Some(range)) => range.min > 0,
        _ => false,
    });
    finding_if_any(
        Rule::HemisphereMismatches,
        rows,
        "latitude contradicts hemisphere".to_string(),
    )
    .into_iter()
    .collect()
}

/// Dates that appear on more than one row, one finding per date
pub fn find_duplicate_dates(counts: &[CountObservation]) -> Vec<ValidationFinding> {
    let mut by_date: BTreeMap<NaiveDate, Vec<usize>> = BTreeMap::new();
    for (index, row) in counts.iter().enumerate() {
        by_date.entry(row.date).or_default().push(index);
    }

    by_date
        .into_iter()
        .filter(|(_, rows)| rows.len() > 1)
        .map(|(date, rows)| {
            ValidationFinding::new(Rule::DuplicateDates, rows).with_message(format!("{date} repeated"))
        })
        .collect()
}

/// Days whose group numbers are not exactly `1..=N`, one finding per day
pub fn find_invalid_group_number(records: &[DailyGroupRecord]) -> Vec<ValidationFinding> {
    let mut by_date: BTreeMap<NaiveDate, Vec<(usize, u16)>> = BTreeMap::new();
    for (index, record) in records.iter().enumerate() {
        if let (Some(date), Some(number)) = (record.date, record.group_number) {
            by_date.entry(date).or_default().push((index, number));
        }
    }

    by_date
        .into_iter()
        .filter_map(|(date, entries)| {
            let mut original: Vec<u16> = entries.iter().map(|&(_, number)| number).collect();
            original.sort_unstable();
            let expected: Vec<u16> = (1..=entries.len() as u16).collect();
            if original == expected {
                return None;
            }

            Some(ValidationFinding {
                rule: Rule::InvalidGroupNumber,
                rows: entries.iter().map(|&(index, _)| index).collect(),
                detail: FindingDetail::GroupNumbering {
                    date,
                    original,
                    expected,
                },
            })
        })
        .collect()
}

/// Rows whose total differs from north plus south
pub fn find_inconsistent_totals(counts: &[CountObservation]) -> Vec<ValidationFinding> {
    let rows = rows_where(counts, |row| {
        row.total.groups != row.north.groups + row.south.groups
            || row.total.spots != row.north.spots + row.south.spots
    });
    finding_if_any(
        Rule::InconsistentTotals,
        rows,
        "total differs from north + south".to_string(),
    )
    .into_iter()
    .collect()
}

/// Rows where some partition has more groups than spots
pub fn find_groups_exceeding_spots(counts: &[CountObservation]) -> Vec<ValidationFinding> {
    let exceeds = |count: &HemisphereCount| count.groups > count.spots;
    let rows = rows_where(counts, |row| {
        exceeds(&row.north) || exceeds(&row.south) || exceeds(&row.total)
    });
    finding_if_any(
        Rule::GroupsExceedingSpots,
        rows,
        "more groups than spots".to_string(),
    )
    .into_iter()
    .collect()
}
