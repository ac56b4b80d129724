//! Resolution of groups split across two monthly reports.
//!
//! A group still visible at the end of a month shows up in two reports
//! under the same serial, one of the rows marked as a continuation. Within
//! a partition of (era, hemisphere), a serial carrying a continuation row
//! is merged only when exactly two rows share it; anything else is left
//! as is and reported.

use crate::models::{Era, GroupObservation, Hemisphere};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, warn};

type MergeKey = (Era, Hemisphere, u16);

/// Merge continuation pairs; returns the merged table and the number of pairs merged
pub fn merge_continuations(observations: Vec<GroupObservation>) -> (Vec<GroupObservation>, usize) {
    let mut by_key: HashMap<MergeKey, Vec<usize>> = HashMap::new();
    for (index, obs) in observations.iter().enumerate() {
        if let (Some(hemisphere), Some(serial)) = (obs.hemisphere, obs.group_serial) {
            by_key.entry((obs.era, hemisphere, serial)).or_default().push(index);
        }
    }

    // Row index that receives the merged row, and the row that is absorbed.
    let mut replacements: HashMap<usize, GroupObservation> = HashMap::new();
    let mut absorbed: Vec<bool> = vec![false; observations.len()];

    for (key, indices) in &by_key {
        if !indices.iter().any(|&i| observations[i].continuation) {
            continue;
        }
        if indices.len() != 2 {
            warn!(
                "Not merging serial {} ({}, {}): {} rows carry it",
                key.2,
                key.0,
                key.1.code(),
                indices.len()
            );
            continue;
        }

        let (a, b) = (indices[0], indices[1]);
        let (primary, secondary) = if merge_priority(&observations[a], &observations[b]) == Ordering::Greater {
            (b, a)
        } else {
            (a, b)
        };
        let merged = merge_pair(&observations[primary], &observations[secondary]);
        replacements.insert(a.min(b), merged);
        absorbed[a.max(b)] = true;
    }

    let merged_pairs = replacements.len();
    let merged: Vec<GroupObservation> = observations
        .into_iter()
        .enumerate()
        .filter(|(index, _)| !absorbed[*index])
        .map(|(index, obs)| replacements.remove(&index).unwrap_or(obs))
        .collect();

    debug!("Merged {} continuation pairs", merged_pairs);
    (merged, merged_pairs)
}

/// Coalescing order: the non-continuation fragment first, then the earlier report month
fn merge_priority(a: &GroupObservation, b: &GroupObservation) -> Ordering {
    a.continuation
        .cmp(&b.continuation)
        .then(a.report_month.cmp(&b.report_month))
}

/// Merge two fragments; `primary` wins every first-non-null choice
pub fn merge_pair(primary: &GroupObservation, secondary: &GroupObservation) -> GroupObservation {
    let (latitude, latitude_uncertain) = match primary.latitude {
        Some(range) => (Some(range), primary.latitude_uncertain),
        None => (secondary.latitude, secondary.latitude_uncertain),
    };
    let (longitude, longitude_uncertain) = match primary.longitude {
        Some(range) => (Some(range), primary.longitude_uncertain),
        None => (secondary.longitude, secondary.longitude_uncertain),
    };

    GroupObservation {
        era: primary.era,
        report_month: primary.report_month,
        hemisphere: primary.hemisphere.or(secondary.hemisphere),
        group_serial: primary.group_serial.or(secondary.group_serial),
        latitude,
        longitude,
        latitude_uncertain,
        longitude_uncertain,
        first_seen: min_present(primary.first_seen, secondary.first_seen),
        last_seen: max_present(primary.last_seen, secondary.last_seen),
        continuation: false,
    }
}

fn min_present<T: Ord>(a: Option<T>, b: Option<T>) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn max_present<T: Ord>(a: Option<T>, b: Option<T>) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CoordinateRange, ReportMonth};
    use chrono::NaiveDate;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fragment(
        report: (i32, u32),
        serial: u16,
        first: NaiveDate,
        last: NaiveDate,
        continuation: bool,
    ) -> GroupObservation {
        let mut obs = GroupObservation::empty(Era::New, ReportMonth::new(report.0, report.1));
        obs.hemisphere = Some(Hemisphere::North);
        obs.group_serial = Some(serial);
        obs.first_seen = Some(first);
        obs.last_seen = Some(last);
        obs.continuation = continuation;
        obs
    }

    #[test]
    fn test_merges_month_boundary_fragments() {
        let a = fragment((2000, 5), 3, ymd(2000, 5, 5), ymd(2000, 5, 5), true);
        let mut b = fragment((2000, 6), 3, ymd(2000, 5, 30), ymd(2000, 6, 3), false);
        b.latitude = Some(CoordinateRange::new(8, 11));

        let (merged, pairs) = merge_continuations(vec![a, b]);
        assert_eq!(pairs, 1);
        assert_eq!(merged.len(), 1);

        let row = &merged[0];
        assert_eq!(row.first_seen, Some(ymd(2000, 5, 5)));
        assert_eq!(row.last_seen, Some(ymd(2000, 6, 3)));
        assert_eq!(row.latitude, Some(CoordinateRange::new(8, 11)));
        assert_eq!(row.report_month, ReportMonth::new(2000, 6));
        assert!(!row.continuation);
    }

    #[test]
    fn test_non_continuation_fragment_wins_coalescing() {
        let mut a = fragment((2000, 5), 4, ymd(2000, 5, 28), ymd(2000, 5, 31), false);
        a.latitude = Some(CoordinateRange::new(-12, -10));
        a.latitude_uncertain = true;
        let mut b = fragment((2000, 6), 4, ymd(2000, 6, 1), ymd(2000, 6, 2), true);
        b.latitude = Some(CoordinateRange::new(-14, -13));

        let (merged, _) = merge_continuations(vec![b, a]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].latitude, Some(CoordinateRange::new(-12, -10)));
        assert!(merged[0].latitude_uncertain);
        assert_eq!(merged[0].report_month, ReportMonth::new(2000, 5));
    }

    #[test]
    fn test_three_rows_are_left_alone() {
        let rows = vec![
            fragment((2000, 5), 7, ymd(2000, 5, 1), ymd(2000, 5, 2), true),
            fragment((2000, 6), 7, ymd(2000, 6, 1), ymd(2000, 6, 2), false),
            fragment((2000, 7), 7, ymd(2000, 7, 1), ymd(2000, 7, 2), false),
        ];
        let (merged, pairs) = merge_continuations(rows.clone());
        assert_eq!(pairs, 0);
        assert_eq!(merged, rows);
    }

    #[test]
    fn test_pairs_without_continuation_are_not_merged() {
        let rows = vec![
            fragment((2000, 5), 2, ymd(2000, 5, 1), ymd(2000, 5, 2), false),
            fragment((2000, 6), 2, ymd(2000, 6, 1), ymd(2000, 6, 2), false),
        ];
        let (merged, pairs) = merge_continuations(rows);
        assert_eq!(pairs, 0);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_partitions_are_separate() {
        let north = fragment((2000, 5), 5, ymd(2000, 5, 1), ymd(2000, 5, 2), true);
        let mut south = fragment((2000, 6), 5, ymd(2000, 6, 1), ymd(2000, 6, 2), false);
        south.hemisphere = Some(Hemisphere::South);
        let mut no_hemisphere = fragment((2000, 6), 5, ymd(2000, 6, 1), ymd(2000, 6, 2), false);
        no_hemisphere.hemisphere = None;

        let (merged, pairs) = merge_continuations(vec![north, south, no_hemisphere]);
        assert_eq!(pairs, 0);
        assert_eq!(merged.len(), 3);
        assert!(merged[0].continuation);
    }

    #[test]
    fn test_merged_row_keeps_position_of_earlier_fragment() {
        let other = fragment((2000, 5), 1, ymd(2000, 5, 1), ymd(2000, 5, 3), false);
        let a = fragment((2000, 5), 9, ymd(2000, 5, 29), ymd(2000, 5, 31), true);
        let between = fragment((2000, 6), 2, ymd(2000, 6, 2), ymd(2000, 6, 4), false);
        let b = fragment((2000, 6), 9, ymd(2000, 6, 1), ymd(2000, 6, 5), false);

        let (merged, _) = merge_continuations(vec![other, a, between, b]);
        let serials: Vec<u16> = merged.iter().filter_map(|o| o.group_serial).collect();
        assert_eq!(serials, vec![1, 9, 2]);
        assert_eq!(merged[1].first_seen, Some(ymd(2000, 5, 29)));
        assert_eq!(merged[1].last_seen, Some(ymd(2000, 6, 5)));
    }
}
