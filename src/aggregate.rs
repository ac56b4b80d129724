//! Relative sunspot numbers.
//!
//! Daily values count the groups (g) and sum the spots (f) per hemisphere
//! and give R = 10g + f. Monthly values are plain means over the observed
//! days of the month.

use crate::models::{CountObservation, DailyGroupRecord, Hemisphere, HemisphereCount, MonthlyCount};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Daily sunspot numbers from per-group rows, one row per date in date order
pub fn daily_counts(records: &[DailyGroupRecord]) -> Vec<CountObservation> {
    let mut days: BTreeMap<NaiveDate, (HemisphereCount, HemisphereCount)> = BTreeMap::new();
    let mut skipped = 0usize;
    let mut null_spots = 0usize;

    for record in records {
        let (Some(date), Some(hemisphere)) = (record.date, record.hemisphere) else {
            skipped += 1;
            continue;
        };

        let spots = match record.spot_count {
            Some(spots) => u32::from(spots),
            None => {
                null_spots += 1;
                0
            }
        };

        let entry = days.entry(date).or_default();
        let partition = match hemisphere {
            Hemisphere::North => &mut entry.0,
            Hemisphere::South => &mut entry.1,
        };
        partition.groups += 1;
        partition.spots += spots;
    }

    if skipped > 0 {
        warn!("Skipped {} group rows without date or hemisphere", skipped);
    }
    if null_spots > 0 {
        warn!("Counted {} group rows with missing spot counts as zero spots", null_spots);
    }

    let daily: Vec<CountObservation> = days
        .into_iter()
        .map(|(date, (north, south))| CountObservation::from_hemispheres(date, north, south))
        .collect();
    debug!("Aggregated {} group rows into {} days", records.len(), daily.len());
    daily
}

/// Monthly means of the daily values
pub fn monthly_means(daily: &[CountObservation]) -> Vec<MonthlyCount> {
    let mut months: BTreeMap<NaiveDate, Vec<&CountObservation>> = BTreeMap::new();
    for day in daily {
        if let Some(start) = day.date.with_day(1) {
            months.entry(start).or_default().push(day);
        }
    }

    months
        .into_iter()
        .map(|(month, days)| {
            let n = days.len() as f64;
            let mean = |value: fn(&CountObservation) -> u32| {
                days.iter().map(|day| f64::from(value(day))).sum::<f64>() / n
            };

            MonthlyCount {
                month,
                days: days.len() as u32,
                north_groups: mean(|d| d.north.groups),
                north_spots: mean(|d| d.north.spots),
                north_relative: mean(|d| d.north.relative_number()),
                south_groups: mean(|d| d.south.groups),
                south_spots: mean(|d| d.south.spots),
                south_relative: mean(|d| d.south.relative_number()),
                total_groups: mean(|d| d.total.groups),
                total_spots: mean(|d| d.total.spots),
                total_relative: mean(|d| d.total.relative_number()),
            }
        })
        .collect()
}

/// Hemispheric asymmetry (R_N - R_S) / (R_N + R_S); `None` when both are zero
pub fn asymmetry_index(north: f64, south: f64) -> Option<f64> {
    let denominator = north + south;
    if denominator == 0.0 {
        None
    } else {
        Some((north - south) / denominator)
    }
}

impl CountObservation {
    pub fn asymmetry(&self) -> Option<f64> {
        asymmetry_index(
            f64::from(self.north.relative_number()),
            f64::from(self.south.relative_number()),
        )
    }
}

impl MonthlyCount {
    pub fn asymmetry(&self) -> Option<f64> {
        asymmetry_index(self.north_relative, self.south_relative)
    }
}
