//! Raw rows to canonical records.
//!
//! Applies the era's date strategy and the coordinate and number parsers
//! to every raw row. Fields that fail to parse become typed nulls and are
//! returned as [`FieldIssue`]s alongside the records.

use crate::constants::sentinels::CONTINUATION;
use crate::header::{RawFile, RawRecord};
use crate::models::{
    Axis, CoordinateRange, DailyGroupRecord, DatasetKind, FieldIssue, GroupObservation, Hemisphere,
};
use crate::parsing::grammar::normalize_token;
use crate::parsing::{
    audit_coordinates, forward_fill, parse_coordinate, parse_date, parse_hemisphere, parse_unsigned, CoordinateToken,
    FieldResult, Grammar,
};
use crate::schema::{ColumnKind, EraSpec};
use chrono::NaiveDate;
use std::path::Path;
use tracing::{debug, warn};

const SERIAL: &str = "no";
const HEMISPHERE: &str = "ns";
const FIRST_SEEN: &str = "first";
const LAST_SEEN: &str = "last";
const LATITUDE: &str = "lat";
const LONGITUDE: &str = "lon";
const SPOTS: &str = "spots";

/// Collects field issues for one file
struct IssueLog<'a> {
    path: &'a Path,
    issues: Vec<FieldIssue>,
}

impl<'a> IssueLog<'a> {
    fn new(path: &'a Path) -> Self {
        Self {
            path,
            issues: Vec::new(),
        }
    }

    /// Unwrap a field result, recording the failure and yielding the fallback
    fn take<T>(&mut self, result: FieldResult<T>, fallback: T, column: &str, token: &str, record: &RawRecord) -> T {
        match result {
            Ok(value) => value,
            Err(kind) => {
                self.issues
                    .push(FieldIssue::new(column, token, kind).at(self.path, record.line));
                fallback
            }
        }
    }
}

/// Normalized coordinate of one row
struct Position {
    range: Option<CoordinateRange>,
    uncertain: bool,
    signed: bool,
    continuation: bool,
}

impl Position {
    fn from_token(token: CoordinateToken) -> Self {
        match token {
            CoordinateToken::Range {
                range,
                uncertain,
                signed,
            } => Self {
                range: Some(range),
                uncertain,
                signed,
                continuation: false,
            },
            CoordinateToken::Continuation => Self {
                continuation: true,
                ..Self::empty()
            },
            CoordinateToken::NotDetected | CoordinateToken::Missing => Self::empty(),
        }
    }

    fn empty() -> Self {
        Self {
            range: None,
            uncertain: false,
            signed: false,
            continuation: false,
        }
    }
}

/// Normalize the rows of an active-region file
pub fn normalize_regions(
    grammar: &Grammar,
    spec: &EraSpec,
    raw: &RawFile,
    path: &Path,
) -> (Vec<GroupObservation>, Vec<FieldIssue>) {
    let mut log = IssueLog::new(path);
    let mut observations = Vec::with_capacity(raw.records.len());

    for record in &raw.records {
        let mut obs = GroupObservation::empty(spec.era, raw.report_month);

        let token = raw.field(record, SERIAL);
        obs.group_serial = log.take(parse_unsigned::<u16>(grammar, token), None, SERIAL, token, record);

        let token = raw.field(record, HEMISPHERE);
        obs.hemisphere = log.take(parse_hemisphere(token), None, HEMISPHERE, token, record);

        for (column, target) in [(FIRST_SEEN, &mut obs.first_seen), (LAST_SEEN, &mut obs.last_seen)] {
            let token = raw.field(record, column);
            if normalize_token(token) == CONTINUATION {
                obs.continuation = true;
                continue;
            }
            let parsed = parse_date(grammar, spec.date_format, token, raw.report_month);
            *target = log.take(parsed, None, column, token, record);
        }

        let token = raw.field(record, LATITUDE);
        let latitude = log.take(
            parse_coordinate(grammar, token, Axis::Latitude).map(Position::from_token),
            Position::empty(),
            LATITUDE,
            token,
            record,
        );
        apply_latitude(&mut obs, latitude);

        if spec.has_axis(Axis::Longitude) {
            let token = raw.field(record, LONGITUDE);
            let longitude = log.take(
                parse_coordinate(grammar, token, Axis::Longitude).map(Position::from_token),
                Position::empty(),
                LONGITUDE,
                token,
                record,
            );
            obs.longitude = longitude.range;
            obs.longitude_uncertain = longitude.uncertain;
            obs.continuation |= longitude.continuation;
        }

        observations.push(obs);
    }

    for (axis, column) in [(Axis::Latitude, LATITUDE), (Axis::Longitude, LONGITUDE)] {
        let Some(bounds) = spec.bounds(axis).filter(|_| spec.has_axis(axis)) else {
            continue;
        };
        let audit = audit_coordinates(grammar, raw.column_tokens(column), axis, bounds);
        if !audit.is_valid() {
            warn!(
                "{}: {} of {} {} tokens malformed, {} out of bounds",
                path.display(),
                audit.malformed.len(),
                audit.tokens_checked,
                axis.as_str(),
                audit.out_of_bounds.len()
            );
        }
    }

    debug!(
        "Normalized {} group rows from {} ({} issues)",
        observations.len(),
        path.display(),
        log.issues.len()
    );
    (observations, log.issues)
}

/// Resolve latitude sign and hemisphere against each other.
///
/// An unsigned latitude in a South row is negated; a row without a
/// hemisphere takes it from a signed latitude lying on one side of the
/// equator.
fn apply_latitude(obs: &mut GroupObservation, position: Position) {
    obs.continuation |= position.continuation;
    obs.latitude_uncertain = position.uncertain;

    let Some(range) = position.range else {
        return;
    };

    let range = if !position.signed && obs.hemisphere == Some(Hemisphere::South) {
        range.negated()
    } else {
        range
    };

    if obs.hemisphere.is_none() && position.signed {
        obs.hemisphere = if range.min > 0 {
            Some(Hemisphere::North)
        } else if range.max < 0 {
            Some(Hemisphere::South)
        } else {
            None
        };
    }

    obs.latitude = Some(range);
}

/// Normalize the rows of a sunspot-count file.
///
/// Count sheets write the date and hemisphere only on the first row they
/// apply to; omitted values are carried down. A malformed value is not
/// carried: rows below it stay null until the next valid value.
pub fn normalize_counts(
    grammar: &Grammar,
    spec: &EraSpec,
    raw: &RawFile,
    path: &Path,
) -> (Vec<DailyGroupRecord>, Vec<FieldIssue>) {
    let mut log = IssueLog::new(path);
    let date_column = spec
        .column_for(DatasetKind::SunspotCount, ColumnKind::Date)
        .unwrap_or("date");

    let mut dates: Vec<Option<Option<NaiveDate>>> = Vec::with_capacity(raw.records.len());
    let mut hemispheres: Vec<Option<Option<Hemisphere>>> = Vec::with_capacity(raw.records.len());
    let mut partial = Vec::with_capacity(raw.records.len());

    for record in &raw.records {
        let token = raw.field(record, date_column);
        dates.push(match parse_date(grammar, spec.date_format, token, raw.report_month) {
            Ok(None) => None,
            result => Some(log.take(result, None, date_column, token, record)),
        });

        let token = raw.field(record, HEMISPHERE);
        hemispheres.push(match parse_hemisphere(token) {
            Ok(None) => None,
            result => Some(log.take(result, None, HEMISPHERE, token, record)),
        });

        let token = raw.field(record, SERIAL);
        let group_number = log.take(parse_unsigned::<u16>(grammar, token), None, SERIAL, token, record);
        let token = raw.field(record, SPOTS);
        let spot_count = log.take(parse_unsigned::<u16>(grammar, token), None, SPOTS, token, record);
        partial.push((group_number, spot_count));
    }

    let records: Vec<DailyGroupRecord> = forward_fill(dates)
        .into_iter()
        .zip(forward_fill(hemispheres))
        .zip(partial)
        .map(|((date, hemisphere), (group_number, spot_count))| DailyGroupRecord {
            era: spec.era,
            date: date.flatten(),
            hemisphere: hemisphere.flatten(),
            group_number,
            spot_count,
        })
        .collect();

    debug!(
        "Normalized {} count rows from {} ({} issues)",
        records.len(),
        path.display(),
        log.issues.len()
    );
    (records, log.issues)
}
