//! Heliographic coordinate tokens.
//!
//! A token is a point (`N12`, `-7`, `E45.5`) or a range joined by `~`
//! (`N6~12`, `12~-15`). Each side may carry a direction letter (`N`/`S`
//! for latitude, `E`/`W` for longitude) or an explicit sign (`+`, `-`,
//! `p`, `m`). A side without an indicator takes the other side's letter;
//! explicit signs apply only to their own side. Decimal magnitudes are
//! rounded half-up before the sign is applied, and the two ends are
//! reordered so that `min <= max`.
//!
//! Special tokens: `ND` means the observer could not measure the value,
//! `/` marks a fragment continued in the adjacent monthly report, and a
//! trailing `?` flags an uncertain value.

use super::grammar::{normalize_token, Grammar};
use super::FieldResult;
use crate::constants::sentinels::{CONTINUATION, NOT_DETECTED, RANGE_SEPARATOR, UNCERTAIN};
use crate::models::{Axis, CoordinateRange, IssueKind};
use serde::Serialize;

/// Parsed coordinate token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateToken {
    /// Empty cell
    Missing,
    /// Observer could not measure the value
    NotDetected,
    /// Value lives in the adjacent monthly report
    Continuation,
    Range {
        range: CoordinateRange,
        uncertain: bool,
        /// At least one side carried an explicit indicator
        signed: bool,
    },
}

impl CoordinateToken {
    pub fn range(&self) -> Option<CoordinateRange> {
        match self {
            CoordinateToken::Range { range, .. } => Some(*range),
            _ => None,
        }
    }

    pub fn is_uncertain(&self) -> bool {
        matches!(self, CoordinateToken::Range { uncertain: true, .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Indicator {
    None,
    /// Direction letter, inheritable by the other side
    Letter(i16),
    /// Explicit sign, applies to its own side only
    Sign(i16),
}

impl Indicator {
    fn parse(text: &str, axis: Axis) -> FieldResult<Self> {
        let indicator = match (text, axis) {
            ("", _) => Indicator::None,
            ("N" | "n", Axis::Latitude) | ("E" | "e", Axis::Longitude) => Indicator::Letter(1),
            ("S" | "s", Axis::Latitude) | ("W" | "w", Axis::Longitude) => Indicator::Letter(-1),
            ("+" | "p" | "P", _) => Indicator::Sign(1),
            ("-" | "m" | "M", _) => Indicator::Sign(-1),
            _ => return Err(IssueKind::Malformed),
        };
        Ok(indicator)
    }

    fn sign(&self) -> Option<i16> {
        match self {
            Indicator::None => None,
            Indicator::Letter(sign) | Indicator::Sign(sign) => Some(*sign),
        }
    }
}

struct Side {
    indicator: Indicator,
    magnitude: i16,
}

/// Parse one coordinate token for the given axis
pub fn parse_coordinate(grammar: &Grammar, token: &str, axis: Axis) -> FieldResult<CoordinateToken> {
    let token = normalize_token(token);
    if token.is_empty() {
        return Ok(CoordinateToken::Missing);
    }
    if token.eq_ignore_ascii_case(NOT_DETECTED) {
        return Ok(CoordinateToken::NotDetected);
    }
    if token == CONTINUATION {
        return Ok(CoordinateToken::Continuation);
    }

    let (body, uncertain) = match token.strip_suffix(UNCERTAIN) {
        Some(stripped) => (stripped.trim_end(), true),
        None => (token.as_str(), false),
    };

    let mut parts = body.split(RANGE_SEPARATOR);
    let left = parse_side(grammar, parts.next().unwrap_or_default(), axis)?;
    let right = match parts.next() {
        Some(text) => Some(parse_side(grammar, text, axis)?),
        None => None,
    };
    if parts.next().is_some() {
        return Err(IssueKind::Malformed);
    }

    let (range, signed) = match right {
        None => (
            CoordinateRange::point(left.magnitude * left.indicator.sign().unwrap_or(1)),
            left.indicator != Indicator::None,
        ),
        Some(right) => {
            let left_value = left.magnitude * resolve_sign(left.indicator, right.indicator);
            let right_value = right.magnitude * resolve_sign(right.indicator, left.indicator);
            let signed = left.indicator != Indicator::None || right.indicator != Indicator::None;
            (CoordinateRange::new(left_value, right_value), signed)
        }
    };

    Ok(CoordinateToken::Range {
        range,
        uncertain,
        signed,
    })
}

/// Sign of one side given its own indicator and the opposite side's
fn resolve_sign(own: Indicator, other: Indicator) -> i16 {
    match (own, other) {
        (Indicator::None, Indicator::Letter(sign)) => sign,
        (own, _) => own.sign().unwrap_or(1),
    }
}

fn parse_side(grammar: &Grammar, text: &str, axis: Axis) -> FieldResult<Side> {
    let caps = grammar
        .coordinate_side
        .captures(text.trim())
        .ok_or(IssueKind::Malformed)?;

    let indicator = Indicator::parse(&caps[1], axis)?;
    let fraction = caps.get(3).map(|m| m.as_str()).unwrap_or_default();
    let magnitude = round_half_up(&caps[2], fraction).ok_or(IssueKind::OutOfRange)?;

    Ok(Side {
        indicator,
        magnitude,
    })
}

/// Round a non-negative decimal given as integer and fraction digits.
///
/// Works on the digit strings so `12.5` always becomes 13 and `12.49`
/// always becomes 12, whatever the binary float representation would say.
fn round_half_up(integer: &str, fraction: &str) -> Option<i16> {
    let whole: i16 = integer.parse().ok()?;
    let round_up = fraction.chars().next().is_some_and(|d| d >= '5');
    if round_up { whole.checked_add(1) } else { Some(whole) }
}

/// Canonical signed rendering, e.g. `-15~12` or `7`
pub fn render_coordinate(range: &CoordinateRange) -> String {
    if range.min == range.max {
        range.min.to_string()
    } else {
        format!("{}{}{}", range.min, RANGE_SEPARATOR, range.max)
    }
}

/// Summary of a file-level coordinate check
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoordinateAudit {
    pub tokens_checked: usize,
    /// Tokens that do not match the grammar, with their 1-based row
    pub malformed: Vec<(usize, String)>,
    /// Parsed tokens whose ends fall outside the axis bounds
    pub out_of_bounds: Vec<(usize, String)>,
}

impl CoordinateAudit {
    pub fn is_valid(&self) -> bool {
        self.malformed.is_empty() && self.out_of_bounds.is_empty()
    }
}

/// Check a column of coordinate tokens against the grammar and the axis bounds
pub fn audit_coordinates<'a, I>(
    grammar: &Grammar,
    tokens: I,
    axis: Axis,
    bounds: (i16, i16),
) -> CoordinateAudit
where
    I: IntoIterator<Item = &'a str>,
{
    let mut audit = CoordinateAudit::default();
    for (row, token) in tokens.into_iter().enumerate() {
        audit.tokens_checked += 1;
        match parse_coordinate(grammar, token, axis) {
            Ok(CoordinateToken::Range { range, .. }) => {
                if range.min < bounds.0 || range.max > bounds.1 {
                    audit.out_of_bounds.push((row + 1, token.to_string()));
                }
            }
            Ok(_) => {}
            Err(_) => audit.malformed.push((row + 1, token.to_string())),
        }
    }
    audit
}
