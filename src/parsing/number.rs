//! Bounded integer fields, hemisphere codes and carry-down of omitted values.

use super::grammar::{normalize_token, Grammar};
use super::FieldResult;
use crate::models::{Hemisphere, IssueKind};

/// Parse an unsigned integer into a bounded type; an empty token yields `None`
pub fn parse_unsigned<T>(grammar: &Grammar, token: &str) -> FieldResult<Option<T>>
where
    T: TryFrom<u64>,
{
    let token = normalize_token(token);
    if token.is_empty() {
        return Ok(None);
    }
    if !grammar.unsigned.is_match(&token) {
        return Err(IssueKind::Malformed);
    }

    let wide: u64 = token.parse().map_err(|_| IssueKind::OutOfRange)?;
    T::try_from(wide).map(Some).map_err(|_| IssueKind::OutOfRange)
}

/// Parse a hemisphere code; an empty token yields `None`
pub fn parse_hemisphere(token: &str) -> FieldResult<Option<Hemisphere>> {
    let token = normalize_token(token);
    if token.is_empty() {
        return Ok(None);
    }
    Hemisphere::from_code(&token)
        .map(Some)
        .ok_or(IssueKind::Malformed)
}

/// Carry the last present value down over omitted (`None`) entries
pub fn forward_fill<T: Clone>(values: Vec<Option<T>>) -> Vec<Option<T>> {
    let mut last: Option<T> = None;
    values
        .into_iter()
        .map(|value| match value {
            Some(value) => {
                last = Some(value.clone());
                Some(value)
            }
            None => last.clone(),
        })
        .collect()
}
