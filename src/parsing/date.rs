//! Date normalization for the three recording eras.
//!
//! Notebook pages carry only the day of month, old reports write
//! `{mon}.{day}` and new reports write a full date with a free-form
//! separator. The report month of the source file supplies whatever the
//! token leaves out.

use super::grammar::{normalize_token, Grammar};
use super::FieldResult;
use crate::constants::MONTH_ABBREVIATIONS;
use crate::models::{GroupObservation, IssueKind, ReportMonth};
use crate::schema::DateFormat;
use chrono::{Months, NaiveDate};
use tracing::debug;

/// Parse a date token with the era's strategy; an empty token yields `None`
pub fn parse_date(
    grammar: &Grammar,
    format: DateFormat,
    token: &str,
    report: ReportMonth,
) -> FieldResult<Option<NaiveDate>> {
    let token = normalize_token(token);
    if token.is_empty() {
        return Ok(None);
    }

    let date = match format {
        DateFormat::DayOnly => parse_day_only(grammar, &token, report)?,
        DateFormat::MonthName => parse_month_name(grammar, &token, report)?,
        DateFormat::FreeForm => parse_free_form(grammar, &token)?,
    };
    Ok(Some(date))
}

/// Bare day of month within the report month
pub fn parse_day_only(grammar: &Grammar, token: &str, report: ReportMonth) -> FieldResult<NaiveDate> {
    let caps = grammar
        .day_of_month
        .captures(token)
        .ok_or(IssueKind::Malformed)?;
    let day: u32 = caps[1].parse().map_err(|_| IssueKind::Malformed)?;
    NaiveDate::from_ymd_opt(report.year, report.month, day).ok_or(IssueKind::InvalidDate)
}

/// `{mon}.{day}`, where a January date in a December report belongs to the next year
pub fn parse_month_name(grammar: &Grammar, token: &str, report: ReportMonth) -> FieldResult<NaiveDate> {
    let caps = grammar.month_day.captures(token).ok_or(IssueKind::Malformed)?;

    let name = caps[1].to_ascii_lowercase();
    let month = MONTH_ABBREVIATIONS
        .iter()
        .position(|abbr| *abbr == name)
        .map(|index| index as u32 + 1)
        .ok_or(IssueKind::Malformed)?;
    let day: u32 = caps[2].parse().map_err(|_| IssueKind::Malformed)?;

    let year = if report.month == 12 && month == 1 {
        report.year + 1
    } else {
        report.year
    };

    NaiveDate::from_ymd_opt(year, month, day).ok_or(IssueKind::InvalidDate)
}

/// `Y{sep}M{sep}D` with matching separators from `-`, `/`, `.`, space
pub fn parse_free_form(grammar: &Grammar, token: &str) -> FieldResult<NaiveDate> {
    let caps = grammar
        .free_form_date
        .captures(token)
        .ok_or(IssueKind::Malformed)?;
    if caps[2] != caps[4] {
        return Err(IssueKind::Malformed);
    }

    let year: i32 = caps[1].parse().map_err(|_| IssueKind::Malformed)?;
    let month: u32 = caps[3].parse().map_err(|_| IssueKind::Malformed)?;
    let day: u32 = caps[5].parse().map_err(|_| IssueKind::Malformed)?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or(IssueKind::InvalidDate)
}

/// Last calendar day of a report month
pub fn month_end(report: ReportMonth) -> Option<NaiveDate> {
    report
        .first_day()?
        .checked_add_months(Months::new(1))?
        .pred_opt()
}

/// Fill missing last-seen dates with the last day of the row's report month
pub fn complement_last_seen(observations: Vec<GroupObservation>) -> Vec<GroupObservation> {
    let mut filled = 0usize;
    let observations: Vec<GroupObservation> = observations
        .into_iter()
        .map(|mut obs| {
            if obs.last_seen.is_none() {
                obs.last_seen = month_end(obs.report_month);
                if obs.last_seen.is_some() {
                    filled += 1;
                }
            }
            obs
        })
        .collect();

    debug!("Complemented {} missing last-seen dates", filled);
    observations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Era;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_name_year_rollover() {
        let grammar = Grammar::new().unwrap();
        let report = ReportMonth::new(2000, 12);
        assert_eq!(parse_month_name(&grammar, "dec.30", report), Ok(ymd(2000, 12, 30)));
        assert_eq!(parse_month_name(&grammar, "jan.5", report), Ok(ymd(2001, 1, 5)));
        assert_eq!(parse_month_name(&grammar, "Jan.05", ReportMonth::new(1970, 1)), Ok(ymd(1970, 1, 5)));
    }

    #[test]
    fn test_month_name_rejects_unknown_month() {
        let grammar = Grammar::new().unwrap();
        let report = ReportMonth::new(1970, 3);
        assert_eq!(parse_month_name(&grammar, "xyz.3", report), Err(IssueKind::Malformed));
        assert_eq!(parse_month_name(&grammar, "feb.30", report), Err(IssueKind::InvalidDate));
    }

    #[test]
    fn test_free_form_separators_must_match() {
        let grammar = Grammar::new().unwrap();
        assert_eq!(parse_free_form(&grammar, "1999-12-31"), Ok(ymd(1999, 12, 31)));
        assert_eq!(parse_free_form(&grammar, "1999/1/2"), Ok(ymd(1999, 1, 2)));
        assert_eq!(parse_free_form(&grammar, "1999 1 2"), Ok(ymd(1999, 1, 2)));
        assert_eq!(parse_free_form(&grammar, "1999-1/2"), Err(IssueKind::Malformed));
    }

    #[test]
    fn test_free_form_respects_leap_years() {
        let grammar = Grammar::new().unwrap();
        assert_eq!(parse_free_form(&grammar, "2000.02.29"), Ok(ymd(2000, 2, 29)));
        assert_eq!(parse_free_form(&grammar, "1900.02.29"), Err(IssueKind::InvalidDate));
    }

    #[test]
    fn test_day_only_uses_report_month() {
        let grammar = Grammar::new().unwrap();
        let report = ReportMonth::new(1960, 2);
        assert_eq!(
            parse_date(&grammar, DateFormat::DayOnly, "29", report),
            Ok(Some(ymd(1960, 2, 29)))
        );
        assert_eq!(
            parse_date(&grammar, DateFormat::DayOnly, "30", report),
            Err(IssueKind::InvalidDate)
        );
        assert_eq!(parse_date(&grammar, DateFormat::DayOnly, "", report), Ok(None));
    }

    #[test]
    fn test_month_end() {
        assert_eq!(month_end(ReportMonth::new(2000, 2)), Some(ymd(2000, 2, 29)));
        assert_eq!(month_end(ReportMonth::new(1999, 12)), Some(ymd(1999, 12, 31)));
    }

    #[test]
    fn test_complement_last_seen_fills_only_missing() {
        let report = ReportMonth::new(2001, 4);
        let mut open = GroupObservation::empty(Era::New, report);
        open.first_seen = Some(ymd(2001, 4, 20));
        let mut closed = open.clone();
        closed.last_seen = Some(ymd(2001, 4, 22));

        let filled = complement_last_seen(vec![open, closed]);
        assert_eq!(filled[0].last_seen, Some(ymd(2001, 4, 30)));
        assert_eq!(filled[1].last_seen, Some(ymd(2001, 4, 22)));
    }
}
