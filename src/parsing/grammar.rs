//! Precompiled token grammar shared by the field parsers.

use crate::error::Result;
use regex::Regex;

/// Regex table for raw tokens, compiled once and passed by reference
#[derive(Debug, Clone)]
pub struct Grammar {
    /// One side of a coordinate: optional indicator then integer or decimal body
    pub coordinate_side: Regex,
    /// `{mon}.{day}` dates of the old reports
    pub month_day: Regex,
    /// `Y{sep}M{sep}D` dates of the new reports
    pub free_form_date: Regex,
    /// Bare day of month
    pub day_of_month: Regex,
    /// Unsigned decimal integer
    pub unsigned: Regex,
}

impl Grammar {
    pub fn new() -> Result<Self> {
        Ok(Self {
            coordinate_side: Regex::new(r"^([A-Za-z+\-]?)(\d+)(?:\.(\d*))?$")?,
            month_day: Regex::new(r"^([A-Za-z]{3})\.(\d{1,2})$")?,
            free_form_date: Regex::new(r"^(\d{4})([-/. ])(\d{1,2})([-/. ])(\d{1,2})$")?,
            day_of_month: Regex::new(r"^(\d{1,2})$")?,
            unsigned: Regex::new(r"^\d+$")?,
        })
    }
}

/// Fold a raw token to ASCII: full-width forms, the ideographic space,
/// the Unicode minus and wave dashes become their ASCII counterparts.
/// Leading and trailing whitespace is removed.
pub fn normalize_token(token: &str) -> String {
    let folded: String = token
        .chars()
        .map(|c| match c {
            '\u{FF01}'..='\u{FF5E}' => {
                char::from_u32(c as u32 - 0xFEE0).unwrap_or(c)
            }
            '\u{3000}' => ' ',
            '\u{2212}' | '\u{2012}' | '\u{2013}' => '-',
            '\u{301C}' | '\u{223C}' => '~',
            _ => c,
        })
        .collect();
    folded.trim().to_string()
}
