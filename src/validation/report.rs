//! Validation report rendering.

use super::ValidationFinding;
use crate::error::Result;
use colored::Colorize;
use serde::Serialize;
use std::fmt;

/// Findings of every rule run against one table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub table: String,
    pub rows: usize,
    pub findings: Vec<ValidationFinding>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    /// Number of distinct rows named by any finding
    pub fn flagged_rows(&self) -> usize {
        let mut rows: Vec<usize> = self
            .findings
            .iter()
            .flat_map(|finding| finding.rows.iter().copied())
            .collect();
        rows.sort_unstable();
        rows.dedup();
        rows.len()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({} rows)", self.table.bold(), self.rows)?;

        if self.is_clean() {
            return writeln!(f, "  {}", "no findings".green());
        }

        writeln!(
            f,
            "  {} findings covering {} rows",
            self.findings.len().to_string().yellow(),
            self.flagged_rows()
        )?;
        for finding in &self.findings {
            let rows = preview_rows(&finding.rows);
            writeln!(f, "  {} {}: rows {}", "-".red(), finding.rule, rows)?;
            let detail = finding.detail.to_string();
            if !detail.is_empty() {
                writeln!(f, "      {}", detail.dimmed())?;
            }
        }
        Ok(())
    }
}

fn preview_rows(rows: &[usize]) -> String {
    const PREVIEW: usize = 10;
    let shown: Vec<String> = rows.iter().take(PREVIEW).map(|r| r.to_string()).collect();
    if rows.len() > PREVIEW {
        format!("{} ... ({} total)", shown.join(", "), rows.len())
    } else {
        shown.join(", ")
    }
}
