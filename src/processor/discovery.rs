//! File discovery for monthly report directories
//!
//! Finds `{year}-{month}.csv` report files below an input directory and
//! orders them chronologically. Files whose names do not encode a report
//! month are skipped with a warning and counted.

use crate::error::{Result, SunspotError};
use crate::header::parse_report_month;
use crate::models::ReportMonth;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A report file and the month it covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub report_month: ReportMonth,
}

/// File discovery component for report directories
#[derive(Debug)]
pub struct FileDiscovery {
    input_path: PathBuf,
    skipped: Vec<PathBuf>,
}

impl FileDiscovery {
    pub fn new(input_path: PathBuf) -> Self {
        Self {
            input_path,
            skipped: Vec::new(),
        }
    }

    /// CSV files passed over because their names carry no report month
    pub fn skipped(&self) -> &[PathBuf] {
        &self.skipped
    }

    /// Discover report files in chronological order
    ///
    /// Reports may sit directly in the input directory or in nested
    /// directories (for example one per year):
    /// ```text
    /// input/
    ///   1953/
    ///     1953-01.csv
    ///     1953-2.csv
    ///   1954-01.csv
    /// ```
    /// A single file path is accepted as a one-file input.
    pub fn discover_csv_files(&mut self) -> Result<Vec<DiscoveredFile>> {
        if !self.input_path.exists() {
            return Err(SunspotError::DirectoryNotFound {
                path: self.input_path.clone(),
            });
        }

        debug!("Searching for report files in: {}", self.input_path.display());
        self.skipped.clear();

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.input_path).follow_links(true) {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_file() || !is_csv_file(path) {
                continue;
            }

            match parse_report_month(path) {
                Ok(report_month) => files.push(DiscoveredFile {
                    path: path.to_path_buf(),
                    report_month,
                }),
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    self.skipped.push(path.to_path_buf());
                }
            }
        }

        files.sort_by(|a, b| {
            a.report_month
                .cmp(&b.report_month)
                .then_with(|| a.path.cmp(&b.path))
        });

        debug!(
            "Found {} report files ({} skipped)",
            files.len(),
            self.skipped.len()
        );
        Ok(files)
    }
}

/// Check if a path is a CSV file
fn is_csv_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "csv")
}
