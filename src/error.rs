//! Error handling for sunspot processing operations.
//!
//! Structural failures (files that cannot be classified or read) are
//! represented here. Content problems inside a file never become errors;
//! they are recorded as field issues and validation findings instead.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SunspotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Pattern error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Directory traversal error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Input directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("File name does not encode a report month ({{year}}-{{month}}.csv): {path}")]
    InvalidFileName { path: PathBuf },

    #[error("No recording era covers {year}-{month:02} (file: {path})")]
    UnsupportedEra {
        path: PathBuf,
        year: i32,
        month: u32,
    },

    #[error("Header of {path} does not match the {era} schema: missing columns {missing:?}")]
    HeaderMismatch {
        path: PathBuf,
        era: String,
        missing: Vec<String>,
    },

    #[error("File has no header row: {path}")]
    EmptyFile { path: PathBuf },

    #[error("Could not determine dataset kind for: {path}")]
    UnknownDataset { path: PathBuf },

    #[error("Invalid date interval '{text}': {reason}")]
    InvalidDateDelta { text: String, reason: String },

    #[error("Invalid butterfly frame: {reason}")]
    InvalidButterflyInfo { reason: String },

    #[error("Butterfly images cannot be combined: {reason}")]
    ImageMismatch { reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Processing failed for {path}: {reason}")]
    ProcessingFailed { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, SunspotError>;
