//! Sunspot Processor Library
//!
//! Normalizes hand-transcribed monthly sunspot reports into canonical
//! Apache Parquet tables.
//!
//! This library provides tools for:
//! - Classifying report months into recording eras with their raw schemas
//! - Parsing coordinate, date and count tokens written in inconsistent notations
//! - Merging groups that continue across month boundaries
//! - Deriving daily and monthly sunspot numbers per hemisphere
//! - Building butterfly diagrams from active-region tables
//! - Auditing canonical tables and comparing against the SILSO series

pub mod aggregate;
pub mod butterfly;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod header;
pub mod merge;
pub mod models;
pub mod parsing;
pub mod processor;
pub mod reference;
pub mod schema;
pub mod validation;

// Re-export commonly used types
pub use butterfly::{ButterflyImage, ButterflyInfo, DateDelta};
pub use config::{CompressionAlgorithm, ProcessorConfig};
pub use error::{Result, SunspotError};
pub use models::{
    CountObservation, DailyGroupRecord, DatasetKind, Era, GroupObservation, MonthlyCount,
    ProcessingStats, ReportMonth,
};
pub use processor::SunspotProcessor;
pub use validation::{ValidationReport, Validator};
