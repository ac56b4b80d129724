//! Integration tests for the processor module
//!
//! Runs the complete pipeline over small report directories written to
//! temporary storage.

pub mod error_handling;

use crate::processor::SunspotProcessor;
use std::fs;
use std::path::{Path, PathBuf};

/// Write one report file below `dir`
pub fn write_report(dir: &Path, name: &str, content: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(name), content).unwrap();
}

/// Processor over `input` writing to `output`, without console output
pub fn processor(input: PathBuf, output: PathBuf) -> SunspotProcessor {
    SunspotProcessor::new(input, Some(output))
        .unwrap()
        .without_console()
}
