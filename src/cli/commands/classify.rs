//! Classify command: show the era and raw schema of a report month

use super::shared::CommandOutcome;
use crate::cli::args::ClassifyArgs;
use crate::error::{Result, SunspotError};
use crate::models::DatasetKind;
use crate::schema::{spec_for, EraSpec};
use std::path::PathBuf;

pub fn run_classify(args: &ClassifyArgs) -> Result<CommandOutcome> {
    let spec = lookup(args.year, args.month)?;
    let kinds = match args.dataset {
        Some(dataset) => vec![dataset.into()],
        None => vec![DatasetKind::ActiveRegion, DatasetKind::SunspotCount],
    };
    for kind in kinds {
        spec.report(kind);
    }
    Ok(CommandOutcome::Success)
}

fn lookup(year: i32, month: u32) -> Result<&'static EraSpec> {
    spec_for(year, month).ok_or_else(|| SunspotError::UnsupportedEra {
        path: PathBuf::from(format!("{}-{:02}.csv", year, month)),
        year,
        month,
    })
}
