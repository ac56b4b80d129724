//! Command implementations for the sunspot processor CLI
//!
//! Each subcommand lives in its own module; `shared` holds logging setup,
//! configuration loading and report printing.

pub mod butterfly;
pub mod classify;
pub mod compare;
pub mod process;
pub mod shared;
pub mod validate;

pub use shared::{setup_logging, CommandOutcome};

use crate::cli::args::{Args, Commands};
use crate::error::Result;
use tracing::debug;

/// Main command runner
///
/// Sets up logging, loads the layered configuration and dispatches to the
/// subcommand handler.
pub fn run(args: Args) -> Result<CommandOutcome> {
    setup_logging(&args)?;
    debug!("Command line arguments: {:?}", args);

    let config = shared::load_configuration(&args)?;
    let quiet = !args.show_progress();

    match &args.command {
        Commands::Process(process_args) => process::run_process(process_args, config, quiet),
        Commands::Validate(validate_args) => validate::run_validate(validate_args, &config),
        Commands::Butterfly(butterfly_args) => butterfly::run_butterfly(butterfly_args, &config, quiet),
        Commands::Compare(compare_args) => compare::run_compare(compare_args),
        Commands::Classify(classify_args) => classify::run_classify(classify_args),
    }
}
