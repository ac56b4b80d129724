use clap::Parser;
use std::process;
use sunspot_processor::cli::{args::Args, commands};

fn main() {
    let args = Args::parse();

    match commands::run(args) {
        Ok(outcome) => process::exit(outcome.exit_code()),
        Err(error) => {
            eprintln!("Error: {:#}", anyhow::Error::from(error));
            process::exit(1);
        }
    }
}
