use std::process::ExitCode;

use clap::Parser;
use temple::cli::{self, Args};
use temple::logging::init_logging;

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.log_level());

    match cli::run(&args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
