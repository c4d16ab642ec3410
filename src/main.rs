use std::process::ExitCode;

use cella_stats::error::exit_code_for;

fn main() -> ExitCode {
    match cella_stats::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code_for(&err))
        }
    }
}
