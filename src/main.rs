//! Binary entrypoint for the `task-wizard` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    match task_wizard::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
