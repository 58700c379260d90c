//! Core library for the `task-wizard` CLI: warehouse task execution
//! through step-by-step action wizards.

pub mod adapters;
pub mod autofill;
pub mod cassette;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod execution;
pub mod logging;
pub mod model;
pub mod ports;
pub mod session;
pub mod step;
pub mod validation;
pub mod validators;
pub mod wizard;

#[cfg(test)]
mod testing;

use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = cli::Cli::try_parse_from(args).map_err(|err| err.to_string())?;
    commands::dispatch(&cli)
}
