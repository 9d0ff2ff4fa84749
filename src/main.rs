//! Askeval - scoring of LLM-generated data-analysis code
//!
//! Reads a generated snippet with its question and execution outcome, scores
//! it along six dimensions, and keeps per-session metrics logs and summaries.

mod cli;
mod commands;

use std::env;
use std::process::ExitCode;
use std::time::Instant;

use clap::error::ErrorKind;
use clap::Parser;

use askeval_core::error::{EvalError, ExitCode as EvalExitCode};
use askeval_core::logging;
use cli::{Cli, OutputFormat};

fn main() -> ExitCode {
    let start = Instant::now();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => return parse_failure(err),
    };

    if let Err(e) = logging::init_tracing(cli.verbose, cli.log_level.as_deref(), cli.log_json) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }
    tracing::debug!(elapsed = ?start.elapsed(), "parse_args");

    match commands::dispatch::run(&cli, start) {
        Ok(()) => ExitCode::from(EvalExitCode::Success as u8),
        Err(e) => report(&cli, &e),
    }
}

/// Clap errors keep clap's own rendering unless JSON output was requested
fn parse_failure(err: clap::Error) -> ExitCode {
    if matches!(
        err.kind(),
        ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
    ) || !cli::requests_json(env::args().skip(1))
    {
        err.exit();
    }

    let error = match err.kind() {
        ErrorKind::Io | ErrorKind::Format => EvalError::Other(err.to_string()),
        _ => EvalError::UsageError(err.to_string()),
    };
    eprintln!("{}", error.to_json());
    ExitCode::from(error.exit_code() as u8)
}

fn report(cli: &Cli, error: &EvalError) -> ExitCode {
    match cli.format {
        OutputFormat::Json => eprintln!("{}", error.to_json()),
        OutputFormat::Human if !cli.quiet => eprintln!("error: {}", error),
        OutputFormat::Human => {}
    }
    ExitCode::from(error.exit_code() as u8)
}
