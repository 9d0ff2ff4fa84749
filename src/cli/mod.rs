//! CLI argument parsing for askeval
//!
//! Global flags: --root, --sessions-dir, --config, --format, --quiet, --verbose

pub mod paths;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub use askeval_core::format::OutputFormat;

/// Askeval - score LLM-generated data-analysis code
#[derive(Parser, Debug)]
#[command(name = "askeval")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Base directory for resolving sessions, config and relative dataset paths
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Directory holding per-session metrics (default: <root>/chat_history)
    #[arg(long, global = true)]
    pub sessions_dir: Option<PathBuf>,

    /// Scoring configuration file (default: <root>/askeval.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format: human or json
    #[arg(long, global = true, default_value = "human")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Log level or filter directive (e.g. "debug", "askeval_core=trace")
    #[arg(long, global = true, env = "ASKEVAL_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Whether raw arguments ask for JSON output.
///
/// Used when clap rejects the command line before `Cli.format` exists. The
/// last `--format` wins; arguments after `--` are ignored.
pub fn requests_json<I>(args: I) -> bool
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut format = None;
    while let Some(arg) = args.next() {
        if arg == "--" {
            break;
        }
        if arg == "--format" {
            format = args.next();
        } else if let Some(value) = arg.strip_prefix("--format=") {
            format = Some(value.to_string());
        }
    }
    format
        .and_then(|value| value.parse::<OutputFormat>().ok())
        .is_some_and(|format| format == OutputFormat::Json)
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score one turn and print its metrics record
    Score(ScoreArgs),

    /// Inspect a code snippet: syntax, quality, safety and complexity
    Inspect(InspectArgs),

    /// Print the recomputed summary of a session
    Summary(SummaryArgs),

    /// Recompute the summary file of every session
    Refresh,

    /// Split a CSV dataset into row-contiguous parts
    Split(SplitArgs),
}

#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// Turn JSON file, or "-" for stdin
    pub input: String,

    /// Append the record to this session's metrics log
    #[arg(long, short)]
    pub session: Option<String>,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Code file, or "-" for stdin
    pub input: String,

    /// CSV dataset used for the memory estimate
    #[arg(long, short)]
    pub dataset: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Session id
    pub session: String,
}

#[derive(Args, Debug)]
pub struct SplitArgs {
    /// CSV file to split
    pub csv: PathBuf,

    /// Number of parts
    #[arg(long, short, default_value_t = 3)]
    pub parts: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_requests_json_forms() {
        assert!(requests_json(args(&["--format", "json", "score"])));
        assert!(requests_json(args(&["score", "--format=JSON"])));
        assert!(!requests_json(args(&["score", "turn.json"])));
        assert!(!requests_json(args(&["--format", "human"])));
    }

    #[test]
    fn test_requests_json_last_flag_wins() {
        assert!(!requests_json(args(&["--format", "json", "--format", "human"])));
        assert!(requests_json(args(&["--format=human", "--format", "json"])));
    }

    #[test]
    fn test_requests_json_stops_at_separator() {
        assert!(!requests_json(args(&["score", "--", "--format", "json"])));
    }
}
