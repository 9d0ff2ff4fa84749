//! Command trait and context for dispatching commands

use std::path::{Path, PathBuf};
use std::time::Instant;

use askeval_core::config::ScoringConfig;
use askeval_core::error::Result;
use askeval_core::session::SessionStore;

use crate::cli::paths::{resolve_sessions_dir, resolve_under};
use crate::cli::Cli;

/// Shared context for command execution
pub struct CommandContext<'a> {
    pub cli: &'a Cli,
    pub root: &'a PathBuf,
    pub start: Instant,
}

impl<'a> CommandContext<'a> {
    pub fn new(cli: &'a Cli, root: &'a PathBuf, start: Instant) -> Self {
        Self { cli, root, start }
    }

    /// Scoring configuration from `--config`, `<root>/askeval.toml` or defaults
    pub fn config(&self) -> Result<ScoringConfig> {
        let explicit = self.cli.config.as_deref().map(|p| self.resolve(p));
        ScoringConfig::discover(explicit.as_deref(), self.root)
    }

    pub fn store(&self) -> SessionStore {
        SessionStore::new(resolve_sessions_dir(
            self.root,
            self.cli.sessions_dir.as_deref(),
        ))
    }

    /// Resolve a user-supplied path against the root
    pub fn resolve(&self, path: &Path) -> PathBuf {
        resolve_under(self.root, path)
    }
}

/// Trait for commands that can be executed
pub trait Command {
    fn execute(&self, ctx: &CommandContext) -> Result<()>;
}

/// No-op command (when no subcommand is provided)
pub struct NoCommand;

impl Command for NoCommand {
    fn execute(&self, _ctx: &CommandContext) -> Result<()> {
        println!("askeval {}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("Scores LLM-generated data-analysis code and tracks per-session metrics.");
        println!();
        println!("Run `askeval --help` for usage information.");
        Ok(())
    }
}
