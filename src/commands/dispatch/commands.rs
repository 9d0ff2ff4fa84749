//! Command implementations for all askeval commands

use tracing::debug;

use askeval_core::error::Result;

use crate::cli::Commands;
use crate::commands;
use crate::commands::dispatch::command::{Command, CommandContext};

impl Command for Commands {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let result = match self {
            Commands::Score(args) => commands::score::execute(ctx, args),
            Commands::Inspect(args) => commands::inspect::execute(ctx, args),
            Commands::Summary(args) => commands::summary::execute(ctx, args),
            Commands::Refresh => commands::refresh::execute(ctx),
            Commands::Split(args) => commands::split::execute(ctx, args),
        };
        debug!(elapsed = ?ctx.start.elapsed(), "execute_command");
        result
    }
}
