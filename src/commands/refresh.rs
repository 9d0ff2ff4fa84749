//! `askeval refresh` command

use askeval_core::error::Result;

use crate::cli::OutputFormat;
use crate::commands::dispatch::CommandContext;

/// Rewrite `metrics_summary.json` in every session directory
pub fn execute(ctx: &CommandContext) -> Result<()> {
    let store = ctx.store();
    let report = store.refresh_all()?;

    match ctx.cli.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Human => {
            if !ctx.cli.quiet {
                for name in &report.updated {
                    println!("updated {}", name);
                }
                for name in &report.skipped {
                    println!("skipped {} (no metrics log)", name);
                }
            }
            for (name, reason) in &report.failed {
                println!("failed {}: {}", name, reason);
            }
            println!(
                "{} updated, {} skipped, {} failed in {}",
                report.updated.len(),
                report.skipped.len(),
                report.failed.len(),
                store.root().display()
            );
        }
    }

    Ok(())
}
