//! `askeval split` command

use askeval_core::dataset::split_csv;
use askeval_core::error::{EvalError, Result};

use crate::cli::{OutputFormat, SplitArgs};
use crate::commands::dispatch::CommandContext;

/// Split a CSV dataset into row-contiguous parts
pub fn execute(ctx: &CommandContext, args: &SplitArgs) -> Result<()> {
    let path = ctx.resolve(&args.csv);
    if !path.is_file() {
        return Err(EvalError::not_found("dataset", path.display()));
    }

    let parts = split_csv(&path, args.parts)?;

    match ctx.cli.format {
        OutputFormat::Json => {
            let files: Vec<String> = parts.iter().map(|p| p.display().to_string()).collect();
            let output = serde_json::json!({
                "source": path.display().to_string(),
                "split": parts.len() > 1 || parts.first() != Some(&path),
                "files": files,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Human => {
            if parts.len() == 1 && parts[0] == path {
                if !ctx.cli.quiet {
                    println!("{} has fewer rows than parts; not split", path.display());
                }
            } else {
                for part in &parts {
                    println!("{}", part.display());
                }
            }
        }
    }

    Ok(())
}
