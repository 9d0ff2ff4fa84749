//! Reading command inputs from files or stdin

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use askeval_core::error::{EvalError, Result};
use askeval_core::metrics::Turn;

use crate::commands::dispatch::CommandContext;

/// Read a file argument, where "-" means stdin
pub fn read_text(ctx: &CommandContext, input: &str) -> Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| EvalError::io_operation("read", "stdin", e))?;
        return Ok(buffer);
    }

    let path = ctx.resolve(Path::new(input));
    if !path.is_file() {
        return Err(EvalError::not_found("input file", path.display()));
    }
    fs::read_to_string(&path).map_err(|e| EvalError::io_operation("read", path.display(), e))
}

/// Read and parse a turn file
pub fn read_turn(ctx: &CommandContext, input: &str) -> Result<Turn> {
    let content = read_text(ctx, input)?;
    serde_json::from_str(&content).map_err(|e| EvalError::invalid_input(input, e))
}
