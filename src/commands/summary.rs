//! `askeval summary` command

use askeval_core::error::Result;
use askeval_core::{summarize, SessionSummary};
use serde::Serialize;

use crate::cli::{OutputFormat, SummaryArgs};
use crate::commands::dispatch::CommandContext;

#[derive(Debug, Serialize)]
struct SummaryOutput<'a> {
    session_id: &'a str,
    total_entries: usize,
    summary: SessionSummary,
}

/// Recompute and print a session's summary without writing it
pub fn execute(ctx: &CommandContext, args: &SummaryArgs) -> Result<()> {
    let records = ctx.store().load(&args.session)?;
    let output = SummaryOutput {
        session_id: &args.session,
        total_entries: records.len(),
        summary: summarize(&records),
    };

    match ctx.cli.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Human => print_human(&output),
    }

    Ok(())
}

fn print_human(output: &SummaryOutput) {
    let s = &output.summary;
    println!("Session {} ({} entries)", output.session_id, output.total_entries);
    println!("  Models:          {}", s.models_used.join(", "));
    println!("  Overall:         {:.3}", s.average_overall_score);
    println!("  Correctness:     {:.3}", s.average_correctness_score);
    println!("  Quality:         {:.3}", s.average_quality_score);
    println!("  Performance:     {:.3}", s.average_performance_score);
    println!("  Understanding:   {:.3}", s.average_understanding_score);
    println!("  Coverage:        {:.3}", s.average_coverage_score);
    println!("  Recovery:        {:.3}", s.average_recovery_score);
    if let Some(ms) = s.average_execution_time_ms {
        println!("  Avg exec time:   {:.1} ms", ms);
    }
    println!(
        "  Executions:      {}/{} successful",
        s.successful_executions, s.total_questions
    );
    println!(
        "  Recoveries:      {}/{} errors ({} attempts)",
        s.successful_recoveries, s.errors_encountered, s.total_recovery_attempts
    );

    let time: Vec<String> = s
        .time_complexity_distribution
        .iter()
        .map(|(class, n)| format!("{}={}", class, n))
        .collect();
    println!("  Time complexity: {}", time.join(" "));
    let space: Vec<String> = s
        .space_complexity_distribution
        .iter()
        .map(|(class, n)| format!("{}={}", class, n))
        .collect();
    println!("  Space complexity: {}", space.join(" "));
}
