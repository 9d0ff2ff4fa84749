//! `askeval score` command

use std::path::Path;

use askeval_core::dataset::DatasetInfo;
use askeval_core::error::Result;
use askeval_core::session::SummaryFile;
use askeval_core::{MetricsEngine, MetricsRecord};
use tracing::{debug, warn};

use crate::cli::{OutputFormat, ScoreArgs};
use crate::commands::dispatch::CommandContext;
use crate::commands::input::read_turn;

/// Score one turn and optionally append it to a session
pub fn execute(ctx: &CommandContext, args: &ScoreArgs) -> Result<()> {
    let engine = MetricsEngine::new(ctx.config()?);
    let turn = read_turn(ctx, &args.input)?;

    let dataset = match &turn.dataset {
        Some(reference) => {
            let mut info = DatasetInfo::probe(&ctx.resolve(Path::new(reference)));
            info.reference = Some(reference.clone());
            info
        }
        None => DatasetInfo::none(),
    };

    let record = engine.compute(&turn, &dataset);
    debug!(elapsed = ?ctx.start.elapsed(), overall = record.overall_score, "score");

    let saved = args
        .session
        .as_deref()
        .and_then(|session| match ctx.store().append(session, record.clone()) {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!(session, error = %e, "failed to save metrics");
                if !ctx.cli.quiet {
                    eprintln!("warning: failed to save metrics for session {}: {}", session, e);
                }
                None
            }
        });

    match ctx.cli.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        OutputFormat::Human => {
            print_human(&record);
            if let (Some(summary), false) = (&saved, ctx.cli.quiet) {
                print_saved(summary);
            }
        }
    }

    Ok(())
}

fn print_human(record: &MetricsRecord) {
    let perf = &record.performance;
    println!("Overall:        {:.3}", record.overall_score);
    println!(
        "Correctness:    {:.3}",
        record.code_correctness.correctness_score
    );
    println!("Quality:        {:.3}", record.code_quality.quality_score);
    println!(
        "Performance:    {:.3}  (time {}, space {})",
        perf.performance_score, perf.time_complexity.notation, perf.space_complexity.notation
    );
    println!(
        "Understanding:  {:.3}",
        record.prompt_understanding.understanding_score
    );
    println!(
        "Coverage:       {:.3}",
        record.requirement_coverage.coverage_score
    );
    println!("Recovery:       {:.3}", record.error_recovery.recovery_score);

    for issue in &record.code_correctness.syntax_errors {
        match issue.line {
            Some(line) => println!("  syntax error (line {}): {}", line, issue.message),
            None => println!("  syntax error: {}", issue.message),
        }
    }
    if let Some(error) = &record.code_correctness.execution_error {
        println!("  execution error: {}", error);
    }
    for issue in &record.code_quality.safety.safety_issues {
        println!("  unsafe: {} ({})", issue.category, issue.pattern);
    }
    for missing in &record.requirement_coverage.details.missing_requirements {
        println!("  missing: {}", missing);
    }
}

fn print_saved(summary: &SummaryFile) {
    println!();
    println!(
        "Saved to session {} ({} entries, average overall {:.3})",
        summary.session_id, summary.total_entries, summary.summary.average_overall_score
    );
}
