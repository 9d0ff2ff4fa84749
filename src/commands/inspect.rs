//! `askeval inspect` command

use askeval_core::complexity::{
    estimate_space_complexity, estimate_time_complexity, SpaceComplexity, TimeComplexity,
};
use askeval_core::dataset::DatasetInfo;
use askeval_core::error::Result;
use askeval_core::inspect::{
    check_quality, check_safety, check_syntax, QualityReport, SafetyReport, SyntaxReport,
};
use askeval_core::MetricsEngine;
use serde::Serialize;

use crate::cli::{InspectArgs, OutputFormat};
use crate::commands::dispatch::CommandContext;
use crate::commands::input::read_text;

#[derive(Debug, Serialize)]
struct InspectOutput {
    language: &'static str,
    syntax: SyntaxReport,
    quality: QualityReport,
    readability_max: u32,
    safety: SafetyReport,
    time_complexity: TimeComplexity,
    space_complexity: SpaceComplexity,
}

/// Run the static inspector and complexity estimators over a snippet
pub fn execute(ctx: &CommandContext, args: &InspectArgs) -> Result<()> {
    let engine = MetricsEngine::new(ctx.config()?);
    let code = read_text(ctx, &args.input)?;
    let scanner = engine.scanner();
    let config = engine.config();

    let size_bytes = args
        .dataset
        .as_deref()
        .and_then(|path| DatasetInfo::probe(&ctx.resolve(path)).size_bytes);

    let output = InspectOutput {
        language: scanner.language(),
        syntax: check_syntax(scanner, &code),
        quality: check_quality(scanner, &code, &config.quality),
        readability_max: config.quality.readability_max,
        safety: check_safety(scanner, &code, &config.safety),
        time_complexity: estimate_time_complexity(scanner, &code),
        space_complexity: estimate_space_complexity(scanner, &code, size_bytes),
    };

    match ctx.cli.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Human => print_human(&output),
    }

    Ok(())
}

fn print_human(output: &InspectOutput) {
    if output.syntax.valid {
        println!("Syntax:      valid ({})", output.language);
    } else {
        println!("Syntax:      invalid ({})", output.language);
        for issue in &output.syntax.errors {
            match issue.line {
                Some(line) => println!("  line {}: {}", line, issue.message),
                None => println!("  {}", issue.message),
            }
        }
    }

    let quality = &output.quality;
    println!(
        "Quality:     readability {}/{}, {} lines, complexity {}, imports {}, comments {}",
        quality.readability_score,
        output.readability_max,
        quality.line_count,
        quality.complexity_score,
        yes_no(quality.has_imports),
        yes_no(quality.has_comments)
    );

    println!(
        "Safety:      {:.2}{}",
        output.safety.safety_score,
        if output.safety.is_safe { "" } else { " (unsafe)" }
    );
    for issue in &output.safety.safety_issues {
        println!("  {} [{:?}]: {}", issue.category, issue.severity, issue.pattern);
    }

    let time = &output.time_complexity;
    println!(
        "Time:        {} (score {:.1}, loops {})",
        time.notation, time.score, time.loop_weight
    );
    let space = &output.space_complexity;
    println!(
        "Space:       {} (score {:.1}, ~{:.2} MB)",
        space.notation, space.score, space.estimated_memory_mb
    );
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
