//! Mix command implementation
//!
//! Builds a plan from a file (or the built-in reference plan), applies
//! command-line overrides, runs the engine and reports the result.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use blockmix_mixer::Strategy;
use colored::Colorize;
use serde::Serialize;

use crate::engine::{MixEngine, MixSummary};
use crate::plan::{MixPlan, Pipeline};
use crate::profile::{Profiler, ScopeReport};

/// Options of `blockmix mix`.
#[derive(Debug, Clone, Default)]
pub struct MixArgs {
    /// Plan file.
    pub plan: Option<PathBuf>,
    /// Use the built-in reference plan instead of a file.
    pub reference: bool,
    /// Output path override.
    pub output: Option<PathBuf>,
    /// Block count override.
    pub blocks: Option<usize>,
    /// Block size override.
    pub block_size: Option<usize>,
    /// Strategy override.
    pub strategy: Option<Strategy>,
    /// Pipeline override.
    pub pipeline: Option<Pipeline>,
    /// Print scope timings.
    pub profile: bool,
    /// Append scope timings to this CSV file.
    pub profile_csv: Option<PathBuf>,
    /// Emit JSON instead of colored text.
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct MixReport<'a> {
    #[serde(flatten)]
    summary: &'a MixSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    profile: Option<Vec<ScopeReport>>,
}

/// Resolves the plan the command will run.
pub fn build_plan(args: &MixArgs) -> Result<MixPlan> {
    let mut plan = match (&args.plan, args.reference) {
        (Some(_), true) => bail!("--plan and --reference are mutually exclusive"),
        (Some(path), false) => {
            MixPlan::read(path).with_context(|| format!("Failed to load plan {}", path.display()))?
        }
        (None, true) => MixPlan::reference(),
        (None, false) => bail!("either --plan <file> or --reference is required"),
    };

    if let Some(output) = &args.output {
        plan.output.path = output.clone();
    }
    if let Some(blocks) = args.blocks {
        plan.blocks = Some(blocks);
    }
    if let Some(block_size) = args.block_size {
        plan.block_size = block_size;
    }
    if let Some(strategy) = args.strategy {
        plan.strategy = strategy;
    }
    if let Some(pipeline) = args.pipeline {
        plan.pipeline = pipeline;
    }
    plan.validate()?;
    Ok(plan)
}

/// Run the mix command
///
/// # Returns
/// Exit code: 0 on success; errors propagate to the caller
pub fn run(args: &MixArgs) -> Result<ExitCode> {
    let plan = build_plan(args)?;
    let profiler = if args.profile || args.profile_csv.is_some() {
        Profiler::new()
    } else {
        Profiler::disabled()
    };

    let engine = MixEngine::open(plan).context("Failed to open mix")?;
    if !args.json {
        print_formats(&engine);
    }

    let summary = engine.run(&profiler).context("Mix failed")?;

    if let Some(csv) = &args.profile_csv {
        profiler
            .write_csv(csv)
            .with_context(|| format!("Failed to write profile log {}", csv.display()))?;
    }

    if args.json {
        let report = MixReport {
            summary: &summary,
            profile: profiler.is_enabled().then(|| profiler.report()),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&summary);
        if args.profile {
            print_profile(&profiler.report());
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_formats(engine: &MixEngine) {
    for (path, format) in engine.input_formats() {
        println!("{} {}", "Input:".cyan().bold(), path.display());
        for line in format.to_string().lines() {
            println!("  {}", line.dimmed());
        }
    }
    println!("{} {}", "Output:".cyan().bold(), engine.plan().output.path.display());
    for line in engine.output_format().to_string().lines() {
        println!("  {}", line.dimmed());
    }
}

fn print_summary(summary: &MixSummary) {
    println!(
        "\n{} {} blocks of {} samples from {} inputs ({}, {})",
        "Mixed".green().bold(),
        summary.blocks,
        summary.block_size,
        summary.inputs,
        summary.strategy,
        summary.pipeline
    );
    println!("  {} {}", "Output:".dimmed(), summary.output.display());
    println!("  {} {}", "Samples:".dimmed(), summary.samples_written);
    println!("  {} {:.2} ms", "Elapsed:".dimmed(), summary.elapsed_ms);
    let short_hash = summary.pcm_hash.get(..16).unwrap_or(&summary.pcm_hash);
    println!("  {} {}", "PCM hash:".dimmed(), short_hash);
}

fn print_profile(report: &[ScopeReport]) {
    println!("\n{}", "Profile:".cyan().bold());
    println!(
        "  {:<10} {:>10} {:>12} {:>12} {:>12} {:>12}",
        "scope", "count", "total ms", "mean ms", "min ms", "max ms"
    );
    for entry in report {
        println!(
            "  {:<10} {:>10} {:>12.3} {:>12.6} {:>12.6} {:>12.6}",
            entry.label, entry.count, entry.total_ms, entry.mean_ms, entry.min_ms, entry.max_ms
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockmix_mixer::GainPair;
    use std::fs;

    #[test]
    fn test_overrides_apply_to_reference_plan() {
        let args = MixArgs {
            reference: true,
            output: Some(PathBuf::from("elsewhere.wav")),
            blocks: Some(4),
            block_size: Some(256),
            strategy: Some(Strategy::Scalar),
            pipeline: Some(Pipeline::Int16),
            ..MixArgs::default()
        };
        let plan = build_plan(&args).unwrap();
        assert_eq!(plan.output.path, PathBuf::from("elsewhere.wav"));
        assert_eq!(plan.blocks, Some(4));
        assert_eq!(plan.block_size, 256);
        assert_eq!(plan.strategy, Strategy::Scalar);
        assert_eq!(plan.pipeline, Pipeline::Int16);
        assert_eq!(plan.inputs[1].gain, GainPair::new(0.3, 0.5));
    }

    #[test]
    fn test_plan_source_is_required() {
        assert!(build_plan(&MixArgs::default()).is_err());
        let both = MixArgs {
            plan: Some(PathBuf::from("plan.json")),
            reference: true,
            ..MixArgs::default()
        };
        assert!(build_plan(&both).is_err());
    }

    #[test]
    fn test_invalid_override_rejected() {
        let args = MixArgs {
            reference: true,
            block_size: Some(3),
            ..MixArgs::default()
        };
        assert!(build_plan(&args).is_err());
    }

    #[test]
    fn test_plan_file_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        fs::write(&path, r#"{"inputs": [{"path": "a.wav"}], "blocks": 2}"#).unwrap();
        let args = MixArgs {
            plan: Some(path),
            ..MixArgs::default()
        };
        let plan = build_plan(&args).unwrap();
        assert_eq!(plan.inputs[0].path, dir.path().join("a.wav"));
        assert_eq!(plan.blocks, Some(2));
    }

    #[test]
    fn test_override_repairs_plan_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        fs::write(&path, r#"{"inputs": [{"path": "a.wav"}], "block_size": 3}"#).unwrap();

        let as_written = MixArgs {
            plan: Some(path.clone()),
            ..MixArgs::default()
        };
        assert!(build_plan(&as_written).is_err());

        let overridden = MixArgs {
            plan: Some(path),
            block_size: Some(64),
            ..MixArgs::default()
        };
        assert_eq!(build_plan(&overridden).unwrap().block_size, 64);
    }
}
