//! blockmix CLI - offline block mixing of 16-bit PCM WAV streams
//!
//! This binary runs mix plans and inspects WAV headers.

use std::path::PathBuf;
use std::process::ExitCode;

use blockmix_mixer::Strategy;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use blockmix_cli::commands;
use blockmix_cli::commands::mix::MixArgs;
use blockmix_cli::Pipeline;

/// blockmix - streaming SIMD mixer for 16-bit PCM WAV files
#[derive(Parser)]
#[command(name = "blockmix")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mix the inputs of a plan into one output file
    Mix {
        /// Path to the mix plan (JSON)
        #[arg(short, long)]
        plan: Option<PathBuf>,

        /// Run the built-in four-stream reference plan in the current directory
        #[arg(long, conflicts_with = "plan")]
        reference: bool,

        /// Output WAV path (overrides the plan)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of blocks to mix (default: as many as every input supplies)
        #[arg(long)]
        blocks: Option<usize>,

        /// Interleaved samples per block
        #[arg(long)]
        block_size: Option<usize>,

        /// Vector width of the float pipeline (scalar, simd128, simd256, simd512)
        #[arg(long)]
        strategy: Option<Strategy>,

        /// Sample representation (float, int16)
        #[arg(long)]
        pipeline: Option<Pipeline>,

        /// Print per-scope timings after the run
        #[arg(long)]
        profile: bool,

        /// Append per-scope timings to a CSV datalog
        #[arg(long)]
        profile_csv: Option<PathBuf>,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Print the header summary and PCM hash of a WAV file
    Info {
        /// Path to the WAV file
        path: PathBuf,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "blockmix={level},blockmix_cli={level},blockmix_wav={level},blockmix_mixer={level}"
        ))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Mix {
            plan,
            reference,
            output,
            blocks,
            block_size,
            strategy,
            pipeline,
            profile,
            profile_csv,
            json,
        } => commands::mix::run(&MixArgs {
            plan,
            reference,
            output,
            blocks,
            block_size,
            strategy,
            pipeline,
            profile,
            profile_csv,
            json,
        }),
        Commands::Info { path, json } => commands::info::run(&path, json),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_mix_arguments_parse() {
        let cli = Cli::try_parse_from([
            "blockmix",
            "mix",
            "--plan",
            "plan.json",
            "--strategy",
            "simd512",
            "--pipeline",
            "int16",
            "--blocks",
            "12",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Mix {
                plan,
                strategy,
                pipeline,
                blocks,
                ..
            } => {
                assert_eq!(plan, Some(PathBuf::from("plan.json")));
                assert_eq!(strategy, Some(Strategy::Simd512));
                assert_eq!(pipeline, Some(Pipeline::Int16));
                assert_eq!(blocks, Some(12));
            }
            Commands::Info { .. } => panic!("expected mix command"),
        }
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        assert!(Cli::try_parse_from(["blockmix", "mix", "--reference", "--strategy", "avx"]).is_err());
    }

    #[test]
    fn test_plan_and_reference_conflict() {
        assert!(Cli::try_parse_from(["blockmix", "mix", "--plan", "p.json", "--reference"]).is_err());
    }
}
