//! causalab CLI: run, tune, and score causal-discovery algorithms against
//! hand-authored true graphs.

mod commands;
mod report;

use causalab_discovery::{Algorithm, DatasetKind};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// causalab: causal-discovery experiments with known ground truth
#[derive(Parser, Debug)]
#[command(name = "causalab", version, about, long_about = None)]
struct Cli {
    /// Workspace directory (holds `.causalab/config.toml`)
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run each algorithm once on the full dataset and score it
    Run {
        /// Built-in dataset (student, adult)
        #[arg(short, long)]
        dataset: DatasetKind,
        /// Records as JSON lines (.jsonl) or a JSON array
        #[arg(long)]
        data: PathBuf,
        /// Algorithm to run (pc, ica-lingam, direct-lingam); all when omitted
        #[arg(short, long)]
        algorithm: Option<Algorithm>,
        /// DirectLiNGAM independence measure
        #[arg(long, default_value = "pwling")]
        measure: String,
        /// Extra parameter as key=value (value parsed as JSON when possible)
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, serde_json::Value)>,
        /// Forbid edges into the dataset's root variables (PC only)
        #[arg(long)]
        background_knowledge: bool,
    },
    /// Cross-validated grid search for one algorithm
    Tune {
        #[arg(short, long)]
        dataset: DatasetKind,
        #[arg(long)]
        data: PathBuf,
        #[arg(short, long)]
        algorithm: Algorithm,
        /// Number of folds (overrides config)
        #[arg(long)]
        folds: Option<usize>,
        /// Fold shuffle seed (overrides config)
        #[arg(long)]
        seed: Option<u64>,
        /// Forbid edges into the dataset's root variables (PC only)
        #[arg(long)]
        background_knowledge: bool,
        /// Write the full report as pretty JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print a dataset's true graph
    Truth {
        #[arg(short, long)]
        dataset: DatasetKind,
        /// Use the encoded column names
        #[arg(long)]
        encoded: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Check the Python interpreter and discovery packages
    Doctor,
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Write the default configuration to the workspace
    Init,
    /// Print the effective configuration
    Show,
}

fn parse_param(raw: &str) -> Result<(String, serde_json::Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty parameter name in '{raw}'"));
    }
    let value = serde_json::from_str(value.trim())
        .unwrap_or_else(|_| serde_json::Value::String(value.trim().to_string()));
    Ok((key.to_string(), value))
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up tracing: human-readable stderr + JSON file logging
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    let log_dir = directories::ProjectDirs::from("dev", "causalab", "causalab")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "causalab.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    commands::handle_command(cli.command, &workspace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_param() {
        assert_eq!(
            parse_param("alpha=0.05").unwrap(),
            ("alpha".to_string(), serde_json::json!(0.05))
        );
        assert_eq!(
            parse_param("measure=kernel").unwrap(),
            ("measure".to_string(), serde_json::json!("kernel"))
        );
        assert_eq!(
            parse_param("stable = true").unwrap(),
            ("stable".to_string(), serde_json::json!(true))
        );
        assert!(parse_param("alpha").is_err());
        assert!(parse_param("=1").is_err());
    }

    #[test]
    fn test_parse_tune_command() {
        let cli = Cli::try_parse_from([
            "causalab",
            "tune",
            "--dataset",
            "adult",
            "--data",
            "adult.jsonl",
            "--algorithm",
            "direct-lingam",
            "--folds",
            "3",
        ])
        .unwrap();
        match cli.command {
            Commands::Tune {
                dataset,
                algorithm,
                folds,
                ..
            } => {
                assert_eq!(dataset, DatasetKind::Adult);
                assert_eq!(algorithm, Algorithm::DirectLingam);
                assert_eq!(folds, Some(3));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
