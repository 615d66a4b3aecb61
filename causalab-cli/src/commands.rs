//! CLI subcommand handlers.

use crate::report;
use crate::{Commands, ConfigAction};
use anyhow::{Context, bail};
use causalab_core::config::{CausalabConfig, load_config, workspace_config_path};
use causalab_core::{ForbiddenEdges, HyperparameterGrid, ParamSet, evaluate_once, search};
use causalab_discovery::{
    Algorithm, DatasetKind, PreparedDataset, PythonBackend, RecordBatch, adapter_for,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Handle a CLI subcommand.
pub fn handle_command(command: Commands, workspace: &Path) -> anyhow::Result<()> {
    match command {
        Commands::Run {
            dataset,
            data,
            algorithm,
            measure,
            params,
            background_knowledge,
        } => handle_run(
            workspace,
            RunArgs {
                dataset,
                data,
                algorithm,
                measure,
                params,
                background_knowledge,
            },
        ),
        Commands::Tune {
            dataset,
            data,
            algorithm,
            folds,
            seed,
            background_knowledge,
            output,
        } => handle_tune(
            workspace,
            TuneArgs {
                dataset,
                data,
                algorithm,
                folds,
                seed,
                background_knowledge,
                output,
            },
        ),
        Commands::Truth { dataset, encoded } => handle_truth(dataset, encoded),
        Commands::Config { action } => handle_config(action, workspace),
        Commands::Doctor => handle_doctor(workspace),
    }
}

struct RunArgs {
    dataset: DatasetKind,
    data: PathBuf,
    algorithm: Option<Algorithm>,
    measure: String,
    params: Vec<(String, serde_json::Value)>,
    background_knowledge: bool,
}

struct TuneArgs {
    dataset: DatasetKind,
    data: PathBuf,
    algorithm: Algorithm,
    folds: Option<usize>,
    seed: Option<u64>,
    background_knowledge: bool,
    output: Option<PathBuf>,
}

fn load(workspace: &Path) -> anyhow::Result<CausalabConfig> {
    load_config(Some(workspace), None).map_err(|e| anyhow::anyhow!("Configuration error: {}", e))
}

fn load_dataset(kind: DatasetKind, path: &Path) -> anyhow::Result<PreparedDataset> {
    let batch = RecordBatch::load(path)
        .with_context(|| format!("Failed to read dataset from {}", path.display()))?;
    let prepared = kind
        .prepare(&batch)
        .with_context(|| format!("Failed to encode {kind} dataset"))?;
    info!(
        dataset = %kind,
        rows = prepared.matrix.n_rows(),
        labels = ?prepared.labels,
        "Dataset ready"
    );
    Ok(prepared)
}

fn background(kind: DatasetKind, labels: &[String], enabled: bool) -> Option<ForbiddenEdges> {
    enabled.then(|| ForbiddenEdges::roots(labels, kind.root_variables()))
}

fn handle_run(workspace: &Path, args: RunArgs) -> anyhow::Result<()> {
    if args.algorithm.is_none() && !args.params.is_empty() {
        bail!("--param requires --algorithm");
    }
    let config = load(workspace)?;
    let prepared = load_dataset(args.dataset, &args.data)?;
    let truth = args.dataset.reference_graph()?;
    let backend = PythonBackend::from_config(&config.python, workspace.to_path_buf())?;
    let forbidden = background(args.dataset, &prepared.labels, args.background_knowledge);

    let algorithms = args
        .algorithm
        .map_or_else(|| Algorithm::ALL.to_vec(), |a| vec![a]);
    let mut succeeded = 0;
    for algorithm in algorithms {
        let params = run_params(algorithm, &args);
        let adapter = adapter_for(algorithm, &backend, forbidden.clone());
        match evaluate_once(&prepared.matrix, &prepared.labels, &params, &truth, &adapter) {
            Ok(run) => {
                report::print_run(algorithm, &run);
                succeeded += 1;
            }
            Err(e) => error!(algorithm = %algorithm, error = %e, "Algorithm failed"),
        }
    }

    if succeeded == 0 {
        bail!("No algorithm produced a graph");
    }
    Ok(())
}

/// Parameters for a single run: `--param` values, then per-algorithm defaults.
///
/// PC with background knowledge runs at alpha 0.05, stable, uc_rule 0.
fn run_params(algorithm: Algorithm, args: &RunArgs) -> ParamSet {
    let mut params: ParamSet = args.params.iter().cloned().collect();
    let defaults = match algorithm {
        Algorithm::DirectLingam => vec![("measure", json!(args.measure))],
        Algorithm::Pc if args.background_knowledge => vec![
            ("alpha", json!(0.05)),
            ("stable", json!(true)),
            ("uc_rule", json!(0)),
        ],
        _ => Vec::new(),
    };
    for (key, value) in defaults {
        params.entry(key.to_string()).or_insert(value);
    }
    params
}

fn grid_for(config: &CausalabConfig, algorithm: Algorithm) -> &HyperparameterGrid {
    match algorithm {
        Algorithm::Pc => &config.grids.pc,
        Algorithm::IcaLingam => &config.grids.ica_lingam,
        Algorithm::DirectLingam => &config.grids.direct_lingam,
    }
}

fn handle_tune(workspace: &Path, args: TuneArgs) -> anyhow::Result<()> {
    let config = load(workspace)?;
    let prepared = load_dataset(args.dataset, &args.data)?;
    let truth = args.dataset.reference_graph()?;
    let backend = PythonBackend::from_config(&config.python, workspace.to_path_buf())?;
    let forbidden = background(args.dataset, &prepared.labels, args.background_knowledge);
    let adapter = adapter_for(args.algorithm, &backend, forbidden);

    let report = search(
        &prepared.matrix,
        &prepared.labels,
        grid_for(&config, args.algorithm),
        &truth,
        &adapter,
        args.folds.unwrap_or(config.search.n_splits),
        args.seed.unwrap_or(config.search.seed),
    )?;
    report::print_search(&report);

    if let Some(path) = &args.output {
        report::write_json(path, &report)?;
        println!("Report written to: {}", path.display());
    }
    Ok(())
}

fn handle_truth(dataset: DatasetKind, encoded: bool) -> anyhow::Result<()> {
    let graph = if encoded {
        dataset.reference_graph()?
    } else {
        dataset.true_graph()?
    };
    report::print_graph(&format!("True graph: {dataset}"), &graph);
    Ok(())
}

fn handle_config(action: ConfigAction, workspace: &Path) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_path = workspace_config_path(workspace);
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }
            if let Some(dir) = config_path.parent() {
                std::fs::create_dir_all(dir)?;
            }

            let toml_str = toml::to_string_pretty(&CausalabConfig::default())?;
            std::fs::write(&config_path, &toml_str)?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            let config = load(workspace)?;
            let toml_str = toml::to_string_pretty(&config)?;
            println!("{}", toml_str);
            Ok(())
        }
    }
}

fn handle_doctor(workspace: &Path) -> anyhow::Result<()> {
    let config = load(workspace)?;
    let backend = PythonBackend::from_config(&config.python, workspace.to_path_buf())?;

    let info = backend.python_info()?;
    println!("Python:  {} ({})", info.version, info.path.display());
    if let Some(venv) = &info.venv_path {
        println!("Venv:    {}", venv.display());
    }

    let mut packages: Vec<_> = backend.check_packages().into_iter().collect();
    packages.sort();
    for (name, available) in &packages {
        println!("  {:<12} {}", name, if *available { "ok" } else { "missing" });
    }
    if packages.iter().any(|(_, available)| !available) {
        println!("\nInstall with: pip install numpy causal-learn lingam");
    }
    Ok(())
}
