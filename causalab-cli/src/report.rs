//! Terminal and JSON output for runs and searches.

use causalab_core::search::describe;
use causalab_core::{CombinationStatus, GraphModel, SearchOutcome, SearchReport, SingleRun};
use causalab_discovery::Algorithm;
use serde::Serialize;
use std::path::Path;

pub fn print_run(algorithm: Algorithm, run: &SingleRun) {
    let eval = &run.evaluation;
    println!(
        "{algorithm}: SHD {}, recall {:.3}, precision {:.3} ({} edges)",
        eval.shd,
        eval.recall,
        eval.precision,
        run.graph.edge_count()
    );
    for (from, to) in run.graph.edges() {
        println!("    {from} -> {to}");
    }
}

pub fn print_search(report: &SearchReport) {
    println!(
        "{} grid search: {} combinations, {} folds, seed {}",
        report.adapter,
        report.all_scores.len(),
        report.n_splits,
        report.seed
    );
    for score in &report.all_scores {
        let failed = score.folds.iter().filter(|f| f.evaluation().is_none()).count();
        match score.status {
            CombinationStatus::Scored { mean_shd } if failed > 0 => println!(
                "  {:<40} mean SHD {mean_shd:.2} ({failed} folds failed)",
                describe(&score.params)
            ),
            CombinationStatus::Scored { mean_shd } => {
                println!("  {:<40} mean SHD {mean_shd:.2}", describe(&score.params))
            }
            CombinationStatus::AllFoldsFailed => {
                println!("  {:<40} all folds failed", describe(&score.params))
            }
        }
    }

    match &report.outcome {
        SearchOutcome::Best(best) => {
            let folds: Vec<String> = best
                .per_fold_shd
                .iter()
                .map(|s| s.map_or_else(|| "-".to_string(), |v| v.to_string()))
                .collect();
            println!("\nBest parameters: {}", describe(&best.params));
            println!("  mean SHD:  {:.2}", best.mean_shd);
            println!("  per fold:  [{}]", folds.join(", "));
            println!("  recall:    {:.3}", best.recall_at_best);
            println!("  precision: {:.3}", best.precision_at_best);
        }
        SearchOutcome::NoConfigurationSucceeded => {
            println!("\nNo configuration succeeded.");
        }
    }
}

pub fn print_graph(title: &str, graph: &GraphModel) {
    println!(
        "{title} ({} nodes, {} edges)",
        graph.node_count(),
        graph.edge_count()
    );
    for (from, to) in graph.edges() {
        println!("  {from} -> {to}");
    }
}

/// Write `value` as pretty JSON, creating parent directories.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}
