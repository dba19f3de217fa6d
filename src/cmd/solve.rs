use crate::reports::{self, InstanceSummary};
use clap::Args;
use mapf_cem::config::SearchParams;
use mapf_cem::instance::MapfInstance;
use mapf_cem::optimizer::{CemOptimizer, CemOptions, GenerationReport, ProgressCallback};
use mapf_cem::results::{self, ResultRecord};
use mapf_cem::solver::PathSolver;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Args, Debug, Clone)]
pub struct SolveArgs {
    /// Instance files to process, in order.
    #[arg(short, long, num_args = 1.., required = true)]
    pub instance: Vec<PathBuf>,

    #[command(flatten)]
    pub search: SearchParams,
}

struct CliLogger;
impl ProgressCallback for CliLogger {
    fn on_generation(&self, r: &GenerationReport) {
        let mean = r
            .mean_solved_cost
            .map(|m| format!("{:.1}", m))
            .unwrap_or_else(|| "-".to_string());
        info!(
            "Gen {:3} | Best: {} | Mean solved: {} | Elite worst: {} | Unreach: {} | Inf: {}",
            r.generation, r.best_cost, mean, r.elite_worst_cost, r.unreachable, r.infinite
        );
    }
}

/// Returns the number of instances that could not be processed.
pub fn run(
    args: &SolveArgs,
    params: &SearchParams,
    solver: Arc<dyn PathSolver>,
    out_dir: &Path,
) -> usize {
    let options = CemOptions::from(params);
    let results_path = out_dir.join("results.csv");
    let mut summaries = Vec::new();
    let mut failures = 0;

    for path in &args.instance {
        info!("=== Processing {} ===", path.display());

        let instance = match MapfInstance::load_from_file(path) {
            Ok(i) => Arc::new(i),
            Err(e) => {
                error!("Failed to process {}: {}", path.display(), e);
                failures += 1;
                continue;
            }
        };

        let result = CemOptimizer::new(instance.clone(), solver.clone(), options.clone())
            .and_then(|optimizer| optimizer.run(params.seed, &CliLogger));
        let result = match result {
            Ok(r) => r,
            Err(e) => {
                error!("Failed to process {}: {}", path.display(), e);
                failures += 1;
                continue;
            }
        };

        let record = ResultRecord::from_result(&instance.name, &result);
        if let Err(e) = results::append_record(&results_path, &record) {
            error!("Could not write {}: {}", results_path.display(), e);
        }
        let trace_path = results::trace_path(out_dir, &instance.name);
        if let Err(e) = results::write_trace(&trace_path, &result.trace) {
            error!("Could not write {}: {}", trace_path.display(), e);
        }

        reports::print_assignment(&instance, &result.permutation);
        reports::print_trace(&instance.name, &result.trace);
        summaries.push(InstanceSummary {
            record,
            generations: result.trace.len(),
            best_sampled: result.trace.iter().copied().fold(f64::INFINITY, f64::min),
        });
    }

    reports::print_summary(&summaries);
    failures
}
