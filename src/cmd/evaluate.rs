use crate::reports::{self, InstanceSummary};
use clap::Args;
use mapf_cem::config::SearchParams;
use mapf_cem::instance::MapfInstance;
use mapf_cem::optimizer::CostEvaluator;
use mapf_cem::results::{self, ResultRecord};
use mapf_cem::solver::PathSolver;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    #[arg(short, long, num_args = 1.., required = true)]
    pub instance: Vec<PathBuf>,

    // Only `disjoint` is used; it resolves against `--config` like `solve`.
    #[command(flatten)]
    pub search: SearchParams,
}

/// Scores every instance with its goals in file order and appends the rows
/// to `<out>/baseline.csv`. Returns the number of instances that failed to load.
pub fn run(
    args: &EvaluateArgs,
    params: &SearchParams,
    solver: Arc<dyn PathSolver>,
    out_dir: &Path,
) -> usize {
    let baseline_path = out_dir.join("baseline.csv");
    let mut summaries = Vec::new();
    let mut failures = 0;

    for path in &args.instance {
        let instance = match MapfInstance::load_from_file(path) {
            Ok(i) => i,
            Err(e) => {
                error!("Failed to process {}: {}", path.display(), e);
                failures += 1;
                continue;
            }
        };

        let evaluator =
            CostEvaluator::new(&instance.grid, &instance.starts, &*solver, params.disjoint);
        let (cost, note) = evaluator.classify(&instance.goals).final_outcome();
        info!("{}: listed assignment costs {} {}", instance.name, cost, note);

        let record = ResultRecord::new(&instance.name, cost, &instance.goals, note);
        if let Err(e) = results::append_record(&baseline_path, &record) {
            error!("Could not write {}: {}", baseline_path.display(), e);
        }
        summaries.push(InstanceSummary {
            record,
            generations: 0,
            best_sampled: cost,
        });
    }

    reports::print_summary(&summaries);
    failures
}
