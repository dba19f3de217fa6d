use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use mapf_cem::config::SearchParams;
use mapf_cem::solver::{CommandSolver, IndependentSolver, PathSolver};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "CEM goal assignment for multi-agent pathfinding",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON file with search parameters; flags typed on the command line win.
    #[arg(global = true, long)]
    config: Option<PathBuf>,

    #[arg(global = true, short, long, default_value = "results")]
    out: PathBuf,

    /// External solver program (JSON on stdin/stdout). Without it, agents are
    /// planned independently with BFS.
    #[arg(global = true, long)]
    solver_cmd: Option<String>,

    /// Extra argument for the solver program; repeatable.
    #[arg(global = true, long = "solver-arg", allow_hyphen_values = true)]
    solver_args: Vec<String>,

    #[arg(global = true, long, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search for the best goal assignment of each instance.
    Solve(cmd::solve::SolveArgs),
    /// Score each instance's listed assignment once.
    Evaluate(cmd::evaluate::EvaluateArgs),
}

fn main() {
    // 1. Parse raw matches first so explicit flags can be told apart from defaults
    let matches = Cli::command().get_matches();

    // 2. Construct the CLI struct (populated with defaults)
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    // 3. Logging: RUST_LOG wins, otherwise --debug picks the level

    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    // 4. Pick the pathfinding oracle
    let solver: Arc<dyn PathSolver> = match &cli.solver_cmd {
        Some(program) => {
            info!("Using external solver: {} {:?}", program, cli.solver_args);
            Arc::new(CommandSolver::new(program.clone(), cli.solver_args.clone()))
        }
        None => {
            warn!("No --solver-cmd given; planning agents independently (conflicts ignored).");
            Arc::new(IndependentSolver)
        }
    };

    // 5. Execute. Search flags live in the subcommand's matches, not the root.
    let failures = match &cli.command {
        Commands::Solve(args) => {
            let Some(sub_matches) = matches.subcommand_matches("solve") else {
                unreachable!("clap dispatched 'solve' without its matches");
            };
            let params = resolve_params(&cli, &args.search, sub_matches);
            cmd::solve::run(args, &params, solver, &cli.out)
        }
        Commands::Evaluate(args) => {
            let Some(sub_matches) = matches.subcommand_matches("evaluate") else {
                unreachable!("clap dispatched 'evaluate' without its matches");
            };
            let params = resolve_params(&cli, &args.search, sub_matches);
            cmd::evaluate::run(args, &params, solver, &cli.out)
        }
    };

    // 6. Any instance that could not be processed fails the batch

    if failures > 0 {
        error!("{} instance(s) could not be processed", failures);
        process::exit(1);
    }
}

fn resolve_params(
    cli: &Cli,
    cli_params: &SearchParams,
    matches: &clap::ArgMatches,
) -> SearchParams {
    let mut params = match &cli.config {
        Some(path) => {
            info!("Loading search parameters from {}", path.display());
            // File values are the base; flags typed on the command line override them
            let mut file_params = SearchParams::load_from_file(path).unwrap_or_else(|e| {
                error!("{}", e);
                process::exit(1);
            });
            file_params.merge_from_cli(cli_params, matches);
            file_params
        }
        None => cli_params.clone(),
    };

    if let Err(e) = params.validate() {
        error!("{}", e);
        process::exit(1);
    }
    if params.num_elite > params.num_samples {
        warn!(
            "num_elite ({}) exceeds num_samples ({}); every sample will be elite",
            params.num_elite, params.num_samples
        );
        params.num_elite = params.num_samples;
    }
    params
}
