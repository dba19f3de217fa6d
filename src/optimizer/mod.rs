//! Cross-Entropy-Method search over goal assignments.
//!
//! Each generation samples real vectors from a multivariate Gaussian,
//! decodes them into goal permutations, scores the permutations in parallel
//! and refits the Gaussian to the elite samples. The reported assignment is
//! decoded from the final mean, not from the best sample seen.

pub mod decode;
pub mod evaluate;
pub mod gaussian;
pub mod runner;

pub use self::decode::decode;
pub use self::evaluate::{CostEvaluator, Evaluation, ResultNote, UNREACHABLE_COST};
pub use self::gaussian::SearchState;
pub use self::runner::BatchRunner;

use crate::config::{default_threads, SearchParams};
use crate::error::{MapfError, MapfResult};
use crate::grid::Coord;
use crate::instance::MapfInstance;
use crate::solver::PathSolver;
use nalgebra::DVector;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use typed_builder::TypedBuilder;

#[derive(TypedBuilder, Debug, Clone)]
pub struct CemOptions {
    #[builder(default = 100)]
    pub num_samples: usize,
    #[builder(default = 10)]
    pub num_elite: usize,
    #[builder(default = 20)]
    pub maxiter: usize,
    #[builder(default = default_threads())]
    pub num_threads: usize,
    #[builder(default = false)]
    pub disjoint: bool,
}

impl Default for CemOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl From<&SearchParams> for CemOptions {
    fn from(params: &SearchParams) -> Self {
        Self {
            num_samples: params.num_samples,
            num_elite: params.num_elite,
            maxiter: params.maxiter,
            num_threads: params.worker_threads(),
            disjoint: params.disjoint,
        }
    }
}

/// One CEM iteration: the samples, their decoded permutations and costs,
/// and the indices of the elite samples (best first).
#[derive(Debug, Clone)]
pub struct Generation {
    pub samples: Vec<DVector<f64>>,
    pub permutations: Vec<Vec<Coord>>,
    pub costs: Vec<f64>,
    pub elite: Vec<usize>,
}

impl Generation {
    pub fn best_cost(&self) -> f64 {
        self.costs.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn report(&self, generation: usize) -> GenerationReport {
        let finite: Vec<f64> = self
            .costs
            .iter()
            .copied()
            .filter(|c| c.is_finite() && *c != UNREACHABLE_COST)
            .collect();
        let mean_solved_cost = if finite.is_empty() {
            None
        } else {
            Some(finite.iter().sum::<f64>() / finite.len() as f64)
        };

        GenerationReport {
            generation,
            best_cost: self.best_cost(),
            mean_solved_cost,
            elite_worst_cost: self
                .elite
                .last()
                .map(|&i| self.costs[i])
                .unwrap_or(f64::INFINITY),
            unreachable: self
                .costs
                .iter()
                .filter(|&&c| c == UNREACHABLE_COST)
                .count(),
            infinite: self.costs.iter().filter(|c| c.is_infinite()).count(),
        }
    }
}

/// Per-generation summary handed to a [`ProgressCallback`].
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    pub generation: usize,
    pub best_cost: f64,
    /// Mean over samples the solver actually solved.
    pub mean_solved_cost: Option<f64>,
    pub elite_worst_cost: f64,
    pub unreachable: usize,
    pub infinite: usize,
}

/// Receives a report after every generation. Purely observational: a run
/// always completes `maxiter` generations.
pub trait ProgressCallback: Send + Sync {
    fn on_generation(&self, report: &GenerationReport);
}

pub struct SilentProgress;

impl ProgressCallback for SilentProgress {
    fn on_generation(&self, _report: &GenerationReport) {}
}

#[derive(Debug, Clone)]
pub struct CemResult {
    /// Goal for agent `i` at position `i`.
    pub permutation: Vec<Coord>,
    pub cost: f64,
    pub note: ResultNote,
    /// Best sample cost per generation, exactly `maxiter` entries.
    pub trace: Vec<f64>,
    pub final_state: SearchState,
}

/// Indices of the `min(num_elite, costs.len())` lowest costs, best first.
/// Equal costs keep sample order.
pub fn select_elite(costs: &[f64], num_elite: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..costs.len()).collect();
    order.sort_by(|&a, &b| costs[a].total_cmp(&costs[b]));
    order.truncate(num_elite.min(costs.len()));
    order
}

pub struct CemOptimizer<S: PathSolver + ?Sized> {
    instance: Arc<MapfInstance>,
    solver: Arc<S>,
    options: CemOptions,
}

impl<S: PathSolver + ?Sized> CemOptimizer<S> {
    pub fn new(
        instance: Arc<MapfInstance>,
        solver: Arc<S>,
        options: CemOptions,
    ) -> MapfResult<Self> {
        instance.validate()?;
        if options.num_samples == 0 {
            return Err(MapfError::Validation("num_samples must be at least 1".into()));
        }
        if options.num_elite == 0 {
            return Err(MapfError::Validation("num_elite must be at least 1".into()));
        }
        if options.num_threads == 0 {
            return Err(MapfError::Validation("num_threads must be at least 1".into()));
        }
        Ok(Self {
            instance,
            solver,
            options,
        })
    }

    pub fn options(&self) -> &CemOptions {
        &self.options
    }

    pub fn evaluator(&self) -> CostEvaluator<'_, S> {
        CostEvaluator::new(
            &self.instance.grid,
            &self.instance.starts,
            &*self.solver,
            self.options.disjoint,
        )
    }

    /// Runs with a fresh `StdRng`, seeded when `seed` is given.
    pub fn run<CB: ProgressCallback>(
        &self,
        seed: Option<u64>,
        callback: &CB,
    ) -> MapfResult<CemResult> {
        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        self.run_with_rng(&mut rng, callback)
    }

    pub fn run_with_rng<R, CB>(&self, rng: &mut R, callback: &CB) -> MapfResult<CemResult>
    where
        R: Rng + ?Sized,
        CB: ProgressCallback,
    {
        let opts = &self.options;
        let n = self.instance.num_agents();

        info!(
            "CEM on '{}': {} agents, {} samples x {} generations, {} elite, {} workers",
            self.instance.name, n, opts.num_samples, opts.maxiter, opts.num_elite, opts.num_threads
        );

        let mut state = SearchState::new(n);
        let mut trace = Vec::with_capacity(opts.maxiter);
        let start_time = Instant::now();

        {
            let runner = BatchRunner::new(opts.num_threads)?;
            for g in 0..opts.maxiter {
                let generation = self.run_generation(&runner, &mut state, rng);
                let report = generation.report(g);
                debug!(
                    "Gen {:3} | best {} | elite worst {} | unreachable {} | inf {}",
                    g,
                    report.best_cost,
                    report.elite_worst_cost,
                    report.unreachable,
                    report.infinite
                );
                trace.push(report.best_cost);
                callback.on_generation(&report);
            }
        }

        let (permutation, evaluation) = self.finalize(&state);
        let (cost, note) = evaluation.final_outcome();

        info!(
            "CEM on '{}' done in {:.2?}: cost {} {}",
            self.instance.name,
            start_time.elapsed(),
            cost,
            note
        );

        Ok(CemResult {
            permutation,
            cost,
            note,
            trace,
            final_state: state,
        })
    }

    /// Sample, decode, evaluate, select and refit. Blocks until every sample
    /// of the generation has been scored.
    pub fn run_generation<R: Rng + ?Sized>(
        &self,
        runner: &BatchRunner,
        state: &mut SearchState,
        rng: &mut R,
    ) -> Generation {
        let goals = &self.instance.goals;
        let samples = state.sample(rng, self.options.num_samples);
        let permutations: Vec<Vec<Coord>> = samples
            .iter()
            .map(|v| decode(v.as_slice(), goals))
            .collect();

        let evaluator = self.evaluator();
        let costs = runner.run(&permutations, |perm| evaluator.evaluate(perm));

        let elite = select_elite(&costs, self.options.num_elite);
        let elite_vectors: Vec<&DVector<f64>> = elite.iter().map(|&i| &samples[i]).collect();
        state.refit(&elite_vectors);

        Generation {
            samples,
            permutations,
            costs,
            elite,
        }
    }

    /// Decodes the distribution mean and evaluates it once more.
    pub fn finalize(&self, state: &SearchState) -> (Vec<Coord>, Evaluation) {
        let permutation = decode(state.mean.as_slice(), &self.instance.goals);
        let evaluation = self.evaluator().classify(&permutation);
        (permutation, evaluation)
    }
}
