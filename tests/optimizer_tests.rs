mod common;

use common::{constant_solver, instance, path_of_len, walled_grid, MockSolver};
use mapf_cem::grid::{Coord, Grid};
use mapf_cem::optimizer::{
    select_elite, BatchRunner, CemOptimizer, CemOptions, GenerationReport, ProgressCallback,
    ResultNote, SearchState, SilentProgress, UNREACHABLE_COST,
};
use mapf_cem::solver::SolverOutcome;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rstest::rstest;
use std::sync::{Arc, Mutex};

fn options(num_samples: usize, num_elite: usize, maxiter: usize) -> CemOptions {
    CemOptions::builder()
        .num_samples(num_samples)
        .num_elite(num_elite)
        .maxiter(maxiter)
        .num_threads(2)
        .build()
}

/// Two agents on an open 3x3 grid. Keeping the listed goal order costs 10,
/// swapping it costs 20.
fn two_agent_setup() -> (
    Arc<mapf_cem::instance::MapfInstance>,
    Arc<MockSolver<impl Fn(&[Coord], &[Coord]) -> SolverOutcome + Send + Sync>>,
) {
    let goals = vec![(0, 2), (2, 2)];
    let inst = instance(Grid::open(3, 3), vec![(0, 0), (2, 0)], goals.clone());
    let solver = MockSolver::new(move |starts: &[Coord], g: &[Coord]| {
        let moves = if g == goals.as_slice() { 5 } else { 10 };
        SolverOutcome::Solved(starts.iter().map(|&s| path_of_len(s, moves)).collect())
    });
    (Arc::new(inst), Arc::new(solver))
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(5)]
#[case(20)]
fn test_single_agent_cost_independent_of_maxiter(#[case] maxiter: usize) {
    let inst = Arc::new(instance(Grid::open(3, 3), vec![(0, 0)], vec![(2, 2)]));
    let solver = Arc::new(constant_solver(4));
    let optimizer = CemOptimizer::new(inst, solver, options(10, 3, maxiter)).unwrap();

    let result = optimizer.run(Some(7), &SilentProgress).unwrap();

    assert_eq!(result.cost, 4.0);
    assert_eq!(result.note, ResultNote::Success);
    assert_eq!(result.permutation, vec![(2, 2)]);
    assert_eq!(result.trace.len(), maxiter);
    assert!(result.trace.iter().all(|&c| c == 4.0));
}

#[test]
fn test_two_agents_converge_to_cheaper_assignment() {
    // Stochastic: each seed converges with high probability; allow 3 misses in 10.
    let mut hits = 0;
    for seed in 0..10 {
        let (inst, solver) = two_agent_setup();
        let optimizer = CemOptimizer::new(inst, solver, options(50, 10, 20)).unwrap();
        let result = optimizer.run(Some(seed), &SilentProgress).unwrap();
        assert!(result.cost == 10.0 || result.cost == 20.0);
        if result.cost == 10.0 {
            assert_eq!(result.permutation, vec![(0, 2), (2, 2)]);
            hits += 1;
        }
    }
    assert!(hits >= 7, "only {}/10 seeds reached cost 10", hits);
}

#[test]
fn test_trace_has_one_entry_per_generation() {
    let (inst, solver) = two_agent_setup();
    let optimizer = CemOptimizer::new(inst, solver, options(20, 5, 13)).unwrap();
    let result = optimizer.run(Some(1), &SilentProgress).unwrap();

    assert_eq!(result.trace.len(), 13);
    assert!(result.trace.iter().all(|&c| c == 10.0 || c == 20.0));
}

#[test]
fn test_evaluation_count_per_run() {
    let (inst, solver) = two_agent_setup();
    let optimizer = CemOptimizer::new(inst, solver.clone(), options(15, 4, 6)).unwrap();
    optimizer.run(Some(3), &SilentProgress).unwrap();

    // Every sample once, plus the final mean.
    assert_eq!(solver.calls(), 15 * 6 + 1);
}

#[rstest]
#[case(&[5.0, 1.0, 3.0, 1.0, 9.0], 3, vec![1, 3, 2])]
#[case(&[2.0, f64::INFINITY, 9999.0, 0.0], 10, vec![3, 0, 2, 1])]
#[case(&[4.0, 4.0, 4.0], 2, vec![0, 1])]
fn test_select_elite(
    #[case] costs: &[f64],
    #[case] num_elite: usize,
    #[case] expected: Vec<usize>,
) {
    assert_eq!(select_elite(costs, num_elite), expected);
}

#[rstest]
#[case(30, 5)]
#[case(8, 8)]
#[case(4, 10)]
fn test_elite_size_and_ordering(#[case] num_samples: usize, #[case] num_elite: usize) {
    // Cost depends on which goal each agent gets, so samples spread out.
    let goals = vec![(0, 0), (0, 1), (0, 2), (0, 3)];
    let inst = Arc::new(instance(Grid::open(4, 4), vec![(3, 0), (3, 1), (3, 2), (3, 3)], goals));
    let solver = Arc::new(MockSolver::new(|starts: &[Coord], goals: &[Coord]| {
        SolverOutcome::Solved(
            starts
                .iter()
                .zip(goals)
                .enumerate()
                .map(|(i, (&s, g))| path_of_len(s, (i + 1) * (g.1 + 1)))
                .collect(),
        )
    }));
    let optimizer =
        CemOptimizer::new(inst, solver, options(num_samples, num_elite, 1)).unwrap();

    let runner = BatchRunner::new(2).unwrap();
    let mut state = SearchState::new(4);
    let mut rng = StdRng::seed_from_u64(11);
    let generation = optimizer.run_generation(&runner, &mut state, &mut rng);

    assert_eq!(generation.samples.len(), num_samples);
    assert_eq!(generation.costs.len(), num_samples);
    assert_eq!(generation.elite.len(), num_elite.min(num_samples));

    let worst_elite = generation
        .elite
        .iter()
        .map(|&i| generation.costs[i])
        .fold(f64::NEG_INFINITY, f64::max);
    for (i, &c) in generation.costs.iter().enumerate() {
        if !generation.elite.contains(&i) {
            assert!(worst_elite <= c, "elite cost {} above non-elite {}", worst_elite, c);
        }
    }
}

#[test]
fn test_unreachable_final_assignment() {
    let inst = Arc::new(instance(walled_grid(3, 3, 1), vec![(0, 0)], vec![(0, 2)]));
    let solver = Arc::new(constant_solver(2));
    let optimizer = CemOptimizer::new(inst, solver.clone(), options(10, 2, 3)).unwrap();

    let result = optimizer.run(Some(0), &SilentProgress).unwrap();

    assert_eq!(result.cost, UNREACHABLE_COST);
    assert_eq!(result.note, ResultNote::Unreachable);
    assert!(result.trace.iter().all(|&c| c == UNREACHABLE_COST));
    assert_eq!(solver.calls(), 0);
}

#[test]
fn test_no_solution_final_assignment() {
    let inst = Arc::new(instance(Grid::open(3, 3), vec![(0, 0)], vec![(2, 2)]));
    let solver = Arc::new(MockSolver::new(|_: &[Coord], _: &[Coord]| {
        SolverOutcome::NoSolution
    }));
    let optimizer = CemOptimizer::new(inst, solver, options(10, 2, 3)).unwrap();

    let result = optimizer.run(Some(0), &SilentProgress).unwrap();

    assert_eq!(result.cost, UNREACHABLE_COST);
    assert_eq!(result.note, ResultNote::NoPath);
    assert!(result.trace.iter().all(|c| c.is_infinite()));
}

#[test]
fn test_failing_solver_final_assignment() {
    let inst = Arc::new(instance(Grid::open(3, 3), vec![(0, 0)], vec![(2, 2)]));
    let solver = Arc::new(MockSolver::new(|_: &[Coord], _: &[Coord]| {
        SolverOutcome::Failed("license expired".into())
    }));
    let optimizer = CemOptimizer::new(inst, solver, options(10, 2, 2)).unwrap();

    let result = optimizer.run(Some(0), &SilentProgress).unwrap();

    assert_eq!(result.cost, UNREACHABLE_COST);
    assert_eq!(result.note, ResultNote::Error);
}

#[test]
fn test_same_seed_same_result_across_thread_counts() {
    let run = |threads: usize| {
        let (inst, solver) = two_agent_setup();
        let opts = CemOptions::builder()
            .num_samples(25)
            .num_elite(5)
            .maxiter(8)
            .num_threads(threads)
            .build();
        CemOptimizer::new(inst, solver, opts)
            .unwrap()
            .run(Some(42), &SilentProgress)
            .unwrap()
    };

    let a = run(1);
    let b = run(4);
    assert_eq!(a.trace, b.trace);
    assert_eq!(a.permutation, b.permutation);
    assert_eq!(a.final_state.mean, b.final_state.mean);
}

#[derive(Default)]
struct Recorder {
    reports: Mutex<Vec<GenerationReport>>,
}

impl ProgressCallback for Recorder {
    fn on_generation(&self, report: &GenerationReport) {
        self.reports.lock().unwrap().push(report.clone());
    }
}

#[test]
fn test_progress_callback_sees_every_generation() {
    let (inst, solver) = two_agent_setup();
    let optimizer = CemOptimizer::new(inst, solver, options(20, 4, 5)).unwrap();
    let recorder = Recorder::default();

    let result = optimizer.run(Some(9), &recorder).unwrap();

    let reports = recorder.reports.into_inner().unwrap();
    let generations: Vec<usize> = reports.iter().map(|r| r.generation).collect();
    assert_eq!(generations, vec![0, 1, 2, 3, 4]);
    let bests: Vec<f64> = reports.iter().map(|r| r.best_cost).collect();
    assert_eq!(bests, result.trace);
    assert!(reports.iter().all(|r| r.unreachable == 0 && r.infinite == 0));
}

#[rstest]
#[case(0, 1, 1)]
#[case(10, 0, 1)]
#[case(10, 1, 0)]
fn test_rejects_invalid_options(
    #[case] num_samples: usize,
    #[case] num_elite: usize,
    #[case] num_threads: usize,
) {
    let inst = Arc::new(instance(Grid::open(2, 2), vec![(0, 0)], vec![(1, 1)]));
    let opts = CemOptions::builder()
        .num_samples(num_samples)
        .num_elite(num_elite)
        .num_threads(num_threads)
        .build();
    assert!(CemOptimizer::new(inst, Arc::new(constant_solver(1)), opts).is_err());
}

#[test]
fn test_rejects_mismatched_instance() {
    let inst = Arc::new(instance(Grid::open(3, 3), vec![(0, 0), (1, 1)], vec![(2, 2)]));
    assert!(CemOptimizer::new(inst, Arc::new(constant_solver(1)), CemOptions::default()).is_err());
}
