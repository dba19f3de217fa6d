#![allow(dead_code)] // Not every test binary uses every helper.

use mapf_cem::grid::{Coord, Grid};
use mapf_cem::instance::MapfInstance;
use mapf_cem::solver::{Path, PathSolver, SolverOutcome};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A path of `moves` moves starting at `start`. Only its length matters to
/// the cost, so the cells are not checked against any grid.
pub fn path_of_len(start: Coord, moves: usize) -> Path {
    (0..=moves).map(|i| (start.0, start.1 + i)).collect()
}

/// Solver double driven by a closure. Counts calls and records the goal
/// order and disjoint flag of each query.
pub struct MockSolver<F> {
    respond: F,
    calls: AtomicUsize,
    seen: Mutex<Vec<(Vec<Coord>, bool)>>,
}

impl<F> MockSolver<F>
where
    F: Fn(&[Coord], &[Coord]) -> SolverOutcome + Send + Sync,
{
    pub fn new(respond: F) -> Self {
        Self {
            respond,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<(Vec<Coord>, bool)> {
        self.seen.lock().unwrap().clone()
    }
}

impl<F> PathSolver for MockSolver<F>
where
    F: Fn(&[Coord], &[Coord]) -> SolverOutcome + Send + Sync,
{
    fn find_solution(
        &self,
        _grid: &Grid,
        starts: &[Coord],
        goals: &[Coord],
        disjoint: bool,
    ) -> SolverOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push((goals.to_vec(), disjoint));
        (self.respond)(starts, goals)
    }
}

/// Every agent gets a path of `moves` moves.
pub fn constant_solver(
    moves: usize,
) -> MockSolver<impl Fn(&[Coord], &[Coord]) -> SolverOutcome + Send + Sync> {
    MockSolver::new(move |starts: &[Coord], _goals: &[Coord]| {
        SolverOutcome::Solved(starts.iter().map(|&s| path_of_len(s, moves)).collect())
    })
}

/// Grid with a full vertical wall at column `wall_col`.
pub fn walled_grid(rows: usize, cols: usize, wall_col: usize) -> Grid {
    let mut grid = Grid::open(rows, cols);
    for r in 0..rows {
        grid.set_blocked((r, wall_col), true);
    }
    grid
}

pub fn instance(grid: Grid, starts: Vec<Coord>, goals: Vec<Coord>) -> MapfInstance {
    MapfInstance::new("test.txt", grid, starts, goals)
}
