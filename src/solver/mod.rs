//! The joint pathfinding oracle seam.
//!
//! The optimizer treats the solver as a black box that either returns one
//! path per agent, reports that no joint solution exists, or fails.

pub mod command;
pub mod independent;

pub use self::command::CommandSolver;
pub use self::independent::IndependentSolver;

use crate::grid::{Coord, Grid};
use serde::{Deserialize, Serialize};

/// Sequence of cells visited by one agent, start and goal included.
pub type Path = Vec<Coord>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SolverOutcome {
    Solved(Vec<Path>),
    NoSolution,
    Failed(String),
}

pub trait PathSolver: Send + Sync {
    /// Plans agent `i` from `starts[i]` to `goals[i]`. `disjoint` selects the
    /// solver's disjoint-splitting strategy and is otherwise uninterpreted.
    fn find_solution(
        &self,
        grid: &Grid,
        starts: &[Coord],
        goals: &[Coord],
        disjoint: bool,
    ) -> SolverOutcome;
}

impl<S: PathSolver + ?Sized> PathSolver for &S {
    fn find_solution(
        &self,
        grid: &Grid,
        starts: &[Coord],
        goals: &[Coord],
        disjoint: bool,
    ) -> SolverOutcome {
        (**self).find_solution(grid, starts, goals, disjoint)
    }
}

impl<S: PathSolver + ?Sized> PathSolver for Box<S> {
    fn find_solution(
        &self,
        grid: &Grid,
        starts: &[Coord],
        goals: &[Coord],
        disjoint: bool,
    ) -> SolverOutcome {
        (**self).find_solution(grid, starts, goals, disjoint)
    }
}

/// Sum of per-agent path lengths, counted in moves (a path of `k` cells has length `k - 1`).
pub fn sum_of_costs(paths: &[Path]) -> f64 {
    paths.iter().map(|p| p.len().saturating_sub(1) as f64).sum()
}
