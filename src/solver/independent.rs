use super::{Path, PathSolver, SolverOutcome};
use crate::grid::{Coord, Grid};

/// Plans every agent on its own with BFS and ignores inter-agent conflicts.
///
/// The resulting sum-of-costs is a lower bound on any conflict-free joint
/// plan. The disjoint flag has no effect.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndependentSolver;

impl PathSolver for IndependentSolver {
    fn find_solution(
        &self,
        grid: &Grid,
        starts: &[Coord],
        goals: &[Coord],
        _disjoint: bool,
    ) -> SolverOutcome {
        if starts.len() != goals.len() {
            return SolverOutcome::Failed(format!(
                "{} starts but {} goals",
                starts.len(),
                goals.len()
            ));
        }

        let paths: Option<Vec<Path>> = starts
            .iter()
            .zip(goals)
            .map(|(&s, &g)| grid.shortest_path(s, g))
            .collect();

        match paths {
            Some(p) => SolverOutcome::Solved(p),
            None => SolverOutcome::NoSolution,
        }
    }
}
