use crate::grid::{all_reachable, Coord, Grid};
use crate::solver::{sum_of_costs, PathSolver, SolverOutcome};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use strum_macros::{Display, EnumString};
use tracing::warn;

/// Cost of an assignment that fails the reachability pre-check.
/// Finite, so it still ranks against real sums-of-costs; `+inf` always ranks last.
pub const UNREACHABLE_COST: f64 = 9999.0;

/// Outcome label attached to the reported assignment of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
pub enum ResultNote {
    #[strum(serialize = "")]
    #[serde(rename = "")]
    Success,
    #[strum(serialize = "INF-UNREACHABLE")]
    #[serde(rename = "INF-UNREACHABLE")]
    Unreachable,
    #[strum(serialize = "INF-NOPATH")]
    #[serde(rename = "INF-NOPATH")]
    NoPath,
    #[strum(serialize = "ERROR")]
    #[serde(rename = "ERROR")]
    Error,
}

/// What happened when one assignment was evaluated.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// Some `(start, goal)` pair is disconnected; the solver was not called.
    Unreachable,
    Solved(f64),
    NoSolution,
    Failed(String),
}

impl Evaluation {
    /// Cost seen by the optimizer for a sampled assignment.
    pub fn sample_cost(&self) -> f64 {
        match self {
            Evaluation::Unreachable => UNREACHABLE_COST,
            Evaluation::Solved(cost) => *cost,
            Evaluation::NoSolution | Evaluation::Failed(_) => f64::INFINITY,
        }
    }

    /// Cost and note reported for the final assignment. Every failure mode
    /// reports `UNREACHABLE_COST`; the note tells them apart.
    pub fn final_outcome(&self) -> (f64, ResultNote) {
        match self {
            Evaluation::Solved(cost) => (*cost, ResultNote::Success),
            Evaluation::Unreachable => (UNREACHABLE_COST, ResultNote::Unreachable),
            Evaluation::NoSolution => (UNREACHABLE_COST, ResultNote::NoPath),
            Evaluation::Failed(_) => (UNREACHABLE_COST, ResultNote::Error),
        }
    }
}

/// Scores goal permutations for a fixed grid and start list.
///
/// Each call makes at most one solver invocation, and solver failures
/// (including panics) come back as values rather than propagating.
pub struct CostEvaluator<'a, S: PathSolver + ?Sized> {
    grid: &'a Grid,
    starts: &'a [Coord],
    solver: &'a S,
    disjoint: bool,
}

impl<'a, S: PathSolver + ?Sized> CostEvaluator<'a, S> {
    pub fn new(grid: &'a Grid, starts: &'a [Coord], solver: &'a S, disjoint: bool) -> Self {
        Self {
            grid,
            starts,
            solver,
            disjoint,
        }
    }

    pub fn evaluate(&self, permutation: &[Coord]) -> f64 {
        self.classify(permutation).sample_cost()
    }

    pub fn classify(&self, permutation: &[Coord]) -> Evaluation {
        if !all_reachable(self.grid, self.starts, permutation) {
            return Evaluation::Unreachable;
        }

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.solver
                .find_solution(self.grid, self.starts, permutation, self.disjoint)
        }))
        .unwrap_or_else(|payload| SolverOutcome::Failed(panic_message(payload.as_ref())));

        match outcome {
            SolverOutcome::Solved(paths) if !paths.is_empty() => {
                Evaluation::Solved(sum_of_costs(&paths))
            }
            SolverOutcome::Solved(_) | SolverOutcome::NoSolution => Evaluation::NoSolution,
            SolverOutcome::Failed(message) => {
                warn!(
                    "Solver failure on permutation [{}]: {}",
                    format_permutation(permutation),
                    message
                );
                Evaluation::Failed(message)
            }
        }
    }
}

/// `r-c;r-c;...`
pub fn format_permutation(permutation: &[Coord]) -> String {
    permutation
        .iter()
        .map(|(r, c)| format!("{}-{}", r, c))
        .join(";")
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("solver panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("solver panicked: {}", s)
    } else {
        "solver panicked".to_string()
    }
}
