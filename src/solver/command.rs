use super::{Path, PathSolver, SolverOutcome};
use crate::grid::{Coord, Grid};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;
use tracing::debug;

/// Runs an external solver process once per query.
///
/// The request is written to the child's stdin as one JSON object; the child
/// answers on stdout with a JSON object tagged by `status`:
///
/// ```json
/// {"status": "solved", "paths": [[[0, 0], [0, 1]], [[2, 2]]]}
/// {"status": "no_solution"}
/// {"status": "failed", "message": "..."}
/// ```
#[derive(Debug, Clone)]
pub struct CommandSolver {
    program: String,
    args: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SolveRequest<'a> {
    pub rows: usize,
    pub cols: usize,
    pub obstacles: Vec<Coord>,
    pub starts: &'a [Coord],
    pub goals: &'a [Coord],
    pub disjoint: bool,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SolveReply {
    Solved { paths: Vec<Path> },
    NoSolution,
    Failed { message: String },
}

impl From<SolveReply> for SolverOutcome {
    fn from(reply: SolveReply) -> Self {
        match reply {
            SolveReply::Solved { paths } => SolverOutcome::Solved(paths),
            SolveReply::NoSolution => SolverOutcome::NoSolution,
            SolveReply::Failed { message } => SolverOutcome::Failed(message),
        }
    }
}

impl CommandSolver {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn run(&self, payload: Vec<u8>) -> Result<SolverOutcome, String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| format!("failed to spawn '{}': {}", self.program, e))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| "child stdin unavailable".to_string())?;
        let writer = thread::spawn(move || stdin.write_all(&payload));

        let output = child
            .wait_with_output()
            .map_err(|e| format!("failed to wait for '{}': {}", self.program, e))?;

        // Exit status takes precedence over a broken stdin pipe.
        let write_result = writer
            .join()
            .map_err(|_| "stdin writer panicked".to_string())?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            ));
        }
        write_result.map_err(|e| format!("failed to write request: {}", e))?;

        debug!("solver replied with {} bytes", output.stdout.len());
        let reply: SolveReply = serde_json::from_slice(&output.stdout)
            .map_err(|e| format!("malformed solver reply: {}", e))?;
        Ok(reply.into())
    }
}

impl PathSolver for CommandSolver {
    fn find_solution(
        &self,
        grid: &Grid,
        starts: &[Coord],
        goals: &[Coord],
        disjoint: bool,
    ) -> SolverOutcome {
        let request = SolveRequest {
            rows: grid.rows(),
            cols: grid.cols(),
            obstacles: grid.obstacles(),
            starts,
            goals,
            disjoint,
        };

        let payload = match serde_json::to_vec(&request) {
            Ok(p) => p,
            Err(e) => return SolverOutcome::Failed(format!("failed to encode request: {}", e)),
        };

        self.run(payload).unwrap_or_else(SolverOutcome::Failed)
    }
}
