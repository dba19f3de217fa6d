use crate::error::{MapfError, MapfResult};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A `(row, col)` cell position.
pub type Coord = (usize, usize);

const NEIGHBOURS: [(isize, isize); 4] = [(0, 1), (1, 0), (-1, 0), (0, -1)];

/// Immutable obstacle mask, row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    rows: usize,
    cols: usize,
    blocked: Vec<bool>,
}

impl Grid {
    /// An obstacle-free grid.
    pub fn open(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            blocked: vec![false; rows * cols],
        }
    }

    pub fn from_mask(rows: usize, cols: usize, blocked: Vec<bool>) -> MapfResult<Self> {
        if blocked.len() != rows * cols {
            return Err(MapfError::Validation(format!(
                "Obstacle mask has {} cells, expected {}x{}",
                blocked.len(),
                rows,
                cols
            )));
        }
        Ok(Self { rows, cols, blocked })
    }

    /// Builds a grid from text rows where `@` marks an obstacle.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> MapfResult<Self> {
        let cols = rows.first().map(|r| r.as_ref().chars().count()).unwrap_or(0);
        let mut blocked = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.chars().count() != cols {
                return Err(MapfError::Validation(format!(
                    "Row {} has {} cells, expected {}",
                    i,
                    row.chars().count(),
                    cols
                )));
            }
            blocked.extend(row.chars().map(|c| c == '@'));
        }
        Self::from_mask(rows.len(), cols, blocked)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn contains(&self, (r, c): Coord) -> bool {
        r < self.rows && c < self.cols
    }

    /// Out-of-bounds cells count as blocked.
    #[inline]
    pub fn is_blocked(&self, pos: Coord) -> bool {
        !self.contains(pos) || self.blocked[pos.0 * self.cols + pos.1]
    }

    pub fn set_blocked(&mut self, pos: Coord, blocked: bool) {
        if self.contains(pos) {
            self.blocked[pos.0 * self.cols + pos.1] = blocked;
        }
    }

    pub fn obstacles(&self) -> Vec<Coord> {
        self.blocked
            .iter()
            .enumerate()
            .filter(|(_, &b)| b)
            .map(|(i, _)| (i / self.cols, i % self.cols))
            .collect()
    }

    #[inline]
    fn index(&self, (r, c): Coord) -> usize {
        r * self.cols + c
    }

    /// Free 4-connected neighbours of `pos`.
    pub fn neighbours(&self, pos: Coord) -> impl Iterator<Item = Coord> + '_ {
        NEIGHBOURS.iter().filter_map(move |&(dr, dc)| {
            let r = pos.0.checked_add_signed(dr)?;
            let c = pos.1.checked_add_signed(dc)?;
            (!self.is_blocked((r, c))).then_some((r, c))
        })
    }

    /// BFS shortest path from `start` to `goal` over free cells, both ends included.
    pub fn shortest_path(&self, start: Coord, goal: Coord) -> Option<Vec<Coord>> {
        if start == goal {
            return Some(vec![start]);
        }
        if !self.contains(start) {
            return None;
        }

        let mut parent: Vec<Option<Coord>> = vec![None; self.rows * self.cols];
        let mut visited = vec![false; self.rows * self.cols];
        let mut queue = VecDeque::from([start]);
        visited[self.index(start)] = true;

        while let Some(curr) = queue.pop_front() {
            for next in self.neighbours(curr) {
                let idx = self.index(next);
                if visited[idx] {
                    continue;
                }
                visited[idx] = true;
                parent[idx] = Some(curr);
                if next == goal {
                    let mut path = vec![goal];
                    let mut cursor = curr;
                    while cursor != start {
                        path.push(cursor);
                        cursor = parent[self.index(cursor)]?;
                    }
                    path.push(start);
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(next);
            }
        }
        None
    }
}

/// Whether `goal` can be reached from `start` by 4-connected moves over free cells.
///
/// `start == goal` is always reachable. The start cell itself is not checked
/// against the obstacle mask; a start outside the grid reaches nothing else.
pub fn reachable(grid: &Grid, start: Coord, goal: Coord) -> bool {
    if start == goal {
        return true;
    }
    if !grid.contains(start) {
        return false;
    }

    let mut visited = vec![false; grid.rows * grid.cols];
    let mut queue = VecDeque::from([start]);
    visited[grid.index(start)] = true;

    while let Some(curr) = queue.pop_front() {
        for next in grid.neighbours(curr) {
            let idx = grid.index(next);
            if visited[idx] {
                continue;
            }
            if next == goal {
                return true;
            }
            visited[idx] = true;
            queue.push_back(next);
        }
    }
    false
}

/// True when every `(starts[i], goals[i])` pair is connected.
pub fn all_reachable(grid: &Grid, starts: &[Coord], goals: &[Coord]) -> bool {
    starts
        .iter()
        .zip(goals)
        .all(|(&s, &g)| reachable(grid, s, g))
}
