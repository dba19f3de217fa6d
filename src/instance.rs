use crate::error::{MapfError, MapfResult};
use crate::grid::{Coord, Grid};
use std::fs;
use std::path::{Path, PathBuf};

/// One assignment problem: a grid, N agent starts and N pooled goals.
#[derive(Debug, Clone)]
pub struct MapfInstance {
    pub name: String,
    pub grid: Grid,
    pub starts: Vec<Coord>,
    pub goals: Vec<Coord>,
}

impl MapfInstance {
    pub fn new(name: impl Into<String>, grid: Grid, starts: Vec<Coord>, goals: Vec<Coord>) -> Self {
        Self {
            name: name.into(),
            grid,
            starts,
            goals,
        }
    }

    pub fn num_agents(&self) -> usize {
        self.starts.len()
    }

    /// Checks the square-assignment invariant and that every endpoint lies on the grid.
    pub fn validate(&self) -> MapfResult<()> {
        if self.starts.is_empty() {
            return Err(MapfError::Validation(format!(
                "Instance '{}' has no agents",
                self.name
            )));
        }
        if self.starts.len() != self.goals.len() {
            return Err(MapfError::Validation(format!(
                "Instance '{}' has {} starts but {} goals",
                self.name,
                self.starts.len(),
                self.goals.len()
            )));
        }
        if let Some(p) = self
            .starts
            .iter()
            .chain(&self.goals)
            .find(|&&p| !self.grid.contains(p))
        {
            return Err(MapfError::Validation(format!(
                "Instance '{}': {:?} lies outside the {}x{} grid",
                self.name,
                p,
                self.grid.rows(),
                self.grid.cols()
            )));
        }
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> MapfResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::parse(&name, path, &content)
    }

    /// Parses the text format:
    ///
    /// ```text
    /// rows cols
    /// <rows map lines, '@' = obstacle>
    /// num_agents
    /// sx sy gx gy   (one line per agent)
    /// ```
    pub fn parse(name: &str, path: &Path, content: &str) -> MapfResult<Self> {
        let mut reader = LineReader::new(path, content);

        let (line_no, header) = reader.next_line("grid dimensions")?;
        let dims = parse_numbers(header).map_err(|m| reader.error(line_no, m))?;
        let &[rows, cols] = dims.as_slice() else {
            return Err(reader.error(line_no, format!("expected 'rows cols', got '{}'", header)));
        };
        if rows.checked_mul(cols).is_none() {
            return Err(reader.error(line_no, format!("grid {}x{} is too large", rows, cols)));
        }

        // Counts in the file never size an allocation up front.
        let mut blocked = Vec::new();
        for r in 0..rows {
            let (line_no, line) = reader.next_line("map row")?;
            let cells: Vec<char> = line.chars().collect();
            if cells.len() < cols {
                return Err(reader.error(
                    line_no,
                    format!("map row {} has {} cells, expected {}", r, cells.len(), cols),
                ));
            }
            blocked.extend(cells[..cols].iter().map(|&c| c == '@'));
        }
        let grid = Grid::from_mask(rows, cols, blocked)?;

        let (line_no, line) = reader.next_line("agent count")?;
        let num_agents: usize = line
            .trim()
            .parse()
            .map_err(|_| reader.error(line_no, format!("invalid agent count '{}'", line.trim())))?;

        let mut starts = Vec::new();
        let mut goals = Vec::new();
        for _ in 0..num_agents {
            let (line_no, line) = reader.next_line("agent line")?;
            let nums = parse_numbers(line).map_err(|m| reader.error(line_no, m))?;
            let &[sx, sy, gx, gy] = nums.as_slice() else {
                return Err(reader.error(
                    line_no,
                    format!("expected 'sx sy gx gy', got '{}'", line),
                ));
            };
            starts.push((sx, sy));
            goals.push((gx, gy));
        }

        let instance = Self::new(name, grid, starts, goals);
        instance.validate()?;
        Ok(instance)
    }
}

struct LineReader<'a> {
    path: PathBuf,
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
}

impl<'a> LineReader<'a> {
    fn new(path: &Path, content: &'a str) -> Self {
        Self {
            path: path.to_path_buf(),
            lines: content.lines().enumerate(),
        }
    }

    fn next_line(&mut self, what: &str) -> MapfResult<(usize, &'a str)> {
        match self.lines.next() {
            Some((i, line)) => Ok((i + 1, line)),
            None => Err(MapfError::Instance {
                path: self.path.clone(),
                line: 0,
                message: format!("unexpected end of file, expected {}", what),
            }),
        }
    }

    fn error(&self, line: usize, message: String) -> MapfError {
        MapfError::Instance {
            path: self.path.clone(),
            line,
            message,
        }
    }
}

fn parse_numbers(line: &str) -> Result<Vec<usize>, String> {
    line.split_whitespace()
        .map(|tok| {
            tok.parse::<usize>()
                .map_err(|_| format!("'{}' is not a non-negative integer", tok))
        })
        .collect()
}
