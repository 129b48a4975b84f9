use std::collections::{HashMap, HashSet};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{Position, TaskId};

/// Represents errors that can occur while building or parsing a grid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("coordinates ({x}, {y}) are out of bounds for grid size ({columns}, {rows})")]
    OutOfBounds {
        x: usize,
        y: usize,
        columns: usize,
        rows: usize,
    },
    #[error("cell ({x}, {y}) already holds a barrier or a task")]
    CellConflict { x: usize, y: usize },
    #[error("unknown map token '{token}' at cell ({x}, {y})")]
    UnknownToken { token: String, x: usize, y: usize },
    #[error("inconsistent width at row {row}: expected {expected}, found {found}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("map is empty")]
    EmptyMap,
}

/// The spatial truth of one episode: fixed dimensions, a set of barrier
/// cells, and the remaining task cells keyed by position.
///
/// Barriers are laid down once at construction time. The task map shrinks
/// over the episode as agents collect tasks; [`Grid::remove_task`] is the
/// only runtime mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    columns: usize,
    rows: usize,
    barriers: HashSet<Position>,
    tasks: HashMap<Position, TaskId>,
}

/// Restore point for [`Grid::restore`]: the barrier set and task map as
/// they stood when the snapshot was taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSnapshot {
    barriers: HashSet<Position>,
    tasks: HashMap<Position, TaskId>,
}

/// Fixed orthogonal neighbor offsets: up, down, left, right. The emission
/// order makes search exploration, and therefore tie-breaking among
/// equal-cost paths, reproducible.
const NEIGHBOR_OFFSETS: [(isize, isize); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

impl Grid {
    /// Creates an empty grid with the given dimensions.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    pub fn new(columns: usize, rows: usize) -> Self {
        assert!(
            columns > 0 && rows > 0,
            "grid dimensions must be positive, got ({columns}, {rows})"
        );
        Grid {
            columns,
            rows,
            barriers: HashSet::new(),
            tasks: HashMap::new(),
        }
    }

    /// Generates a grid with `barrier_count` barriers and `task_count`
    /// tasks placed on distinct random cells. Deterministic under a seeded
    /// `Rng`. The agent start cell `(0, 0)` is left free so a freshly
    /// placed agent never begins on top of a barrier or task. Task ids run
    /// `1..=task_count` in placement order.
    pub fn generate<R: Rng>(
        columns: usize,
        rows: usize,
        barrier_count: usize,
        task_count: usize,
        rng: &mut R,
    ) -> Self {
        let mut grid = Grid::new(columns, rows);
        let start = Position::new(0, 0);

        // Cap the requested counts so placement always terminates on
        // small grids.
        let free_cells = columns * rows - 1;
        let barrier_count = barrier_count.min(free_cells);
        let task_count = task_count.min(free_cells - barrier_count);

        while grid.barriers.len() < barrier_count {
            let cell = Position::new(rng.random_range(0..columns), rng.random_range(0..rows));
            if cell != start {
                grid.barriers.insert(cell);
            }
        }

        let mut next_id: TaskId = 1;
        while next_id <= task_count {
            let cell = Position::new(rng.random_range(0..columns), rng.random_range(0..rows));
            if cell != start && !grid.barriers.contains(&cell) && !grid.tasks.contains_key(&cell) {
                grid.tasks.insert(cell, next_id);
                next_id += 1;
            }
        }

        grid
    }

    /// Parses a grid from a whitespace-separated token map.
    ///
    /// Tokens: `.` is an open cell, `#` a barrier, and a decimal integer
    /// places a task with that id. Every row must carry the same number of
    /// tokens.
    pub fn from_ascii(map: &str) -> Result<Grid, GridError> {
        let lines: Vec<&str> = map
            .trim()
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        if lines.is_empty() {
            return Err(GridError::EmptyMap);
        }

        let rows = lines.len();
        let mut columns = 0;
        let mut parsed: Vec<Vec<&str>> = Vec::with_capacity(rows);
        for (y, line) in lines.iter().enumerate() {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if y == 0 {
                columns = tokens.len();
                if columns == 0 {
                    return Err(GridError::EmptyMap);
                }
            } else if tokens.len() != columns {
                return Err(GridError::RaggedRow {
                    row: y,
                    expected: columns,
                    found: tokens.len(),
                });
            }
            parsed.push(tokens);
        }

        let mut grid = Grid::new(columns, rows);
        for (y, row_tokens) in parsed.iter().enumerate() {
            for (x, token) in row_tokens.iter().enumerate() {
                let cell = Position::new(x, y);
                match *token {
                    "." => {}
                    "#" => grid.add_barrier(cell)?,
                    other => match other.parse::<TaskId>() {
                        Ok(id) => grid.add_task(cell, id)?,
                        Err(_) => {
                            return Err(GridError::UnknownToken {
                                token: other.to_string(),
                                x,
                                y,
                            });
                        }
                    },
                }
            }
        }

        Ok(grid)
    }

    /// Places a barrier. Fails if the cell is out of bounds or already
    /// holds a task, keeping the barrier/task sets disjoint.
    pub fn add_barrier(&mut self, position: Position) -> Result<(), GridError> {
        self.check_bounds(position)?;
        if self.tasks.contains_key(&position) {
            return Err(GridError::CellConflict {
                x: position.x,
                y: position.y,
            });
        }
        self.barriers.insert(position);
        Ok(())
    }

    /// Places a task. Fails if the cell is out of bounds, a barrier, or
    /// already holds a task.
    pub fn add_task(&mut self, position: Position, id: TaskId) -> Result<(), GridError> {
        self.check_bounds(position)?;
        if self.barriers.contains(&position) || self.tasks.contains_key(&position) {
            return Err(GridError::CellConflict {
                x: position.x,
                y: position.y,
            });
        }
        self.tasks.insert(position, id);
        Ok(())
    }

    /// Removes and returns the task at `position`, if any. The single
    /// runtime mutation of the grid.
    pub fn remove_task(&mut self, position: Position) -> Option<TaskId> {
        self.tasks.remove(&position)
    }

    /// Walkable orthogonal neighbors of `position`, emitted in the fixed
    /// up, down, left, right order.
    pub fn neighbors(&self, position: Position) -> Vec<Position> {
        let mut neighbors = Vec::with_capacity(4);
        for (dx, dy) in NEIGHBOR_OFFSETS {
            let Some(x) = position.x.checked_add_signed(dx) else {
                continue;
            };
            let Some(y) = position.y.checked_add_signed(dy) else {
                continue;
            };
            if x >= self.columns || y >= self.rows {
                continue;
            }
            let cell = Position::new(x, y);
            if self.barriers.contains(&cell) {
                continue;
            }
            neighbors.push(cell);
        }
        neighbors
    }

    /// Captures the current barrier set and task map as a restore point.
    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            barriers: self.barriers.clone(),
            tasks: self.tasks.clone(),
        }
    }

    /// Restores barriers and tasks from a snapshot taken on a grid with
    /// the same dimensions.
    pub fn restore(&mut self, snapshot: &GridSnapshot) {
        self.barriers = snapshot.barriers.clone();
        self.tasks = snapshot.tasks.clone();
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn in_bounds(&self, position: Position) -> bool {
        position.x < self.columns && position.y < self.rows
    }

    pub fn is_barrier(&self, position: Position) -> bool {
        self.barriers.contains(&position)
    }

    pub fn task_at(&self, position: Position) -> Option<TaskId> {
        self.tasks.get(&position).copied()
    }

    /// Iterates the remaining task cells. Enumeration order is
    /// unspecified; callers must rely on membership only.
    pub fn tasks(&self) -> impl Iterator<Item = (&Position, &TaskId)> {
        self.tasks.iter()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn barrier_count(&self) -> usize {
        self.barriers.len()
    }

    fn check_bounds(&self, position: Position) -> Result<(), GridError> {
        if self.in_bounds(position) {
            Ok(())
        } else {
            Err(GridError::OutOfBounds {
                x: position.x,
                y: position.y,
                columns: self.columns,
                rows: self.rows,
            })
        }
    }
}
