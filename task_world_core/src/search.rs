use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{Position, grid::Grid};

/// A discovered route from start to goal (both inclusive) together with
/// the cost the strategy attributes to it.
///
/// The two strategies report different metrics: [`ucs`] reports the true
/// path cost under unit steps, while [`astar`] reports the Manhattan
/// distances summed over the traversed edges. The metrics are not
/// comparable across strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanResult {
    pub path: Vec<Position>,
    pub cost: usize,
}

/// The two interchangeable shortest-path strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchStrategy {
    AStar,
    Ucs,
}

impl SearchStrategy {
    /// Display name of the strategy.
    pub fn name(&self) -> &'static str {
        match self {
            SearchStrategy::AStar => "A* Search",
            SearchStrategy::Ucs => "UCS",
        }
    }

    /// Runs the strategy from `start` to `goal`. `None` means no path
    /// exists, a normal outcome for goals enclosed by barriers.
    pub fn plan(&self, grid: &Grid, start: Position, goal: Position) -> Option<PlanResult> {
        match self {
            SearchStrategy::AStar => astar(grid, start, goal),
            SearchStrategy::Ucs => ucs(grid, start, goal),
        }
    }
}

/// Frontier entry carrying the route walked so far and the cost metric
/// accumulated along it.
#[derive(Clone, Eq, PartialEq)]
struct Node {
    priority: usize,
    seq: u64,
    cell: Position,
    path: Vec<Position>,
    metric: usize,
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap behavior; `seq` keeps equal priorities in
        // discovery order so tie-breaking stays deterministic.
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A* with the Manhattan-distance heuristic, frontier ordered by
/// `f = g + h`.
///
/// The reported cost is the sum of per-edge Manhattan distances along the
/// winning path rather than the path cost itself; downstream cost ledgers
/// book this metric. On a 4-connected grid every edge contributes exactly
/// 1, so the sum telescopes to the step count.
pub fn astar(grid: &Grid, start: Position, goal: Position) -> Option<PlanResult> {
    let mut frontier = BinaryHeap::new();
    let mut g_scores: HashMap<Position, usize> = HashMap::new();
    let mut seq: u64 = 0;

    g_scores.insert(start, 0);
    frontier.push(Node {
        priority: start.manhattan_distance(goal),
        seq,
        cell: start,
        path: vec![start],
        metric: 0,
    });

    while let Some(node) = frontier.pop() {
        if node.cell == goal {
            return Some(PlanResult {
                path: node.path,
                cost: node.metric,
            });
        }

        let Some(&g_current) = g_scores.get(&node.cell) else {
            continue;
        };

        for neighbor in grid.neighbors(node.cell) {
            let tentative = g_current + 1;
            if g_scores.get(&neighbor).is_none_or(|&g| tentative < g) {
                g_scores.insert(neighbor, tentative);
                seq += 1;
                let mut path = node.path.clone();
                path.push(neighbor);
                frontier.push(Node {
                    priority: tentative + neighbor.manhattan_distance(goal),
                    seq,
                    cell: neighbor,
                    path,
                    metric: node.metric + node.cell.manhattan_distance(neighbor),
                });
            }
        }
    }

    None
}

/// Uniform-cost search: frontier ordered by accumulated path cost alone.
///
/// Cells are marked visited when popped, never when pushed, so the
/// frontier may hold several pending entries for one cell; the cheapest
/// (earliest-discovered on ties) wins. The reported cost is the true
/// shortest-path cost, path length minus one.
pub fn ucs(grid: &Grid, start: Position, goal: Position) -> Option<PlanResult> {
    let mut frontier = BinaryHeap::new();
    let mut visited: HashSet<Position> = HashSet::new();
    let mut seq: u64 = 0;

    frontier.push(Node {
        priority: 0,
        seq,
        cell: start,
        path: vec![start],
        metric: 0,
    });

    while let Some(node) = frontier.pop() {
        if !visited.insert(node.cell) {
            continue;
        }

        if node.cell == goal {
            return Some(PlanResult {
                path: node.path,
                cost: node.metric,
            });
        }

        for neighbor in grid.neighbors(node.cell) {
            seq += 1;
            let mut path = node.path.clone();
            path.push(neighbor);
            frontier.push(Node {
                priority: node.priority + 1,
                seq,
                cell: neighbor,
                path,
                metric: node.metric + 1,
            });
        }
    }

    None
}
