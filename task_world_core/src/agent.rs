use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{Position, TaskId, grid::Grid, planner, search::SearchStrategy};

/// One simulated agent: its position on the grid, the route it is
/// currently walking, and the running ledger of collected tasks.
///
/// The agent is a two-state machine. While idle with tasks remaining it
/// asks the planner for a route to the nearest one; while moving it
/// consumes exactly one cell of the pending route per tick. Stepping onto
/// a task cell removes that task from the grid and books the cost of the
/// current plan against it, in the same tick as the move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    strategy: SearchStrategy,
    start: Position,
    position: Position,
    pending_path: VecDeque<Position>,
    moving: bool,
    current_plan_cost: usize,
    completed: Vec<(TaskId, usize)>,
    total_cost: usize,
}

impl Agent {
    pub fn new(strategy: SearchStrategy, start: Position) -> Self {
        Agent {
            strategy,
            start,
            position: start,
            pending_path: VecDeque::new(),
            moving: false,
            current_plan_cost: 0,
            completed: Vec::new(),
            total_cost: 0,
        }
    }

    /// Returns the agent to its episode-start record: back at the start
    /// cell, idle, with an empty ledger.
    pub fn reset(&mut self) {
        self.position = self.start;
        self.pending_path.clear();
        self.moving = false;
        self.current_plan_cost = 0;
        self.completed.clear();
        self.total_cost = 0;
    }

    /// Advances the state machine by exactly one step.
    ///
    /// Moving agents consume one cell of the pending route (or fall back
    /// to idle once it is exhausted). Idle agents plan a route to the
    /// nearest task if any remain; planning consumes the tick without
    /// moving. An idle agent with no tasks left, or none reachable, stays
    /// put.
    pub fn tick(&mut self, grid: &mut Grid) {
        if self.moving {
            self.advance(grid);
        } else if grid.task_count() > 0 {
            self.plan(grid);
        }
    }

    fn plan(&mut self, grid: &Grid) {
        if let Some(plan) = planner::plan_nearest(grid, self.position, self.strategy) {
            self.pending_path = plan.steps.into();
            self.current_plan_cost = plan.cost;
            self.moving = true;
        }
    }

    fn advance(&mut self, grid: &mut Grid) {
        match self.pending_path.pop_front() {
            Some(next) => {
                self.position = next;
                if let Some(task) = grid.remove_task(next) {
                    self.completed.push((task, self.current_plan_cost));
                    self.total_cost += self.current_plan_cost;
                }
            }
            None => self.moving = false,
        }
    }

    #[inline]
    pub fn strategy(&self) -> SearchStrategy {
        self.strategy
    }

    #[inline]
    pub fn position(&self) -> Position {
        self.position
    }

    #[inline]
    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// Cells still to be traversed, excluding the current position.
    pub fn pending_path(&self) -> impl Iterator<Item = &Position> {
        self.pending_path.iter()
    }

    /// Collected tasks in completion order, each with its attributed cost.
    pub fn completed(&self) -> &[(TaskId, usize)] {
        &self.completed
    }

    pub fn tasks_completed(&self) -> usize {
        self.completed.len()
    }

    pub fn total_cost(&self) -> usize {
        self.total_cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_until_idle(agent: &mut Agent, grid: &mut Grid, max_ticks: usize) {
        for _ in 0..max_ticks {
            agent.tick(grid);
            if !agent.is_moving() && grid.task_count() == 0 {
                return;
            }
        }
        panic!("agent did not finish within {max_ticks} ticks");
    }

    #[test]
    fn planning_consumes_a_tick_without_moving() {
        let mut grid = Grid::from_ascii(". . 1").unwrap();
        let mut agent = Agent::new(SearchStrategy::Ucs, Position::new(0, 0));

        agent.tick(&mut grid);
        assert!(agent.is_moving());
        assert_eq!(agent.position(), Position::new(0, 0));
        assert_eq!(agent.pending_path().count(), 2);

        agent.tick(&mut grid);
        assert_eq!(agent.position(), Position::new(1, 0));
    }

    #[test]
    fn collects_the_goal_task_and_books_its_cost() {
        let mut grid = Grid::new(5, 5);
        grid.add_task(Position::new(4, 4), 3).unwrap();
        let mut agent = Agent::new(SearchStrategy::Ucs, Position::new(0, 0));

        run_until_idle(&mut agent, &mut grid, 32);

        assert_eq!(agent.position(), Position::new(4, 4));
        assert_eq!(agent.completed(), &[(3, 8)]);
        assert_eq!(agent.total_cost(), 8);
        assert_eq!(agent.tasks_completed(), 1);
        assert_eq!(grid.task_count(), 0);
    }

    #[test]
    fn astar_books_the_heuristic_sum() {
        let mut grid = Grid::new(5, 5);
        grid.add_task(Position::new(4, 4), 1).unwrap();
        let mut agent = Agent::new(SearchStrategy::AStar, Position::new(0, 0));

        run_until_idle(&mut agent, &mut grid, 32);
        assert_eq!(agent.completed(), &[(1, 8)]);
        assert_eq!(agent.total_cost(), 8);
    }

    #[test]
    fn collects_tasks_stepped_on_en_route() {
        let mut grid = Grid::new(5, 1);
        grid.add_task(Position::new(4, 0), 1).unwrap();
        let mut agent = Agent::new(SearchStrategy::Ucs, Position::new(0, 0));

        // Plan to the only task, then drop a second one onto the route
        // mid-flight; the agent must collect it as it passes, attributing
        // the cost of the plan it is walking.
        agent.tick(&mut grid);
        grid.add_task(Position::new(2, 0), 9).unwrap();

        run_until_idle(&mut agent, &mut grid, 16);
        assert_eq!(agent.completed(), &[(9, 4), (1, 4)]);
        assert_eq!(agent.total_cost(), 8);
    }

    #[test]
    fn stays_idle_when_no_task_is_reachable() {
        let mut grid = Grid::from_ascii(
            ". # 1
             . # .",
        )
        .unwrap();
        let mut agent = Agent::new(SearchStrategy::AStar, Position::new(0, 0));

        for _ in 0..4 {
            agent.tick(&mut grid);
        }
        assert!(!agent.is_moving());
        assert_eq!(agent.position(), Position::new(0, 0));
        assert_eq!(agent.tasks_completed(), 0);
        assert_eq!(grid.task_count(), 1);
    }

    #[test]
    fn exhausted_route_flips_to_idle_on_the_following_tick() {
        let mut grid = Grid::from_ascii(". 1").unwrap();
        let mut agent = Agent::new(SearchStrategy::Ucs, Position::new(0, 0));

        agent.tick(&mut grid); // plan
        agent.tick(&mut grid); // step onto the task, exhausting the route
        assert_eq!(agent.position(), Position::new(1, 0));
        assert_eq!(grid.task_count(), 0);
        assert!(agent.is_moving(), "flip to idle happens one tick later");

        agent.tick(&mut grid);
        assert!(!agent.is_moving());
    }

    #[test]
    fn reset_restores_the_initial_record() {
        let mut grid = Grid::from_ascii(". 1 2").unwrap();
        let mut agent = Agent::new(SearchStrategy::Ucs, Position::new(0, 0));
        let initial = agent.clone();

        run_until_idle(&mut agent, &mut grid, 16);
        assert_ne!(agent, initial);

        agent.reset();
        assert_eq!(agent, initial);
    }
}
