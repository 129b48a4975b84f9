use serde::{Deserialize, Serialize};

use crate::{
    Position,
    agent::Agent,
    grid::{Grid, GridSnapshot},
    search::SearchStrategy,
};

/// Cell every agent starts an episode from.
pub const START_CELL: Position = Position::new(0, 0);

/// Owns one episode: the grid, its initial snapshot, and one agent per
/// strategy.
///
/// Exactly one agent is ever active. Activating a strategy restores the
/// grid from the initial snapshot and resets that agent before it starts
/// advancing, so the two strategies always compete on identical task sets
/// and never starve each other by sharing a shrinking one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    grid: Grid,
    initial: GridSnapshot,
    astar_agent: Agent,
    ucs_agent: Agent,
    active: Option<SearchStrategy>,
}

impl Episode {
    /// Wraps a grid, capturing its current state as the restore point for
    /// every later activation.
    pub fn new(grid: Grid) -> Self {
        let initial = grid.snapshot();
        Episode {
            grid,
            initial,
            astar_agent: Agent::new(SearchStrategy::AStar, START_CELL),
            ucs_agent: Agent::new(SearchStrategy::Ucs, START_CELL),
            active: None,
        }
    }

    /// Restores the grid from the initial snapshot, resets the chosen
    /// agent, and makes it the one that advances on subsequent ticks.
    pub fn activate(&mut self, strategy: SearchStrategy) {
        self.grid.restore(&self.initial);
        self.agent_mut(strategy).reset();
        self.active = Some(strategy);
    }

    /// Re-runs the active agent from scratch on the original task set.
    /// No-op when nothing has been activated yet.
    pub fn reset(&mut self) {
        if let Some(strategy) = self.active {
            self.activate(strategy);
        }
    }

    /// Replaces the restore point with a caller-supplied snapshot, then
    /// restores the grid from it and resets both agents.
    pub fn reset_with(&mut self, snapshot: GridSnapshot) {
        self.grid.restore(&snapshot);
        self.initial = snapshot;
        self.astar_agent.reset();
        self.ucs_agent.reset();
    }

    /// Advances the active agent by exactly one step. No-op when no agent
    /// has been activated.
    pub fn tick(&mut self) {
        match self.active {
            Some(SearchStrategy::AStar) => self.astar_agent.tick(&mut self.grid),
            Some(SearchStrategy::Ucs) => self.ucs_agent.tick(&mut self.grid),
            None => {}
        }
    }

    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn agent(&self, strategy: SearchStrategy) -> &Agent {
        match strategy {
            SearchStrategy::AStar => &self.astar_agent,
            SearchStrategy::Ucs => &self.ucs_agent,
        }
    }

    fn agent_mut(&mut self, strategy: SearchStrategy) -> &mut Agent {
        match strategy {
            SearchStrategy::AStar => &mut self.astar_agent,
            SearchStrategy::Ucs => &mut self.ucs_agent,
        }
    }

    #[inline]
    pub fn active(&self) -> Option<SearchStrategy> {
        self.active
    }

    pub fn active_agent(&self) -> Option<&Agent> {
        self.active.map(|strategy| self.agent(strategy))
    }

    /// True once the active agent has collected every task and come to
    /// rest.
    pub fn solved(&self) -> bool {
        self.grid.task_count() == 0
            && self
                .active_agent()
                .is_some_and(|agent| !agent.is_moving())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode() -> Episode {
        let grid = Grid::from_ascii(
            ". . 1 .
             . # . .
             . . . 2",
        )
        .unwrap();
        Episode::new(grid)
    }

    fn run_to_completion(episode: &mut Episode, max_ticks: usize) {
        for _ in 0..max_ticks {
            if episode.solved() {
                return;
            }
            episode.tick();
        }
        panic!("episode not solved within {max_ticks} ticks");
    }

    #[test]
    fn tick_is_a_no_op_until_activation() {
        let mut episode = episode();
        episode.tick();
        assert_eq!(episode.active(), None);
        assert_eq!(episode.grid().task_count(), 2);
        assert!(!episode.solved());
    }

    #[test]
    fn active_agent_collects_every_task() {
        let mut episode = episode();
        episode.activate(SearchStrategy::Ucs);
        run_to_completion(&mut episode, 64);

        let agent = episode.agent(SearchStrategy::Ucs);
        assert_eq!(agent.tasks_completed(), 2);
        assert_eq!(
            agent.total_cost(),
            agent.completed().iter().map(|(_, cost)| cost).sum()
        );
        // The idle partner never advanced.
        assert_eq!(episode.agent(SearchStrategy::AStar).tasks_completed(), 0);
    }

    #[test]
    fn switching_strategies_restores_the_task_set() {
        let mut episode = episode();
        episode.activate(SearchStrategy::AStar);
        for _ in 0..8 {
            episode.tick();
        }
        assert!(episode.grid().task_count() < 2 || episode.agent(SearchStrategy::AStar).is_moving());

        episode.activate(SearchStrategy::Ucs);
        assert_eq!(episode.grid().task_count(), 2);
        assert_eq!(episode.agent(SearchStrategy::Ucs).position(), START_CELL);
        assert_eq!(episode.agent(SearchStrategy::Ucs).tasks_completed(), 0);
    }

    #[test]
    fn reset_is_idempotent_regardless_of_elapsed_ticks() {
        let mut episode = episode();
        episode.activate(SearchStrategy::Ucs);
        let pristine_grid = episode.grid().clone();
        let pristine_agent = episode.agent(SearchStrategy::Ucs).clone();

        for ticks in [0, 1, 5, 64] {
            for _ in 0..ticks {
                episode.tick();
            }
            episode.reset();
            assert_eq!(episode.grid(), &pristine_grid);
            assert_eq!(episode.agent(SearchStrategy::Ucs), &pristine_agent);
        }
    }

    #[test]
    fn reset_with_swaps_the_restore_point() {
        let mut episode = episode();
        episode.activate(SearchStrategy::Ucs);
        run_to_completion(&mut episode, 64);

        let replacement = Grid::from_ascii(". . 5").unwrap().snapshot();
        episode.reset_with(replacement.clone());
        assert_eq!(episode.grid().snapshot(), replacement);
        assert_eq!(episode.agent(SearchStrategy::Ucs).tasks_completed(), 0);

        // A later plain reset restores the replacement, not the original.
        episode.activate(SearchStrategy::Ucs);
        run_to_completion(&mut episode, 64);
        episode.reset();
        assert_eq!(episode.grid().snapshot(), replacement);
    }
}
