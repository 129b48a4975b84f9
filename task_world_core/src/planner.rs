use crate::{
    Position,
    grid::Grid,
    search::{PlanResult, SearchStrategy},
};

/// The planner's pick: the chosen task cell, the route to it with the
/// start cell already stripped (the agent is standing there), and the cost
/// to attribute to the task once reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPlan {
    pub goal: Position,
    pub steps: Vec<Position>,
    pub cost: usize,
}

/// Finds the nearest remaining task from `position` under `strategy`.
///
/// Every task cell still on the grid is searched; unreachable ones are
/// skipped. Selection is by path length (cell count) for both strategies,
/// with the first task to reach a new minimum winning ties. Returns `None`
/// when no task is reachable, leaving the agent idle.
pub fn plan_nearest(grid: &Grid, position: Position, strategy: SearchStrategy) -> Option<TaskPlan> {
    let mut best: Option<(Position, PlanResult)> = None;

    for (&cell, _) in grid.tasks() {
        let Some(result) = strategy.plan(grid, position, cell) else {
            continue;
        };
        let shorter = best
            .as_ref()
            .is_none_or(|(_, held)| result.path.len() < held.path.len());
        if shorter {
            best = Some((cell, result));
        }
    }

    best.map(|(goal, result)| TaskPlan {
        goal,
        cost: result.cost,
        steps: result.path.into_iter().skip(1).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_task_with_the_shortest_path() {
        let grid = Grid::from_ascii(
            ". . . . 2
             . . . . .
             1 . . . .",
        )
        .unwrap();

        let plan = plan_nearest(&grid, Position::new(0, 0), SearchStrategy::Ucs).unwrap();
        assert_eq!(plan.goal, Position::new(0, 2));
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.cost, 2);
        assert_eq!(plan.steps.last(), Some(&Position::new(0, 2)));
    }

    #[test]
    fn steps_exclude_the_start_cell() {
        let grid = Grid::from_ascii(". 1").unwrap();
        for strategy in [SearchStrategy::AStar, SearchStrategy::Ucs] {
            let plan = plan_nearest(&grid, Position::new(0, 0), strategy).unwrap();
            assert_eq!(plan.steps, vec![Position::new(1, 0)]);
            assert_eq!(plan.cost, 1);
        }
    }

    #[test]
    fn skips_unreachable_tasks() {
        // Task 1 is sealed behind barriers; task 2 sits further away but
        // must be chosen.
        let grid = Grid::from_ascii(
            ". # 1 # .
             . # # # .
             . . . . 2",
        )
        .unwrap();

        let plan = plan_nearest(&grid, Position::new(0, 0), SearchStrategy::AStar).unwrap();
        assert_eq!(plan.goal, Position::new(4, 2));
    }

    #[test]
    fn returns_none_when_nothing_is_reachable() {
        let grid = Grid::from_ascii(
            ". # 1
             . # #
             . # 2",
        )
        .unwrap();

        for strategy in [SearchStrategy::AStar, SearchStrategy::Ucs] {
            assert_eq!(plan_nearest(&grid, Position::new(0, 1), strategy), None);
        }
    }

    #[test]
    fn task_under_the_agent_yields_an_empty_route() {
        let grid = Grid::from_ascii("1 . . 2").unwrap();
        let plan = plan_nearest(&grid, Position::new(0, 0), SearchStrategy::Ucs).unwrap();
        assert_eq!(plan.goal, Position::new(0, 0));
        assert!(plan.steps.is_empty());
        assert_eq!(plan.cost, 0);
    }
}
