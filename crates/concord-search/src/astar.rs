//! Space-time A* over the shared graph.
//!
//! Search states are (location, time step) pairs; every expansion advances
//! time by one, and staying put is a legal move, so an agent can wait out a
//! constraint. The heuristic is the unconstrained graph distance to the
//! goal, computed by one BFS per query; it is admissible and consistent
//! because constraints only ever lengthen paths.
//!
//! Termination is guaranteed by a hard horizon: `horizon_factor` times the
//! unconstrained shortest-path length. No state beyond the horizon is
//! expanded, so a query either returns a minimum-cost path or `None`.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};

use tracing::debug;

use concord_contracts::{
    agent::AgentId,
    constraint::Constraint,
    path::{Location, Path},
    problem::{MapfProblem, SharedGraph},
};
use concord_core::traits::PathPlanner;

/// One space-time search state on the heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SearchNode {
    location: Location,
    time: usize,
    f_cost: usize,
}

impl Ord for SearchNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for a min-heap; ties resolved by (time, location) so
        // expansion order, and therefore the returned path, is fully
        // deterministic.
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| other.time.cmp(&self.time))
            .then_with(|| other.location.cmp(&self.location))
    }
}

impl PartialOrd for SearchNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The reference `PathPlanner`: deterministic, bounded space-time A*.
///
/// Stateless across calls, so one instance can be shared by every agent.
#[derive(Debug, Clone)]
pub struct SpaceTimeAStar {
    horizon_factor: usize,
}

impl SpaceTimeAStar {
    /// `horizon_factor` scales the unconstrained shortest-path length into
    /// the maximum arrival time considered; it must be at least 1.
    pub fn new(horizon_factor: usize) -> Self {
        debug_assert!(horizon_factor >= 1);
        Self { horizon_factor }
    }
}

impl Default for SpaceTimeAStar {
    fn default() -> Self {
        Self::new(3)
    }
}

impl PathPlanner for SpaceTimeAStar {
    fn find_path(
        &self,
        problem: &MapfProblem,
        agent: AgentId,
        constraints: &[Constraint],
    ) -> Option<Path> {
        let spec = problem.spec(agent)?;
        let graph = problem.graph();

        // Only this agent's prohibitions apply.
        let forbidden: HashSet<(Location, usize)> = constraints
            .iter()
            .filter(|c| c.agent == agent)
            .map(|c| (c.location, c.time_step))
            .collect();

        // The start position at time 0 is not negotiable.
        if forbidden.contains(&(spec.start, 0)) {
            return None;
        }

        let heuristic = distances_to(graph, spec.goal);
        let d0 = *heuristic.get(&spec.start)?;
        let horizon = self.horizon_factor * d0.max(1);

        // A goal constraint later than arrival would collide with the
        // conceptual wait-at-goal, so arrival must come strictly after the
        // last constraint targeting the goal cell.
        let goal_clear_after = forbidden
            .iter()
            .filter(|(loc, _)| *loc == spec.goal)
            .map(|(_, t)| *t)
            .max();

        let mut open = BinaryHeap::new();
        let mut trace: HashMap<(Location, usize), (Location, usize)> = HashMap::new();
        let mut visited: HashSet<(Location, usize)> = HashSet::new();

        visited.insert((spec.start, 0));
        open.push(SearchNode {
            location: spec.start,
            time: 0,
            f_cost: d0,
        });

        while let Some(current) = open.pop() {
            if current.location == spec.goal
                && goal_clear_after.map_or(true, |t| current.time > t)
            {
                return Some(reconstruct(&trace, current.location, current.time));
            }

            let next_time = current.time + 1;
            if next_time > horizon {
                continue;
            }

            // Real moves plus the wait-in-place self-transition.
            let mut moves = graph.neighbors(current.location);
            moves.push(current.location);

            for next in moves {
                if forbidden.contains(&(next, next_time)) {
                    continue;
                }
                if !visited.insert((next, next_time)) {
                    continue;
                }
                let Some(&h) = heuristic.get(&next) else {
                    // The goal is unreachable from here even without
                    // constraints.
                    continue;
                };
                trace.insert((next, next_time), (current.location, current.time));
                open.push(SearchNode {
                    location: next,
                    time: next_time,
                    f_cost: next_time + h,
                });
            }
        }

        debug!(
            %agent,
            constraints = constraints.len(),
            horizon,
            "no constraint-satisfying path within horizon"
        );
        None
    }
}

/// Unconstrained graph distance from every reachable location to `goal`,
/// by BFS over the symmetric edge relation.
fn distances_to(graph: &dyn SharedGraph, goal: Location) -> HashMap<Location, usize> {
    let mut dist = HashMap::new();
    let mut queue = VecDeque::new();
    dist.insert(goal, 0usize);
    queue.push_back(goal);

    while let Some(at) = queue.pop_front() {
        let d = dist[&at];
        for next in graph.neighbors(at) {
            if !dist.contains_key(&next) {
                dist.insert(next, d + 1);
                queue.push_back(next);
            }
        }
    }
    dist
}

/// Walk the parent trace back from the goal state and reverse it into a
/// time-indexed path.
fn reconstruct(
    trace: &HashMap<(Location, usize), (Location, usize)>,
    mut location: Location,
    mut time: usize,
) -> Path {
    let mut steps = vec![location];
    while let Some(&(prev_loc, prev_time)) = trace.get(&(location, time)) {
        steps.push(prev_loc);
        location = prev_loc;
        time = prev_time;
    }
    steps.reverse();
    Path::new(steps)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use concord_contracts::problem::AgentSpec;

    use super::*;

    /// A bidirectional corridor 0-1-...-(cells-1).
    struct LineGraph {
        cells: u32,
    }

    impl SharedGraph for LineGraph {
        fn neighbors(&self, at: Location) -> Vec<Location> {
            let mut out = Vec::new();
            if at.0 > 0 {
                out.push(Location(at.0 - 1));
            }
            if at.0 + 1 < self.cells {
                out.push(Location(at.0 + 1));
            }
            out
        }
    }

    /// Two disconnected vertices.
    struct SplitGraph;

    impl SharedGraph for SplitGraph {
        fn neighbors(&self, _at: Location) -> Vec<Location> {
            Vec::new()
        }
    }

    fn line_problem(cells: u32, start: u32, goal: u32) -> MapfProblem {
        MapfProblem::new(
            Arc::new(LineGraph { cells }),
            vec![AgentSpec {
                id: AgentId(0),
                start: Location(start),
                goal: Location(goal),
            }],
        )
        .unwrap()
    }

    fn constraint(location: u32, time_step: usize) -> Constraint {
        Constraint {
            agent: AgentId(0),
            location: Location(location),
            time_step,
        }
    }

    fn steps(path: &Path) -> Vec<u32> {
        path.steps().map(|l| l.0).collect()
    }

    #[test]
    fn unconstrained_path_is_shortest() {
        let problem = line_problem(5, 0, 4);
        let path = SpaceTimeAStar::default()
            .find_path(&problem, AgentId(0), &[])
            .unwrap();
        assert_eq!(steps(&path), vec![0, 1, 2, 3, 4]);
        assert_eq!(path.cost(), 4);
    }

    #[test]
    fn start_equal_goal_costs_nothing() {
        let problem = line_problem(3, 1, 1);
        let path = SpaceTimeAStar::default()
            .find_path(&problem, AgentId(0), &[])
            .unwrap();
        assert_eq!(steps(&path), vec![1]);
        assert_eq!(path.cost(), 0);
    }

    #[test]
    fn constraint_forces_a_wait() {
        // Cell 1 is forbidden at t=1, so the agent idles one step first.
        let problem = line_problem(3, 0, 2);
        let path = SpaceTimeAStar::default()
            .find_path(&problem, AgentId(0), &[constraint(1, 1)])
            .unwrap();
        assert_eq!(steps(&path), vec![0, 0, 1, 2]);
        assert_eq!(path.cost(), 3);
    }

    #[test]
    fn other_agents_constraints_are_ignored() {
        let problem = line_problem(3, 0, 2);
        let foreign = Constraint {
            agent: AgentId(9),
            location: Location(1),
            time_step: 1,
        };
        let path = SpaceTimeAStar::default()
            .find_path(&problem, AgentId(0), &[foreign])
            .unwrap();
        assert_eq!(path.cost(), 2);
    }

    #[test]
    fn goal_constraint_after_arrival_delays_arrival() {
        // The agent would arrive at t=2, but the goal cell is forbidden at
        // t=3; it must hold off until strictly after that.
        let problem = line_problem(3, 0, 2);
        let path = SpaceTimeAStar::default()
            .find_path(&problem, AgentId(0), &[constraint(2, 3)])
            .unwrap();
        assert!(path.cost() > 3);
        assert_eq!(path.end(), Location(2));
        assert_eq!(path.location_at(3), Location(1), "goal cell must be clear at t=3");
    }

    #[test]
    fn constrained_start_is_infeasible() {
        let problem = line_problem(3, 0, 2);
        let result = SpaceTimeAStar::default().find_path(&problem, AgentId(0), &[constraint(0, 0)]);
        assert!(result.is_none());
    }

    #[test]
    fn disconnected_goal_is_infeasible() {
        let problem = MapfProblem::new(
            Arc::new(SplitGraph),
            vec![AgentSpec {
                id: AgentId(0),
                start: Location(0),
                goal: Location(1),
            }],
        )
        .unwrap();
        let result = SpaceTimeAStar::default().find_path(&problem, AgentId(0), &[]);
        assert!(result.is_none());
    }

    #[test]
    fn horizon_bounds_the_search() {
        // d0 = 2, factor 2 → horizon 4. Blocking the goal through t=4
        // leaves no admissible arrival time.
        let problem = line_problem(3, 0, 2);
        let constraints: Vec<Constraint> = (1..=4).map(|t| constraint(2, t)).collect();
        let result = SpaceTimeAStar::new(2).find_path(&problem, AgentId(0), &constraints);
        assert!(result.is_none());

        // A roomier horizon admits the late arrival.
        let path = SpaceTimeAStar::new(3)
            .find_path(&problem, AgentId(0), &constraints)
            .unwrap();
        assert_eq!(path.cost(), 5);
    }

    #[test]
    fn repeated_queries_are_deterministic() {
        let problem = line_problem(5, 0, 4);
        let planner = SpaceTimeAStar::default();
        let first = planner
            .find_path(&problem, AgentId(0), &[constraint(2, 2)])
            .unwrap();
        let second = planner
            .find_path(&problem, AgentId(0), &[constraint(2, 2)])
            .unwrap();
        assert_eq!(first, second);
    }
}
