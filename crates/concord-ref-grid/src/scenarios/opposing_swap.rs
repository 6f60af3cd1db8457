//! Scenario 1: Opposing Swap
//!
//! Two agents on a 3-cell line `A-B-C` trade ends: agent 0 goes A→C while
//! agent 1 goes C→A. Their direct shortest paths collide on B at t=1, so
//! the distributed search must make one agent wait a step at an endpoint.
//! The optimal joint cost is 2 + 3 = 5, and both agents must finalize with
//! the same conflict-free solution.

use std::sync::Arc;

use concord_contracts::{
    agent::AgentId,
    error::{ConcordError, ConcordResult},
    problem::{AgentSpec, MapfProblem},
};
use concord_driver::{RoundDriver, SolveReport, SolverConfig};

use crate::grid::GridMap;

/// Build the 3-cell line problem.
pub fn build_problem() -> ConcordResult<Arc<MapfProblem>> {
    let line = GridMap::new(3, 1);
    let a = line.location(0, 0);
    let c = line.location(0, 2);

    Ok(Arc::new(MapfProblem::new(
        Arc::new(line),
        vec![
            AgentSpec { id: AgentId(0), start: a, goal: c },
            AgentSpec { id: AgentId(1), start: c, goal: a },
        ],
    )?))
}

/// Run Scenario 1: Opposing Swap.
///
/// Solves the instance, prints both final paths, and checks the expected
/// optimal cost of 5.
pub fn run_scenario() -> ConcordResult<SolveReport> {
    println!("=== Scenario 1: Opposing Swap ===");
    println!();
    println!("  Line A-B-C; agent 0: A -> C, agent 1: C -> A.");
    println!("  Direct paths collide on B at t=1.");
    println!();

    let report = RoundDriver::new(SolverConfig::default()).solve(build_problem()?)?;

    let solution = report.outcome.solution().ok_or_else(|| {
        ConcordError::ConsensusViolation {
            reason: "opposing swap is solvable but terminated infeasible".to_string(),
        }
    })?;

    for (agent, path) in solution.rows() {
        let cells: Vec<String> = path.steps().map(|l| l.to_string()).collect();
        println!("  {}: {} (cost {})", agent, cells.join(" -> "), path.cost());
    }
    println!();
    println!("  Joint cost:     {} (optimal: 5)", solution.cost());
    println!("  Conflict-free:  {}", solution.is_valid());
    println!("  Rounds:         {}", report.rounds);
    println!();
    println!("  Scenario 1 complete.");
    println!();

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_reaches_the_optimal_cost() {
        let report = RoundDriver::new(SolverConfig::default())
            .solve(build_problem().unwrap())
            .unwrap();
        let solution = report.outcome.solution().unwrap();
        assert!(solution.is_valid());
        assert_eq!(solution.cost(), 5);
    }
}
