//! Scenario 3: Shared-Goal Deadlock
//!
//! A two-cell line where agent 1 is already parked on its goal and agent 0
//! needs that same cell. Every constrained alternative collides again
//! within the planning horizon, so both agents exhaust their constraint
//! trees. The run must end with consensus on infeasibility, not with a
//! hang or a bogus solution.

use std::sync::Arc;

use concord_contracts::{
    agent::AgentId,
    error::ConcordResult,
    problem::{AgentSpec, MapfProblem},
};
use concord_driver::{Outcome, RoundDriver, SolveReport, SolverConfig};

use crate::grid::GridMap;

/// Build the two-cell instance with a contested goal cell.
pub fn build_problem() -> ConcordResult<Arc<MapfProblem>> {
    let line = GridMap::new(2, 1);
    let a = line.location(0, 0);
    let b = line.location(0, 1);

    Ok(Arc::new(MapfProblem::new(
        Arc::new(line),
        vec![
            AgentSpec { id: AgentId(0), start: a, goal: b },
            AgentSpec { id: AgentId(1), start: b, goal: b },
        ],
    )?))
}

/// Run Scenario 3: Shared-Goal Deadlock.
pub fn run_scenario() -> ConcordResult<SolveReport> {
    println!("=== Scenario 3: Shared-Goal Deadlock ===");
    println!();
    println!("  Line A-B; agent 0: A -> B, agent 1 parked on B with goal B.");
    println!("  No joint plan clears B within the planning horizon.");
    println!();

    let report = RoundDriver::new(SolverConfig::default()).solve(build_problem()?)?;

    match &report.outcome {
        Outcome::Infeasible => {
            println!("  Outcome:  infeasible (as expected)");
            println!("  Rounds:   {} until both trees exhausted", report.rounds);
        }
        Outcome::Solved { solution } => {
            println!("  Outcome:  UNEXPECTED solution with cost {}", solution.cost());
        }
    }
    println!();
    println!("  Scenario 3 complete.");
    println!();

    Ok(report)
}
