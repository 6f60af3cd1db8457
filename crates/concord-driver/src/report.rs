//! Solve outcomes and the per-run report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use concord_contracts::solution::JointSolution;

/// The terminal outcome of a solve.
///
/// `Infeasible` is a distinct outcome, never an empty solution: all agents
/// exhausted their search without any valid joint solution existing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    /// Every agent terminated holding this (identical) optimal solution.
    Solved { solution: JointSolution },
    /// Every agent terminated with no incumbent: the problem has no
    /// conflict-free joint solution within the search horizon.
    Infeasible,
}

impl Outcome {
    pub fn is_solved(&self) -> bool {
        matches!(self, Outcome::Solved { .. })
    }

    pub fn solution(&self) -> Option<&JointSolution> {
        match self {
            Outcome::Solved { solution } => Some(solution),
            Outcome::Infeasible => None,
        }
    }
}

/// Everything the driver knows about one completed solve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveReport {
    /// Unique id of this run; appears in every log line of the solve.
    pub run_id: Uuid,
    pub outcome: Outcome,
    /// Synchronous rounds executed until global termination.
    pub rounds: u32,
    /// Summed path cost of the solution, when one exists.
    pub cost: Option<usize>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}
