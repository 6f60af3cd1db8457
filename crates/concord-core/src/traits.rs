//! The low-level search seam.
//!
//! The constrained shortest-path primitive is a black box to the agent
//! state machine: the agent hands it the problem, its own id, and the
//! accumulated constraints, and gets back either a minimum-cost path or
//! nothing. `concord-search` provides the reference space-time A*
//! implementation; tests substitute scripted mocks.

use concord_contracts::{
    agent::AgentId,
    constraint::Constraint,
    path::Path,
    problem::MapfProblem,
};

/// The constrained single-agent shortest-path primitive.
///
/// Implementations must be deterministic and stateless across calls: the
/// same (problem, agent, constraints) triple always yields the same result.
/// They may be shared between agents, which is why `&self` suffices.
pub trait PathPlanner: Send + Sync {
    /// Minimum-cost path for `agent` from its start to its goal such that
    /// for every constraint targeting `agent`, the path does not occupy
    /// that location at that time step. Waiting in place is a legal move.
    ///
    /// Returns `None` when no satisfying path exists within the planner's
    /// bounded time horizon; the caller prunes that branch.
    fn find_path(
        &self,
        problem: &MapfProblem,
        agent: AgentId,
        constraints: &[Constraint],
    ) -> Option<Path>;
}
