//! Joint solutions, incumbents, and constraint-tree nodes.
//!
//! A `JointSolution` maps every agent to its path. An `Incumbent` is a
//! valid joint solution tagged with the agent that first produced it, which
//! gives equal-cost candidates a total order. A `CtNode` pairs a joint
//! solution with the constraints that produced it; nodes are immutable
//! once created.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::agent::AgentId;
use crate::constraint::Constraint;
use crate::path::Path;

/// One path per agent. Keys are unique by construction of `BTreeMap`;
/// iteration order is ascending agent id, which keeps every derived
/// computation deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JointSolution {
    paths: BTreeMap<AgentId, Path>,
}

impl JointSolution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `agent`'s row, replacing any previous path.
    pub fn set_path(&mut self, agent: AgentId, path: Path) {
        self.paths.insert(agent, path);
    }

    pub fn path(&self, agent: AgentId) -> Option<&Path> {
        self.paths.get(&agent)
    }

    /// Number of agents that currently have a path.
    pub fn agent_count(&self) -> usize {
        self.paths.len()
    }

    /// Agents with a path, in ascending id order.
    pub fn agent_ids(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.paths.keys().copied()
    }

    /// Rows in ascending agent-id order.
    pub fn rows(&self) -> impl Iterator<Item = (AgentId, &Path)> + '_ {
        self.paths.iter().map(|(id, p)| (*id, p))
    }

    /// Summed path cost across all agents.
    pub fn cost(&self) -> usize {
        self.paths.values().map(Path::cost).sum()
    }

    /// True when no pair of agents occupies the same location at the same
    /// time step, with every agent holding its goal after arrival.
    pub fn is_valid(&self) -> bool {
        let rows: Vec<(AgentId, &Path)> = self.rows().collect();
        for (i, (_, a)) in rows.iter().enumerate() {
            for (_, b) in rows.iter().skip(i + 1) {
                let horizon = a.len().max(b.len());
                for t in 0..horizon {
                    if a.location_at(t) == b.location_at(t) {
                        return false;
                    }
                }
            }
        }
        true
    }
}

/// A candidate optimum: a valid joint solution tagged with the agent that
/// first produced it.
///
/// Two incumbents order by `(cost, owner)`. An agent adopts a candidate
/// only when it orders strictly below the local incumbent, so re-declaring
/// the same incumbent is always a no-op and every agent converges on the
/// solution of the lowest-id agent among the cost-optimal finders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incumbent {
    pub owner: AgentId,
    pub solution: JointSolution,
}

impl Incumbent {
    pub fn new(owner: AgentId, solution: JointSolution) -> Self {
        Self { owner, solution }
    }

    pub fn cost(&self) -> usize {
        self.solution.cost()
    }

    /// True when `self` should replace `other` as the incumbent.
    pub fn orders_below(&self, other: &Incumbent) -> bool {
        (self.cost(), self.owner) < (other.cost(), other.owner)
    }
}

/// A node of the constraint tree: a joint solution plus the accumulated
/// constraints that produced it.
///
/// Immutable once created. A child node is derived by appending exactly one
/// constraint and replanning exactly one agent's path; every other row is
/// carried over from the parent unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CtNode {
    pub solution: JointSolution,
    pub constraints: Vec<Constraint>,
}

impl CtNode {
    /// The root node: the exchanged unconstrained paths, no constraints.
    pub fn root(solution: JointSolution) -> Self {
        Self { solution, constraints: Vec::new() }
    }

    pub fn cost(&self) -> usize {
        self.solution.cost()
    }
}
