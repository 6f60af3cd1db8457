//! The MAPF problem interface.
//!
//! The environment is an external collaborator: CONCORD only sees an
//! abstract graph of opaque locations plus per-agent start and goal
//! locations. The planner supplies the "wait in place" self-transition
//! itself, so graphs only enumerate real edges.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::agent::AgentId;
use crate::error::{ConcordError, ConcordResult};
use crate::path::Location;

/// The shared environment graph.
///
/// Implementations must be deterministic: `neighbors` returns the same
/// list, in the same order, for the same location on every call. Edges are
/// symmetric; the heuristic search relies on that.
pub trait SharedGraph: Send + Sync {
    /// Locations reachable from `at` in one move, excluding `at` itself.
    fn neighbors(&self, at: Location) -> Vec<Location>;
}

/// One agent's slice of the problem: where it starts and where it must end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentSpec {
    pub id: AgentId,
    pub start: Location,
    pub goal: Location,
}

/// An immutable MAPF problem instance: a shared graph plus the agent table.
///
/// Construction validates the agent table; per-agent reachability is only
/// checked once each agent plans its first path during setup.
pub struct MapfProblem {
    graph: Arc<dyn SharedGraph>,
    agents: BTreeMap<AgentId, AgentSpec>,
}

impl MapfProblem {
    /// Build a problem, rejecting duplicate agent ids and an empty agent
    /// set before any search begins.
    pub fn new(graph: Arc<dyn SharedGraph>, agents: Vec<AgentSpec>) -> ConcordResult<Self> {
        if agents.is_empty() {
            return Err(ConcordError::InvalidProblem {
                reason: "a MAPF problem needs at least one agent".to_string(),
            });
        }

        let mut table = BTreeMap::new();
        for spec in agents {
            if table.insert(spec.id, spec).is_some() {
                return Err(ConcordError::InvalidProblem {
                    reason: format!("duplicate agent id {}", spec.id),
                });
            }
        }

        Ok(Self { graph, agents: table })
    }

    pub fn graph(&self) -> &dyn SharedGraph {
        self.graph.as_ref()
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Agent ids in ascending order.
    pub fn agent_ids(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.agents.keys().copied()
    }

    pub fn spec(&self, agent: AgentId) -> Option<&AgentSpec> {
        self.agents.get(&agent)
    }
}

impl fmt::Debug for MapfProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapfProblem")
            .field("agents", &self.agents)
            .finish_non_exhaustive()
    }
}
