//! Movement constraints and detected conflicts.
//!
//! A `Constraint` is a single-agent movement prohibition introduced by one
//! constraint-tree branch. A `Conflict` is a detected collision between two
//! agents in a joint solution. Both are immutable value types: constraints
//! accumulate append-only down the tree, conflicts exist only long enough
//! to be branched on.

use serde::{Deserialize, Serialize};

use crate::agent::AgentId;
use crate::path::Location;

/// Forbids `agent` from occupying `location` at `time_step`.
///
/// Created only for the agent it targets, by the CT node that introduced
/// it, and inherited unchanged by every descendant node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Constraint {
    pub agent: AgentId,
    pub location: Location,
    pub time_step: usize,
}

/// Two agents occupying the same location at the same time step.
///
/// Invariant: the agent that detected the conflict is always `agent1`.
/// This asymmetry is what distributes conflict resolution: each agent
/// branches only on conflicts in which it is the first party, and the
/// second party grows its mirror branch on receipt of a conflict message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Conflict {
    pub location: Location,
    pub time_step: usize,
    pub agent1: AgentId,
    pub agent2: AgentId,
}
