//! Agent identity.
//!
//! Solver agent ids are the dense numeric ids of the MAPF problem's agents.
//! They appear in every constraint, conflict, and message envelope, and
//! their total order is load-bearing: equal-cost incumbents are tie-broken
//! by the id of the agent that first produced them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of one solver agent (and of its row in the joint solution).
///
/// Ids come from the problem input and are fixed for the lifetime of a
/// solve. The `Ord` impl is the one the consensus tie-break relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent{}", self.0)
    }
}
