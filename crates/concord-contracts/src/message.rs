//! The typed message protocol between solver agents.
//!
//! Four message kinds carry the whole distributed search: initial path
//! exchange, incumbent declaration, conflict propagation, and open-set
//! exhaustion. Delivery is abstract; any serialization a real transport
//! chooses must preserve these field sets, which is why everything here
//! derives serde.

use serde::{Deserialize, Serialize};

use crate::agent::AgentId;
use crate::constraint::Conflict;
use crate::path::Path;
use crate::solution::{CtNode, Incumbent};

/// A message addressed from one agent to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub from: AgentId,
    pub to: AgentId,
    pub payload: Message,
}

impl Envelope {
    pub fn new(from: AgentId, to: AgentId, payload: Message) -> Self {
        Self { from, to, payload }
    }
}

/// The payload of one inter-agent message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    /// Sent once per peer during setup: the sender's unconstrained shortest
    /// path, a row of everyone's root solution. Only legal before the
    /// receiver leaves its Init state.
    PathForAgent { path: Path },

    /// The sender found (or adopted) a new best valid joint solution.
    DeclareSolution { incumbent: Incumbent },

    /// The sender detected `conflict` in `ct_node` with itself as the first
    /// party. The receiver must be `conflict.agent2`; it grows the mirror
    /// branch by constraining itself and replanning its own path.
    DeclareConflict { ct_node: CtNode, conflict: Conflict },

    /// The sender has exhausted its local OPEN set. Carries the sender's
    /// incumbent, if any, for the termination consensus, plus the number of
    /// conflict messages the sender has received from the addressee so
    /// far. The receiver compares that count against the conflicts it has
    /// sent: a report that does not account for all of them was produced
    /// before the last conflict arrived and must not count as exhaustion.
    DeclareEmptyOpen {
        incumbent: Option<Incumbent>,
        conflicts_seen: u64,
    },
}

impl Message {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::PathForAgent { .. } => "path_for_agent",
            Message::DeclareSolution { .. } => "declare_solution",
            Message::DeclareConflict { .. } => "declare_conflict",
            Message::DeclareEmptyOpen { .. } => "declare_empty_open",
        }
    }
}
