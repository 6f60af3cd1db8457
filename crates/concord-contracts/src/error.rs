//! Error types for the CONCORD solver.
//!
//! All fallible operations across the workspace return `ConcordResult<T>`.
//! Protocol violations are deliberately errors, not logged-and-ignored
//! events: they indicate a bug in the search logic, never a data problem.

use thiserror::Error;

use crate::agent::AgentId;

/// The unified error type for the CONCORD crates.
#[derive(Debug, Error)]
pub enum ConcordError {
    /// The agent table is malformed (duplicate ids, no agents at all).
    #[error("invalid problem: {reason}")]
    InvalidProblem { reason: String },

    /// An agent has no path from its start to its goal even without
    /// constraints; detected during setup, before any search begins.
    #[error("no path exists for {agent} between its start and goal")]
    NoPathForAgent { agent: AgentId },

    /// A message arrived that the protocol forbids in the receiver's
    /// current state (e.g. a path exchange after Init, or a conflict
    /// addressed to the wrong second party).
    #[error("protocol violation: {reason}")]
    ProtocolViolation { reason: String },

    /// Agents finalized with diverging incumbents. Must never happen when
    /// the search logic is correct.
    #[error("consensus violation: {reason}")]
    ConsensusViolation { reason: String },

    /// The driver's round budget ran out before global termination.
    #[error("round limit of {limit} exceeded before termination")]
    RoundLimitExceeded { limit: u32 },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },
}

/// Convenience alias used throughout the CONCORD crates.
pub type ConcordResult<T> = Result<T, ConcordError>;
