//! # concord-core
//!
//! The distributed Conflict-Based Search core: the per-agent constraint
//! tree search, the conflict-resolution protocol, and the termination
//! consensus.
//!
//! This crate provides:
//! - The `PathPlanner` trait (the low-level constrained shortest-path seam)
//! - The deterministic cost-ordered `OpenList`
//! - The `SolverAgent` state machine the driver runs
//!
//! ## Usage
//!
//! ```rust,ignore
//! use concord_core::{SolverAgent, traits::PathPlanner};
//! ```

pub mod agent;
pub mod open;
pub mod traits;

pub use agent::{AgentLifecycle, SolverAgent};
pub use open::OpenList;
