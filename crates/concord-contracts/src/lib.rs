//! # concord-contracts
//!
//! Shared types, messages, and problem contracts for CONCORD, a distributed
//! Conflict-Based Search solver for Multi-Agent Path Finding.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate; only data definitions, the problem interface, and the error
//! types.

pub mod agent;
pub mod constraint;
pub mod error;
pub mod message;
pub mod path;
pub mod problem;
pub mod solution;
