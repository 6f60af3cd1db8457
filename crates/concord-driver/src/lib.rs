//! # concord-driver
//!
//! The reference execution harness for CONCORD: a synchronous round-based
//! driver that delivers messages between solver agents and runs them to
//! global termination, plus the solver configuration and the per-run
//! report.

pub mod config;
pub mod driver;
pub mod report;

pub use config::SolverConfig;
pub use driver::RoundDriver;
pub use report::{Outcome, SolveReport};
