//! Reference scenarios for the CONCORD solver.
//!
//! Each scenario builds a small grid problem, runs the round driver to
//! consensus, prints a short walk-through, and returns the solve report.

pub mod disjoint_trio;
pub mod opposing_swap;
pub mod shared_goal_deadlock;
