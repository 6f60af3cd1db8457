//! # concord-search
//!
//! The reference low-level search for CONCORD: a deterministic, bounded
//! space-time A* implementing the `concord-core` `PathPlanner` trait.

pub mod astar;

pub use astar::SpaceTimeAStar;
