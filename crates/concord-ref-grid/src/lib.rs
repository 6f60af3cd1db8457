//! # concord-ref-grid
//!
//! Grid-world reference environments for the CONCORD distributed MAPF
//! solver, plus three end-to-end scenarios run against the round driver:
//!
//! 1. **Opposing Swap**: two agents trade ends of a 3-cell line and must
//!    negotiate a one-step wait. Optimal joint cost 5.
//! 2. **Disjoint Trio**: three agents on separate rows; the root solution
//!    is already conflict-free and terminates without branching.
//! 3. **Shared-Goal Deadlock**: one agent is parked on the other's goal;
//!    both constraint trees exhaust and the run ends as infeasible.
//!
//! All scenarios use the 4-connected [`grid::GridMap`] environment.

pub mod grid;
pub mod scenarios;
