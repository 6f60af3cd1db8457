//! Locations and single-agent paths.
//!
//! A `Location` is an opaque vertex id in the shared graph. A `Path` is the
//! time-indexed sequence of locations one agent occupies, starting at time
//! step 0. After its last step an agent is considered to hold its final
//! location forever, which is what `location_at` encodes and what every
//! conflict check relies on.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque vertex identifier in the shared graph.
///
/// The contracts crate never interprets the id; the graph implementation
/// decides what it means (a grid cell, a waypoint, a road-network node).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location(pub u32);

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// One agent's path through the graph, indexed by time step.
///
/// Invariant: a path is never empty; index 0 is the agent's start location
/// and the last index is its arrival at the goal. The path cost is the
/// arrival time, i.e. the number of moves taken.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path {
    steps: Vec<Location>,
}

impl Path {
    /// Build a path from its time-indexed steps.
    ///
    /// `steps` must be non-empty; a path always contains at least the
    /// start location at time step 0.
    pub fn new(steps: Vec<Location>) -> Self {
        debug_assert!(!steps.is_empty(), "a path always holds at least its start location");
        Self { steps }
    }

    /// The path cost: arrival time at the goal (number of moves).
    pub fn cost(&self) -> usize {
        self.steps.len() - 1
    }

    /// Number of time-indexed steps, including step 0.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// A path is never empty, so this always returns false. Provided so
    /// `len` does not trip the usual lint pairing.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The location occupied at `time_step`, holding the final location
    /// for every step past arrival (agents wait at their goal).
    pub fn location_at(&self, time_step: usize) -> Location {
        let idx = time_step.min(self.steps.len() - 1);
        self.steps[idx]
    }

    /// The start location (time step 0).
    pub fn start(&self) -> Location {
        self.steps[0]
    }

    /// The final location (the goal, for a complete path).
    pub fn end(&self) -> Location {
        self.steps[self.steps.len() - 1]
    }

    /// Iterate over the steps in time order.
    pub fn steps(&self) -> impl Iterator<Item = Location> + '_ {
        self.steps.iter().copied()
    }
}
