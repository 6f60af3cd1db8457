//! Four-connected grid maps.
//!
//! The reference environment: a width×height grid where agents move
//! between edge-adjacent open cells. A 1×N grid doubles as a line graph.
//! Location ids are `row * width + col`, so a `GridMap` and its callers
//! agree on ids without sharing state.

use std::collections::HashSet;

use concord_contracts::{
    path::Location,
    problem::SharedGraph,
};

/// A rectangular grid with optionally blocked cells.
#[derive(Debug, Clone)]
pub struct GridMap {
    width: u32,
    height: u32,
    blocked: HashSet<(u32, u32)>,
}

impl GridMap {
    /// An open grid with no blocked cells.
    pub fn new(width: u32, height: u32) -> Self {
        debug_assert!(width > 0 && height > 0);
        Self {
            width,
            height,
            blocked: HashSet::new(),
        }
    }

    /// Mark a cell impassable.
    pub fn block(mut self, row: u32, col: u32) -> Self {
        self.blocked.insert((row, col));
        self
    }

    /// The location id of the cell at (row, col).
    pub fn location(&self, row: u32, col: u32) -> Location {
        debug_assert!(row < self.height && col < self.width);
        Location(row * self.width + col)
    }

    fn cell(&self, at: Location) -> (u32, u32) {
        (at.0 / self.width, at.0 % self.width)
    }

    fn is_open(&self, row: u32, col: u32) -> bool {
        row < self.height && col < self.width && !self.blocked.contains(&(row, col))
    }
}

impl SharedGraph for GridMap {
    fn neighbors(&self, at: Location) -> Vec<Location> {
        let (row, col) = self.cell(at);
        let mut out = Vec::with_capacity(4);

        // Fixed order (up, left, right, down) keeps neighbor enumeration,
        // and with it the whole solve, deterministic.
        if row > 0 && self.is_open(row - 1, col) {
            out.push(self.location(row - 1, col));
        }
        if col > 0 && self.is_open(row, col - 1) {
            out.push(self.location(row, col - 1));
        }
        if self.is_open(row, col + 1) {
            out.push(self.location(row, col + 1));
        }
        if self.is_open(row + 1, col) {
            out.push(self.location(row + 1, col));
        }
        out
    }
}
