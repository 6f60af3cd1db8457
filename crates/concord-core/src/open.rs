//! The OPEN set: the frontier of unexpanded constraint-tree nodes.
//!
//! Best-first order: lowest joint solution cost first, ties broken by push
//! order. The tie-break makes expansion fully deterministic, which is what
//! lets two runs of the same problem produce byte-identical output.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use concord_contracts::solution::CtNode;

struct OpenEntry {
    node: CtNode,
    cost: usize,
    seq: u64,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost && self.seq == other.seq
    }
}

impl Eq for OpenEntry {}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the BinaryHeap pops the cheapest, oldest entry first.
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Priority collection of CT nodes, cheapest solution first.
#[derive(Default)]
pub struct OpenList {
    heap: BinaryHeap<OpenEntry>,
    next_seq: u64,
}

impl OpenList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: CtNode) {
        let entry = OpenEntry {
            cost: node.cost(),
            seq: self.next_seq,
            node,
        };
        self.next_seq += 1;
        self.heap.push(entry);
    }

    /// Remove and return the lowest-cost node, oldest first on ties.
    pub fn pop(&mut self) -> Option<CtNode> {
        self.heap.pop().map(|entry| entry.node)
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }
}
