//! Remembered set: the cross-generation reference ledger.
//!
//! Tracks (old-or-permanent source, young target) edges recorded by the
//! write barrier. During a minor collection the targets are treated as
//! additional roots, which is what lets the collector skip rescanning
//! the whole old generation.
//!
//! The set is owned exclusively by the collector and only mutated under
//! the heap lock, so it carries no internal synchronization.

use core_types::ObjectId;
use std::collections::HashSet;

/// Ledger of old-to-young reference edges.
#[derive(Debug, Default)]
pub struct RememberedSet {
    edges: HashSet<(ObjectId, ObjectId)>,
}

impl RememberedSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        RememberedSet {
            edges: HashSet::new(),
        }
    }

    /// Records an old-to-young edge. Duplicates collapse.
    pub fn record(&mut self, from: ObjectId, to: ObjectId) {
        self.edges.insert((from, to));
    }

    /// True if the exact edge is recorded.
    pub fn contains(&self, from: ObjectId, to: ObjectId) -> bool {
        self.edges.contains(&(from, to))
    }

    /// The young-generation targets, deduplicated. These are minor-GC
    /// roots.
    pub fn young_targets(&self) -> Vec<ObjectId> {
        let mut targets: Vec<ObjectId> = self.edges.iter().map(|&(_, to)| to).collect();
        targets.sort();
        targets.dedup();
        targets
    }

    /// Drops every edge whose source is `id` (the source object died).
    pub fn remove_source(&mut self, id: ObjectId) {
        self.edges.retain(|&(from, _)| from != id);
    }

    /// Drops every edge whose target is `id` (the target died or was
    /// promoted, making the edge old-to-old).
    pub fn remove_target(&mut self, id: ObjectId) {
        self.edges.retain(|&(_, to)| to != id);
    }

    /// Drops every edge touching `id`.
    pub fn remove_involving(&mut self, id: ObjectId) {
        self.edges.retain(|&(from, to)| from != id && to != id);
    }

    /// Number of recorded edges.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// True if no edges are recorded.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Drops all edges. Done before a from-scratch rebuild after a major
    /// collection.
    pub fn clear(&mut self) {
        self.edges.clear();
    }
}
