//! Process-wide shape cache: transition table and canonical layouts.
//!
//! The cache is the owner of every shape. Children are held strongly in
//! the transition table, keyed by (parent shape, transition); shapes hold
//! only weak back-references to their parents, so the graph cannot form
//! ownership cycles. Structural sharing falls out of the table: two
//! objects built through the same sequence of transitions converge on the
//! same shape instance, which is what keeps inline caches valid across
//! object instances.
//!
//! The cache is explicit state: construct it, wrap it in an `Arc`, and
//! pass the handle to whoever needs it. There is no ambient singleton.

use crate::property::{PropertyAttributes, PropertyInfo, ValueHint};
use crate::shape::{Shape, ShapeId, Transition};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TransitionKey {
    parent: ShapeId,
    transition: Transition,
}

/// Global cache of shapes: the canonical empty root, the transition
/// table, and canonical shapes for well-known layouts.
///
/// Shape pointers obtained from the cache are immutable and readable
/// without synchronization; only the tables themselves are locked.
pub struct ShapeCache {
    root: Arc<Shape>,
    transitions: Mutex<HashMap<TransitionKey, Arc<Shape>>>,
    canonical: Mutex<HashMap<Vec<String>, Arc<Shape>>>,
    next_id: AtomicU64,
}

impl ShapeCache {
    /// Creates a cache with a fresh root empty shape.
    pub fn new() -> Self {
        ShapeCache {
            root: Arc::new(Shape::root(0)),
            transitions: Mutex::new(HashMap::new()),
            canonical: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Returns the canonical empty shape.
    ///
    /// Idempotent: the same instance for the lifetime of the cache.
    pub fn root(&self) -> Arc<Shape> {
        Arc::clone(&self.root)
    }

    fn issue_id(&self) -> ShapeId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Derives the shape that has `name` added to `shape` with the given
    /// attributes.
    ///
    /// If the transition already exists it is returned as-is (structural
    /// sharing). Adding a property the shape already has with identical
    /// attributes is a no-op returning the same shape; with different
    /// attributes it derives a distinct child that keeps the slot index
    /// but carries the new attributes. This never fails.
    pub fn add_property(
        &self,
        shape: &Arc<Shape>,
        name: &str,
        attributes: PropertyAttributes,
        hint: ValueHint,
    ) -> Arc<Shape> {
        let existing = shape.peek_property_info(name);
        if let Some(info) = &existing {
            if info.attributes == attributes {
                return Arc::clone(shape);
            }
        }

        let transition = Transition::Add {
            name: name.to_string(),
            attributes,
        };
        let key = TransitionKey {
            parent: shape.id(),
            transition: transition.clone(),
        };

        let mut transitions = self.transitions.lock();
        if let Some(child) = transitions.get(&key) {
            return Arc::clone(child);
        }

        let mut entries = shape.entries_snapshot();
        match existing {
            Some(info) => {
                // Re-description: same slot, new attributes
                if let Some(row) = entries.iter_mut().find(|e| e.slot == info.slot) {
                    row.attributes = attributes;
                    row.hint = hint;
                }
            }
            None => {
                entries.push(PropertyInfo {
                    name: name.to_string(),
                    slot: shape.property_count(),
                    attributes,
                    hint,
                });
            }
        }

        let child = Arc::new(Shape::derived(self.issue_id(), shape, transition, entries));
        transitions.insert(key, Arc::clone(&child));
        child
    }

    /// Derives the shape that has `name` removed from `shape`.
    ///
    /// The child's table is rebuilt with renumbered slot offsets: every
    /// slot above the removed one shifts down by one. This is the one
    /// operation that invalidates slot offsets; inline caches referencing
    /// the old shape miss by construction since the shape id differs.
    /// Removing an absent property is a no-op returning the same shape.
    pub fn remove_property(&self, shape: &Arc<Shape>, name: &str) -> Arc<Shape> {
        let removed = match shape.peek_property_info(name) {
            Some(info) => info,
            None => return Arc::clone(shape),
        };

        let transition = Transition::Remove {
            name: name.to_string(),
        };
        let key = TransitionKey {
            parent: shape.id(),
            transition: transition.clone(),
        };

        let mut transitions = self.transitions.lock();
        if let Some(child) = transitions.get(&key) {
            return Arc::clone(child);
        }

        let mut entries = Vec::with_capacity(shape.property_count() as usize - 1);
        for mut entry in shape.entries_snapshot() {
            if entry.name == name {
                continue;
            }
            if entry.slot > removed.slot {
                entry.slot -= 1;
            }
            entries.push(entry);
        }

        let child = Arc::new(Shape::derived(self.issue_id(), shape, transition, entries));
        transitions.insert(key, Arc::clone(&child));
        child
    }

    /// Builds or looks up the canonical shape for a known property-name
    /// list, with default data attributes. Used for well-known object
    /// kinds so independently created instances share a layout.
    pub fn get_or_create_class(&self, names: &[&str]) -> Arc<Shape> {
        let key: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        if let Some(shape) = self.canonical.lock().get(&key) {
            return Arc::clone(shape);
        }

        let mut shape = self.root();
        for name in names {
            shape = self.add_property(
                &shape,
                name,
                PropertyAttributes::data_default(),
                ValueHint::Any,
            );
        }

        self.canonical.lock().insert(key, Arc::clone(&shape));
        shape
    }

    /// Canonical shape for array objects: a hidden, non-configurable
    /// `length` data property at slot 0.
    pub fn array_shape(&self) -> Arc<Shape> {
        self.add_property(
            &self.root(),
            "length",
            PropertyAttributes::hidden_data(),
            ValueHint::Smi,
        )
    }

    /// Canonical shape for function objects: `name`, `length`, and
    /// `prototype` at slots 0..3.
    pub fn function_shape(&self) -> Arc<Shape> {
        let attrs = PropertyAttributes::Data {
            writable: false,
            enumerable: false,
            configurable: true,
        };
        let shape = self.add_property(&self.root(), "name", attrs, ValueHint::String);
        let shape = self.add_property(&shape, "length", attrs, ValueHint::Smi);
        self.add_property(
            &shape,
            "prototype",
            PropertyAttributes::hidden_data(),
            ValueHint::Object,
        )
    }

    /// Drops cached shapes that have no live instances (the cache holds
    /// the only strong reference). Returns the number of entries evicted.
    ///
    /// Mitigation for pathological code that churns through transition
    /// chains: the table may grow without bound, so callers evict
    /// periodically.
    pub fn evict_unused(&self) -> usize {
        let mut evicted = 0;

        let mut canonical = self.canonical.lock();
        canonical.retain(|_, shape| {
            if Arc::strong_count(shape) > 1 {
                true
            } else {
                evicted += 1;
                false
            }
        });
        drop(canonical);

        let mut transitions = self.transitions.lock();
        transitions.retain(|_, shape| {
            if Arc::strong_count(shape) > 1 {
                true
            } else {
                evicted += 1;
                false
            }
        });

        evicted
    }

    /// Number of entries in the transition table.
    pub fn transition_count(&self) -> usize {
        self.transitions.lock().len()
    }

    /// Number of cached canonical layouts.
    pub fn canonical_count(&self) -> usize {
        self.canonical.lock().len()
    }
}

impl Default for ShapeCache {
    fn default() -> Self {
        Self::new()
    }
}
