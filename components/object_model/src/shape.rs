//! Shapes (hidden classes) describing object property layout.
//!
//! Objects with the same properties added in the same order share a
//! shape, enabling offset-based property access and inline caching.
//! A shape is immutable after creation: adding or removing a property
//! never mutates a shape in place, it derives another shape through the
//! transition machinery in [`crate::shape_cache::ShapeCache`].

use crate::property::{PropertyAttributes, PropertyInfo};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Monotonically increasing shape identity, issued by the shape cache.
pub type ShapeId = u64;

/// Accesses a shape must see before it reports itself stable and the
/// one-time layout optimization may run.
pub const STABLE_ACCESS_THRESHOLD: u64 = 1024;

/// The single structural step that derived a shape from its parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Transition {
    /// A property was added (or re-described with new attributes).
    Add {
        /// Property name.
        name: String,
        /// Attributes the property was added with.
        attributes: PropertyAttributes,
    },
    /// A property was removed; slots above it shifted down by one.
    Remove {
        /// Property name.
        name: String,
    },
}

/// Property table plus per-row access counts.
///
/// `entries` is kept in scan order: initially slot order, reordered once
/// by the layout optimization so hot rows are checked first. The set of
/// (name, slot, attributes) rows never changes after construction.
struct PropertyTable {
    entries: Vec<PropertyInfo>,
    hits: Vec<AtomicU32>,
}

impl PropertyTable {
    fn new(entries: Vec<PropertyInfo>) -> Self {
        let hits = entries.iter().map(|_| AtomicU32::new(0)).collect();
        PropertyTable { entries, hits }
    }
}

/// Hidden class for runtime objects.
///
/// # Example
///
/// ```
/// use object_model::ShapeCache;
/// use object_model::PropertyAttributes;
/// use object_model::ValueHint;
///
/// let cache = ShapeCache::new();
/// let root = cache.root();
/// let attrs = PropertyAttributes::data_default();
/// let with_x = cache.add_property(&root, "x", attrs, ValueHint::Smi);
/// let with_xy = cache.add_property(&with_x, "y", attrs, ValueHint::Smi);
///
/// assert_eq!(with_xy.get_property_info("x").unwrap().slot, 0);
/// assert_eq!(with_xy.get_property_info("y").unwrap().slot, 1);
/// ```
pub struct Shape {
    id: ShapeId,
    property_count: u32,
    parent: Option<Weak<Shape>>,
    transition: Option<Transition>,
    table: RwLock<PropertyTable>,
    accesses: AtomicU64,
    optimized: AtomicBool,
}

impl Shape {
    /// Creates the root empty shape. Only the shape cache does this.
    pub(crate) fn root(id: ShapeId) -> Self {
        Shape {
            id,
            property_count: 0,
            parent: None,
            transition: None,
            table: RwLock::new(PropertyTable::new(Vec::new())),
            accesses: AtomicU64::new(0),
            optimized: AtomicBool::new(false),
        }
    }

    /// Creates a shape derived from `parent` by `transition`, with the
    /// complete new property table. Only the shape cache does this.
    pub(crate) fn derived(
        id: ShapeId,
        parent: &Arc<Shape>,
        transition: Transition,
        entries: Vec<PropertyInfo>,
    ) -> Self {
        Shape {
            id,
            property_count: entries.len() as u32,
            parent: Some(Arc::downgrade(parent)),
            transition: Some(transition),
            table: RwLock::new(PropertyTable::new(entries)),
            accesses: AtomicU64::new(0),
            optimized: AtomicBool::new(false),
        }
    }

    /// Returns this shape's identity.
    pub fn id(&self) -> ShapeId {
        self.id
    }

    /// Returns the number of properties described by this shape.
    pub fn property_count(&self) -> u32 {
        self.property_count
    }

    /// Returns the parent shape, if it is still alive.
    ///
    /// The back-reference is weak: parents are owned by the shape cache,
    /// not by their children.
    pub fn parent(&self) -> Option<Arc<Shape>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// Returns the transition that produced this shape from its parent.
    pub fn transition(&self) -> Option<Transition> {
        self.transition.clone()
    }

    /// Returns true if the shape describes `name`.
    pub fn has_property(&self, name: &str) -> bool {
        self.table.read().entries.iter().any(|e| e.name == name)
    }

    /// Looks up a property row, recording the access for the layout
    /// optimization. O(1) average: the table is a small vector scanned
    /// front-to-back, with hot rows moved to the front once stable.
    pub fn get_property_info(&self, name: &str) -> Option<PropertyInfo> {
        let found = {
            let table = self.table.read();
            match table.entries.iter().position(|e| e.name == name) {
                Some(pos) => {
                    table.hits[pos].fetch_add(1, Ordering::Relaxed);
                    Some(table.entries[pos].clone())
                }
                None => None,
            }
        };
        let total = self.accesses.fetch_add(1, Ordering::Relaxed) + 1;
        if total >= STABLE_ACCESS_THRESHOLD && !self.optimized.load(Ordering::Relaxed) {
            self.optimize_property_layout();
        }
        found
    }

    /// Looks up a property row without touching the access counters.
    pub fn peek_property_info(&self, name: &str) -> Option<PropertyInfo> {
        let table = self.table.read();
        table.entries.iter().find(|e| e.name == name).cloned()
    }

    /// Returns the property names in slot order.
    pub fn property_names(&self) -> Vec<String> {
        let mut entries = self.entries_snapshot();
        entries.sort_by_key(|e| e.slot);
        entries.into_iter().map(|e| e.name).collect()
    }

    /// Returns a copy of the property table, sorted by slot index.
    ///
    /// Used by the shape cache when deriving child tables; sorted so the
    /// result is independent of any scan reordering.
    pub fn entries_snapshot(&self) -> Vec<PropertyInfo> {
        let mut entries = self.table.read().entries.clone();
        entries.sort_by_key(|e| e.slot);
        entries
    }

    /// Total property accesses observed through this shape.
    pub fn access_count(&self) -> u64 {
        self.accesses.load(Ordering::Relaxed)
    }

    /// True once the shape has seen enough accesses to be considered
    /// stable (hot layouts no longer expected to transition).
    pub fn is_stable(&self) -> bool {
        self.accesses.load(Ordering::Relaxed) >= STABLE_ACCESS_THRESHOLD
    }

    /// Reorders the scan order so the most-accessed rows come first.
    ///
    /// Slot indices are untouched; only the linear-scan order changes.
    /// Runs at most once per shape; returns true if the reorder happened
    /// on this call.
    pub fn optimize_property_layout(&self) -> bool {
        if self.optimized.swap(true, Ordering::SeqCst) {
            return false;
        }
        let mut table = self.table.write();
        let counts: Vec<u32> = table
            .hits
            .iter()
            .map(|h| h.load(Ordering::Relaxed))
            .collect();
        let mut order: Vec<usize> = (0..table.entries.len()).collect();
        order.sort_by_key(|&i| std::cmp::Reverse(counts[i]));

        let entries = order
            .iter()
            .map(|&i| table.entries[i].clone())
            .collect::<Vec<_>>();
        let hits = order
            .iter()
            .map(|&i| AtomicU32::new(counts[i]))
            .collect::<Vec<_>>();
        table.entries = entries;
        table.hits = hits;
        true
    }

    /// True if the one-time layout optimization has already run.
    pub fn is_optimized(&self) -> bool {
        self.optimized.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shape")
            .field("id", &self.id)
            .field("property_count", &self.property_count)
            .field("transition", &self.transition)
            .finish()
    }
}
