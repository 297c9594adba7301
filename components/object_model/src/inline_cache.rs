//! Inline caching for property access optimization.
//!
//! Each call site owns a [`PropertyCache`] that memoizes successful
//! shape-table lookups as (shape id, slot offset) pairs. The state
//! machine never regresses:
//!
//! ```text
//! Uninitialized -> Monomorphic -> Polymorphic -> Megamorphic
//! ```
//!
//! Megamorphic is terminal: the site falls back to the full shape-table
//! lookup on every access and no further caching is attempted. This caps
//! the per-site cost even under worst-case shape diversity.

use crate::property::{PropertyKey, PropertyValue, SlotKind};
use crate::shape::ShapeId;
use crate::store::ObjectStore;
use arrayvec::ArrayVec;
use core_types::{ObjectId, Value};

/// Hard upper bound on polymorphic cache entries per call site.
pub const MAX_POLYMORPHIC_ENTRIES: usize = 4;

/// One memoized lookup: shape identity, slot offset, descriptor kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheEntry {
    /// Shape identity the lookup was made against.
    pub shape: ShapeId,
    /// Slot offset valid for that shape.
    pub slot: u32,
    /// Whether the slot holds a data value or an accessor pair.
    pub kind: SlotKind,
}

/// Inline cache state for one call site.
#[derive(Debug, Clone, PartialEq)]
pub enum InlineCache {
    /// No lookup observed yet.
    Uninitialized,
    /// Single shape cached (the common case).
    Monomorphic(CacheEntry),
    /// Bounded set of shapes cached; scanned linearly.
    Polymorphic {
        /// Cached (shape, slot) pairs, oldest first.
        entries: ArrayVec<CacheEntry, MAX_POLYMORPHIC_ENTRIES>,
    },
    /// Too many shapes seen; terminal fallback to full lookup.
    Megamorphic,
}

impl InlineCache {
    /// Creates an uninitialized cache.
    pub fn new() -> Self {
        InlineCache::Uninitialized
    }

    /// Looks up the cached entry for `shape`, if any.
    pub fn lookup(&self, shape: ShapeId) -> Option<CacheEntry> {
        match self {
            InlineCache::Uninitialized | InlineCache::Megamorphic => None,
            InlineCache::Monomorphic(entry) => (entry.shape == shape).then_some(*entry),
            InlineCache::Polymorphic { entries } => {
                entries.iter().find(|e| e.shape == shape).copied()
            }
        }
    }

    /// Records a successful lookup, advancing the state machine.
    ///
    /// `limit` bounds the polymorphic entry count (clamped to
    /// [`MAX_POLYMORPHIC_ENTRIES`]); exceeding it discards all entries
    /// and goes megamorphic.
    pub fn update(&mut self, entry: CacheEntry, limit: usize) {
        let limit = limit.clamp(1, MAX_POLYMORPHIC_ENTRIES);
        match self {
            InlineCache::Uninitialized => {
                *self = InlineCache::Monomorphic(entry);
            }
            InlineCache::Monomorphic(cached) => {
                if cached.shape == entry.shape {
                    *cached = entry;
                } else if limit < 2 {
                    *self = InlineCache::Megamorphic;
                } else {
                    let mut entries = ArrayVec::new();
                    entries.push(*cached);
                    entries.push(entry);
                    *self = InlineCache::Polymorphic { entries };
                }
            }
            InlineCache::Polymorphic { entries } => {
                if let Some(cached) = entries.iter_mut().find(|e| e.shape == entry.shape) {
                    *cached = entry;
                } else if entries.len() < limit {
                    entries.push(entry);
                } else {
                    *self = InlineCache::Megamorphic;
                }
            }
            InlineCache::Megamorphic => {}
        }
    }

    /// True once the terminal state is reached.
    pub fn is_megamorphic(&self) -> bool {
        matches!(self, InlineCache::Megamorphic)
    }

    /// Number of cached (shape, slot) entries.
    pub fn entry_count(&self) -> usize {
        match self {
            InlineCache::Uninitialized | InlineCache::Megamorphic => 0,
            InlineCache::Monomorphic(_) => 1,
            InlineCache::Polymorphic { entries } => entries.len(),
        }
    }

    /// State name for diagnostics.
    pub fn state_name(&self) -> &'static str {
        match self {
            InlineCache::Uninitialized => "uninitialized",
            InlineCache::Monomorphic(_) => "monomorphic",
            InlineCache::Polymorphic { .. } => "polymorphic",
            InlineCache::Megamorphic => "megamorphic",
        }
    }
}

impl Default for InlineCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Hit/miss counters for one call site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that fell back to the full shape-table walk.
    pub misses: u64,
}

impl CacheStats {
    /// Hit ratio in 0.0 ..= 1.0; zero when nothing was observed.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// A property-access call site: inline cache plus statistics.
///
/// This is the entry point the bytecode/JIT property opcodes consume to
/// avoid full lookups on hot paths.
#[derive(Debug, Clone)]
pub struct PropertyCache {
    cache: InlineCache,
    stats: CacheStats,
    limit: usize,
}

impl Default for PropertyCache {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyCache {
    /// Creates a call site with the default polymorphic bound.
    pub fn new() -> Self {
        Self::with_limit(MAX_POLYMORPHIC_ENTRIES)
    }

    /// Creates a call site with a custom polymorphic bound
    /// (clamped to 1 ..= [`MAX_POLYMORPHIC_ENTRIES`]).
    pub fn with_limit(limit: usize) -> Self {
        PropertyCache {
            cache: InlineCache::new(),
            stats: CacheStats::default(),
            limit: limit.clamp(1, MAX_POLYMORPHIC_ENTRIES),
        }
    }

    /// Returns the cache state.
    pub fn cache(&self) -> &InlineCache {
        &self.cache
    }

    /// Returns the hit/miss counters.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Pure cache probe: answers only on a shape match, counting a miss
    /// otherwise. The caller runs the slow path on `None` and then calls
    /// [`PropertyCache::cache_property`].
    ///
    /// A site caches one property name; the probe is keyed on the shape
    /// alone, so the name is not consulted here.
    pub fn try_get_property(
        &mut self,
        store: &ObjectStore,
        id: ObjectId,
        _name: &str,
    ) -> Option<Value> {
        let object = store.get(id)?;
        let entry = match self.cache.lookup(object.shape().id()) {
            Some(entry) => entry,
            None => {
                self.stats.misses += 1;
                return None;
            }
        };
        match object.slot(entry.slot) {
            Some(PropertyValue::Data(value)) => {
                self.stats.hits += 1;
                Some(value.clone())
            }
            Some(PropertyValue::Accessor { getter, .. }) => {
                self.stats.hits += 1;
                Some(getter.clone())
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Records the slow-path result for the current shape of `id`.
    ///
    /// Only own properties are cached; prototype-chain hits stay
    /// uncached since the receiver's shape does not witness them. A
    /// megamorphic site ignores the call.
    pub fn cache_property(&mut self, store: &ObjectStore, id: ObjectId, name: &str) {
        if self.cache.is_megamorphic() {
            return;
        }
        let object = match store.get(id) {
            Some(object) => object,
            None => return,
        };
        if let Some(info) = object.shape().peek_property_info(name) {
            let kind = if info.attributes.is_accessor() {
                SlotKind::Accessor
            } else {
                SlotKind::Data
            };
            self.cache.update(
                CacheEntry {
                    shape: object.shape().id(),
                    slot: info.slot,
                    kind,
                },
                self.limit,
            );
        }
    }

    /// Cached property read with slow-path fallback.
    ///
    /// Equivalent to `try_get_property` followed by the full lookup and
    /// a cache fill on miss. Always resolves (undefined on absence).
    pub fn get_property(&mut self, store: &ObjectStore, id: ObjectId, name: &str) -> Value {
        if let Some(value) = self.try_get_property(store, id, name) {
            return value;
        }
        let value = store.get_property(id, &PropertyKey::name(name));
        self.cache_property(store, id, name);
        value
    }

    /// Cached property write.
    ///
    /// Mirrors the lookup to refresh/verify cache validity; in the
    /// megamorphic state it performs the generic set directly with no
    /// caching attempted.
    pub fn store_property(
        &mut self,
        store: &mut ObjectStore,
        id: ObjectId,
        name: &str,
        value: Value,
    ) -> bool {
        let key = PropertyKey::name(name);
        let attrs = crate::property::PropertyAttributes::data_default();
        if self.cache.is_megamorphic() {
            return store.set_property(id, &key, value, attrs);
        }

        let hit = store
            .get(id)
            .map(|object| self.cache.lookup(object.shape().id()).is_some())
            .unwrap_or(false);
        if hit {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }

        let stored = store.set_property(id, &key, value, attrs);
        if stored {
            self.cache_property(store, id, name);
        }
        stored
    }
}
