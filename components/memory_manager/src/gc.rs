//! Generational garbage collector.
//!
//! Objects move one way through the generations:
//!
//! ```text
//! Young --promotion--> Old        Permanent (never collected)
//! ```
//!
//! Minor collections mark and sweep only the young generation, using the
//! remembered set to stand in for old-to-young references. Major
//! collections mark and sweep young and old together, with permanent
//! objects as an additional root source, and rebuild the remembered set
//! from scratch.

use crate::config::{CollectionMode, GcConfig};
use crate::region::{align_size, MemoryPool};
use crate::remembered_set::RememberedSet;
use crate::stats::GcStats;
use core_types::{MemoryError, ObjectId};
use object_model::ObjectStore;
use std::collections::{HashMap, VecDeque};
use std::time::Instant;
use tracing::{debug, error};

/// GC classification of an object by expected lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Generation {
    /// Newly allocated objects; collected by minor collections.
    Young,
    /// Minor-collection survivors; collected by major collections.
    Old,
    /// Engine built-ins; never collected, only used as a root source.
    Permanent,
}

impl Generation {
    /// Region name for diagnostics and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Generation::Young => "young",
            Generation::Old => "old",
            Generation::Permanent => "permanent",
        }
    }
}

/// Per-object GC metadata, created at registration and destroyed at
/// sweep. Mutated only by the collector.
#[derive(Debug, Clone)]
pub struct GcObjectHeader {
    /// Owning generation.
    pub generation: Generation,
    /// Mark bit for the current collection cycle.
    pub marked: bool,
    /// Minor collections survived.
    pub age: u8,
    /// Accounted byte size (8-byte aligned).
    pub size: usize,
    /// Registration timestamp.
    pub allocated_at: Instant,
}

/// The generational collector: regions, headers, remembered set, roots,
/// and statistics.
///
/// The collector never owns objects; it tracks them by id and calls back
/// into the [`ObjectStore`] to trace references and destroy garbage.
pub struct GenerationalGC {
    config: GcConfig,
    pool: MemoryPool,
    headers: HashMap<ObjectId, GcObjectHeader>,
    remembered: RememberedSet,
    /// Explicit roots with registration counts, covering both embedder
    /// roots and active-context locals.
    roots: HashMap<ObjectId, usize>,
    stats: GcStats,
    /// Set by a failed validation; collections refuse to run afterwards.
    halted: bool,
}

impl GenerationalGC {
    /// Creates a collector with the given configuration.
    pub fn new(config: GcConfig) -> Self {
        let pool = MemoryPool::new(config.young_size, config.old_size, config.permanent_size);
        GenerationalGC {
            config,
            pool,
            headers: HashMap::new(),
            remembered: RememberedSet::new(),
            roots: HashMap::new(),
            stats: GcStats::default(),
            halted: false,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &GcConfig {
        &self.config
    }

    /// Returns accumulated statistics.
    pub fn stats(&self) -> &GcStats {
        &self.stats
    }

    /// Returns the memory pool.
    pub fn pool(&self) -> &MemoryPool {
        &self.pool
    }

    /// Returns the remembered set.
    pub fn remembered(&self) -> &RememberedSet {
        &self.remembered
    }

    /// Returns the header for `id`, if registered.
    pub fn header(&self, id: ObjectId) -> Option<&GcObjectHeader> {
        self.headers.get(&id)
    }

    /// Returns the generation owning `id`.
    pub fn generation_of(&self, id: ObjectId) -> Option<Generation> {
        self.headers.get(&id).map(|h| h.generation)
    }

    /// Number of registered objects.
    pub fn object_count(&self) -> usize {
        self.headers.len()
    }

    /// True once a validation failure has poisoned the collector.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Ensures the preferred region can satisfy a `size`-byte allocation.
    ///
    /// Runs the trigger-ratio collection first in automatic modes. On
    /// exhaustion, collects synchronously (minor for young, major for
    /// old) and retries once; a still-unsatisfiable request is an
    /// out-of-memory condition, propagated to the host.
    pub fn allocate_object(
        &mut self,
        store: &mut ObjectStore,
        size: usize,
        preferred: Generation,
    ) -> Result<(), MemoryError> {
        if self.config.mode != CollectionMode::Manual
            && preferred == Generation::Young
            && self.should_trigger_minor()
        {
            self.collect_minor(store);
        }

        if self.pool.region(preferred).can_allocate(size) {
            return Ok(());
        }
        match preferred {
            Generation::Young => self.collect_minor(store),
            Generation::Old => self.collect_major(store),
            // Nothing a collection could free
            Generation::Permanent => {}
        }
        if self.pool.region(preferred).can_allocate(size) {
            Ok(())
        } else {
            Err(MemoryError::OutOfMemory {
                requested: size,
                generation: preferred.name(),
            })
        }
    }

    /// Registers an object with the collector, accounting its bytes in
    /// the generation's region.
    pub fn register_object(
        &mut self,
        id: ObjectId,
        size: usize,
        generation: Generation,
    ) -> Result<(), MemoryError> {
        if self.headers.contains_key(&id) {
            return Err(MemoryError::IntegrityViolation(format!(
                "object {} registered twice",
                id
            )));
        }
        if self.pool.region_mut(generation).allocate(size).is_none() {
            return Err(MemoryError::OutOfMemory {
                requested: size,
                generation: generation.name(),
            });
        }
        let aligned = align_size(size);
        self.headers.insert(
            id,
            GcObjectHeader {
                generation,
                marked: false,
                age: 0,
                size: aligned,
                allocated_at: Instant::now(),
            },
        );
        self.stats.bytes_allocated += aligned as u64;
        self.stats.objects_registered += 1;
        Ok(())
    }

    /// Unregisters an object, releasing its accounted bytes. The caller
    /// owns the object's lifetime and destroys it in the store.
    pub fn unregister_object(&mut self, id: ObjectId) -> bool {
        match self.headers.remove(&id) {
            Some(header) => {
                self.pool.region_mut(header.generation).release(header.size);
                self.remembered.remove_involving(id);
                self.roots.remove(&id);
                self.stats.bytes_freed += header.size as u64;
                true
            }
            None => false,
        }
    }

    /// Registers a root. Roots are reference counted: each `add_root`
    /// must be paired with a `remove_root`.
    pub fn add_root(&mut self, id: ObjectId) {
        *self.roots.entry(id).or_insert(0) += 1;
    }

    /// Releases one root registration for `id`.
    pub fn remove_root(&mut self, id: ObjectId) {
        if let Some(count) = self.roots.get_mut(&id) {
            *count -= 1;
            if *count == 0 {
                self.roots.remove(&id);
            }
        }
    }

    /// Snapshot of the current root ids.
    pub fn roots(&self) -> Vec<ObjectId> {
        self.roots.keys().copied().collect()
    }

    /// Records an old-to-young edge when `from` is old or permanent and
    /// `to` is young; a no-op otherwise.
    ///
    /// This is the only mechanism keeping minor-collection roots accurate
    /// without rescanning the old generation.
    pub fn write_barrier(&mut self, from: ObjectId, to: ObjectId) {
        let from_old = matches!(
            self.generation_of(from),
            Some(Generation::Old) | Some(Generation::Permanent)
        );
        if from_old && self.generation_of(to) == Some(Generation::Young) {
            self.remembered.record(from, to);
        }
    }

    /// True if young occupancy reached the minor trigger ratio.
    pub fn should_trigger_minor(&self) -> bool {
        self.pool.region(Generation::Young).occupancy() >= self.config.minor_trigger_ratio
    }

    /// True if old occupancy reached the major trigger ratio.
    pub fn should_trigger_major(&self) -> bool {
        self.pool.region(Generation::Old).occupancy() >= self.config.major_trigger_ratio
    }

    /// Explicit collection request: a minor collection, then a major one
    /// if the old generation is past its trigger ratio.
    pub fn collect(&mut self, store: &mut ObjectStore) {
        self.collect_minor(store);
        if self.should_trigger_major() {
            self.collect_major(store);
        }
    }

    /// Unconditional full collection.
    pub fn force_collect(&mut self, store: &mut ObjectStore) {
        self.collect_major(store);
    }

    /// Minor collection: mark the young generation from explicit roots
    /// and remembered-set targets, sweep the garbage, age and promote
    /// survivors.
    pub fn collect_minor(&mut self, store: &mut ObjectStore) {
        if self.halted {
            return;
        }
        let started = Instant::now();

        for header in self.headers.values_mut() {
            if header.generation == Generation::Young {
                header.marked = false;
            }
        }

        // Roots: explicit roots plus remembered-set young targets. Young
        // objects reachable only through unrecorded old edges do not
        // exist: every old-to-young store went through the barrier.
        let mut worklist: VecDeque<ObjectId> = VecDeque::new();
        worklist.extend(self.roots.keys().copied());
        worklist.extend(self.remembered.young_targets());

        while let Some(id) = worklist.pop_front() {
            match self.headers.get_mut(&id) {
                Some(header) if header.generation == Generation::Young && !header.marked => {
                    header.marked = true;
                }
                _ => continue,
            }
            let mut children = Vec::new();
            store.trace(id, &mut |child| children.push(child));
            worklist.extend(children);
        }

        // Sweep unmarked young objects.
        let dead: Vec<(ObjectId, usize)> = self
            .headers
            .iter()
            .filter(|(_, h)| h.generation == Generation::Young && !h.marked)
            .map(|(id, h)| (*id, h.size))
            .collect();
        let swept = dead.len();
        let mut freed = 0usize;
        for (id, size) in dead {
            store.destroy(id);
            self.headers.remove(&id);
            self.pool.region_mut(Generation::Young).release(size);
            self.remembered.remove_involving(id);
            freed += size;
        }

        // Age survivors; promote past the age threshold, or all of them
        // while the young region stays under pressure.
        let pressure =
            self.pool.region(Generation::Young).occupancy() >= self.config.pressure_ratio;
        let mut candidates: Vec<(ObjectId, usize)> = Vec::new();
        for (id, header) in self.headers.iter_mut() {
            if header.generation != Generation::Young || !header.marked {
                continue;
            }
            header.marked = false;
            header.age = header.age.saturating_add(1);
            if pressure || header.age >= self.config.promotion_age {
                candidates.push((*id, header.size));
            }
        }

        let mut promoted = 0usize;
        for (id, size) in candidates {
            // Promotion is copy/relink into the old region; an old region
            // that cannot take the object leaves it young for now.
            if self.pool.region_mut(Generation::Old).allocate(size).is_none() {
                continue;
            }
            self.pool.region_mut(Generation::Young).release(size);
            if let Some(header) = self.headers.get_mut(&id) {
                header.generation = Generation::Old;
            }
            // Old-to-old edges leave the ledger; surviving young children
            // of the promoted object enter it.
            self.remembered.remove_target(id);
            let mut children = Vec::new();
            store.trace(id, &mut |child| children.push(child));
            for child in children {
                if self.generation_of(child) == Some(Generation::Young) {
                    self.remembered.record(id, child);
                }
            }
            promoted += 1;
        }

        let pause = started.elapsed();
        self.stats.minor_collections += 1;
        self.stats.objects_swept += swept as u64;
        self.stats.objects_promoted += promoted as u64;
        self.stats.bytes_freed += freed as u64;
        self.stats.last_pause = pause;
        self.stats.total_pause += pause;
        debug!(
            swept,
            promoted,
            freed_bytes = freed,
            pause_us = pause.as_micros() as u64,
            "minor collection complete"
        );
    }

    /// Major collection: full mark-and-sweep over young and old, with
    /// permanent objects as an additional root source, then a
    /// from-scratch remembered-set rebuild.
    pub fn collect_major(&mut self, store: &mut ObjectStore) {
        if self.halted {
            return;
        }
        let started = Instant::now();

        for header in self.headers.values_mut() {
            header.marked = false;
        }

        let mut worklist: VecDeque<ObjectId> = VecDeque::new();
        worklist.extend(self.roots.keys().copied());
        worklist.extend(
            self.headers
                .iter()
                .filter(|(_, h)| h.generation == Generation::Permanent)
                .map(|(id, _)| *id),
        );

        while let Some(id) = worklist.pop_front() {
            match self.headers.get_mut(&id) {
                Some(header) if !header.marked => header.marked = true,
                _ => continue,
            }
            let mut children = Vec::new();
            store.trace(id, &mut |child| children.push(child));
            worklist.extend(children);
        }

        let dead: Vec<(ObjectId, usize, Generation)> = self
            .headers
            .iter()
            .filter(|(_, h)| h.generation != Generation::Permanent && !h.marked)
            .map(|(id, h)| (*id, h.size, h.generation))
            .collect();
        let swept = dead.len();
        let mut freed = 0usize;
        for (id, size, generation) in dead {
            store.destroy(id);
            self.headers.remove(&id);
            self.pool.region_mut(generation).release(size);
            self.roots.remove(&id);
            freed += size;
        }

        for header in self.headers.values_mut() {
            header.marked = false;
        }

        // Recompute the remembered set from the surviving graph.
        self.remembered.clear();
        let sources: Vec<ObjectId> = self
            .headers
            .iter()
            .filter(|(_, h)| h.generation != Generation::Young)
            .map(|(id, _)| *id)
            .collect();
        for source in sources {
            let mut children = Vec::new();
            store.trace(source, &mut |child| children.push(child));
            for child in children {
                if self.generation_of(child) == Some(Generation::Young) {
                    self.remembered.record(source, child);
                }
            }
        }

        let pause = started.elapsed();
        self.stats.major_collections += 1;
        self.stats.objects_swept += swept as u64;
        self.stats.bytes_freed += freed as u64;
        self.stats.last_pause = pause;
        self.stats.total_pause += pause;
        debug!(
            swept,
            freed_bytes = freed,
            remembered = self.remembered.len(),
            pause_us = pause.as_micros() as u64,
            "major collection complete"
        );
    }

    /// Cross-checks the header registry against the store and the region
    /// accounting.
    ///
    /// A mismatch is a programming-error-class fault: it is logged and
    /// the collector halts, refusing to run further collections.
    pub fn validate(&mut self, store: &ObjectStore) -> Result<(), MemoryError> {
        let mut problems: Vec<String> = Vec::new();

        for id in store.ids() {
            if !self.headers.contains_key(&id) {
                problems.push(format!("object {} live in store but unregistered", id));
            }
        }
        for id in self.headers.keys() {
            if !store.contains(*id) {
                problems.push(format!("object {} registered but absent from store", id));
            }
        }

        for generation in [Generation::Young, Generation::Old, Generation::Permanent] {
            let accounted: usize = self
                .headers
                .values()
                .filter(|h| h.generation == generation)
                .map(|h| h.size)
                .sum();
            let used = self.pool.region(generation).used();
            if accounted != used {
                problems.push(format!(
                    "{} region accounts {} bytes but headers sum to {}",
                    generation.name(),
                    used,
                    accounted
                ));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            let message = problems.join("; ");
            error!(%message, "heap integrity violation; halting collection");
            self.halted = true;
            Err(MemoryError::IntegrityViolation(message))
        }
    }
}
