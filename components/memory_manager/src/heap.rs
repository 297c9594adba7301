//! Heap facade: the entry point other subsystems consume.
//!
//! Wraps the object store and the generational collector behind a single
//! heap-wide mutex. One foreground thread plus at most one background
//! collector serialize on this lock; there is no lock-free path. Every
//! call is synchronous and may block briefly on the mutex.
//!
//! The facade invokes the GC write barrier for every reference value
//! stored through it, so callers never maintain the remembered set by
//! hand.

use crate::config::{CollectionMode, GcConfig};
use crate::gc::{Generation, GenerationalGC};
use crate::stats::GcStats;
use core_types::{MemoryError, ObjectId, StructuralError, Value};
use object_model::{
    LayoutConfig, ObjectStore, PropertyAttributes, PropertyCache, PropertyKey, PropertyValue,
    ShapeCache,
};
use std::sync::{Arc, Mutex, MutexGuard};

/// Base accounted size of an object, before inline slots.
const OBJECT_BASE_SIZE: usize = 64;
/// Accounted bytes per inline property slot.
const SLOT_SIZE: usize = 16;

pub(crate) struct HeapInner {
    pub(crate) store: ObjectStore,
    pub(crate) gc: GenerationalGC,
}

/// Shared handle to the heap. Clones refer to the same heap state.
#[derive(Clone)]
pub struct Heap {
    inner: Arc<Mutex<HeapInner>>,
}

impl Heap {
    /// Creates a heap with the given GC configuration and default object
    /// layout.
    pub fn new(config: GcConfig) -> Self {
        Self::with_layout(config, LayoutConfig::default())
    }

    /// Creates a heap with explicit GC and layout configuration.
    pub fn with_layout(config: GcConfig, layout: LayoutConfig) -> Self {
        let shapes = Arc::new(ShapeCache::new());
        let store = ObjectStore::with_config(shapes, layout);
        let gc = GenerationalGC::new(config);
        Heap {
            inner: Arc::new(Mutex::new(HeapInner { store, gc })),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, HeapInner> {
        self.inner.lock().unwrap()
    }

    /// Returns a copy of the GC configuration.
    pub fn gc_config(&self) -> GcConfig {
        self.lock().gc.config().clone()
    }

    fn object_size(store: &ObjectStore) -> usize {
        OBJECT_BASE_SIZE + SLOT_SIZE * store.config().inline_slot_budget
    }

    fn create_with(
        &self,
        generation: Generation,
        build: impl FnOnce(&mut ObjectStore) -> ObjectId,
    ) -> Result<ObjectId, MemoryError> {
        let inner = &mut *self.lock();
        let size = Self::object_size(&inner.store);
        inner.gc.allocate_object(&mut inner.store, size, generation)?;
        let id = build(&mut inner.store);
        if let Err(err) = inner.gc.register_object(id, size, generation) {
            inner.store.destroy(id);
            return Err(err);
        }
        Ok(id)
    }

    /// Allocates an ordinary object in the young generation.
    pub fn create_object(&self) -> Result<ObjectId, MemoryError> {
        self.create_with(Generation::Young, |store| store.create_object(None))
    }

    /// Allocates an ordinary object in the chosen generation.
    /// Permanent is reserved for engine built-ins.
    pub fn create_object_in(&self, generation: Generation) -> Result<ObjectId, MemoryError> {
        self.create_with(generation, |store| store.create_object(None))
    }

    /// Allocates an object with a prototype link.
    pub fn create_object_with_prototype(
        &self,
        prototype: ObjectId,
    ) -> Result<ObjectId, MemoryError> {
        self.create_with(Generation::Young, move |store| {
            store.create_object(Some(prototype))
        })
    }

    /// Allocates an array object.
    pub fn create_array(&self) -> Result<ObjectId, MemoryError> {
        self.create_with(Generation::Young, |store| store.create_array(None))
    }

    /// Allocates a function object.
    pub fn create_function(&self) -> Result<ObjectId, MemoryError> {
        self.create_with(Generation::Young, |store| store.create_function(None))
    }

    /// Allocates an object with the canonical shape for a known property
    /// name list.
    pub fn create_with_class(&self, names: &[&str]) -> Result<ObjectId, MemoryError> {
        self.create_with(Generation::Young, |store| {
            store.create_with_class(names, None)
        })
    }

    /// Destroys an object explicitly, unregistering it from the
    /// collector. Normally the collector sweeps garbage on its own; this
    /// is for layers that own object lifetime directly.
    pub fn destroy_object(&self, id: ObjectId) -> bool {
        let inner = &mut *self.lock();
        inner.gc.unregister_object(id);
        inner.store.destroy(id)
    }

    /// True if `id` is a live object.
    pub fn contains(&self, id: ObjectId) -> bool {
        self.lock().store.contains(id)
    }

    /// Number of live objects.
    pub fn object_count(&self) -> usize {
        self.lock().store.len()
    }

    /// Returns the generation owning `id`.
    pub fn generation_of(&self, id: ObjectId) -> Option<Generation> {
        self.lock().gc.generation_of(id)
    }

    /// Reads a property (prototype chain included).
    pub fn get_property(&self, id: ObjectId, key: &PropertyKey) -> Value {
        self.lock().store.get_property(id, key)
    }

    /// Writes a property, invoking the write barrier for reference
    /// values.
    pub fn set_property(
        &self,
        id: ObjectId,
        key: &PropertyKey,
        value: Value,
        attributes: PropertyAttributes,
    ) -> bool {
        let inner = &mut *self.lock();
        let target = value.as_object();
        let stored = inner.store.set_property(id, key, value, attributes);
        if stored {
            if let Some(target) = target {
                inner.gc.write_barrier(id, target);
            }
        }
        stored
    }

    /// Installs a property descriptor, barriering getter/setter and data
    /// references.
    pub fn define_property(
        &self,
        id: ObjectId,
        key: &PropertyKey,
        value: PropertyValue,
        attributes: PropertyAttributes,
    ) -> Result<(), StructuralError> {
        let inner = &mut *self.lock();
        let mut targets = Vec::new();
        match &value {
            PropertyValue::Data(v) => targets.extend(v.as_object()),
            PropertyValue::Accessor { getter, setter } => {
                targets.extend(getter.as_object());
                targets.extend(setter.as_object());
            }
        }
        inner.store.define_property(id, key, value, attributes)?;
        for target in targets {
            inner.gc.write_barrier(id, target);
        }
        Ok(())
    }

    /// Deletes a property.
    pub fn delete_property(&self, id: ObjectId, key: &PropertyKey) -> bool {
        self.lock().store.delete_property(id, key)
    }

    /// Reads an element.
    pub fn get_element(&self, id: ObjectId, index: u32) -> Value {
        self.lock().store.get_element(id, index)
    }

    /// Writes an element, invoking the write barrier for reference
    /// values.
    pub fn set_element(&self, id: ObjectId, index: u32, value: Value) -> bool {
        let inner = &mut *self.lock();
        let target = value.as_object();
        let stored = inner.store.set_element(id, index, value);
        if stored {
            if let Some(target) = target {
                inner.gc.write_barrier(id, target);
            }
        }
        stored
    }

    /// Assigns an array's length (checked, never clamped).
    pub fn set_array_length(&self, id: ObjectId, new_length: f64) -> Result<(), StructuralError> {
        self.lock().store.set_array_length(id, new_length)
    }

    /// Returns an array's length.
    pub fn array_length(&self, id: ObjectId) -> u32 {
        self.lock().store.array_length(id)
    }

    /// Cached property read through a call site's inline cache.
    pub fn cached_get_property(
        &self,
        site: &mut PropertyCache,
        id: ObjectId,
        name: &str,
    ) -> Value {
        let inner = &*self.lock();
        site.get_property(&inner.store, id, name)
    }

    /// Cached property write through a call site's inline cache, with
    /// the write barrier applied.
    pub fn cached_store_property(
        &self,
        site: &mut PropertyCache,
        id: ObjectId,
        name: &str,
        value: Value,
    ) -> bool {
        let inner = &mut *self.lock();
        let target = value.as_object();
        let stored = site.store_property(&mut inner.store, id, name, value);
        if stored {
            if let Some(target) = target {
                inner.gc.write_barrier(id, target);
            }
        }
        stored
    }

    /// Registers a root (e.g. a stack-reachable object).
    pub fn add_root(&self, id: ObjectId) {
        self.lock().gc.add_root(id);
    }

    /// Releases one root registration.
    pub fn remove_root(&self, id: ObjectId) {
        self.lock().gc.remove_root(id);
    }

    /// Explicit collection request.
    pub fn collect(&self) {
        let inner = &mut *self.lock();
        let (store, gc) = (&mut inner.store, &mut inner.gc);
        gc.collect(store);
    }

    /// Unconditional full collection.
    pub fn force_collect(&self) {
        let inner = &mut *self.lock();
        let (store, gc) = (&mut inner.store, &mut inner.gc);
        gc.force_collect(store);
    }

    /// Minor collection, exposed for diagnostics and tests.
    pub fn collect_minor(&self) {
        let inner = &mut *self.lock();
        let (store, gc) = (&mut inner.store, &mut inner.gc);
        gc.collect_minor(store);
    }

    /// Major collection, exposed for diagnostics and tests.
    pub fn collect_major(&self) {
        let inner = &mut *self.lock();
        let (store, gc) = (&mut inner.store, &mut inner.gc);
        gc.collect_major(store);
    }

    /// Returns a snapshot of the collection statistics.
    pub fn stats(&self) -> GcStats {
        self.lock().gc.stats().clone()
    }

    /// Runs the heap integrity validation.
    pub fn validate(&self) -> Result<(), MemoryError> {
        let inner = &mut *self.lock();
        let (store, gc) = (&inner.store, &mut inner.gc);
        gc.validate(store)
    }

    /// One background-collector tick: runs the collections the mode
    /// calls for.
    pub(crate) fn background_tick(&self) {
        let inner = &mut *self.lock();
        let (store, gc) = (&mut inner.store, &mut inner.gc);
        match gc.config().mode {
            CollectionMode::Manual => {}
            CollectionMode::Automatic => {
                if gc.should_trigger_minor() {
                    gc.collect_minor(store);
                } else if gc.should_trigger_major() {
                    gc.collect_major(store);
                }
            }
            CollectionMode::Incremental => {
                gc.collect_minor(store);
                if gc.should_trigger_major() {
                    gc.collect_major(store);
                }
            }
        }
    }
}
