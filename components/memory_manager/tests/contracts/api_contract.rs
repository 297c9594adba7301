//! Contract tests verifying the memory_manager API matches the contract specification.
//! These tests ensure all exported types and functions exist with correct signatures.

use core_types::{MemoryError, ObjectId, Value};
use memory_manager::{
    BackgroundCollector, CollectionMode, GcConfig, Generation, GenerationalGC, Heap,
    MemoryRegion, RememberedSet,
};
use object_model::{ObjectStore, PropertyAttributes, PropertyCache, ShapeCache};
use std::sync::Arc;

/// Test Heap contract: new(config: GcConfig) -> Self
#[test]
fn contract_heap_new() {
    let heap = Heap::new(GcConfig::default());
    let _ = heap;
}

/// Test Heap contract: create_object() -> Result<ObjectId, MemoryError>
#[test]
fn contract_heap_create_object() {
    let heap = Heap::new(GcConfig::default());
    let id: Result<ObjectId, MemoryError> = heap.create_object();
    assert!(id.is_ok());
}

/// Test Heap contract: property entry points
#[test]
fn contract_heap_property_access() {
    let heap = Heap::new(GcConfig::default());
    let id = heap.create_object().unwrap();

    let stored: bool = heap.set_property(
        id,
        &"x".into(),
        Value::Smi(1),
        PropertyAttributes::data_default(),
    );
    assert!(stored);
    let value: Value = heap.get_property(id, &"x".into());
    assert_eq!(value, Value::Smi(1));
    let deleted: bool = heap.delete_property(id, &"x".into());
    assert!(deleted);
}

/// Test Heap contract: element entry points
#[test]
fn contract_heap_element_access() {
    let heap = Heap::new(GcConfig::default());
    let arr = heap.create_array().unwrap();

    assert!(heap.set_element(arr, 0, Value::Smi(1)));
    assert_eq!(heap.get_element(arr, 0), Value::Smi(1));
    assert_eq!(heap.array_length(arr), 1);
    assert!(heap.set_array_length(arr, 0.0).is_ok());
}

/// Test Heap contract: root registration and collection requests
#[test]
fn contract_heap_roots_and_collect() {
    let heap = Heap::new(GcConfig::default());
    let id = heap.create_object().unwrap();

    heap.add_root(id);
    heap.collect();
    heap.force_collect();
    heap.remove_root(id);
    assert!(heap.validate().is_ok());
}

/// Test GenerationalGC contract: register/unregister and the barrier
#[test]
fn contract_gc_register_and_barrier() {
    let mut store = ObjectStore::new(Arc::new(ShapeCache::new()));
    let mut gc = GenerationalGC::new(GcConfig::default());

    gc.allocate_object(&mut store, 64, Generation::Old).unwrap();
    let old = store.create_object(None);
    gc.register_object(old, 64, Generation::Old).unwrap();

    gc.allocate_object(&mut store, 64, Generation::Young).unwrap();
    let young = store.create_object(None);
    gc.register_object(young, 64, Generation::Young).unwrap();

    gc.write_barrier(old, young);
    assert!(gc.remembered().contains(old, young));

    assert!(gc.unregister_object(young));
    assert!(gc.unregister_object(old));
}

/// Test GenerationalGC contract: trigger predicates
#[test]
fn contract_gc_trigger_predicates() {
    let gc = GenerationalGC::new(GcConfig::default());
    let _minor: bool = gc.should_trigger_minor();
    let _major: bool = gc.should_trigger_major();
}

/// Test MemoryRegion contract: bump allocation accounting
#[test]
fn contract_memory_region() {
    let mut region = MemoryRegion::new("young", 1024);
    let offset: Option<usize> = region.allocate(64);
    assert!(offset.is_some());
    assert!(region.used() >= 64);
    assert!(region.occupancy() > 0.0);
}

/// Test RememberedSet contract: edge ledger
#[test]
fn contract_remembered_set() {
    let mut set = RememberedSet::new();
    set.record(ObjectId::new(1), ObjectId::new(2));
    assert_eq!(set.young_targets(), vec![ObjectId::new(2)]);
    set.clear();
    assert!(set.is_empty());
}

/// Test inline-cache entry points consumed by the bytecode layer
#[test]
fn contract_cached_property_access() {
    let heap = Heap::new(GcConfig::default());
    let id = heap.create_object().unwrap();
    let mut site = PropertyCache::new();

    assert!(heap.cached_store_property(&mut site, id, "x", Value::Smi(1)));
    assert_eq!(heap.cached_get_property(&mut site, id, "x"), Value::Smi(1));
}

/// Test BackgroundCollector contract: start/poke/stop
#[test]
fn contract_background_collector() {
    let config = GcConfig {
        mode: CollectionMode::Manual,
        ..GcConfig::default()
    };
    let collector = BackgroundCollector::start(Heap::new(config));
    collector.request_collection();
    collector.stop();
}
