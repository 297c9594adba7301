//! Heap and collector integration tests
//!
//! Exercises the full write-barrier / collection / promotion pipeline
//! through the heap facade, the way the interpreter layer consumes it.

use core_types::{MemoryError, Value};
use memory_manager::{BackgroundCollector, CollectionMode, GcConfig, Generation, Heap};
use object_model::{PropertyAttributes, PropertyCache};
use std::time::Duration;

fn attrs() -> PropertyAttributes {
    PropertyAttributes::data_default()
}

/// End-to-end scenario: old-to-young reference survives a minor GC
#[test]
fn test_old_to_young_reference_survives_minor() {
    let heap = Heap::new(GcConfig::default());

    let old = heap.create_object_in(Generation::Old).unwrap();
    let young = heap.create_object().unwrap();
    assert_eq!(heap.generation_of(young), Some(Generation::Young));

    // The facade runs the write barrier for the reference store
    assert!(heap.set_property(old, &"field".into(), Value::HeapObject(young), attrs()));

    heap.collect_minor();

    assert!(heap.contains(young));
    assert_eq!(
        heap.get_property(old, &"field".into()),
        Value::HeapObject(young)
    );
}

/// Property: no live young object referenced only from old objects is
/// ever swept, across a chain of stores
#[test]
fn test_write_barrier_completeness() {
    let heap = Heap::new(GcConfig::default());
    let old = heap.create_object_in(Generation::Old).unwrap();

    let mut youngs = Vec::new();
    for i in 0..20u32 {
        let young = heap.create_array().unwrap();
        heap.set_element(young, 0, Value::Smi(i as i32));
        heap.set_element(old, i, Value::HeapObject(young));
        youngs.push(young);
    }

    heap.collect_minor();

    for (i, &young) in youngs.iter().enumerate() {
        assert!(heap.contains(young), "young object {} was swept", i);
        assert_eq!(heap.get_element(young, 0), Value::Smi(i as i32));
    }
}

#[test]
fn test_young_garbage_reclaimed_young_roots_kept() {
    let heap = Heap::new(GcConfig::default());

    let kept = heap.create_object().unwrap();
    heap.add_root(kept);
    let garbage = heap.create_object().unwrap();

    heap.collect_minor();

    assert!(heap.contains(kept));
    assert!(!heap.contains(garbage));
    assert_eq!(heap.stats().objects_swept, 1);
}

#[test]
fn test_transitive_reachability_from_root() {
    let heap = Heap::new(GcConfig::default());

    let root = heap.create_object().unwrap();
    let middle = heap.create_object().unwrap();
    let leaf = heap.create_object().unwrap();
    heap.set_property(root, &"m".into(), Value::HeapObject(middle), attrs());
    heap.set_property(middle, &"l".into(), Value::HeapObject(leaf), attrs());
    heap.add_root(root);

    heap.collect_minor();
    heap.force_collect();

    assert!(heap.contains(root));
    assert!(heap.contains(middle));
    assert!(heap.contains(leaf));
}

/// Promotion: survivors age through minor collections and move to the
/// old generation, staying reachable
#[test]
fn test_promotion_pipeline() {
    let config = GcConfig {
        promotion_age: 2,
        ..GcConfig::default()
    };
    let heap = Heap::new(config);

    let id = heap.create_object().unwrap();
    heap.set_property(id, &"marker".into(), Value::Smi(42), attrs());
    heap.add_root(id);

    heap.collect_minor();
    assert_eq!(heap.generation_of(id), Some(Generation::Young));
    heap.collect_minor();
    assert_eq!(heap.generation_of(id), Some(Generation::Old));

    // Promoted objects keep their state and survive further minors
    heap.collect_minor();
    assert_eq!(heap.get_property(id, &"marker".into()), Value::Smi(42));
    assert_eq!(heap.stats().objects_promoted, 1);
}

/// Allocation churn: unrooted garbage is recycled by synchronous
/// collections, so a small heap sustains many allocations
#[test]
fn test_allocation_churn_never_exhausts() {
    let heap = Heap::new(GcConfig::small(4096, 4096));

    for i in 0..200 {
        let id = heap
            .create_object()
            .unwrap_or_else(|e| panic!("allocation {} failed: {}", i, e));
        heap.set_property(id, &"n".into(), Value::Smi(i), attrs());
    }
    assert!(heap.stats().minor_collections > 0);
}

#[test]
fn test_oom_when_heap_full_of_roots() {
    let heap = Heap::new(GcConfig::small(512, 512));

    let mut err = None;
    for _ in 0..10 {
        match heap.create_object() {
            Ok(id) => heap.add_root(id),
            Err(e) => {
                err = Some(e);
                break;
            }
        }
    }
    assert!(matches!(err, Some(MemoryError::OutOfMemory { .. })));
}

#[test]
fn test_inline_cache_through_heap_survives_collection() {
    let heap = Heap::new(GcConfig::default());
    let id = heap.create_object().unwrap();
    heap.add_root(id);
    let mut site = PropertyCache::new();

    assert!(heap.cached_store_property(&mut site, id, "x", Value::Smi(9)));
    heap.collect_minor();

    // Object survived with its shape; the cached site still hits
    assert_eq!(heap.cached_get_property(&mut site, id, "x"), Value::Smi(9));
    assert!(site.stats().hits >= 1);
}

#[test]
fn test_validation_passes_after_heavy_activity() {
    let heap = Heap::new(GcConfig::default());

    let keep = heap.create_object().unwrap();
    heap.add_root(keep);
    for i in 0..50u32 {
        let id = heap.create_object().unwrap();
        if i % 3 == 0 {
            heap.set_property(keep, &"latest".into(), Value::HeapObject(id), attrs());
        }
    }
    heap.collect_minor();
    heap.force_collect();

    assert!(heap.validate().is_ok());
}

#[test]
fn test_background_collector_with_foreground_traffic() {
    let config = GcConfig {
        mode: CollectionMode::Automatic,
        background_interval: Duration::from_millis(5),
        ..GcConfig::small(64 * 1024, 64 * 1024)
    };
    let heap = Heap::new(config);
    let collector = BackgroundCollector::start(heap.clone());

    let keep = heap.create_object().unwrap();
    heap.add_root(keep);
    for i in 0..500 {
        let id = heap.create_object().unwrap();
        heap.set_property(id, &"n".into(), Value::Smi(i), attrs());
    }
    collector.request_collection();
    std::thread::sleep(Duration::from_millis(30));
    collector.stop();

    assert!(heap.contains(keep));
    assert!(heap.validate().is_ok());
}
