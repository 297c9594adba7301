//! Shape and property storage integration tests
//!
//! Verifies structural sharing, transition idempotence, delete
//! renumbering, and the array length invariant across the object model.

use core_types::Value;
use object_model::{
    LayoutConfig, ObjectStore, PropertyAttributes, PropertyKey, ShapeCache,
};
use std::sync::Arc;

fn store() -> ObjectStore {
    ObjectStore::new(Arc::new(ShapeCache::new()))
}

fn attrs() -> PropertyAttributes {
    PropertyAttributes::data_default()
}

/// Test: objects built via identical property histories share a shape
#[test]
fn test_identical_histories_converge_on_one_shape() {
    let mut store = store();

    let a = store.create_object(None);
    store.set_property(a, &"x".into(), Value::Smi(1), attrs());
    store.set_property(a, &"y".into(), Value::Smi(2), attrs());

    let b = store.create_object(None);
    store.set_property(b, &"x".into(), Value::Smi(10), attrs());
    store.set_property(b, &"y".into(), Value::Smi(20), attrs());

    let shape_a = store.get(a).unwrap().shape().clone();
    let shape_b = store.get(b).unwrap().shape().clone();
    assert!(
        Arc::ptr_eq(&shape_a, &shape_b),
        "same add sequence must yield reference-equal shapes"
    );

    // Slot offsets match as a consequence
    assert_eq!(
        shape_a.peek_property_info("x").unwrap().slot,
        shape_b.peek_property_info("x").unwrap().slot
    );
    assert_eq!(
        shape_a.peek_property_info("y").unwrap().slot,
        shape_b.peek_property_info("y").unwrap().slot
    );
}

/// Test: different add orders diverge
#[test]
fn test_order_matters_for_sharing() {
    let mut store = store();

    let a = store.create_object(None);
    store.set_property(a, &"x".into(), Value::Smi(1), attrs());
    store.set_property(a, &"y".into(), Value::Smi(2), attrs());

    let b = store.create_object(None);
    store.set_property(b, &"y".into(), Value::Smi(2), attrs());
    store.set_property(b, &"x".into(), Value::Smi(1), attrs());

    assert!(!Arc::ptr_eq(
        store.get(a).unwrap().shape(),
        store.get(b).unwrap().shape()
    ));
}

/// Test: transition idempotence at the cache level
#[test]
fn test_transition_idempotence() {
    let cache = ShapeCache::new();
    let root = cache.root();

    let first = cache.add_property(&root, "p", attrs(), object_model::ValueHint::Smi);
    let second = cache.add_property(&root, "p", attrs(), object_model::ValueHint::Smi);
    assert!(Arc::ptr_eq(&first, &second));

    // And through a longer chain
    let chain_a = cache.add_property(&first, "q", attrs(), object_model::ValueHint::Any);
    let chain_b = cache.add_property(&second, "q", attrs(), object_model::ValueHint::Any);
    assert!(Arc::ptr_eq(&chain_a, &chain_b));
}

/// Test: add/remove leave the original shape untouched
#[test]
fn test_shape_immutability() {
    let cache = ShapeCache::new();
    let root = cache.root();
    let s1 = cache.add_property(&root, "x", attrs(), object_model::ValueHint::Smi);
    let s2 = cache.add_property(&s1, "y", attrs(), object_model::ValueHint::Smi);

    let table_before = s2.entries_snapshot();
    let count_before = s2.property_count();

    let _bigger = cache.add_property(&s2, "z", attrs(), object_model::ValueHint::Smi);
    let _smaller = cache.remove_property(&s2, "x");

    assert_eq!(s2.property_count(), count_before);
    assert_eq!(s2.entries_snapshot(), table_before);
}

/// End-to-end scenario: delete a property, survivors renumber
#[test]
fn test_delete_changes_shape_and_renumbers() {
    let mut store = store();
    let a = store.create_object(None);
    store.set_property(a, &"x".into(), Value::Smi(1), attrs());
    store.set_property(a, &"y".into(), Value::Smi(2), attrs());

    let shape_before = store.get(a).unwrap().shape().id();
    let y_slot_before = store
        .get(a)
        .unwrap()
        .shape()
        .peek_property_info("y")
        .unwrap()
        .slot;
    assert_eq!(y_slot_before, 1);

    assert!(store.delete_property(a, &"x".into()));

    let object = store.get(a).unwrap();
    assert_ne!(object.shape().id(), shape_before);
    assert_eq!(store.get_property(a, &"x".into()), Value::Undefined);
    // y still hits, at a renumbered slot
    assert_eq!(object.shape().peek_property_info("y").unwrap().slot, 0);
    assert_eq!(store.get_property(a, &"y".into()), Value::Smi(2));
}

/// Test: prototype chain resolution across objects
#[test]
fn test_prototype_chain_across_objects() {
    let mut store = store();
    let grandparent = store.create_object(None);
    store.set_property(grandparent, &"deep".into(), Value::Smi(3), attrs());
    let parent = store.create_object(Some(grandparent));
    store.set_property(parent, &"mid".into(), Value::Smi(2), attrs());
    let child = store.create_object(Some(parent));
    store.set_property(child, &"own".into(), Value::Smi(1), attrs());

    assert_eq!(store.get_property(child, &"own".into()), Value::Smi(1));
    assert_eq!(store.get_property(child, &"mid".into()), Value::Smi(2));
    assert_eq!(store.get_property(child, &"deep".into()), Value::Smi(3));
    assert_eq!(
        store.get_property(child, &"missing".into()),
        Value::Undefined
    );
}

/// End-to-end scenario: array truncation through length assignment
#[test]
fn test_array_length_truncation() {
    let mut store = store();
    let arr = store.create_array(None);

    store.set_element(arr, 0, Value::Smi(1));
    store.set_element(arr, 1, Value::Smi(2));
    store.set_element(arr, 2, Value::Smi(3));
    assert_eq!(store.array_length(arr), 3);

    store.set_array_length(arr, 1.0).unwrap();

    assert_eq!(store.array_length(arr), 1);
    assert_eq!(store.get_element(arr, 0), Value::Smi(1));
    assert_eq!(store.get_element(arr, 1), Value::Undefined);
    assert_eq!(store.get_element(arr, 2), Value::Undefined);
}

/// Property: length >= 1 + highest populated index after arbitrary
/// set/delete/length sequences
#[test]
fn test_array_length_invariant() {
    let mut store = store();
    let arr = store.create_array(None);

    store.set_element(arr, 5, Value::Smi(5));
    assert!(store.array_length(arr) >= 6);

    store.set_element(arr, 100_000, Value::Smi(1));
    assert!(store.array_length(arr) >= 100_001);

    store.delete_property(arr, &PropertyKey::Index(100_000));
    store.set_array_length(arr, 10.0).unwrap();
    store.set_element(arr, 3, Value::Smi(3));

    let length = store.array_length(arr);
    for index in [3u32, 5] {
        if !store.get_element(arr, index).is_undefined() {
            assert!(length >= index + 1);
        }
    }
    // Indices at or past the length are unobservable
    assert_eq!(store.get_element(arr, length), Value::Undefined);
    assert_eq!(store.get_element(arr, length + 10), Value::Undefined);
}

/// Test: sparse writes do not zero-fill the dense vector
#[test]
fn test_sparse_array_storage() {
    let mut store = store();
    let arr = store.create_array(None);

    store.set_element(arr, 0, Value::Smi(1));
    store.set_element(arr, 5_000_000, Value::Smi(2));

    let object = store.get(arr).unwrap();
    assert_eq!(object.dense_element_count(), 1);
    assert_eq!(object.sparse_element_count(), 1);
    assert_eq!(store.get_element(arr, 5_000_000), Value::Smi(2));
    assert_eq!(store.array_length(arr), 5_000_001);
}

/// Test: invalid lengths are reported, not clamped
#[test]
fn test_invalid_lengths_reported() {
    let mut store = store();
    let arr = store.create_array(None);
    store.set_element(arr, 0, Value::Smi(1));

    for bad in [-1.0, 0.5, f64::NAN, f64::INFINITY, 4294967296.0] {
        assert!(store.set_array_length(arr, bad).is_err());
    }
    // Nothing changed
    assert_eq!(store.array_length(arr), 1);
    assert_eq!(store.get_element(arr, 0), Value::Smi(1));
}

/// Test: inline budget spill keeps lookups working across the boundary
#[test]
fn test_overflow_properties_resolve() {
    let shapes = Arc::new(ShapeCache::new());
    let mut store = ObjectStore::with_config(
        shapes,
        LayoutConfig {
            inline_slot_budget: 2,
            ..LayoutConfig::default()
        },
    );
    let id = store.create_object(None);

    for i in 0..6 {
        store.set_property(
            id,
            &PropertyKey::name(format!("k{}", i)),
            Value::Smi(i),
            attrs(),
        );
    }
    for i in 0..6 {
        assert_eq!(
            store.get_property(id, &PropertyKey::name(format!("k{}", i))),
            Value::Smi(i)
        );
    }
    let object = store.get(id).unwrap();
    assert_eq!(object.inline_slot_count(), 2);
    assert_eq!(object.overflow_slot_count(), 4);
}
