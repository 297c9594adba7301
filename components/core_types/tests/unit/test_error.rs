//! Unit tests for the error taxonomy.

use core_types::{MemoryError, ObjectId, StructuralError};

#[test]
fn test_structural_error_variants() {
    let _key = StructuralError::InvalidKey(String::new());
    let _cfg = StructuralError::NotConfigurable("x".to_string());
    let _wr = StructuralError::NotWritable("y".to_string());
    let _len = StructuralError::InvalidArrayLength(1.5);
    let _obj = StructuralError::UnknownObject(ObjectId::new(0));
}

#[test]
fn test_structural_error_is_std_error() {
    let err: Box<dyn std::error::Error> =
        Box::new(StructuralError::NotWritable("x".to_string()));
    assert!(err.to_string().contains("not writable"));
}

#[test]
fn test_memory_error_display() {
    let oom = MemoryError::OutOfMemory {
        requested: 4096,
        generation: "old",
    };
    assert!(oom.to_string().contains("4096"));
    assert!(oom.to_string().contains("old"));

    let bad = MemoryError::IntegrityViolation("header table mismatch".to_string());
    assert!(bad.to_string().contains("header table mismatch"));
}

#[test]
fn test_memory_error_equality() {
    assert_eq!(
        MemoryError::OutOfMemory {
            requested: 1,
            generation: "young"
        },
        MemoryError::OutOfMemory {
            requested: 1,
            generation: "young"
        }
    );
}
