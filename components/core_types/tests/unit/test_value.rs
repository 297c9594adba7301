//! Unit tests for the Value enum and ObjectId handles.

use core_types::{ObjectId, Value};
use num_bigint::BigInt;

#[cfg(test)]
mod value_creation_tests {
    use super::*;

    #[test]
    fn test_value_undefined() {
        let val = Value::Undefined;
        assert!(matches!(val, Value::Undefined));
        assert!(val.is_undefined());
    }

    #[test]
    fn test_value_null() {
        let val = Value::Null;
        assert!(matches!(val, Value::Null));
        assert!(!val.is_undefined());
    }

    #[test]
    fn test_value_smi() {
        assert!(matches!(Value::Smi(42), Value::Smi(42)));
        assert!(matches!(Value::Smi(-100), Value::Smi(-100)));
    }

    #[test]
    fn test_value_double() {
        let val = Value::Double(2.5);
        assert_eq!(val, Value::Double(2.5));
    }

    #[test]
    fn test_value_bigint() {
        let val = Value::BigInt(BigInt::from(1_000_000_000_000_i64));
        assert_eq!(val.type_of(), "bigint");
    }

    #[test]
    fn test_value_heap_object() {
        let val = Value::HeapObject(ObjectId::new(5));
        assert_eq!(val.as_object(), Some(ObjectId::new(5)));
    }
}

#[cfg(test)]
mod value_equality_tests {
    use super::*;

    #[test]
    fn test_same_variant_equality() {
        assert_eq!(Value::Smi(1), Value::Smi(1));
        assert_ne!(Value::Smi(1), Value::Smi(2));
        assert_eq!(
            Value::String("a".to_string()),
            Value::String("a".to_string())
        );
    }

    #[test]
    fn test_cross_variant_inequality() {
        // Smi(1) and Double(1.0) are distinct representations
        assert_ne!(Value::Smi(1), Value::Double(1.0));
        assert_ne!(Value::Undefined, Value::Null);
    }

    #[test]
    fn test_nan_inequality() {
        assert_ne!(Value::Double(f64::NAN), Value::Double(f64::NAN));
    }

    #[test]
    fn test_object_identity_equality() {
        let a = Value::HeapObject(ObjectId::new(1));
        let b = Value::HeapObject(ObjectId::new(1));
        let c = Value::HeapObject(ObjectId::new(2));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}

#[cfg(test)]
mod object_id_tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_object_id_hashable() {
        let mut set = HashSet::new();
        set.insert(ObjectId::new(1));
        set.insert(ObjectId::new(1));
        set.insert(ObjectId::new(2));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_object_id_ordering() {
        assert!(ObjectId::new(1) < ObjectId::new(2));
    }
}
