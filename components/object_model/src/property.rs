//! Property keys, attributes, and descriptors.
//!
//! Property descriptors are tagged as data or accessor; the two are
//! separate enum variants so a descriptor can never be both at once.

use core_types::Value;

/// A property key: either a name or a canonical array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    /// Named property ("x", "length", "0x10", ...)
    Name(String),
    /// Canonical array index (0 ..= 2^32 - 2)
    Index(u32),
}

impl PropertyKey {
    /// Creates a named key.
    pub fn name(name: impl Into<String>) -> Self {
        PropertyKey::Name(name.into())
    }

    /// Creates an index key.
    pub fn index(index: u32) -> Self {
        PropertyKey::Index(index)
    }

    /// Parses a raw key string, recognizing canonical array indices.
    ///
    /// A canonical index is a base-10 integer without leading zeros
    /// ("0" itself is canonical) in the range 0 ..= 2^32 - 2. Everything
    /// else, including "01" and "4294967295", is a name.
    pub fn parse(raw: &str) -> Self {
        if raw == "0" {
            return PropertyKey::Index(0);
        }
        if !raw.is_empty()
            && !raw.starts_with('0')
            && raw.bytes().all(|b| b.is_ascii_digit())
        {
            if let Ok(index) = raw.parse::<u32>() {
                if index != u32::MAX {
                    return PropertyKey::Index(index);
                }
            }
        }
        PropertyKey::Name(raw.to_string())
    }

    /// Returns false for keys the object model refuses to store
    /// (currently only the empty name).
    pub fn is_valid(&self) -> bool {
        match self {
            PropertyKey::Name(name) => !name.is_empty(),
            PropertyKey::Index(_) => true,
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(raw: &str) -> Self {
        PropertyKey::parse(raw)
    }
}

impl From<u32> for PropertyKey {
    fn from(index: u32) -> Self {
        PropertyKey::Index(index)
    }
}

/// Attribute flags of a property, split by descriptor kind.
///
/// Data properties carry a writability flag; accessor properties do not,
/// so the illegal combination is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyAttributes {
    /// Attributes of a data property.
    Data {
        /// Value can be replaced through `set_property`.
        writable: bool,
        /// Property shows up in enumeration.
        enumerable: bool,
        /// Property can be deleted or redefined.
        configurable: bool,
    },
    /// Attributes of an accessor property.
    Accessor {
        /// Property shows up in enumeration.
        enumerable: bool,
        /// Property can be deleted or redefined.
        configurable: bool,
    },
}

impl PropertyAttributes {
    /// Writable + enumerable + configurable data property.
    pub const fn data_default() -> Self {
        PropertyAttributes::Data {
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    /// Enumerable + configurable accessor property.
    pub const fn accessor_default() -> Self {
        PropertyAttributes::Accessor {
            enumerable: true,
            configurable: true,
        }
    }

    /// Non-writable, non-configurable, enumerable data property.
    pub const fn read_only() -> Self {
        PropertyAttributes::Data {
            writable: false,
            enumerable: true,
            configurable: false,
        }
    }

    /// Writable data property hidden from enumeration and deletion
    /// (the array `length` layout).
    pub const fn hidden_data() -> Self {
        PropertyAttributes::Data {
            writable: true,
            enumerable: false,
            configurable: false,
        }
    }

    /// True for accessor-kind attributes.
    pub const fn is_accessor(&self) -> bool {
        matches!(self, PropertyAttributes::Accessor { .. })
    }

    /// True if a plain assignment may replace the value.
    ///
    /// Accessor properties are never directly writable; stores to them
    /// go through the setter, dispatched by the caller.
    pub const fn is_writable(&self) -> bool {
        match self {
            PropertyAttributes::Data { writable, .. } => *writable,
            PropertyAttributes::Accessor { .. } => false,
        }
    }

    /// True if the property shows up in enumeration.
    pub const fn is_enumerable(&self) -> bool {
        match self {
            PropertyAttributes::Data { enumerable, .. }
            | PropertyAttributes::Accessor { enumerable, .. } => *enumerable,
        }
    }

    /// True if the property may be deleted or redefined.
    pub const fn is_configurable(&self) -> bool {
        match self {
            PropertyAttributes::Data { configurable, .. }
            | PropertyAttributes::Accessor { configurable, .. } => *configurable,
        }
    }
}

impl Default for PropertyAttributes {
    fn default() -> Self {
        Self::data_default()
    }
}

/// Descriptor kind tag, used by shape tables and inline-cache entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    /// Plain value slot
    Data,
    /// Getter/setter pair slot
    Accessor,
}

/// The value stored in an object's property slot.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// A plain data value.
    Data(Value),
    /// A getter/setter pair. Either side may be `Value::Undefined`.
    Accessor {
        /// Getter object, or undefined.
        getter: Value,
        /// Setter object, or undefined.
        setter: Value,
    },
}

impl PropertyValue {
    /// Wraps a plain value.
    pub fn data(value: Value) -> Self {
        PropertyValue::Data(value)
    }

    /// Returns the descriptor kind of this slot value.
    pub fn kind(&self) -> SlotKind {
        match self {
            PropertyValue::Data(_) => SlotKind::Data,
            PropertyValue::Accessor { .. } => SlotKind::Accessor,
        }
    }

    /// Returns the contained data value, if this is a data slot.
    pub fn as_data(&self) -> Option<&Value> {
        match self {
            PropertyValue::Data(value) => Some(value),
            PropertyValue::Accessor { .. } => None,
        }
    }
}

/// Value-type hint recorded in the shape table when the property is first
/// added, for the benefit of a type-specializing JIT tier. Fixed once the
/// shape exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueHint {
    /// No useful hint
    Any,
    /// Small integer
    Smi,
    /// Double-precision float
    Double,
    /// Boolean
    Boolean,
    /// String
    String,
    /// BigInt
    BigInt,
    /// Heap object reference
    Object,
}

impl ValueHint {
    /// Derives the hint from a concrete value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Undefined | Value::Null => ValueHint::Any,
            Value::Boolean(_) => ValueHint::Boolean,
            Value::Smi(_) => ValueHint::Smi,
            Value::Double(_) => ValueHint::Double,
            Value::String(_) => ValueHint::String,
            Value::BigInt(_) => ValueHint::BigInt,
            Value::HeapObject(_) => ValueHint::Object,
        }
    }
}

/// A single row of a shape's property table.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyInfo {
    /// Property name.
    pub name: String,
    /// Slot index in the object's property storage.
    pub slot: u32,
    /// Attribute flags.
    pub attributes: PropertyAttributes,
    /// Value-type hint recorded at transition time.
    pub hint: ValueHint,
}
