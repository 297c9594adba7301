//! Runtime object representation.
//!
//! An object is a header (shape, prototype link, kind tag) plus property
//! storage: a small inline slot vector, an overflow map for slots past
//! the inline budget, and a separate element store for array indices
//! (dense vector plus a sparse overflow map).

use crate::property::PropertyValue;
use crate::shape::Shape;
use core_types::{ObjectId, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Object kind tag carried in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// Ordinary object
    Plain,
    /// Array object with a tracked length
    Array,
    /// Function object
    Function,
}

/// A runtime object with shape-described property storage.
///
/// The shape pointer is shared, not owned: the shape cache keeps shapes
/// alive, the object only keeps a reference-counted handle. The invariant
/// `property_count() == shape.property_count()` holds whenever the object
/// is not mid-transition.
pub struct JsObject {
    shape: Arc<Shape>,
    prototype: Option<ObjectId>,
    kind: ObjectKind,
    /// Inline property slots, indexed by shape slot offsets.
    slots: Vec<PropertyValue>,
    /// Property slots past the inline budget.
    slot_overflow: HashMap<u32, PropertyValue>,
    /// Dense elements.
    elements: Vec<Value>,
    /// Sparse elements far beyond the dense length.
    element_overflow: HashMap<u32, Value>,
    /// Tracked array length: max of dense population, highest overflow
    /// index + 1, and any explicitly assigned length.
    length: u32,
    inline_budget: usize,
}

impl JsObject {
    /// Creates an object with the given shape and an empty slot vector.
    pub fn new(
        shape: Arc<Shape>,
        prototype: Option<ObjectId>,
        kind: ObjectKind,
        inline_budget: usize,
    ) -> Self {
        JsObject {
            shape,
            prototype,
            kind,
            slots: Vec::new(),
            slot_overflow: HashMap::new(),
            elements: Vec::new(),
            element_overflow: HashMap::new(),
            length: 0,
            inline_budget,
        }
    }

    /// Returns the current shape.
    pub fn shape(&self) -> &Arc<Shape> {
        &self.shape
    }

    /// Replaces the shape after a transition.
    pub fn set_shape(&mut self, shape: Arc<Shape>) {
        self.shape = shape;
    }

    /// Returns the prototype link.
    pub fn prototype(&self) -> Option<ObjectId> {
        self.prototype
    }

    /// Replaces the prototype link.
    pub fn set_prototype(&mut self, prototype: Option<ObjectId>) {
        self.prototype = prototype;
    }

    /// Returns the kind tag.
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// Number of named properties, per the shape.
    pub fn property_count(&self) -> u32 {
        self.shape.property_count()
    }

    /// Reads a property slot.
    pub fn slot(&self, slot: u32) -> Option<&PropertyValue> {
        if (slot as usize) < self.inline_budget {
            self.slots.get(slot as usize)
        } else {
            self.slot_overflow.get(&slot)
        }
    }

    /// Writes a property slot, growing inline storage or spilling to the
    /// overflow map once the inline budget is exceeded.
    pub fn set_slot(&mut self, slot: u32, value: PropertyValue) {
        if (slot as usize) < self.inline_budget {
            if self.slots.len() <= slot as usize {
                self.slots
                    .resize(slot as usize + 1, PropertyValue::Data(Value::Undefined));
            }
            self.slots[slot as usize] = value;
        } else {
            self.slot_overflow.insert(slot, value);
        }
    }

    /// Replaces all property storage with the given (slot, value) pairs.
    ///
    /// Used after a remove-transition, where slot offsets were renumbered
    /// and values must be rebound against the new table.
    pub fn replace_slots(&mut self, values: Vec<(u32, PropertyValue)>) {
        self.slots.clear();
        self.slot_overflow.clear();
        for (slot, value) in values {
            self.set_slot(slot, value);
        }
    }

    /// Number of slots in inline storage (for tests and diagnostics).
    pub fn inline_slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots spilled past the inline budget.
    pub fn overflow_slot_count(&self) -> usize {
        self.slot_overflow.len()
    }

    /// Reads an element. Indices at or past the tracked length are
    /// unobservable and read as undefined.
    pub fn element(&self, index: u32) -> Value {
        if index >= self.length {
            return Value::Undefined;
        }
        if (index as usize) < self.elements.len() {
            return self.elements[index as usize].clone();
        }
        self.element_overflow
            .get(&index)
            .cloned()
            .unwrap_or(Value::Undefined)
    }

    /// True if the object has a populated element at `index`.
    pub fn has_element(&self, index: u32) -> bool {
        if index >= self.length {
            return false;
        }
        if (index as usize) < self.elements.len() {
            return !self.elements[index as usize].is_undefined();
        }
        self.element_overflow.contains_key(&index)
    }

    /// Writes an element.
    ///
    /// A write no more than `sparse_gap` beyond the dense length extends
    /// the dense vector (undefined-filling the gap); a write farther out
    /// stores that single index in the overflow map instead of
    /// zero-filling a huge vector.
    pub fn set_element(&mut self, index: u32, value: Value, sparse_gap: u32) {
        let dense_len = self.elements.len() as u64;
        if (index as u64) < dense_len {
            self.elements[index as usize] = value;
        } else if (index as u64) <= dense_len + sparse_gap as u64 {
            self.elements
                .resize(index as usize, Value::Undefined);
            self.elements.push(value);
        } else {
            self.element_overflow.insert(index, value);
        }
        self.length = self.length.max(index.saturating_add(1));
    }

    /// Removes an element without changing the length.
    pub fn delete_element(&mut self, index: u32) {
        if (index as usize) < self.elements.len() {
            self.elements[index as usize] = Value::Undefined;
        } else {
            self.element_overflow.remove(&index);
        }
    }

    /// Returns the tracked array length.
    pub fn array_length(&self) -> u32 {
        self.length
    }

    /// Assigns the array length.
    ///
    /// Shrinking truncates the dense vector and purges overflow entries
    /// at or above the new length; growing just extends the observable
    /// range.
    pub fn set_length(&mut self, new_length: u32) {
        if (new_length as usize) < self.elements.len() {
            self.elements.truncate(new_length as usize);
        }
        self.element_overflow.retain(|&index, _| index < new_length);
        self.length = new_length;
    }

    /// Number of dense element slots in use (for tests and diagnostics).
    pub fn dense_element_count(&self) -> usize {
        self.elements.len()
    }

    /// Number of sparse overflow elements (for tests and diagnostics).
    pub fn sparse_element_count(&self) -> usize {
        self.element_overflow.len()
    }

    /// Visits every outgoing heap reference: the prototype link, all
    /// property slot values (including accessor pairs), and all elements.
    /// This is the traversal the collector marks through.
    pub fn trace(&self, visit: &mut dyn FnMut(ObjectId)) {
        if let Some(proto) = self.prototype {
            visit(proto);
        }
        for value in self.slots.iter().chain(self.slot_overflow.values()) {
            match value {
                PropertyValue::Data(v) => {
                    if let Some(id) = v.as_object() {
                        visit(id);
                    }
                }
                PropertyValue::Accessor { getter, setter } => {
                    if let Some(id) = getter.as_object() {
                        visit(id);
                    }
                    if let Some(id) = setter.as_object() {
                        visit(id);
                    }
                }
            }
        }
        for value in self.elements.iter().chain(self.element_overflow.values()) {
            if let Some(id) = value.as_object() {
                visit(id);
            }
        }
    }
}

impl std::fmt::Debug for JsObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsObject")
            .field("shape", &self.shape.id())
            .field("kind", &self.kind)
            .field("prototype", &self.prototype)
            .field("properties", &self.shape.property_count())
            .field("length", &self.length)
            .finish()
    }
}
