//! Object store: handle-to-object mapping and property access paths.
//!
//! The store owns every live object and resolves all property operations:
//! shape-table lookups, prototype chain walks, shape transitions on
//! writes, and the dense/sparse element paths. Other subsystems touch
//! object state only through these entry points.

use crate::object::{JsObject, ObjectKind};
use crate::property::{
    PropertyAttributes, PropertyKey, PropertyValue, ValueHint,
};
use crate::shape_cache::ShapeCache;
use core_types::{ObjectId, StructuralError, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Tunable layout parameters of the object model.
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Property slots stored inline before spilling to the overflow map.
    pub inline_slot_budget: usize,
    /// Upper bound on prototype chain walks. Chains deeper than this are
    /// a configuration error, not a runtime condition, so the walk just
    /// stops.
    pub max_prototype_depth: usize,
    /// An element write more than this far past the dense length goes to
    /// sparse overflow storage for that single index.
    pub sparse_element_gap: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            inline_slot_budget: 8,
            max_prototype_depth: 16,
            sparse_element_gap: 1024,
        }
    }
}

/// Result of a descriptor-aware property lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyLookup {
    /// No own or inherited property.
    NotFound,
    /// A data property with its value.
    Data(Value),
    /// An accessor property; the caller dispatches the getter/setter.
    Accessor {
        /// Getter object, or undefined.
        getter: Value,
        /// Setter object, or undefined.
        setter: Value,
    },
}

/// Owner of all live objects, keyed by [`ObjectId`].
///
/// The store holds the shape cache handle and performs every property
/// and element operation defined by the object model.
pub struct ObjectStore {
    objects: HashMap<ObjectId, JsObject>,
    next_id: u64,
    shapes: Arc<ShapeCache>,
    config: LayoutConfig,
}

impl ObjectStore {
    /// Creates a store with default layout parameters.
    pub fn new(shapes: Arc<ShapeCache>) -> Self {
        Self::with_config(shapes, LayoutConfig::default())
    }

    /// Creates a store with explicit layout parameters.
    pub fn with_config(shapes: Arc<ShapeCache>, config: LayoutConfig) -> Self {
        ObjectStore {
            objects: HashMap::new(),
            next_id: 0,
            shapes,
            config,
        }
    }

    /// Returns the shared shape cache.
    pub fn shapes(&self) -> &Arc<ShapeCache> {
        &self.shapes
    }

    /// Returns the layout configuration.
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// True if the store holds no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// True if `id` refers to a live object.
    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    /// Snapshot of all live object ids.
    pub fn ids(&self) -> Vec<ObjectId> {
        self.objects.keys().copied().collect()
    }

    fn issue_id(&mut self) -> ObjectId {
        let id = ObjectId::new(self.next_id);
        self.next_id += 1;
        id
    }

    fn insert(&mut self, object: JsObject) -> ObjectId {
        let id = self.issue_id();
        self.objects.insert(id, object);
        id
    }

    /// Creates an ordinary object with the empty shape.
    pub fn create_object(&mut self, prototype: Option<ObjectId>) -> ObjectId {
        let object = JsObject::new(
            self.shapes.root(),
            prototype,
            ObjectKind::Plain,
            self.config.inline_slot_budget,
        );
        self.insert(object)
    }

    /// Creates an array object with the canonical array shape. The
    /// `length` slot mirrors the tracked element length.
    pub fn create_array(&mut self, prototype: Option<ObjectId>) -> ObjectId {
        let mut object = JsObject::new(
            self.shapes.array_shape(),
            prototype,
            ObjectKind::Array,
            self.config.inline_slot_budget,
        );
        object.set_slot(0, PropertyValue::Data(Value::Smi(0)));
        self.insert(object)
    }

    /// Creates a function object with the canonical function shape.
    pub fn create_function(&mut self, prototype: Option<ObjectId>) -> ObjectId {
        let shape = self.shapes.function_shape();
        let mut object = JsObject::new(
            shape,
            prototype,
            ObjectKind::Function,
            self.config.inline_slot_budget,
        );
        object.set_slot(0, PropertyValue::Data(Value::String(String::new())));
        object.set_slot(1, PropertyValue::Data(Value::Smi(0)));
        object.set_slot(2, PropertyValue::Data(Value::Undefined));
        self.insert(object)
    }

    /// Creates an object with the canonical shape for a known property
    /// name list, all slots initialized to undefined.
    pub fn create_with_class(
        &mut self,
        names: &[&str],
        prototype: Option<ObjectId>,
    ) -> ObjectId {
        let shape = self.shapes.get_or_create_class(names);
        let mut object = JsObject::new(
            shape,
            prototype,
            ObjectKind::Plain,
            self.config.inline_slot_budget,
        );
        for slot in 0..names.len() as u32 {
            object.set_slot(slot, PropertyValue::Data(Value::Undefined));
        }
        self.insert(object)
    }

    /// Removes an object from the store. Returns false if it was absent.
    pub fn destroy(&mut self, id: ObjectId) -> bool {
        self.objects.remove(&id).is_some()
    }

    /// Returns the object behind `id`.
    pub fn get(&self, id: ObjectId) -> Option<&JsObject> {
        self.objects.get(&id)
    }

    /// Returns the object behind `id`, mutably.
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut JsObject> {
        self.objects.get_mut(&id)
    }

    /// Reads a property, walking the prototype chain on own-object miss.
    ///
    /// Index keys route to the element path. An exhausted lookup yields
    /// the undefined sentinel. Accessor hits yield the stored getter;
    /// invoking it is the interpreter's job.
    pub fn get_property(&self, id: ObjectId, key: &PropertyKey) -> Value {
        match self.lookup_property(id, key) {
            PropertyLookup::NotFound => Value::Undefined,
            PropertyLookup::Data(value) => value,
            PropertyLookup::Accessor { getter, .. } => getter,
        }
    }

    /// Descriptor-aware property lookup along the prototype chain.
    pub fn lookup_property(&self, id: ObjectId, key: &PropertyKey) -> PropertyLookup {
        let mut current = Some(id);
        // Bounded walk: prototype cycles are a configuration error.
        for _ in 0..=self.config.max_prototype_depth {
            let object = match current.and_then(|id| self.objects.get(&id)) {
                Some(object) => object,
                None => return PropertyLookup::NotFound,
            };
            match key {
                PropertyKey::Index(index) => {
                    if object.has_element(*index) {
                        return PropertyLookup::Data(object.element(*index));
                    }
                }
                PropertyKey::Name(name) => {
                    if let Some(info) = object.shape().get_property_info(name) {
                        match object.slot(info.slot) {
                            Some(PropertyValue::Data(value)) => {
                                return PropertyLookup::Data(value.clone());
                            }
                            Some(PropertyValue::Accessor { getter, setter }) => {
                                return PropertyLookup::Accessor {
                                    getter: getter.clone(),
                                    setter: setter.clone(),
                                };
                            }
                            None => return PropertyLookup::Data(Value::Undefined),
                        }
                    }
                }
            }
            current = object.prototype();
        }
        PropertyLookup::NotFound
    }

    /// Writes a property on the object itself.
    ///
    /// An existing writable data slot is stored in place with no
    /// transition. An absent property transitions the shape and appends
    /// the value at the new slot. Returns false when the write is
    /// refused (non-writable property, invalid key, unknown object).
    ///
    /// Accessor-kind properties are left untouched and report success;
    /// dispatching the setter is the caller's job. Reference values
    /// stored here must be followed by a GC write barrier before the
    /// next collection becomes observable; the heap facade in the memory
    /// manager does that automatically.
    pub fn set_property(
        &mut self,
        id: ObjectId,
        key: &PropertyKey,
        value: Value,
        attributes: PropertyAttributes,
    ) -> bool {
        if !key.is_valid() {
            return false;
        }
        match key {
            PropertyKey::Index(index) => self.set_element(id, *index, value),
            PropertyKey::Name(name) => {
                if !self.objects.contains_key(&id) {
                    return false;
                }
                // Array length assignment routes through the checked path.
                if name == "length"
                    && self.objects[&id].kind() == ObjectKind::Array
                {
                    let requested = match value {
                        Value::Smi(n) => n as f64,
                        Value::Double(d) => d,
                        _ => return false,
                    };
                    return self.set_array_length(id, requested).is_ok();
                }

                let existing = self.objects[&id].shape().get_property_info(name);
                match existing {
                    Some(info) => {
                        if info.attributes.is_accessor() {
                            return true;
                        }
                        if !info.attributes.is_writable() {
                            return false;
                        }
                        let object = self.objects.get_mut(&id).expect("checked above");
                        object.set_slot(info.slot, PropertyValue::Data(value));
                        true
                    }
                    None => {
                        let hint = ValueHint::of(&value);
                        let old_shape = Arc::clone(self.objects[&id].shape());
                        let new_shape =
                            self.shapes.add_property(&old_shape, name, attributes, hint);
                        let info = new_shape
                            .peek_property_info(name)
                            .expect("transition target has the property");
                        let object = self.objects.get_mut(&id).expect("checked above");
                        object.set_shape(new_shape);
                        object.set_slot(info.slot, PropertyValue::Data(value));
                        true
                    }
                }
            }
        }
    }

    /// Installs a property descriptor directly, including accessors.
    ///
    /// Refuses redefinition of non-configurable properties (except a
    /// plain value update on a writable, non-configurable data property
    /// with unchanged attributes).
    pub fn define_property(
        &mut self,
        id: ObjectId,
        key: &PropertyKey,
        value: PropertyValue,
        attributes: PropertyAttributes,
    ) -> Result<(), StructuralError> {
        if !key.is_valid() {
            let raw = match key {
                PropertyKey::Name(name) => name.clone(),
                PropertyKey::Index(index) => index.to_string(),
            };
            return Err(StructuralError::InvalidKey(raw));
        }
        let name = match key {
            PropertyKey::Name(name) => name.clone(),
            PropertyKey::Index(index) => {
                // Elements carry no descriptors; only data values land here.
                return match value {
                    PropertyValue::Data(v) => {
                        if self.set_element(id, *index, v) {
                            Ok(())
                        } else {
                            Err(StructuralError::UnknownObject(id))
                        }
                    }
                    PropertyValue::Accessor { .. } => {
                        Err(StructuralError::InvalidKey(index.to_string()))
                    }
                };
            }
        };
        if !self.objects.contains_key(&id) {
            return Err(StructuralError::UnknownObject(id));
        }

        let existing = self.objects[&id].shape().peek_property_info(&name);
        if let Some(info) = &existing {
            if !info.attributes.is_configurable() {
                let same_shape_entry = info.attributes == attributes;
                let plain_value_update = same_shape_entry
                    && info.attributes.is_writable()
                    && value.kind() == crate::property::SlotKind::Data;
                if !plain_value_update {
                    return Err(StructuralError::NotConfigurable(name));
                }
            }
        }

        let old_shape = Arc::clone(self.objects[&id].shape());
        let new_shape = self
            .shapes
            .add_property(&old_shape, &name, attributes, ValueHint::Any);
        let info = new_shape
            .peek_property_info(&name)
            .expect("transition target has the property");
        let object = self.objects.get_mut(&id).expect("checked above");
        object.set_shape(new_shape);
        object.set_slot(info.slot, value);
        Ok(())
    }

    /// Deletes a property.
    ///
    /// Returns false only when an existing property is non-configurable.
    /// Deleting an absent property succeeds; deleting an element clears
    /// the index without changing the length.
    pub fn delete_property(&mut self, id: ObjectId, key: &PropertyKey) -> bool {
        match key {
            PropertyKey::Index(index) => {
                if let Some(object) = self.objects.get_mut(&id) {
                    object.delete_element(*index);
                }
                true
            }
            PropertyKey::Name(name) => {
                let info = match self
                    .objects
                    .get(&id)
                    .and_then(|object| object.shape().peek_property_info(name))
                {
                    Some(info) => info,
                    None => return true,
                };
                if !info.attributes.is_configurable() {
                    return false;
                }

                let old_shape = Arc::clone(self.objects[&id].shape());
                let new_shape = self.shapes.remove_property(&old_shape, name);

                // Rebind surviving values by name against the renumbered table.
                let object = self.objects.get_mut(&id).expect("checked above");
                let mut values = Vec::with_capacity(new_shape.property_count() as usize);
                for entry in new_shape.entries_snapshot() {
                    let old_slot = old_shape
                        .peek_property_info(&entry.name)
                        .expect("surviving property existed before the transition")
                        .slot;
                    let value = object
                        .slot(old_slot)
                        .cloned()
                        .unwrap_or(PropertyValue::Data(Value::Undefined));
                    values.push((entry.slot, value));
                }
                object.set_shape(new_shape);
                object.replace_slots(values);
                true
            }
        }
    }

    /// Reads an element, walking the prototype chain on own miss.
    pub fn get_element(&self, id: ObjectId, index: u32) -> Value {
        self.get_property(id, &PropertyKey::Index(index))
    }

    /// Writes an element on the object itself.
    pub fn set_element(&mut self, id: ObjectId, index: u32, value: Value) -> bool {
        let sparse_gap = self.config.sparse_element_gap;
        let object = match self.objects.get_mut(&id) {
            Some(object) => object,
            None => return false,
        };
        object.set_element(index, value, sparse_gap);
        if object.kind() == ObjectKind::Array {
            let length = object.array_length();
            object.set_slot(0, PropertyValue::Data(length_value(length)));
        }
        true
    }

    /// Assigns an array's length.
    ///
    /// Fails on non-integral, negative, or > 2^32 - 1 lengths; the value
    /// is reported, never silently clamped.
    pub fn set_array_length(
        &mut self,
        id: ObjectId,
        new_length: f64,
    ) -> Result<(), StructuralError> {
        if !new_length.is_finite()
            || new_length.fract() != 0.0
            || new_length < 0.0
            || new_length > u32::MAX as f64
        {
            return Err(StructuralError::InvalidArrayLength(new_length));
        }
        let object = self
            .objects
            .get_mut(&id)
            .ok_or(StructuralError::UnknownObject(id))?;
        let new_length = new_length as u32;
        object.set_length(new_length);
        if object.kind() == ObjectKind::Array {
            object.set_slot(0, PropertyValue::Data(length_value(new_length)));
        }
        Ok(())
    }

    /// Returns the tracked array length.
    pub fn array_length(&self, id: ObjectId) -> u32 {
        self.objects
            .get(&id)
            .map(|object| object.array_length())
            .unwrap_or(0)
    }

    /// Visits every outgoing reference of `id` (see [`JsObject::trace`]).
    pub fn trace(&self, id: ObjectId, visit: &mut dyn FnMut(ObjectId)) {
        if let Some(object) = self.objects.get(&id) {
            object.trace(visit);
        }
    }
}

/// Length as a value: Smi when it fits, Double past i32::MAX.
fn length_value(length: u32) -> Value {
    if length <= i32::MAX as u32 {
        Value::Smi(length as i32)
    } else {
        Value::Double(length as f64)
    }
}
