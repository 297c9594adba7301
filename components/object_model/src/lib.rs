//! Object model - shapes, property storage, and inline caches
//!
//! This component provides:
//! - Shapes (hidden classes) with a transition graph for structural sharing
//! - A process-wide shape cache owning transitions and canonical layouts
//! - Object property storage (inline slots, overflow map, dense elements)
//! - The object store mapping handles to objects and walking prototype chains
//! - Inline / polymorphic inline caches for per-call-site property access

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod inline_cache;
pub mod object;
pub mod property;
pub mod shape;
pub mod shape_cache;
pub mod store;

pub use inline_cache::{CacheEntry, CacheStats, InlineCache, PropertyCache, MAX_POLYMORPHIC_ENTRIES};
pub use object::{JsObject, ObjectKind};
pub use property::{
    PropertyAttributes, PropertyInfo, PropertyKey, PropertyValue, SlotKind, ValueHint,
};
pub use shape::{Shape, ShapeId, Transition};
pub use shape_cache::ShapeCache;
pub use store::{LayoutConfig, ObjectStore, PropertyLookup};
