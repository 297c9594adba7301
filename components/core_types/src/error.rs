//! Error taxonomy of the runtime core.
//!
//! Two classes of failure exist in the core:
//!
//! - [`StructuralError`] - property-level failures. Local and recoverable:
//!   the caller decides what to do (typically throw a language-level
//!   exception).
//! - [`MemoryError`] - allocation and heap-integrity failures. Not
//!   recovered locally: surfaced to the embedding engine, which decides
//!   whether to abort execution.

use crate::ObjectId;
use thiserror::Error;

/// Recoverable property-level failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StructuralError {
    /// The property key is not a valid name or array index.
    #[error("invalid property key: {0:?}")]
    InvalidKey(String),

    /// Delete or redefine refused on a non-configurable property.
    #[error("property {0:?} is not configurable")]
    NotConfigurable(String),

    /// Assignment refused on a non-writable data property.
    #[error("property {0:?} is not writable")]
    NotWritable(String),

    /// Array length assignment with a non-integral, negative, or
    /// out-of-range value.
    #[error("invalid array length: {0}")]
    InvalidArrayLength(f64),

    /// The referenced object does not exist in the store.
    #[error("unknown object {0}")]
    UnknownObject(ObjectId),
}

/// Fatal allocation and heap-integrity failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// Allocation could not be satisfied even after a forced collection.
    #[error("out of memory: {requested} bytes requested from the {generation} generation")]
    OutOfMemory {
        /// Bytes the failed allocation asked for.
        requested: usize,
        /// Generation name the allocation targeted.
        generation: &'static str,
    },

    /// An internal heap invariant was violated. Collection halts once
    /// this has been observed.
    #[error("heap integrity violation: {0}")]
    IntegrityViolation(String),
}
