//! Collection statistics.

use std::time::Duration;

/// Counters and timings accumulated across the collector's lifetime.
#[derive(Debug, Clone, Default)]
pub struct GcStats {
    /// Minor (young-generation) collections run.
    pub minor_collections: u64,
    /// Major (full) collections run.
    pub major_collections: u64,
    /// Bytes handed out by `register_object`.
    pub bytes_allocated: u64,
    /// Bytes reclaimed by sweeps and unregistration.
    pub bytes_freed: u64,
    /// Objects registered with the collector.
    pub objects_registered: u64,
    /// Objects swept as garbage.
    pub objects_swept: u64,
    /// Objects promoted young-to-old.
    pub objects_promoted: u64,
    /// Duration of the most recent collection.
    pub last_pause: Duration,
    /// Sum of all collection pauses.
    pub total_pause: Duration,
}

impl GcStats {
    /// Total collections of either kind.
    pub fn collections(&self) -> u64 {
        self.minor_collections + self.major_collections
    }

    /// Live-byte estimate: allocated minus freed.
    pub fn live_bytes(&self) -> u64 {
        self.bytes_allocated.saturating_sub(self.bytes_freed)
    }
}
