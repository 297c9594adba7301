//! Garbage collector configuration.
//!
//! All sizes and thresholds are tunable; the defaults match the region
//! sizing the rest of the engine was measured with.

use std::time::Duration;

/// How collections are initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionMode {
    /// Only explicit `collect`/`force_collect` calls run; the background
    /// thread stays idle. Allocation still collects on region exhaustion.
    Manual,
    /// Trigger-ratio collections on allocation plus the background timer.
    Automatic,
    /// Like automatic, but the background thread runs a minor collection
    /// every tick to spread work instead of waiting for the ratio.
    Incremental,
}

/// Configuration for the generational collector.
#[derive(Debug, Clone)]
pub struct GcConfig {
    /// Young generation region size in bytes.
    pub young_size: usize,
    /// Old generation region size in bytes.
    pub old_size: usize,
    /// Permanent region size in bytes.
    pub permanent_size: usize,
    /// Minor-collection survivals before promotion to the old generation.
    pub promotion_age: u8,
    /// Young occupancy ratio that makes `should_trigger_minor` fire.
    pub minor_trigger_ratio: f64,
    /// Old occupancy ratio that makes `should_trigger_major` fire.
    pub major_trigger_ratio: f64,
    /// Young occupancy ratio past which every minor survivor is promoted
    /// regardless of age.
    pub pressure_ratio: f64,
    /// Collection initiation mode.
    pub mode: CollectionMode,
    /// Background collector tick interval.
    pub background_interval: Duration,
}

/// Default young generation size (1MB)
const YOUNG_SIZE: usize = 1024 * 1024;
/// Default old generation size (4MB)
const OLD_SIZE: usize = 4 * 1024 * 1024;
/// Default permanent region size (1MB)
const PERMANENT_SIZE: usize = 1024 * 1024;

impl Default for GcConfig {
    fn default() -> Self {
        GcConfig {
            young_size: YOUNG_SIZE,
            old_size: OLD_SIZE,
            permanent_size: PERMANENT_SIZE,
            promotion_age: 3,
            minor_trigger_ratio: 0.75,
            major_trigger_ratio: 0.9,
            pressure_ratio: 0.85,
            mode: CollectionMode::Automatic,
            background_interval: Duration::from_millis(50),
        }
    }
}

impl GcConfig {
    /// A tiny-heap configuration for tests that want to exercise
    /// collection triggers without allocating megabytes.
    pub fn small(young: usize, old: usize) -> Self {
        GcConfig {
            young_size: young,
            old_size: old,
            permanent_size: young,
            ..Default::default()
        }
    }
}
