//! Segment cache data structures - Pure DOP
//!
//! NO METHODS. Just data.
//! All transformations happen in segment_cache_operations.rs

use crate::segment::{LoadedSegment, SegmentIdentity};
use parking_lot::Mutex;
use std::sync::Arc;

/// The single cache slot
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CacheSlot {
    #[default]
    Empty,
    Loaded {
        identity: SegmentIdentity,
        segment: LoadedSegment,
    },
}

/// Lookup counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Misses whose fetch or decode failed
    pub failed_loads: u64,
}

/// Holds at most one decoded segment, the last one queried
#[derive(Debug, Clone, Default)]
pub struct SegmentCacheData {
    pub slot: CacheSlot,
    pub stats: CacheStats,
}

/// Thread-safe cache; the lock spans check, rebuild and answer
pub type SharedSegmentCache = Arc<Mutex<SegmentCacheData>>;
