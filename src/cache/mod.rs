//! Segment-Relative Query Cache
//!
//! Keeps the last queried segment decoded so runs of queries against one
//! segment pay the fetch and decode once.

// Data structures
pub mod segment_cache_data;

// Pure functions
pub mod segment_cache_operations;

// Re-export data types
pub use segment_cache_data::{CacheSlot, CacheStats, SegmentCacheData, SharedSegmentCache};

// Re-export operations
pub use segment_cache_operations::{
    cache_stats, cached_segment, clear_cache, create_segment_cache, create_shared_segment_cache,
    current_identity, with_cached_segment,
};
