//! Container Storage
//!
//! Handle-addressed containers of DSK segments, in memory and on disk.

// Data structures
pub mod container_data;

// Pure functions
pub mod container_operations;

// Re-export data types
pub use container_data::{ContainerData, ContainerStoreData};

// Re-export operations
pub use container_operations::{
    close_container, create_container, create_container_store, fetch_components, first_segment,
    next_segment, open_container, save_container, segment_identities, write_segment,
    SegmentSource,
};
