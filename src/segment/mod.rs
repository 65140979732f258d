//! DSK Type 2 Segments
//!
//! Descriptor, identity and the integer/double array layout of one plate
//! model segment.

pub mod descriptor;

// Data structures
pub mod segment_data;

// Pure functions
pub mod segment_operations;

// Re-export data types
pub use descriptor::{CoordinateSystem, DataClass, DskDescriptor};
pub use segment_data::{
    ContainerHandle, DlaDescriptor, LoadedSegment, SegmentComponents, SegmentIdentity,
};

// Re-export operations
pub use descriptor::{descriptor_from_array, descriptor_to_array, validate_descriptor};
pub use segment_operations::{decode_segment, encode_segment};
