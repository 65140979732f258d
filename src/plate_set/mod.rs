//! Plate Set Store
//!
//! Owns the immutable vertex and plate arrays of one shape segment.

// Data structures
pub mod plate_set_data;
// Pure functions
pub mod plate_set_operations;
pub mod tessellation;

// Re-export data structures
pub use plate_set_data::*;
// Re-export operations
pub use plate_set_operations::*;
pub use tessellation::{box_plate_set, ellipsoid_plate_set, ellipsoid_tessellation_counts};
