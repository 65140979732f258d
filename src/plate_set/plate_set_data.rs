//! Plate set data structures - Pure DOP
//!
//! NO METHODS. Just data.
//! All transformations happen in plate_set_operations.rs

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Immutable vertex and plate arrays of one shape segment.
///
/// Vertex and plate IDs are 1-based externally; index `id - 1` here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateSetData {
    pub vertices: Vec<DVec3>,
    /// Each plate as three 1-based vertex IDs, in winding order
    pub plates: Vec<[u32; 3]>,
}

/// Min and max of the third coordinate of a segment's coverage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateRange {
    pub min: f64,
    pub max: f64,
}
