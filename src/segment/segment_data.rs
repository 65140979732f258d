//! Segment data structures - Pure DOP
//!
//! NO METHODS. Just data.
//! All transformations happen in segment_operations.rs

use super::descriptor::DskDescriptor;
use crate::plate_set::PlateSetData;
use crate::voxel_index::SpatialIndexData;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle of an open container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContainerHandle(pub u32);

/// Location of a segment inside its container's address spaces.
///
/// Bases are 0-based element offsets into the container's integer, double
/// and character spaces. Two containers holding segments of equal size at
/// the same position produce equal descriptors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DlaDescriptor {
    pub int_base: usize,
    pub int_size: usize,
    pub dp_base: usize,
    pub dp_size: usize,
    pub char_base: usize,
    pub char_size: usize,
}

impl fmt::Display for DlaDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ints {}+{}, doubles {}+{}",
            self.int_base, self.int_size, self.dp_base, self.dp_size
        )
    }
}

/// Identity of a segment for caching: both fields must match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentIdentity {
    pub handle: ContainerHandle,
    pub dla: DlaDescriptor,
}

/// Raw integer and double arrays of one segment as stored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentComponents {
    pub ints: Vec<i32>,
    pub doubles: Vec<f64>,
}

/// Fully decoded segment, ready for queries
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSegment {
    pub descriptor: DskDescriptor,
    pub plate_set: PlateSetData,
    pub index: SpatialIndexData,
}
