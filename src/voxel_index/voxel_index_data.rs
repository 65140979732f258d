//! Voxel grid spatial index data structures - Pure DOP
//!
//! NO METHODS. Just data.
//! All transformations happen in voxel_index_operations.rs

use crate::geometry::Aabb;
use glam::DVec3;

/// Fine voxel grid geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoxelGrid {
    pub origin: DVec3,
    /// Voxel edge length
    pub voxel_size: f64,
    /// Voxel counts along x, y, z; each a multiple of `coarse_scale`
    pub extents: [u32; 3],
    /// Coarse cell edge length in fine voxels
    pub coarse_scale: u32,
}

/// Typed spatial index record of one segment.
///
/// Correspondence lists are count-prefixed: a pointer names the 1-based
/// position of a count, and the plate IDs follow it in ascending order.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialIndexData {
    pub vertex_bounds: Aabb,
    pub grid: VoxelGrid,
    /// One entry per coarse cell, x-fastest. 0 marks an empty cell; otherwise
    /// the 1-based start of `coarse_scale^3` voxel pointers.
    pub coarse_pointers: Vec<i32>,
    /// Per fine voxel of every occupied coarse cell; -1 marks an empty voxel
    pub voxel_pointers: Vec<i32>,
    pub voxel_plate_list: Vec<i32>,
    /// One entry per vertex, -1 for a vertex no plate uses. Empty when the
    /// vertex-plate map was not built.
    pub vertex_pointers: Vec<i32>,
    pub vertex_plate_list: Vec<i32>,
}

/// Inclusive range of voxel indices a plate's bounding box covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlateVoxelRange {
    pub min: [u32; 3],
    pub max: [u32; 3],
}

/// Counts reported after a build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub total_voxels: usize,
    pub occupied_voxels: usize,
    pub occupied_coarse_cells: usize,
    /// Total (voxel, plate) insertions
    pub work_used: usize,
}
