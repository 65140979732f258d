//! Query result data structures - Pure DOP
//!
//! NO METHODS. Just data.

use crate::geometry::Aabb;
use glam::DVec3;

/// Closest ray/surface intersection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlateIntercept {
    pub plate_id: i64,
    pub point: DVec3,
    /// Distance from the ray vertex to `point`
    pub distance: f64,
}

/// Closest surface point to a query point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestPlatePoint {
    pub plate_id: i64,
    pub point: DVec3,
    pub distance: f64,
}

/// Vertex and plate counts of a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlateModelCounts {
    pub vertex_count: usize,
    pub plate_count: usize,
}

/// Grid and list sizes of a segment's spatial index in one record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSummary {
    pub vertex_count: usize,
    pub plate_count: usize,
    pub total_voxels: usize,
    pub vertex_bounds: Aabb,
    pub voxel_origin: DVec3,
    pub voxel_size: f64,
    pub grid_extents: [u32; 3],
    pub coarse_scale: u32,
    pub voxel_pointer_size: usize,
    pub voxel_list_size: usize,
    pub vertex_list_size: usize,
}
