//! Voxel Grid Spatial Index
//!
//! Two-level voxel grid binning every plate of a plate set by bounding box,
//! plus the flat integer/double component form stored in segments.

// Data structures
pub mod voxel_index_data;

// Pure functions
pub mod spatial_index_codec;
pub mod voxel_index_operations;
pub mod voxel_walk;

// Re-export data types
pub use voxel_index_data::{BuildStats, PlateVoxelRange, SpatialIndexData, VoxelGrid};

// Re-export operations
pub use spatial_index_codec::{
    max_listed_plate, spatial_index_from_components, to_dp_component, to_int_component,
};
pub use voxel_index_operations::{
    build_spatial_index, build_spatial_index_with_stats, clamp_to_grid, coarse_extents,
    compute_voxel_grid, grid_bounds, plate_voxel_range, total_coarse_cells, total_voxels,
    vertex_plates, voxel_at_point, voxel_coordinates, voxel_from_linear_index,
    voxel_linear_index, voxel_plates, voxel_plates_at_linear,
};
pub use voxel_walk::{walk_voxels, VoxelStep, VoxelWalk};
