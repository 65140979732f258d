// DSK Engine - Data-Oriented Programming (DOP) Architecture
//
// Voxel-grid spatial index for DSK type 2 plate models: build the index,
// store segments in containers, and answer keyword, ray and point queries
// through a segment-relative cache.
//
// For new code, prefer:
// - *_data modules for plain data
// - *_operations modules for transformations
// - Pure functions over methods

// Constants module
pub mod constants;

// Core modules
pub mod config;
pub mod error;

// Geometry and plate models
pub mod geometry;
pub mod plate_set;

// Spatial index
pub mod voxel_index;

// Segments and storage
pub mod segment;
pub mod storage;

// Queries
pub mod cache;
pub mod query;

pub use config::{load_index_config, parse_index_config, IndexConfig};
pub use error::{CapacityBound, DskError, DskResult, ErrorContext, OptionExt};

// === Core Types ===
pub use cache::{create_segment_cache, create_shared_segment_cache, SegmentCacheData, SharedSegmentCache};
pub use plate_set::{create_plate_set, PlateSetData};
pub use query::{Keyword, NearestPlatePoint, PlateIntercept, QueryExecutor};
pub use segment::{
    ContainerHandle, CoordinateSystem, DataClass, DlaDescriptor, DskDescriptor, SegmentIdentity,
};
pub use storage::{create_container, create_container_store, write_segment, ContainerStoreData, SegmentSource};
pub use voxel_index::{build_spatial_index, SpatialIndexData, VoxelGrid};

// Re-export glam so callers build vertices with the same vector type
pub use glam;
