//! Engine-wide constants
//!
//! Capacity limits for type 2 plate models, offsets of the flat spatial index
//! components, the DSK descriptor layout, and numeric tolerances used by the
//! query engine. Offsets are 0-based.

use static_assertions::const_assert;
use static_assertions::const_assert_eq;

/// DSK data type implemented by this crate
pub const DSK_TYPE_PLATE_MODEL: i32 = 2;

// ============================================================================
// PLATE MODEL CAPACITY LIMITS
// ============================================================================

pub mod capacity {
    /// Maximum number of vertices in a plate model
    pub const MAX_VERTICES: usize = 16_000_002;

    /// Maximum number of plates in a plate model
    pub const MAX_PLATES: usize = 2 * (MAX_VERTICES - 2);

    /// Maximum number of fine voxels in a voxel grid
    pub const MAX_VOXELS: usize = 100_000_000;

    /// Maximum number of coarse voxels; also the fixed size of the coarse
    /// pointer region of the integer spatial index component
    pub const MAX_COARSE_CELLS: usize = 100_000;
}

// ============================================================================
// SPATIAL INDEX FLAT LAYOUT
// ============================================================================

pub mod spatial_index_layout {
    use super::capacity::MAX_COARSE_CELLS;

    /// Voxel grid extents (3 integers)
    pub const SI_GRID_EXTENTS: usize = 0;
    /// Coarse voxel scale
    pub const SI_COARSE_SCALE: usize = SI_GRID_EXTENTS + 3;
    /// Size of the voxel pointer array
    pub const SI_VOXEL_PTR_SIZE: usize = SI_COARSE_SCALE + 1;
    /// Size of the voxel-plate list
    pub const SI_VOXEL_LIST_SIZE: usize = SI_VOXEL_PTR_SIZE + 1;
    /// Size of the vertex-plate list
    pub const SI_VERTEX_LIST_SIZE: usize = SI_VOXEL_LIST_SIZE + 1;
    /// Start of the coarse grid pointer region
    pub const SI_COARSE_GRID: usize = SI_VERTEX_LIST_SIZE + 1;
    /// Size of the fixed-size part of the integer component
    pub const SPATIAL_INDEX_INT_FIXED_SIZE: usize = SI_COARSE_GRID + MAX_COARSE_CELLS;

    /// Vertex bounds (xmin, xmax, ymin, ymax, zmin, zmax)
    pub const SI_VERTEX_BOUNDS: usize = 0;
    /// Voxel grid origin
    pub const SI_VOXEL_ORIGIN: usize = SI_VERTEX_BOUNDS + 6;
    /// Voxel edge length
    pub const SI_VOXEL_SIZE: usize = SI_VOXEL_ORIGIN + 3;
    /// Size of the double precision component
    pub const SPATIAL_INDEX_DP_FIXED_SIZE: usize = SI_VOXEL_SIZE + 1;

    /// Pointer value marking an empty voxel or an unused vertex
    pub const EMPTY_POINTER: i32 = -1;
}

// ============================================================================
// SEGMENT LAYOUT
// ============================================================================

pub mod segment_layout {
    /// Vertex count
    pub const IX_VERTEX_COUNT: usize = 0;
    /// Plate count
    pub const IX_PLATE_COUNT: usize = IX_VERTEX_COUNT + 1;
    /// Total voxel count
    pub const IX_TOTAL_VOXELS: usize = IX_PLATE_COUNT + 1;
    /// Voxel grid extents (3 integers)
    pub const IX_GRID_EXTENTS: usize = IX_TOTAL_VOXELS + 1;
    /// Coarse voxel scale
    pub const IX_COARSE_SCALE: usize = IX_GRID_EXTENTS + 3;
    /// Size of the voxel pointer array
    pub const IX_VOXEL_PTR_SIZE: usize = IX_COARSE_SCALE + 1;
    /// Size of the voxel-plate list
    pub const IX_VOXEL_LIST_SIZE: usize = IX_VOXEL_PTR_SIZE + 1;
    /// Size of the vertex-plate list
    pub const IX_VERTEX_LIST_SIZE: usize = IX_VOXEL_LIST_SIZE + 1;
    /// First element of the plate array; everything after it has variable size
    pub const IX_PLATES: usize = IX_VERTEX_LIST_SIZE + 1;

    /// DSK descriptor
    pub const DX_DESCRIPTOR: usize = 0;
    /// Vertex bounds
    pub const DX_VERTEX_BOUNDS: usize = DX_DESCRIPTOR + super::descriptor_layout::DSK_DESCRIPTOR_SIZE;
    /// Voxel grid origin
    pub const DX_VOXEL_ORIGIN: usize = DX_VERTEX_BOUNDS + 6;
    /// Voxel edge length
    pub const DX_VOXEL_SIZE: usize = DX_VOXEL_ORIGIN + 3;
    /// First element of the vertex array
    pub const DX_VERTICES: usize = DX_VOXEL_SIZE + 1;
}

// ============================================================================
// DSK DESCRIPTOR LAYOUT
// ============================================================================

pub mod descriptor_layout {
    pub const SRFIDX: usize = 0;
    pub const CTRIDX: usize = SRFIDX + 1;
    pub const CLSIDX: usize = CTRIDX + 1;
    pub const TYPIDX: usize = CLSIDX + 1;
    pub const FRMIDX: usize = TYPIDX + 1;
    pub const SYSIDX: usize = FRMIDX + 1;
    pub const PARIDX: usize = SYSIDX + 1;
    /// Number of coordinate system parameters
    pub const NSYPAR: usize = 10;
    pub const MN1IDX: usize = PARIDX + NSYPAR;
    pub const MX1IDX: usize = MN1IDX + 1;
    pub const MN2IDX: usize = MX1IDX + 1;
    pub const MX2IDX: usize = MN2IDX + 1;
    pub const MN3IDX: usize = MX2IDX + 1;
    pub const MX3IDX: usize = MN3IDX + 1;
    pub const BTMIDX: usize = MX3IDX + 1;
    pub const ETMIDX: usize = BTMIDX + 1;
    /// Number of elements in a DSK descriptor
    pub const DSK_DESCRIPTOR_SIZE: usize = ETMIDX + 1;
}

// ============================================================================
// BUILDER DEFAULTS
// ============================================================================

pub mod builder_defaults {
    /// Coarse scale used when a config does not name one
    pub const DEFAULT_COARSE_SCALE: u32 = 10;
    pub const DEFAULT_WORK_SIZE: usize = 1_000_000;
    pub const DEFAULT_VOXEL_POINTER_CAPACITY: usize = 100_000;
    pub const DEFAULT_VOXEL_LIST_CAPACITY: usize = 200_000;
    pub const DEFAULT_INTEGER_CAPACITY: usize = 1_000_000;

    /// Fraction of a voxel edge added around the vertex bounds
    pub const GRID_PAD_FRACTION: f64 = 1.0e-3;
}

// ============================================================================
// QUERY TOLERANCES
// ============================================================================

pub mod tolerances {
    /// Relative slack on barycentric coordinates so points on a shared edge
    /// are accepted by both plates; the lower plate ID then wins
    pub const EDGE_EPSILON: f64 = 1.0e-10;

    /// Relative tolerance for treating two ray parameters or distances as equal
    pub const TIE_TOLERANCE: f64 = 1.0e-12;
}

const_assert_eq!(descriptor_layout::DSK_DESCRIPTOR_SIZE, 24);
const_assert_eq!(spatial_index_layout::SPATIAL_INDEX_DP_FIXED_SIZE, 10);
const_assert_eq!(
    spatial_index_layout::SPATIAL_INDEX_INT_FIXED_SIZE,
    capacity::MAX_COARSE_CELLS + 7
);
const_assert_eq!(segment_layout::IX_PLATES, 10);
const_assert!(capacity::MAX_COARSE_CELLS <= capacity::MAX_VOXELS);
