//! Voxel grid index operations - Pure DOP functions
//!
//! Builds the two-level voxel grid over a plate set and reads it back:
//! coarse cell -> fine voxel pointer -> count-prefixed plate list.

use super::voxel_index_data::{BuildStats, PlateVoxelRange, SpatialIndexData, VoxelGrid};
use crate::config::IndexConfig;
use crate::constants::builder_defaults::GRID_PAD_FRACTION;
use crate::constants::capacity::{MAX_COARSE_CELLS, MAX_VOXELS};
use crate::constants::spatial_index_layout::{EMPTY_POINTER, SPATIAL_INDEX_INT_FIXED_SIZE};
use crate::error::{CapacityBound, DskError, DskResult};
use crate::geometry::{aabb_extents, aabb_max_extent, triangle_aabb, Aabb};
use crate::plate_set::{plate_count, plate_triangle, vertex_bounds, vertex_count, PlateSetData};
use glam::DVec3;
use rayon::prelude::*;
use rustc_hash::FxHashMap;

// ============================================================================
// GRID ADDRESSING
// ============================================================================

/// Total number of fine voxels
pub fn total_voxels(grid: &VoxelGrid) -> usize {
    grid.extents.iter().map(|&n| n as usize).product()
}

/// Coarse cell counts along each axis
pub fn coarse_extents(grid: &VoxelGrid) -> [u32; 3] {
    grid.extents.map(|n| n / grid.coarse_scale)
}

/// Number of coarse cells
pub fn total_coarse_cells(grid: &VoxelGrid) -> usize {
    coarse_extents(grid).iter().map(|&n| n as usize).product()
}

/// x-fastest linear index of a fine voxel
pub fn voxel_linear_index(grid: &VoxelGrid, voxel: [u32; 3]) -> usize {
    let [nx, ny, _] = grid.extents.map(|n| n as usize);
    voxel[0] as usize + nx * (voxel[1] as usize + ny * voxel[2] as usize)
}

/// Inverse of [`voxel_linear_index`]
pub fn voxel_from_linear_index(grid: &VoxelGrid, linear: usize) -> [u32; 3] {
    let [nx, ny, _] = grid.extents.map(|n| n as usize);
    [
        (linear % nx) as u32,
        ((linear / nx) % ny) as u32,
        (linear / (nx * ny)) as u32,
    ]
}

/// Coarse cell linear index and offset of the voxel inside that cell
fn coarse_location(grid: &VoxelGrid, voxel: [u32; 3]) -> (usize, usize) {
    let cs = grid.coarse_scale;
    let [ncx, ncy, _] = coarse_extents(grid).map(|n| n as usize);
    let coarse = voxel.map(|v| (v / cs) as usize);
    let fine = voxel.map(|v| (v % cs) as usize);
    let cs = cs as usize;
    (
        coarse[0] + ncx * (coarse[1] + ncy * coarse[2]),
        fine[0] + cs * (fine[1] + cs * fine[2]),
    )
}

/// Box spanned by the whole grid
pub fn grid_bounds(grid: &VoxelGrid) -> Aabb {
    let span = DVec3::new(
        grid.extents[0] as f64,
        grid.extents[1] as f64,
        grid.extents[2] as f64,
    ) * grid.voxel_size;
    Aabb {
        min: grid.origin,
        max: grid.origin + span,
    }
}

/// Voxel coordinates of a point, unclamped
pub fn voxel_coordinates(grid: &VoxelGrid, point: DVec3) -> [i64; 3] {
    let scaled = (point - grid.origin) / grid.voxel_size;
    [
        scaled.x.floor() as i64,
        scaled.y.floor() as i64,
        scaled.z.floor() as i64,
    ]
}

/// Voxel containing a point, clamped onto the grid
pub fn clamp_to_grid(grid: &VoxelGrid, voxel: [i64; 3]) -> [u32; 3] {
    [0, 1, 2].map(|axis| voxel[axis].clamp(0, grid.extents[axis] as i64 - 1) as u32)
}

/// Voxel containing a point, `None` outside the grid
pub fn voxel_at_point(grid: &VoxelGrid, point: DVec3) -> Option<[u32; 3]> {
    let voxel = voxel_coordinates(grid, point);
    let inside = (0..3).all(|axis| voxel[axis] >= 0 && voxel[axis] < grid.extents[axis] as i64);
    inside.then(|| voxel.map(|v| v as u32))
}

fn range_of_bounds(grid: &VoxelGrid, bounds: &Aabb) -> PlateVoxelRange {
    PlateVoxelRange {
        min: clamp_to_grid(grid, voxel_coordinates(grid, bounds.min)),
        max: clamp_to_grid(grid, voxel_coordinates(grid, bounds.max)),
    }
}

fn range_volume(range: &PlateVoxelRange) -> usize {
    (0..3)
        .map(|axis| (range.max[axis] - range.min[axis]) as usize + 1)
        .product()
}

// ============================================================================
// BUILD
// ============================================================================

/// Choose the fine voxel grid for a plate set
pub fn compute_voxel_grid(plate_set: &PlateSetData, config: &IndexConfig) -> DskResult<VoxelGrid> {
    let bounds = vertex_bounds(plate_set)?;
    let extents = aabb_extents(&bounds);
    if extents.min_element() <= 0.0 {
        return Err(DskError::degenerate(format!(
            "vertex bounding box has a zero-length axis: extents {:?}",
            extents
        )));
    }

    let np = plate_count(plate_set);
    let fine_scale = config.resolved_fine_scale(np);
    if !fine_scale.is_finite() || fine_scale <= 0.0 {
        return Err(DskError::value_out_of_range("fine scale", fine_scale));
    }
    config.validate()?;

    let extent_sum: f64 = (0..np)
        .map(|idx| aabb_max_extent(&triangle_aabb(&plate_triangle(plate_set, idx))))
        .sum();
    let mean_extent = extent_sum / np as f64;
    if mean_extent <= 0.0 {
        return Err(DskError::degenerate("every plate collapses to a point"));
    }

    let voxel_size = fine_scale * mean_extent;
    let pad = GRID_PAD_FRACTION * voxel_size;
    let origin = bounds.min - DVec3::splat(pad);
    let cs = config.coarse_scale as u64;

    let mut counts = [0u64; 3];
    for axis in 0..3 {
        let raw = ((extents[axis] + 2.0 * pad) / voxel_size).ceil().max(1.0);
        if raw > MAX_VOXELS as f64 {
            return Err(DskError::capacity(
                CapacityBound::VoxelCount,
                raw as usize,
                MAX_VOXELS,
            ));
        }
        counts[axis] = (raw as u64).div_ceil(cs) * cs;
    }

    let total = counts.iter().product::<u64>();
    if total > MAX_VOXELS as u64 {
        return Err(DskError::capacity(
            CapacityBound::VoxelCount,
            total as usize,
            MAX_VOXELS,
        ));
    }
    let coarse_total = total / (cs * cs * cs);
    if coarse_total > MAX_COARSE_CELLS as u64 {
        return Err(DskError::capacity(
            CapacityBound::CoarseGrid,
            coarse_total as usize,
            MAX_COARSE_CELLS,
        ));
    }

    Ok(VoxelGrid {
        origin,
        voxel_size,
        extents: counts.map(|n| n as u32),
        coarse_scale: config.coarse_scale,
    })
}

/// Conservative voxel range of a plate (1-based ID)
pub fn plate_voxel_range(
    grid: &VoxelGrid,
    plate_set: &PlateSetData,
    plate_id: i64,
) -> DskResult<PlateVoxelRange> {
    let np = plate_count(plate_set) as i64;
    if plate_id < 1 || plate_id > np {
        return Err(DskError::index_out_of_range("plate ID", plate_id, 1, np));
    }
    let tri = plate_triangle(plate_set, (plate_id - 1) as usize);
    Ok(range_of_bounds(grid, &triangle_aabb(&tri)))
}

/// Build the spatial index of a plate set.
///
/// All-or-nothing: any capacity or geometry failure returns an error and no
/// partial record.
pub fn build_spatial_index(
    plate_set: &PlateSetData,
    config: &IndexConfig,
) -> DskResult<SpatialIndexData> {
    build_spatial_index_with_stats(plate_set, config).map(|(index, _)| index)
}

/// [`build_spatial_index`] that also reports build counts
pub fn build_spatial_index_with_stats(
    plate_set: &PlateSetData,
    config: &IndexConfig,
) -> DskResult<(SpatialIndexData, BuildStats)> {
    let grid = compute_voxel_grid(plate_set, config)?;
    let np = plate_count(plate_set);
    let nv = vertex_count(plate_set);

    log::info!(
        "[VoxelIndex] Building index for {} plates: voxel size {:.6}, extents {:?}, coarse scale {}",
        np,
        grid.voxel_size,
        grid.extents,
        grid.coarse_scale
    );

    // Bin plates into voxels
    let ranges: Vec<PlateVoxelRange> = (0..np)
        .into_par_iter()
        .map(|idx| range_of_bounds(&grid, &triangle_aabb(&plate_triangle(plate_set, idx))))
        .collect();

    let work_used: usize = ranges.iter().map(range_volume).sum();
    if work_used > config.work_size {
        return Err(DskError::capacity(
            CapacityBound::Workspace,
            work_used,
            config.work_size,
        ));
    }

    let mut bins: FxHashMap<usize, Vec<i32>> = FxHashMap::default();
    for (idx, range) in ranges.iter().enumerate() {
        let plate_id = idx as i32 + 1;
        for k in range.min[2]..=range.max[2] {
            for j in range.min[1]..=range.max[1] {
                for i in range.min[0]..=range.max[0] {
                    bins.entry(voxel_linear_index(&grid, [i, j, k]))
                        .or_default()
                        .push(plate_id);
                }
            }
        }
    }

    // Lay out occupied voxels in coarse-cell order
    let mut occupied: Vec<(usize, usize, usize)> = bins
        .keys()
        .map(|&linear| {
            let (coarse, fine) = coarse_location(&grid, voxel_from_linear_index(&grid, linear));
            (coarse, fine, linear)
        })
        .collect();
    occupied.sort_unstable();

    let cs3 = (grid.coarse_scale as usize).pow(3);
    let mut coarse_pointers = vec![0i32; total_coarse_cells(&grid)];
    let mut occupied_coarse_cells = 0usize;
    for &(coarse, _, _) in &occupied {
        if coarse_pointers[coarse] == 0 {
            coarse_pointers[coarse] = (occupied_coarse_cells * cs3 + 1) as i32;
            occupied_coarse_cells += 1;
        }
    }

    let voxel_pointer_size = occupied_coarse_cells * cs3;
    if voxel_pointer_size > config.voxel_pointer_capacity {
        return Err(DskError::capacity(
            CapacityBound::VoxelPointers,
            voxel_pointer_size,
            config.voxel_pointer_capacity,
        ));
    }

    let voxel_list_size = occupied.len() + work_used;
    if voxel_list_size > config.voxel_list_capacity {
        return Err(DskError::capacity(
            CapacityBound::VoxelPlateList,
            voxel_list_size,
            config.voxel_list_capacity,
        ));
    }

    // Vertex-plate correspondence
    let (vertex_pointers, vertex_plate_list) = if config.build_vertex_plate_map {
        build_vertex_plate_map(plate_set)
    } else {
        (Vec::new(), Vec::new())
    };

    let integer_size = SPATIAL_INDEX_INT_FIXED_SIZE
        + voxel_pointer_size
        + voxel_list_size
        + vertex_pointers.len()
        + vertex_plate_list.len();
    if integer_size > config.integer_capacity {
        return Err(DskError::capacity(
            CapacityBound::IntegerComponent,
            integer_size,
            config.integer_capacity,
        ));
    }

    let mut voxel_pointers = vec![EMPTY_POINTER; voxel_pointer_size];
    let mut voxel_plate_list = Vec::with_capacity(voxel_list_size);
    for &(coarse, fine, linear) in &occupied {
        let plates = &bins[&linear];
        let slot = (coarse_pointers[coarse] - 1) as usize + fine;
        voxel_pointers[slot] = voxel_plate_list.len() as i32 + 1;
        voxel_plate_list.push(plates.len() as i32);
        voxel_plate_list.extend_from_slice(plates);
    }

    let stats = BuildStats {
        total_voxels: total_voxels(&grid),
        occupied_voxels: occupied.len(),
        occupied_coarse_cells,
        work_used,
    };

    log::info!(
        "[VoxelIndex] Built index: {} of {} voxels occupied, {} coarse cells, list sizes {} / {} (nv {})",
        stats.occupied_voxels,
        stats.total_voxels,
        occupied_coarse_cells,
        voxel_plate_list.len(),
        vertex_plate_list.len(),
        nv
    );

    let index = SpatialIndexData {
        vertex_bounds: vertex_bounds(plate_set)?,
        grid,
        coarse_pointers,
        voxel_pointers,
        voxel_plate_list,
        vertex_pointers,
        vertex_plate_list,
    };
    Ok((index, stats))
}

/// Count-prefixed vertex -> plate lists, one pass over the plates
fn build_vertex_plate_map(plate_set: &PlateSetData) -> (Vec<i32>, Vec<i32>) {
    let nv = vertex_count(plate_set);
    let mut incident: Vec<Vec<i32>> = vec![Vec::new(); nv];
    for (idx, plate) in plate_set.plates.iter().enumerate() {
        let plate_id = idx as i32 + 1;
        for (corner, &vertex_id) in plate.iter().enumerate() {
            // A vertex repeated within one plate is listed once
            if plate[..corner].contains(&vertex_id) {
                continue;
            }
            incident[vertex_id as usize - 1].push(plate_id);
        }
    }

    let mut pointers = Vec::with_capacity(nv);
    let mut list = Vec::new();
    for plates in &incident {
        if plates.is_empty() {
            pointers.push(EMPTY_POINTER);
            continue;
        }
        pointers.push(list.len() as i32 + 1);
        list.push(plates.len() as i32);
        list.extend_from_slice(plates);
    }
    (pointers, list)
}

// ============================================================================
// LOOKUPS
// ============================================================================

/// Plate IDs of the count-prefixed entry at a 1-based pointer
fn list_entry(list: &[i32], pointer: i32) -> &[i32] {
    if pointer < 1 {
        return &[];
    }
    let start = pointer as usize;
    let count = list[start - 1] as usize;
    &list[start..start + count]
}

/// Plates binned into a fine voxel, ascending; empty for an empty voxel
pub fn voxel_plates(index: &SpatialIndexData, voxel: [u32; 3]) -> DskResult<&[i32]> {
    for axis in 0..3 {
        let n = index.grid.extents[axis] as i64;
        if voxel[axis] as i64 >= n {
            return Err(DskError::index_out_of_range(
                "voxel coordinate",
                voxel[axis] as i64,
                0,
                n - 1,
            ));
        }
    }

    let (coarse, fine) = coarse_location(&index.grid, voxel);
    let coarse_pointer = index.coarse_pointers[coarse];
    if coarse_pointer == 0 {
        return Ok(&[]);
    }
    let pointer = index.voxel_pointers[(coarse_pointer - 1) as usize + fine];
    Ok(list_entry(&index.voxel_plate_list, pointer))
}

/// [`voxel_plates`] by x-fastest linear voxel index
pub fn voxel_plates_at_linear(index: &SpatialIndexData, linear: i64) -> DskResult<&[i32]> {
    let total = total_voxels(&index.grid) as i64;
    if linear < 0 || linear >= total {
        return Err(DskError::index_out_of_range("voxel index", linear, 0, total - 1));
    }
    voxel_plates(index, voxel_from_linear_index(&index.grid, linear as usize))
}

/// Plates using a vertex (1-based ID) as a corner, ascending
pub fn vertex_plates(index: &SpatialIndexData, vertex_id: i64) -> DskResult<&[i32]> {
    let nv = index.vertex_pointers.len() as i64;
    if nv == 0 {
        return Err(DskError::invalid_input(
            "spatial index was built without a vertex-plate map",
        ));
    }
    if vertex_id < 1 || vertex_id > nv {
        return Err(DskError::index_out_of_range("vertex ID", vertex_id, 1, nv));
    }
    let pointer = index.vertex_pointers[(vertex_id - 1) as usize];
    Ok(list_entry(&index.vertex_plate_list, pointer))
}
