//! Segment operations - Pure DOP functions
//!
//! A type 2 segment stores, in its integer space, the counts, grid header,
//! plates and correspondence arrays; in its double space, the descriptor,
//! vertex bounds, voxel origin and size, then the vertices.

use super::descriptor::{descriptor_from_array, descriptor_to_array, validate_descriptor, DskDescriptor};
use super::segment_data::{LoadedSegment, SegmentComponents};
use crate::constants::descriptor_layout::DSK_DESCRIPTOR_SIZE;
use crate::constants::segment_layout::*;
use crate::constants::spatial_index_layout::{
    SI_COARSE_GRID, SPATIAL_INDEX_DP_FIXED_SIZE, SPATIAL_INDEX_INT_FIXED_SIZE,
};
use crate::error::{DskError, DskResult};
use crate::plate_set::{create_plate_set, plate_count, vertex_count, PlateSetData};
use crate::voxel_index::{
    max_listed_plate, spatial_index_from_components, to_dp_component, total_voxels,
    SpatialIndexData,
};
use glam::DVec3;

// ============================================================================
// ENCODE
// ============================================================================

/// Lay out a segment's arrays. The plate set and index must belong together.
pub fn encode_segment(
    descriptor: &DskDescriptor,
    plate_set: &PlateSetData,
    index: &SpatialIndexData,
) -> DskResult<SegmentComponents> {
    validate_descriptor(descriptor)?;

    let nv = vertex_count(plate_set);
    let np = plate_count(plate_set);
    if !index.vertex_pointers.is_empty() && index.vertex_pointers.len() != nv {
        return Err(DskError::invalid_input(format!(
            "spatial index maps {} vertices, plate set has {}",
            index.vertex_pointers.len(),
            nv
        )));
    }
    let max_plate = max_listed_plate(index);
    if max_plate as usize > np {
        return Err(DskError::index_out_of_range(
            "indexed plate ID",
            max_plate as i64,
            1,
            np as i64,
        ));
    }

    let int_size = IX_PLATES
        + 3 * np
        + index.voxel_pointers.len()
        + index.voxel_plate_list.len()
        + index.vertex_pointers.len()
        + index.vertex_plate_list.len()
        + index.coarse_pointers.len();
    let mut ints = Vec::with_capacity(int_size);
    ints.push(nv as i32);
    ints.push(np as i32);
    ints.push(total_voxels(&index.grid) as i32);
    ints.extend(index.grid.extents.iter().map(|&n| n as i32));
    ints.push(index.grid.coarse_scale as i32);
    ints.push(index.voxel_pointers.len() as i32);
    ints.push(index.voxel_plate_list.len() as i32);
    ints.push(index.vertex_plate_list.len() as i32);
    debug_assert_eq!(ints.len(), IX_PLATES);

    ints.extend(plate_set.plates.iter().flatten().map(|&id| id as i32));
    ints.extend_from_slice(&index.voxel_pointers);
    ints.extend_from_slice(&index.voxel_plate_list);
    ints.extend_from_slice(&index.vertex_pointers);
    ints.extend_from_slice(&index.vertex_plate_list);
    ints.extend_from_slice(&index.coarse_pointers);

    let mut doubles = Vec::with_capacity(DX_VERTICES + 3 * nv);
    doubles.extend_from_slice(&descriptor_to_array(descriptor));
    doubles.extend(to_dp_component(index));
    debug_assert_eq!(doubles.len(), DX_VERTICES);
    doubles.extend(plate_set.vertices.iter().flat_map(|v| v.to_array()));

    Ok(SegmentComponents { ints, doubles })
}

// ============================================================================
// DECODE
// ============================================================================

fn count_at(ints: &[i32], offset: usize, what: &str) -> DskResult<usize> {
    let value = ints[offset];
    if value < 0 {
        return Err(DskError::malformed(format!("segment {} is negative: {}", what, value)));
    }
    Ok(value as usize)
}

/// Rebuild the descriptor, plate set and spatial index of a stored segment
pub fn decode_segment(components: &SegmentComponents) -> DskResult<LoadedSegment> {
    let ints = components.ints.as_slice();
    let doubles = components.doubles.as_slice();
    if ints.len() < IX_PLATES || doubles.len() < DX_VERTICES {
        return Err(DskError::malformed(format!(
            "segment holds {} integers and {} doubles, too few for its header",
            ints.len(),
            doubles.len()
        )));
    }

    let nv = count_at(ints, IX_VERTEX_COUNT, "vertex count")?;
    let np = count_at(ints, IX_PLATE_COUNT, "plate count")?;
    let total = count_at(ints, IX_TOTAL_VOXELS, "total voxel count")?;
    let voxel_pointer_size = count_at(ints, IX_VOXEL_PTR_SIZE, "voxel pointer size")?;
    let voxel_list_size = count_at(ints, IX_VOXEL_LIST_SIZE, "voxel-plate list size")?;
    let vertex_list_size = count_at(ints, IX_VERTEX_LIST_SIZE, "vertex-plate list size")?;
    let vertex_pointer_size = if vertex_list_size > 0 { nv } else { 0 };

    if doubles.len() != DX_VERTICES + 3 * nv {
        return Err(DskError::malformed(format!(
            "segment holds {} doubles, expected {} for {} vertices",
            doubles.len(),
            DX_VERTICES + 3 * nv,
            nv
        )));
    }

    let plates_end = IX_PLATES + 3 * np;
    let lists_end =
        plates_end + voxel_pointer_size + voxel_list_size + vertex_pointer_size + vertex_list_size;
    if lists_end > ints.len() {
        return Err(DskError::malformed(format!(
            "segment declares {} integers but holds {}",
            lists_end,
            ints.len()
        )));
    }

    // Reassemble the flat spatial index components and let their decoder
    // check the grid and every pointer
    let coarse = &ints[lists_end..];
    if coarse.len() > SPATIAL_INDEX_INT_FIXED_SIZE - SI_COARSE_GRID {
        return Err(DskError::malformed(format!(
            "segment holds {} coarse grid pointers",
            coarse.len()
        )));
    }
    let mut si_ints = Vec::with_capacity(SPATIAL_INDEX_INT_FIXED_SIZE + lists_end - plates_end);
    si_ints.extend_from_slice(&ints[IX_GRID_EXTENTS..IX_GRID_EXTENTS + 3]);
    si_ints.push(ints[IX_COARSE_SCALE]);
    si_ints.push(ints[IX_VOXEL_PTR_SIZE]);
    si_ints.push(ints[IX_VOXEL_LIST_SIZE]);
    si_ints.push(ints[IX_VERTEX_LIST_SIZE]);
    si_ints.extend_from_slice(coarse);
    si_ints.resize(SPATIAL_INDEX_INT_FIXED_SIZE, 0);
    si_ints.extend_from_slice(&ints[plates_end..lists_end]);

    let si_doubles = &doubles[DX_VERTEX_BOUNDS..DX_VERTEX_BOUNDS + SPATIAL_INDEX_DP_FIXED_SIZE];
    let index = spatial_index_from_components(&si_ints, si_doubles)?;

    if index.coarse_pointers.len() != coarse.len() {
        return Err(DskError::malformed(format!(
            "segment holds {} coarse grid pointers, grid has {} cells",
            coarse.len(),
            index.coarse_pointers.len()
        )));
    }
    if total_voxels(&index.grid) != total {
        return Err(DskError::malformed(format!(
            "total voxel count {} disagrees with grid extents {:?}",
            total, index.grid.extents
        )));
    }
    let max_plate = max_listed_plate(&index);
    if max_plate as usize > np {
        return Err(DskError::malformed(format!(
            "spatial index lists plate {} of {}",
            max_plate, np
        )));
    }

    let plates = ints[IX_PLATES..plates_end]
        .chunks_exact(3)
        .map(|p| {
            if p.iter().any(|&id| id < 1) {
                return Err(DskError::malformed(format!("plate {:?} has a non-positive vertex ID", p)));
            }
            Ok([p[0] as u32, p[1] as u32, p[2] as u32])
        })
        .collect::<DskResult<Vec<_>>>()?;
    let vertices = doubles[DX_VERTICES..]
        .chunks_exact(3)
        .map(|v| DVec3::new(v[0], v[1], v[2]))
        .collect();
    let plate_set = create_plate_set(vertices, plates)
        .map_err(|e| DskError::malformed(format!("segment plate set: {}", e)))?;

    let descriptor = descriptor_from_array(&doubles[DX_DESCRIPTOR..DX_DESCRIPTOR + DSK_DESCRIPTOR_SIZE])?;

    Ok(LoadedSegment {
        descriptor,
        plate_set,
        index,
    })
}
