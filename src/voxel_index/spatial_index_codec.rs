//! Flat spatial index components
//!
//! The record is exchanged with storage as one integer array and one double
//! array at fixed offsets. Decoding checks every pointer so lookups on a
//! decoded index can slice without further bounds checks.

use super::voxel_index_data::{SpatialIndexData, VoxelGrid};
use super::voxel_index_operations::total_coarse_cells;
use crate::constants::capacity::{MAX_COARSE_CELLS, MAX_VOXELS};
use crate::constants::spatial_index_layout::*;
use crate::error::{DskError, DskResult, OptionExt};
use crate::geometry::Aabb;
use glam::DVec3;

/// Integer component: header, fixed-size coarse region, then the four arrays
pub fn to_int_component(index: &SpatialIndexData) -> Vec<i32> {
    let size = SPATIAL_INDEX_INT_FIXED_SIZE
        + index.voxel_pointers.len()
        + index.voxel_plate_list.len()
        + index.vertex_pointers.len()
        + index.vertex_plate_list.len();
    let mut out = Vec::with_capacity(size);

    out.extend(index.grid.extents.iter().map(|&n| n as i32));
    out.push(index.grid.coarse_scale as i32);
    out.push(index.voxel_pointers.len() as i32);
    out.push(index.voxel_plate_list.len() as i32);
    out.push(index.vertex_plate_list.len() as i32);
    debug_assert_eq!(out.len(), SI_COARSE_GRID);

    out.extend_from_slice(&index.coarse_pointers);
    out.resize(SPATIAL_INDEX_INT_FIXED_SIZE, 0);

    out.extend_from_slice(&index.voxel_pointers);
    out.extend_from_slice(&index.voxel_plate_list);
    out.extend_from_slice(&index.vertex_pointers);
    out.extend_from_slice(&index.vertex_plate_list);
    out
}

/// Double component: vertex bounds, voxel origin, voxel size
pub fn to_dp_component(index: &SpatialIndexData) -> Vec<f64> {
    let b = &index.vertex_bounds;
    let o = index.grid.origin;
    vec![
        b.min.x,
        b.max.x,
        b.min.y,
        b.max.y,
        b.min.z,
        b.max.z,
        o.x,
        o.y,
        o.z,
        index.grid.voxel_size,
    ]
}

fn header_value(ints: &[i32], offset: usize, what: &str) -> DskResult<usize> {
    let value = ints[offset];
    if value < 0 {
        return Err(DskError::malformed(format!("{} is negative: {}", what, value)));
    }
    Ok(value as usize)
}

/// Rebuild the typed record from its flat components
pub fn spatial_index_from_components(ints: &[i32], dps: &[f64]) -> DskResult<SpatialIndexData> {
    if dps.len() != SPATIAL_INDEX_DP_FIXED_SIZE {
        return Err(DskError::malformed(format!(
            "double component has {} elements, expected {}",
            dps.len(),
            SPATIAL_INDEX_DP_FIXED_SIZE
        )));
    }
    if dps.iter().any(|v| !v.is_finite()) {
        return Err(DskError::malformed("double component holds a non-finite value"));
    }
    if ints.len() < SPATIAL_INDEX_INT_FIXED_SIZE {
        return Err(DskError::malformed(format!(
            "integer component has {} elements, fewer than the fixed {}",
            ints.len(),
            SPATIAL_INDEX_INT_FIXED_SIZE
        )));
    }

    let b = &dps[SI_VERTEX_BOUNDS..SI_VERTEX_BOUNDS + 6];
    let vertex_bounds = Aabb {
        min: DVec3::new(b[0], b[2], b[4]),
        max: DVec3::new(b[1], b[3], b[5]),
    };
    if vertex_bounds.min.cmpgt(vertex_bounds.max).any() {
        return Err(DskError::malformed("vertex bounds are inverted"));
    }
    let o = &dps[SI_VOXEL_ORIGIN..SI_VOXEL_ORIGIN + 3];
    let voxel_size = dps[SI_VOXEL_SIZE];
    if voxel_size <= 0.0 {
        return Err(DskError::malformed(format!("voxel size {} is not positive", voxel_size)));
    }

    let mut extents = [0u32; 3];
    for (axis, extent) in extents.iter_mut().enumerate() {
        *extent = header_value(ints, SI_GRID_EXTENTS + axis, "voxel grid extent")? as u32;
    }
    let coarse_scale = header_value(ints, SI_COARSE_SCALE, "coarse scale")? as u32;
    if coarse_scale == 0 || extents.iter().any(|&n| n == 0 || n % coarse_scale != 0) {
        return Err(DskError::malformed(format!(
            "grid extents {:?} are not positive multiples of coarse scale {}",
            extents, coarse_scale
        )));
    }

    let grid = VoxelGrid {
        origin: DVec3::new(o[0], o[1], o[2]),
        voxel_size,
        extents,
        coarse_scale,
    };
    let voxel_count = extents
        .iter()
        .try_fold(1usize, |acc, &n| acc.checked_mul(n as usize))
        .filter(|&n| n <= MAX_VOXELS)
        .ok_or_dsk(|| DskError::malformed(format!("grid extents {:?} are too large", extents)))?;
    let coarse_cells = total_coarse_cells(&grid);
    log::trace!("[SpatialIndex] Decoding {} voxels in {} coarse cells", voxel_count, coarse_cells);
    if coarse_cells > MAX_COARSE_CELLS {
        return Err(DskError::malformed(format!(
            "{} coarse cells exceed the maximum {}",
            coarse_cells, MAX_COARSE_CELLS
        )));
    }

    let voxel_pointer_size = header_value(ints, SI_VOXEL_PTR_SIZE, "voxel pointer size")?;
    let voxel_list_size = header_value(ints, SI_VOXEL_LIST_SIZE, "voxel-plate list size")?;
    let vertex_list_size = header_value(ints, SI_VERTEX_LIST_SIZE, "vertex-plate list size")?;

    let variable = &ints[SPATIAL_INDEX_INT_FIXED_SIZE..];
    let declared = voxel_pointer_size + voxel_list_size + vertex_list_size;
    if declared > variable.len() {
        return Err(DskError::malformed(format!(
            "declared array sizes {} exceed the {} stored elements",
            declared,
            variable.len()
        )));
    }
    let vertex_pointer_size = variable.len() - declared;
    if vertex_pointer_size == 0 && vertex_list_size > 0 {
        return Err(DskError::malformed("vertex-plate list has no vertex pointers"));
    }

    let (voxel_pointers, rest) = variable.split_at(voxel_pointer_size);
    let (voxel_plate_list, rest) = rest.split_at(voxel_list_size);
    let (vertex_pointers, vertex_plate_list) = rest.split_at(vertex_pointer_size);

    let coarse_pointers = &ints[SI_COARSE_GRID..SI_COARSE_GRID + coarse_cells];
    let cs3 = (coarse_scale as usize).pow(3);
    for &pointer in coarse_pointers {
        if pointer == 0 {
            continue;
        }
        let start = pointer as i64 - 1;
        if start < 0 || start as usize % cs3 != 0 || start as usize + cs3 > voxel_pointer_size {
            return Err(DskError::malformed(format!(
                "coarse pointer {} is outside the voxel pointer array",
                pointer
            )));
        }
    }

    check_count_prefixed(voxel_pointers, voxel_plate_list, "voxel")?;
    check_count_prefixed(vertex_pointers, vertex_plate_list, "vertex")?;

    Ok(SpatialIndexData {
        vertex_bounds,
        grid,
        coarse_pointers: coarse_pointers.to_vec(),
        voxel_pointers: voxel_pointers.to_vec(),
        voxel_plate_list: voxel_plate_list.to_vec(),
        vertex_pointers: vertex_pointers.to_vec(),
        vertex_plate_list: vertex_plate_list.to_vec(),
    })
}

/// Every pointer is empty or names a count whose entries fit in the list
fn check_count_prefixed(pointers: &[i32], list: &[i32], what: &str) -> DskResult<()> {
    for &pointer in pointers {
        if pointer == EMPTY_POINTER {
            continue;
        }
        if pointer < 1 || pointer as usize > list.len() {
            return Err(DskError::malformed(format!(
                "{} pointer {} is outside its list of {} elements",
                what,
                pointer,
                list.len()
            )));
        }
        let count = list[pointer as usize - 1];
        if count < 1 || pointer as usize + count as usize > list.len() {
            return Err(DskError::malformed(format!(
                "{} list entry at {} claims {} plates",
                what, pointer, count
            )));
        }
    }
    Ok(())
}

/// Largest plate ID referenced by either correspondence list
pub fn max_listed_plate(index: &SpatialIndexData) -> i32 {
    // Counts are mixed into the lists; walking the pointers skips them
    let walk = |pointers: &[i32], list: &[i32]| {
        pointers
            .iter()
            .filter(|&&p| p != EMPTY_POINTER)
            .flat_map(|&p| {
                let start = p as usize;
                let count = list[start - 1] as usize;
                list[start..start + count].iter().copied()
            })
            .max()
            .unwrap_or(0)
    };
    walk(&index.voxel_pointers, &index.voxel_plate_list)
        .max(walk(&index.vertex_pointers, &index.vertex_plate_list))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexConfig;
    use crate::plate_set::ellipsoid_plate_set;
    use crate::voxel_index::build_spatial_index;

    fn mars_index() -> SpatialIndexData {
        let plates = ellipsoid_plate_set(3396.19, 3396.19, 3376.20, 20, 10).expect("ellipsoid");
        build_spatial_index(&plates, &IndexConfig::default()).expect("index")
    }

    #[test]
    fn test_component_layout() {
        let index = mars_index();
        let ints = to_int_component(&index);
        let dps = to_dp_component(&index);

        let extents = index.grid.extents.map(|n| n as i32);
        assert_eq!(&ints[SI_GRID_EXTENTS..SI_GRID_EXTENTS + 3], &extents[..]);
        assert_eq!(ints[SI_COARSE_SCALE], 10);
        assert_eq!(ints[SI_VOXEL_PTR_SIZE] as usize, index.voxel_pointers.len());
        let ncgr = index.coarse_pointers.len();
        assert_eq!(&ints[SI_COARSE_GRID..SI_COARSE_GRID + ncgr], index.coarse_pointers.as_slice());
        assert!(ints[SI_COARSE_GRID + ncgr..SPATIAL_INDEX_INT_FIXED_SIZE].iter().all(|&v| v == 0));

        let voxel_start = SPATIAL_INDEX_INT_FIXED_SIZE;
        let voxel_end = voxel_start + index.voxel_pointers.len();
        assert_eq!(&ints[voxel_start..voxel_end], index.voxel_pointers.as_slice());

        assert_eq!(dps.len(), SPATIAL_INDEX_DP_FIXED_SIZE);
        assert_eq!(dps[SI_VOXEL_SIZE], index.grid.voxel_size);
        assert_eq!(dps[SI_VERTEX_BOUNDS + 1], index.vertex_bounds.max.x);
    }

    #[test]
    fn test_decode_matches_build() {
        let index = mars_index();
        let decoded =
            spatial_index_from_components(&to_int_component(&index), &to_dp_component(&index))
                .expect("decodes");
        assert_eq!(decoded, index);
        assert_eq!(max_listed_plate(&decoded), 360);
    }

    #[test]
    fn test_decode_rejects_corruption() {
        let index = mars_index();
        let ints = to_int_component(&index);
        let dps = to_dp_component(&index);

        assert!(spatial_index_from_components(&ints[..100], &dps).is_err());
        assert!(spatial_index_from_components(&ints, &dps[..9]).is_err());

        let mut bad_scale = ints.clone();
        bad_scale[SI_COARSE_SCALE] = 3;
        assert!(matches!(
            spatial_index_from_components(&bad_scale, &dps),
            Err(DskError::MalformedIndex { .. })
        ));

        let mut bad_size = ints.clone();
        bad_size[SI_VOXEL_LIST_SIZE] += 1_000_000;
        assert!(spatial_index_from_components(&bad_size, &dps).is_err());

        let mut bad_pointer = ints.clone();
        let first_voxel = bad_pointer[SPATIAL_INDEX_INT_FIXED_SIZE..]
            .iter()
            .position(|&p| p != EMPTY_POINTER)
            .expect("an occupied voxel")
            + SPATIAL_INDEX_INT_FIXED_SIZE;
        bad_pointer[first_voxel] = i32::MAX;
        assert!(spatial_index_from_components(&bad_pointer, &dps).is_err());

        let mut bad_dp = dps.clone();
        bad_dp[SI_VOXEL_SIZE] = 0.0;
        assert!(spatial_index_from_components(&ints, &bad_dp).is_err());
    }
}
