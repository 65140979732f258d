//! Ray and point queries against a plate model - Pure DOP functions
//!
//! Both queries visit voxels of the spatial index instead of every plate.
//! Voxel membership is conservative, so every candidate plate gets an exact
//! test.

use super::query_data::{NearestPlatePoint, PlateIntercept};
use crate::constants::tolerances::{EDGE_EPSILON, TIE_TOLERANCE};
use crate::error::{DskError, DskResult, OptionExt};
use crate::geometry::{
    closest_point_on_triangle, create_ray, plane_from_triangle, plane_signed_distance,
    ray_point_at, ray_triangle_intersect,
};
use crate::plate_set::{plate_count, plate_triangle, PlateSetData};
use crate::voxel_index::{
    clamp_to_grid, voxel_coordinates, voxel_plates, walk_voxels, SpatialIndexData, VoxelGrid,
};
use bit_vec::BitVec;
use glam::DVec3;

/// Candidate `(value, plate_id)` replaces `best` when strictly smaller, or
/// equal within tolerance with a lower plate ID
fn improves(candidate: (f64, i32), best: Option<(f64, i32)>) -> bool {
    let Some((best_value, best_id)) = best else {
        return true;
    };
    let (value, id) = candidate;
    let tolerance = TIE_TOLERANCE * value.abs().max(best_value.abs());
    if (value - best_value).abs() <= tolerance {
        id < best_id
    } else {
        value < best_value
    }
}

/// Marks a plate as tested; false when it already was
fn first_visit(tested: &mut BitVec, plate_id: i32) -> bool {
    let idx = (plate_id - 1) as usize;
    if tested.get(idx).unwrap_or(true) {
        return false;
    }
    tested.set(idx, true);
    true
}

// ============================================================================
// RAY INTERCEPT
// ============================================================================

/// Closest intercept of the ray `vertex + t * direction`, `t >= 0`, with the
/// surface. `None` when the ray misses.
pub fn intercept(
    plate_set: &PlateSetData,
    index: &SpatialIndexData,
    vertex: DVec3,
    direction: DVec3,
) -> DskResult<Option<PlateIntercept>> {
    let ray = create_ray(vertex, direction)?;
    let mut tested = BitVec::from_elem(plate_count(plate_set), false);
    let mut best: Option<(f64, i32)> = None;
    let mut voxels_visited = 0usize;

    for step in walk_voxels(&index.grid, &ray) {
        // Nothing past a confirmed hit can be closer
        if let Some((t, _)) = best {
            if t + TIE_TOLERANCE * t.abs() < step.t_enter {
                break;
            }
        }
        voxels_visited += 1;

        for &plate_id in voxel_plates(index, step.voxel)? {
            if !first_visit(&mut tested, plate_id) {
                continue;
            }
            let tri = plate_triangle(plate_set, (plate_id - 1) as usize);
            if let Some(t) = ray_triangle_intersect(&ray, &tri, EDGE_EPSILON) {
                if improves((t, plate_id), best) {
                    best = Some((t, plate_id));
                }
            }
        }
    }

    log::trace!(
        "[Intercept] Visited {} voxels, hit {:?}",
        voxels_visited,
        best.map(|(_, id)| id)
    );

    Ok(best.map(|(t, plate_id)| PlateIntercept {
        plate_id: plate_id as i64,
        point: ray_point_at(&ray, t),
        distance: t * ray.direction.length(),
    }))
}

// ============================================================================
// NEAREST POINT
// ============================================================================

/// Visit the voxels at Chebyshev distance exactly `radius` from `center`
fn for_each_shell_voxel<F>(grid: &VoxelGrid, center: [u32; 3], radius: i64, mut visit: F) -> DskResult<()>
where
    F: FnMut([u32; 3]) -> DskResult<()>,
{
    let c = center.map(|v| v as i64);
    let lo = [0, 1, 2].map(|a| (c[a] - radius).max(0));
    let hi = [0, 1, 2].map(|a| (c[a] + radius).min(grid.extents[a] as i64 - 1));

    for z in lo[2]..=hi[2] {
        for y in lo[1]..=hi[1] {
            let on_face = (z - c[2]).abs() == radius || (y - c[1]).abs() == radius;
            let mut visit_x = |x: i64| visit([x as u32, y as u32, z as u32]);
            if on_face {
                for x in lo[0]..=hi[0] {
                    visit_x(x)?;
                }
            } else {
                if c[0] - radius >= 0 {
                    visit_x(c[0] - radius)?;
                }
                if c[0] + radius < grid.extents[0] as i64 {
                    visit_x(c[0] + radius)?;
                }
            }
        }
    }
    Ok(())
}

/// Lower bound on the distance from `point` to any voxel farther than
/// `radius` from `center`; `None` when no such voxel exists
fn beyond_shell_bound(grid: &VoxelGrid, point: DVec3, center: [u32; 3], radius: i64) -> Option<f64> {
    let mut bound: Option<f64> = None;
    for axis in 0..3 {
        let c = center[axis] as i64;
        let n = grid.extents[axis] as i64;
        let q = point[axis];
        let origin = grid.origin[axis];

        if c + radius + 1 < n {
            let face = origin + (c + radius + 1) as f64 * grid.voxel_size;
            let d = (face - q).max(0.0);
            bound = Some(bound.map_or(d, |b| b.min(d)));
        }
        if c - radius - 1 >= 0 {
            let face = origin + (c - radius) as f64 * grid.voxel_size;
            let d = (q - face).max(0.0);
            bound = Some(bound.map_or(d, |b| b.min(d)));
        }
    }
    bound
}

/// Surface point closest to `point`
pub fn nearest_point(
    plate_set: &PlateSetData,
    index: &SpatialIndexData,
    point: DVec3,
) -> DskResult<NearestPlatePoint> {
    if !point.is_finite() {
        return Err(DskError::invalid_input(format!(
            "query point is not finite: {:?}",
            point
        )));
    }

    let grid = &index.grid;
    let center = clamp_to_grid(grid, voxel_coordinates(grid, point));
    let mut tested = BitVec::from_elem(plate_count(plate_set), false);
    let mut best: Option<(f64, i32)> = None;
    let mut best_point = DVec3::ZERO;
    let mut radius = 0i64;

    loop {
        for_each_shell_voxel(grid, center, radius, |voxel| {
            for &plate_id in voxel_plates(index, voxel)? {
                if !first_visit(&mut tested, plate_id) {
                    continue;
                }
                let tri = plate_triangle(plate_set, (plate_id - 1) as usize);
                if let (Some((best_distance, _)), Some(plane)) = (best, plane_from_triangle(&tri)) {
                    if plane_signed_distance(&plane, point).abs() > best_distance {
                        continue;
                    }
                }
                let candidate = closest_point_on_triangle(point, &tri);
                let distance = candidate.distance(point);
                if improves((distance, plate_id), best) {
                    best = Some((distance, plate_id));
                    best_point = candidate;
                }
            }
            Ok(())
        })?;

        match (best, beyond_shell_bound(grid, point, center, radius)) {
            (_, None) => break,
            (Some((distance, _)), Some(bound)) if distance < bound => break,
            _ => radius += 1,
        }
    }

    log::trace!("[NearestPoint] Searched {} voxel shells", radius + 1);

    let (distance, plate_id) =
        best.ok_or_dsk(|| DskError::malformed("spatial index lists no plates"))?;
    Ok(NearestPlatePoint {
        plate_id: plate_id as i64,
        point: best_point,
        distance,
    })
}
