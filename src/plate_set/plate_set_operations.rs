//! Plate set operations - Pure DOP functions
//!
//! Validation, 1-based lookups and whole-model measures over a
//! [`PlateSetData`].

use super::plate_set_data::{CoordinateRange, PlateSetData};
use crate::constants::capacity::{MAX_PLATES, MAX_VERTICES};
use crate::error::{CapacityBound, DskError, DskResult};
use crate::geometry::{
    aabb_from_points, closest_point_on_triangle, triangle_area, triangle_unit_normal, Aabb,
    Triangle,
};
use crate::segment::CoordinateSystem;
use glam::DVec3;

// ============================================================================
// CONSTRUCTION
// ============================================================================

/// Validate and take ownership of vertex and plate arrays
pub fn create_plate_set(vertices: Vec<DVec3>, plates: Vec<[u32; 3]>) -> DskResult<PlateSetData> {
    if vertices.len() < 3 {
        return Err(DskError::value_out_of_range("vertex count", vertices.len()));
    }
    if vertices.len() > MAX_VERTICES {
        return Err(DskError::capacity(
            CapacityBound::Vertices,
            vertices.len(),
            MAX_VERTICES,
        ));
    }
    if plates.is_empty() {
        return Err(DskError::value_out_of_range("plate count", 0));
    }
    if plates.len() > MAX_PLATES {
        return Err(DskError::capacity(CapacityBound::Plates, plates.len(), MAX_PLATES));
    }

    if let Some((idx, v)) = vertices.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(DskError::invalid_input(format!(
            "vertex {} is not finite: {:?}",
            idx + 1,
            v
        )));
    }

    let nv = vertices.len() as i64;
    for plate in &plates {
        for &id in plate {
            if id == 0 || id as i64 > nv {
                return Err(DskError::index_out_of_range("plate vertex ID", id as i64, 1, nv));
            }
        }
    }

    log::debug!(
        "[PlateSet] Created plate set with {} vertices and {} plates",
        vertices.len(),
        plates.len()
    );

    Ok(PlateSetData { vertices, plates })
}

// ============================================================================
// LOOKUPS
// ============================================================================

pub fn vertex_count(plate_set: &PlateSetData) -> usize {
    plate_set.vertices.len()
}

pub fn plate_count(plate_set: &PlateSetData) -> usize {
    plate_set.plates.len()
}

/// Triangle of the plate at 0-based index `idx`
pub fn plate_triangle(plate_set: &PlateSetData, idx: usize) -> Triangle {
    let [a, b, c] = plate_set.plates[idx];
    Triangle::new(
        plate_set.vertices[a as usize - 1],
        plate_set.vertices[b as usize - 1],
        plate_set.vertices[c as usize - 1],
    )
}

/// Vertex by 1-based ID
pub fn vertex_by_id(plate_set: &PlateSetData, vertex_id: i64) -> DskResult<DVec3> {
    let n = vertex_count(plate_set) as i64;
    if vertex_id < 1 || vertex_id > n {
        return Err(DskError::index_out_of_range("vertex ID", vertex_id, 1, n));
    }
    Ok(plate_set.vertices[(vertex_id - 1) as usize])
}

/// Plate by 1-based ID
pub fn plate_by_id(plate_set: &PlateSetData, plate_id: i64) -> DskResult<[u32; 3]> {
    let n = plate_count(plate_set) as i64;
    if plate_id < 1 || plate_id > n {
        return Err(DskError::index_out_of_range("plate ID", plate_id, 1, n));
    }
    Ok(plate_set.plates[(plate_id - 1) as usize])
}

/// Validate a 1-based inclusive range request and return its 0-based slice bounds.
/// The range is truncated at the end of the set.
fn id_range(name: &'static str, total: usize, start: i64, count: i64) -> DskResult<(usize, usize)> {
    if count <= 0 {
        return Err(DskError::value_out_of_range("count", count));
    }
    let total = total as i64;
    if start < 1 || start > total {
        return Err(DskError::index_out_of_range(name, start, 1, total));
    }
    let first = (start - 1) as usize;
    let last = (start - 1).saturating_add(count).min(total) as usize;
    Ok((first, last))
}

/// Vertices `start ..= start + count - 1` (1-based), truncated at the last vertex
pub fn vertex_range(plate_set: &PlateSetData, start: i64, count: i64) -> DskResult<Vec<DVec3>> {
    let (first, last) = id_range("start vertex ID", vertex_count(plate_set), start, count)?;
    Ok(plate_set.vertices[first..last].to_vec())
}

/// Plates `start ..= start + count - 1` (1-based), truncated at the last plate
pub fn plate_range(plate_set: &PlateSetData, start: i64, count: i64) -> DskResult<Vec<[u32; 3]>> {
    let (first, last) = id_range("start plate ID", plate_count(plate_set), start, count)?;
    Ok(plate_set.plates[first..last].to_vec())
}

/// Unit normal `(v2 - v1) x (v3 - v2)` of a plate
pub fn plate_normal(plate_set: &PlateSetData, plate_id: i64) -> DskResult<DVec3> {
    plate_by_id(plate_set, plate_id)?;
    let tri = plate_triangle(plate_set, (plate_id - 1) as usize);
    triangle_unit_normal(&tri).ok_or_else(|| {
        DskError::degenerate(format!("plate {} has zero area", plate_id))
    })
}

// ============================================================================
// WHOLE-MODEL MEASURES
// ============================================================================

pub fn vertex_bounds(plate_set: &PlateSetData) -> DskResult<Aabb> {
    aabb_from_points(&plate_set.vertices)
        .ok_or_else(|| DskError::degenerate("plate set has no vertices"))
}

/// Total surface area
pub fn plate_model_area(plate_set: &PlateSetData) -> f64 {
    (0..plate_count(plate_set))
        .map(|idx| triangle_area(&plate_triangle(plate_set, idx)))
        .sum()
}

/// Enclosed volume as a sum of signed tetrahedra with apex at the origin.
/// Meaningful for closed models with outward winding.
pub fn plate_model_volume(plate_set: &PlateSetData) -> f64 {
    let six_volume: f64 = (0..plate_count(plate_set))
        .map(|idx| {
            let tri = plate_triangle(plate_set, idx);
            tri.v1.dot(tri.v2.cross(tri.v3))
        })
        .sum();
    six_volume / 6.0
}

/// Range of the third coordinate covered by the model.
///
/// Latitudinal: radius, from the closest plate point to the origin up to the
/// farthest vertex. Cylindrical and rectangular: Z over the vertices.
pub fn coordinate_range_bounds(
    plate_set: &PlateSetData,
    system: CoordinateSystem,
) -> DskResult<CoordinateRange> {
    match system {
        CoordinateSystem::Latitudinal => {
            let min = (0..plate_count(plate_set))
                .map(|idx| closest_point_on_triangle(DVec3::ZERO, &plate_triangle(plate_set, idx)).length())
                .fold(f64::INFINITY, f64::min);
            let max = plate_set
                .vertices
                .iter()
                .map(|v| v.length())
                .fold(0.0, f64::max);
            Ok(CoordinateRange { min, max })
        }
        CoordinateSystem::Cylindrical | CoordinateSystem::Rectangular => {
            let bounds = vertex_bounds(plate_set)?;
            Ok(CoordinateRange {
                min: bounds.min.z,
                max: bounds.max.z,
            })
        }
        CoordinateSystem::Planetodetic => Err(DskError::invalid_input(
            "coordinate range bounds are not supported for planetodetic coordinates",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plate_set::tessellation::{box_plate_set, ellipsoid_plate_set};

    #[test]
    fn test_create_plate_set_validation() {
        let verts = vec![DVec3::ZERO, DVec3::X, DVec3::Y];
        assert!(create_plate_set(verts.clone(), vec![[1, 2, 3]]).is_ok());

        assert!(matches!(
            create_plate_set(verts.clone(), vec![]),
            Err(DskError::ValueOutOfRange { .. })
        ));
        assert!(matches!(
            create_plate_set(verts.clone(), vec![[1, 2, 4]]),
            Err(DskError::IndexOutOfRange { index: 4, .. })
        ));
        assert!(matches!(
            create_plate_set(verts.clone(), vec![[0, 1, 2]]),
            Err(DskError::IndexOutOfRange { index: 0, .. })
        ));
        assert!(matches!(
            create_plate_set(vec![DVec3::ZERO, DVec3::X], vec![[1, 2, 2]]),
            Err(DskError::ValueOutOfRange { .. })
        ));

        let mut bad = verts;
        bad[1] = DVec3::new(f64::NAN, 0.0, 0.0);
        assert!(matches!(
            create_plate_set(bad, vec![[1, 2, 3]]),
            Err(DskError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_ranges() {
        let set = box_plate_set(1.0, 2.0, 3.0).expect("box");
        let all = plate_range(&set, 1, 12).expect("all plates");
        assert_eq!(all, set.plates);

        let tail = vertex_range(&set, 7, 100).expect("truncated");
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[1], set.vertices[7]);

        assert!(matches!(
            plate_range(&set, 0, 0),
            Err(DskError::ValueOutOfRange { name: "count", .. })
        ));
        assert!(matches!(
            plate_range(&set, -1, 36),
            Err(DskError::IndexOutOfRange { index: -1, .. })
        ));
        assert!(matches!(
            vertex_range(&set, 9, 1),
            Err(DskError::IndexOutOfRange { index: 9, .. })
        ));
    }

    #[test]
    fn test_box_measures() {
        let set = box_plate_set(1.0, 2.0, 3.0).expect("box");
        assert!((plate_model_area(&set) - 8.0 * (2.0 + 6.0 + 3.0)).abs() < 1e-12);
        assert!((plate_model_volume(&set) - 48.0).abs() < 1e-12);

        let range = coordinate_range_bounds(&set, CoordinateSystem::Rectangular).expect("range");
        assert_eq!(range, CoordinateRange { min: -3.0, max: 3.0 });

        let radius = coordinate_range_bounds(&set, CoordinateSystem::Latitudinal).expect("radius");
        assert!((radius.min - 1.0).abs() < 1e-12);
        assert!((radius.max - 14.0f64.sqrt()).abs() < 1e-12);

        assert!(matches!(
            coordinate_range_bounds(&set, CoordinateSystem::Planetodetic),
            Err(DskError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_plate_normals_point_outward() {
        let set = ellipsoid_plate_set(3396.19, 3396.19, 3376.20, 20, 10).expect("ellipsoid");
        for id in 1..=plate_count(&set) as i64 {
            let normal = plate_normal(&set, id).expect("normal");
            let tri = plate_triangle(&set, (id - 1) as usize);
            let centroid = (tri.v1 + tri.v2 + tri.v3) / 3.0;
            assert!(normal.dot(centroid) > 0.0, "plate {} faces inward", id);
            assert!((normal.length() - 1.0).abs() < 1e-12);
        }
        assert!(plate_normal(&set, 0).is_err());
        assert!(plate_normal(&set, 361).is_err());
    }

    #[test]
    fn test_degenerate_plate_normal() {
        let set = create_plate_set(
            vec![DVec3::ZERO, DVec3::X, DVec3::X * 2.0, DVec3::Y],
            vec![[1, 2, 3], [1, 2, 4]],
        )
        .expect("valid indices");
        assert!(matches!(
            plate_normal(&set, 1),
            Err(DskError::DegenerateGeometry { .. })
        ));
        assert!(plate_normal(&set, 2).is_ok());
    }
}
