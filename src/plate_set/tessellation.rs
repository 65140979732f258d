//! Reference shape tessellation
//!
//! Closed plate models with outward winding, used to exercise index builds
//! and as analytic checks on queries.

use super::plate_set_data::PlateSetData;
use super::plate_set_operations::create_plate_set;
use crate::error::{DskError, DskResult};
use crate::geometry::ellipsoid::{create_ellipsoid, ellipsoid_surface_point};
use glam::DVec3;
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Vertex and plate counts of an ellipsoid tessellation
pub fn ellipsoid_tessellation_counts(nlon: usize, nlat: usize) -> (usize, usize) {
    let rings = nlat.saturating_sub(1);
    (nlon * rings + 2, 2 * nlon * rings)
}

/// Tessellate an ellipsoid on a longitude/latitude grid.
///
/// `nlat` latitude bands give `nlat - 1` rings of `nlon` vertices plus the two
/// poles. Vertex 1 is the north pole and the last vertex the south pole.
pub fn ellipsoid_plate_set(
    a: f64,
    b: f64,
    c: f64,
    nlon: usize,
    nlat: usize,
) -> DskResult<PlateSetData> {
    let ellipsoid = create_ellipsoid(a, b, c)?;
    if nlon < 3 {
        return Err(DskError::value_out_of_range("nlon", nlon));
    }
    if nlat < 2 {
        return Err(DskError::value_out_of_range("nlat", nlat));
    }

    let (nv, np) = ellipsoid_tessellation_counts(nlon, nlat);
    let rings = nlat - 1;

    let mut vertices = Vec::with_capacity(nv);
    vertices.push(DVec3::new(0.0, 0.0, c));
    for ring in 1..=rings {
        let lat = FRAC_PI_2 - PI * ring as f64 / nlat as f64;
        for j in 0..nlon {
            let lon = TAU * j as f64 / nlon as f64;
            vertices.push(ellipsoid_surface_point(&ellipsoid, lon, lat));
        }
    }
    vertices.push(DVec3::new(0.0, 0.0, -c));

    let north = 1u32;
    let south = nv as u32;
    let ring_id = |ring: usize, j: usize| (2 + (ring - 1) * nlon + j % nlon) as u32;

    let mut plates = Vec::with_capacity(np);
    for j in 0..nlon {
        plates.push([north, ring_id(1, j), ring_id(1, j + 1)]);
    }
    for ring in 1..rings {
        for j in 0..nlon {
            let upper = ring_id(ring, j);
            let upper_next = ring_id(ring, j + 1);
            let lower = ring_id(ring + 1, j);
            let lower_next = ring_id(ring + 1, j + 1);
            plates.push([upper, lower, lower_next]);
            plates.push([upper, lower_next, upper_next]);
        }
    }
    for j in 0..nlon {
        plates.push([south, ring_id(rings, j + 1), ring_id(rings, j)]);
    }

    log::debug!(
        "[Tessellation] Ellipsoid ({}, {}, {}) with {}x{} samples: {} vertices, {} plates",
        a,
        b,
        c,
        nlon,
        nlat,
        vertices.len(),
        plates.len()
    );

    create_plate_set(vertices, plates)
}

/// Box centered at the origin with half-extents `a`, `b`, `c`
pub fn box_plate_set(a: f64, b: f64, c: f64) -> DskResult<PlateSetData> {
    if [a, b, c].iter().any(|v| !v.is_finite() || *v <= 0.0) {
        return Err(DskError::invalid_input(format!(
            "box half-extents must be finite and positive, got ({}, {}, {})",
            a, b, c
        )));
    }

    // Vertex 1 + (x + 2y + 4z) sits at the corner with those high/low bits
    let vertices = (0..8)
        .map(|bits: u32| {
            DVec3::new(
                if bits & 1 != 0 { a } else { -a },
                if bits & 2 != 0 { b } else { -b },
                if bits & 4 != 0 { c } else { -c },
            )
        })
        .collect();

    let plates = vec![
        [1, 3, 4],
        [1, 4, 2],
        [5, 6, 8],
        [5, 8, 7],
        [1, 2, 6],
        [1, 6, 5],
        [3, 7, 8],
        [3, 8, 4],
        [1, 5, 7],
        [1, 7, 3],
        [2, 4, 8],
        [2, 8, 6],
    ];

    create_plate_set(vertices, plates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ellipsoid::ellipsoid_level;
    use crate::plate_set::plate_set_operations::{plate_count, plate_model_volume, vertex_count};

    #[test]
    fn test_ellipsoid_counts() {
        let set = ellipsoid_plate_set(3396.19, 3396.19, 3376.20, 20, 10).expect("ellipsoid");
        assert_eq!(vertex_count(&set), 182);
        assert_eq!(plate_count(&set), 360);
        assert_eq!(ellipsoid_tessellation_counts(30, 15), (422, 840));

        let nv = vertex_count(&set) as u32;
        assert!(set.plates.iter().flatten().all(|&id| id >= 1 && id <= nv));
    }

    #[test]
    fn test_ellipsoid_vertices_on_surface() {
        let e = create_ellipsoid(3396.19, 3396.19, 3376.20).expect("axes");
        let set = ellipsoid_plate_set(e.a, e.b, e.c, 20, 10).expect("ellipsoid");
        for v in &set.vertices {
            assert!((ellipsoid_level(&e, *v) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_ellipsoid_volume_approaches_analytic() {
        let set = ellipsoid_plate_set(2.0, 2.0, 1.0, 60, 30).expect("ellipsoid");
        let analytic = 4.0 / 3.0 * PI * 2.0 * 2.0 * 1.0;
        let volume = plate_model_volume(&set);
        assert!(volume < analytic);
        assert!((analytic - volume) / analytic < 0.02);
    }

    #[test]
    fn test_every_edge_shared_twice() {
        use rustc_hash::FxHashMap;
        let set = ellipsoid_plate_set(1.0, 1.0, 1.0, 8, 5).expect("ellipsoid");
        let mut directed: FxHashMap<(u32, u32), usize> = FxHashMap::default();
        for [a, b, c] in &set.plates {
            for edge in [(*a, *b), (*b, *c), (*c, *a)] {
                *directed.entry(edge).or_default() += 1;
            }
        }
        // Closed and consistently wound: each directed edge once, reverse present
        for (&(from, to), &count) in &directed {
            assert_eq!(count, 1);
            assert_eq!(directed.get(&(to, from)), Some(&1));
        }
    }

    #[test]
    fn test_bad_tessellation_inputs() {
        assert!(ellipsoid_plate_set(1.0, 1.0, 1.0, 2, 10).is_err());
        assert!(ellipsoid_plate_set(1.0, 1.0, 1.0, 10, 1).is_err());
        assert!(ellipsoid_plate_set(-1.0, 1.0, 1.0, 10, 10).is_err());
        assert!(box_plate_set(1.0, 0.0, 1.0).is_err());
    }

    #[test]
    fn test_box_is_closed() {
        let set = box_plate_set(1.0, 1.0, 1.0).expect("box");
        assert_eq!(vertex_count(&set), 8);
        assert_eq!(plate_count(&set), 12);
        assert!((plate_model_volume(&set) - 8.0).abs() < 1e-12);
    }
}
