//! Triangle primitives
//!
//! Plates are triangles; these are the exact per-plate tests the query
//! engine runs after voxel lookups narrow the candidates.

use super::aabb::{create_aabb, Aabb};
use super::ray::Ray;
use glam::DVec3;

/// Triangle by its three corners, in plate winding order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub v1: DVec3,
    pub v2: DVec3,
    pub v3: DVec3,
}

impl Triangle {
    pub fn new(v1: DVec3, v2: DVec3, v3: DVec3) -> Self {
        Self { v1, v2, v3 }
    }
}

/// Unnormalized normal `(v2 - v1) x (v3 - v2)`; its length is twice the area
pub fn triangle_normal(tri: &Triangle) -> DVec3 {
    (tri.v2 - tri.v1).cross(tri.v3 - tri.v2)
}

/// Unit normal, `None` for a zero-area triangle
pub fn triangle_unit_normal(tri: &Triangle) -> Option<DVec3> {
    let normal = triangle_normal(tri);
    let length = normal.length();
    if length == 0.0 || !length.is_finite() {
        return None;
    }
    Some(normal / length)
}

pub fn triangle_area(tri: &Triangle) -> f64 {
    0.5 * triangle_normal(tri).length()
}

pub fn triangle_aabb(tri: &Triangle) -> Aabb {
    create_aabb(
        tri.v1.min(tri.v2).min(tri.v3),
        tri.v1.max(tri.v2).max(tri.v3),
    )
}

/// Ray/triangle intersection (Moller-Trumbore).
///
/// Returns the ray parameter `t >= 0` of the hit. Barycentric coordinates are
/// accepted within `edge_epsilon` of the edges, so a ray through a shared edge
/// hits both plates.
pub fn ray_triangle_intersect(ray: &Ray, tri: &Triangle, edge_epsilon: f64) -> Option<f64> {
    let e1 = tri.v2 - tri.v1;
    let e2 = tri.v3 - tri.v1;
    let p = ray.direction.cross(e2);
    let det = e1.dot(p);

    let scale = e1.length() * e2.length() * ray.direction.length();
    if det.abs() <= scale * f64::EPSILON {
        // Parallel to the plate plane, or a degenerate plate
        return None;
    }

    let inv_det = 1.0 / det;
    let s = ray.origin - tri.v1;
    let u = s.dot(p) * inv_det;
    if u < -edge_epsilon || u > 1.0 + edge_epsilon {
        return None;
    }

    let q = s.cross(e1);
    let v = ray.direction.dot(q) * inv_det;
    if v < -edge_epsilon || u + v > 1.0 + edge_epsilon {
        return None;
    }

    let t = e2.dot(q) * inv_det;
    if t < 0.0 {
        return None;
    }
    Some(t)
}

/// Closest point on a triangle to `p` (Voronoi region walk, Ericson 5.1.5)
pub fn closest_point_on_triangle(p: DVec3, tri: &Triangle) -> DVec3 {
    let a = tri.v1;
    let b = tri.v2;
    let c = tri.v3;

    let ab = b - a;
    let ac = c - a;
    let ap = p - a;
    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return a + ab * v;
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return a + ac * w;
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    // Inside the face
    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    a + ab * v + ac * w
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ray::create_ray;

    fn xy_triangle() -> Triangle {
        Triangle::new(DVec3::ZERO, DVec3::X, DVec3::Y)
    }

    #[test]
    fn test_normal_and_area() {
        let tri = xy_triangle();
        assert_eq!(triangle_unit_normal(&tri), Some(DVec3::Z));
        assert!((triangle_area(&tri) - 0.5).abs() < 1e-15);

        let flat = Triangle::new(DVec3::ZERO, DVec3::X, DVec3::X * 2.0);
        assert!(triangle_unit_normal(&flat).is_none());
    }

    #[test]
    fn test_ray_hits_interior() {
        let ray = create_ray(DVec3::new(0.25, 0.25, 2.0), DVec3::new(0.0, 0.0, -4.0))
            .expect("valid ray");
        let t = ray_triangle_intersect(&ray, &xy_triangle(), 1e-10).expect("hit");
        assert!((t - 0.5).abs() < 1e-15);
    }

    #[test]
    fn test_ray_misses_and_behind() {
        let tri = xy_triangle();
        let miss = create_ray(DVec3::new(0.8, 0.8, 1.0), -DVec3::Z).expect("valid ray");
        assert!(ray_triangle_intersect(&miss, &tri, 1e-10).is_none());

        let behind = create_ray(DVec3::new(0.25, 0.25, 1.0), DVec3::Z).expect("valid ray");
        assert!(ray_triangle_intersect(&behind, &tri, 1e-10).is_none());

        let parallel = create_ray(DVec3::new(0.25, 0.25, 1.0), DVec3::X).expect("valid ray");
        assert!(ray_triangle_intersect(&parallel, &tri, 1e-10).is_none());
    }

    #[test]
    fn test_ray_through_shared_edge_hits_both() {
        let lower = Triangle::new(DVec3::ZERO, DVec3::X, DVec3::new(1.0, 1.0, 0.0));
        let upper = Triangle::new(DVec3::ZERO, DVec3::new(1.0, 1.0, 0.0), DVec3::Y);
        let ray = create_ray(DVec3::new(0.5, 0.5, 1.0), -DVec3::Z).expect("valid ray");
        assert!(ray_triangle_intersect(&ray, &lower, 1e-10).is_some());
        assert!(ray_triangle_intersect(&ray, &upper, 1e-10).is_some());
    }

    #[test]
    fn test_closest_point_regions() {
        let tri = xy_triangle();
        // Face interior
        let p = closest_point_on_triangle(DVec3::new(0.2, 0.2, 3.0), &tri);
        assert!((p - DVec3::new(0.2, 0.2, 0.0)).length() < 1e-15);
        // Vertex region
        assert_eq!(closest_point_on_triangle(DVec3::new(-1.0, -1.0, 0.0), &tri), DVec3::ZERO);
        // Edge region on the hypotenuse
        let p = closest_point_on_triangle(DVec3::new(1.0, 1.0, 0.0), &tri);
        assert!((p - DVec3::new(0.5, 0.5, 0.0)).length() < 1e-15);
        // Edge region on the x axis
        let p = closest_point_on_triangle(DVec3::new(0.5, -2.0, 1.0), &tri);
        assert!((p - DVec3::new(0.5, 0.0, 0.0)).length() < 1e-15);
    }

    #[test]
    fn test_triangle_aabb() {
        let bounds = triangle_aabb(&Triangle::new(
            DVec3::new(1.0, 5.0, -1.0),
            DVec3::new(-2.0, 0.0, 0.0),
            DVec3::new(0.0, 1.0, 4.0),
        ));
        assert_eq!(bounds.min, DVec3::new(-2.0, 0.0, -1.0));
        assert_eq!(bounds.max, DVec3::new(1.0, 5.0, 4.0));
    }
}
