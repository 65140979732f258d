use super::triangle::{triangle_unit_normal, Triangle};
use glam::DVec3;

/// Plane `normal . x = constant` with a unit normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: DVec3,
    pub constant: f64,
}

/// Plane through a point with the given normal, `None` for a zero normal
pub fn plane_from_point_normal(point: DVec3, normal: DVec3) -> Option<Plane> {
    let normal = normal.try_normalize()?;
    Some(Plane {
        normal,
        constant: normal.dot(point),
    })
}

/// Supporting plane of a triangle, `None` when the triangle is degenerate
pub fn plane_from_triangle(tri: &Triangle) -> Option<Plane> {
    let normal = triangle_unit_normal(tri)?;
    Some(Plane {
        normal,
        constant: normal.dot(tri.v1),
    })
}

/// Signed distance, positive on the normal side
pub fn plane_signed_distance(plane: &Plane, point: DVec3) -> f64 {
    plane.normal.dot(point) - plane.constant
}

/// Orthogonal projection of a point onto the plane
pub fn plane_project_point(plane: &Plane, point: DVec3) -> DVec3 {
    point - plane.normal * plane_signed_distance(plane, point)
}
