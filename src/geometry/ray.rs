use crate::error::{DskError, DskResult};
use glam::DVec3;

/// Ray with a vertex and a non-zero direction. The direction is kept as
/// given so ray parameters stay in the caller's units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: DVec3,
    pub direction: DVec3,
}

/// Build a ray, rejecting non-finite input and a zero direction
pub fn create_ray(origin: DVec3, direction: DVec3) -> DskResult<Ray> {
    if !origin.is_finite() {
        return Err(DskError::invalid_input(format!(
            "ray vertex is not finite: {:?}",
            origin
        )));
    }
    if !direction.is_finite() {
        return Err(DskError::invalid_input(format!(
            "ray direction is not finite: {:?}",
            direction
        )));
    }
    if direction == DVec3::ZERO {
        return Err(DskError::InvalidDirection);
    }
    Ok(Ray { origin, direction })
}

/// Point at parameter `t`
pub fn ray_point_at(ray: &Ray, t: f64) -> DVec3 {
    ray.origin + ray.direction * t
}
