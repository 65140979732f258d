//! Triaxial ellipsoids
//!
//! Used to tessellate reference shapes and as an analytic check on plate
//! model intercepts.

use super::ray::Ray;
use crate::error::{DskError, DskResult};
use glam::DVec3;

/// Ellipsoid centered at the origin with semi-axes along x, y and z
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

/// Create an ellipsoid; every semi-axis must be finite and positive
pub fn create_ellipsoid(a: f64, b: f64, c: f64) -> DskResult<Ellipsoid> {
    for (name, value) in [("a", a), ("b", b), ("c", c)] {
        if !value.is_finite() || value <= 0.0 {
            return Err(DskError::invalid_input(format!(
                "ellipsoid semi-axis {} must be finite and positive, got {}",
                name, value
            )));
        }
    }
    Ok(Ellipsoid { a, b, c })
}

fn semi_axes(ellipsoid: &Ellipsoid) -> DVec3 {
    DVec3::new(ellipsoid.a, ellipsoid.b, ellipsoid.c)
}

/// `(x/a)^2 + (y/b)^2 + (z/c)^2`; equals 1 on the surface
pub fn ellipsoid_level(ellipsoid: &Ellipsoid, point: DVec3) -> f64 {
    (point / semi_axes(ellipsoid)).length_squared()
}

/// Surface point at planetocentric-style angles (radians), parameterised as
/// `(a cos lat cos lon, b cos lat sin lon, c sin lat)`
pub fn ellipsoid_surface_point(ellipsoid: &Ellipsoid, lon: f64, lat: f64) -> DVec3 {
    let (sin_lon, cos_lon) = lon.sin_cos();
    let (sin_lat, cos_lat) = lat.sin_cos();
    DVec3::new(
        ellipsoid.a * cos_lat * cos_lon,
        ellipsoid.b * cos_lat * sin_lon,
        ellipsoid.c * sin_lat,
    )
}

/// Outward unit surface normal at a surface point
pub fn ellipsoid_surface_normal(ellipsoid: &Ellipsoid, point: DVec3) -> Option<DVec3> {
    let axes = semi_axes(ellipsoid);
    (point / (axes * axes)).try_normalize()
}

/// First intersection of a ray with the ellipsoid surface.
///
/// Solved on the unit sphere after scaling by the semi-axes. A vertex inside
/// the ellipsoid yields the exit point.
pub fn ray_ellipsoid_intercept(ellipsoid: &Ellipsoid, ray: &Ray) -> Option<DVec3> {
    let axes = semi_axes(ellipsoid);
    let o = ray.origin / axes;
    let d = ray.direction / axes;

    let a = d.length_squared();
    let half_b = o.dot(d);
    let c = o.length_squared() - 1.0;
    let discriminant = half_b * half_b - a * c;
    if a == 0.0 || discriminant < 0.0 {
        return None;
    }

    let root = discriminant.sqrt();
    // Numerically stable pair of roots
    let q = -(half_b + half_b.signum() * root);
    let (t0, t1) = if q == 0.0 {
        (0.0, 0.0)
    } else {
        let r0 = q / a;
        let r1 = c / q;
        (r0.min(r1), r0.max(r1))
    };

    let t = if t0 >= 0.0 {
        t0
    } else if t1 >= 0.0 {
        t1
    } else {
        return None;
    };
    Some(ray.origin + ray.direction * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ray::create_ray;

    fn mars() -> Ellipsoid {
        create_ellipsoid(3396.19, 3396.19, 3376.20).expect("valid axes")
    }

    #[test]
    fn test_surface_point_is_on_surface() {
        let e = mars();
        for (lon, lat) in [(0.0, 0.0), (1.0, 0.5), (-2.5, -1.2), (3.0, 1.5)] {
            let p = ellipsoid_surface_point(&e, lon, lat);
            assert!((ellipsoid_level(&e, p) - 1.0).abs() < 1e-14);
        }
    }

    #[test]
    fn test_ray_intercept_from_outside() {
        let e = mars();
        let ray = create_ray(DVec3::new(10_000.0, 0.0, 0.0), -DVec3::X).expect("valid ray");
        let p = ray_ellipsoid_intercept(&e, &ray).expect("hit");
        assert!((p.x - 3396.19).abs() < 1e-9);

        let ray = create_ray(DVec3::new(0.0, 0.0, -8000.0), DVec3::new(0.0, 0.0, 3.0))
            .expect("valid ray");
        let p = ray_ellipsoid_intercept(&e, &ray).expect("hit");
        assert!((p.z + 3376.20).abs() < 1e-9);
    }

    #[test]
    fn test_ray_intercept_from_inside_and_miss() {
        let e = mars();
        let ray = create_ray(DVec3::ZERO, DVec3::Y).expect("valid ray");
        let p = ray_ellipsoid_intercept(&e, &ray).expect("exit point");
        assert!((p.y - 3396.19).abs() < 1e-9);

        let away = create_ray(DVec3::new(10_000.0, 0.0, 0.0), DVec3::X).expect("valid ray");
        assert!(ray_ellipsoid_intercept(&e, &away).is_none());
        let wide = create_ray(DVec3::new(10_000.0, 5000.0, 0.0), -DVec3::X).expect("valid ray");
        assert!(ray_ellipsoid_intercept(&e, &wide).is_none());
    }

    #[test]
    fn test_surface_normal_points_outward() {
        let e = mars();
        let p = ellipsoid_surface_point(&e, 0.7, 0.3);
        let n = ellipsoid_surface_normal(&e, p).expect("normal");
        assert!(n.dot(p) > 0.0);
        assert!((n.length() - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_invalid_axes() {
        assert!(create_ellipsoid(0.0, 1.0, 1.0).is_err());
        assert!(create_ellipsoid(1.0, f64::NAN, 1.0).is_err());
    }
}
