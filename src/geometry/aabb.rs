/// Data-Oriented Axis-Aligned Bounding Box
///
/// Pure functions over bounds - no methods, just data transformations.
use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Axis-Aligned Bounding Box - pure data structure
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

/// Create new AABB from min/max points
pub fn create_aabb(min: DVec3, max: DVec3) -> Aabb {
    Aabb { min, max }
}

/// Smallest AABB containing every point, `None` for an empty slice
pub fn aabb_from_points(points: &[DVec3]) -> Option<Aabb> {
    let first = *points.first()?;
    let bounds = points.iter().skip(1).fold(create_aabb(first, first), |acc, p| Aabb {
        min: acc.min.min(*p),
        max: acc.max.max(*p),
    });
    Some(bounds)
}

/// Edge lengths along each axis
pub fn aabb_extents(aabb: &Aabb) -> DVec3 {
    aabb.max - aabb.min
}

/// Longest edge
pub fn aabb_max_extent(aabb: &Aabb) -> f64 {
    aabb_extents(aabb).max_element()
}

/// Copy of the box grown by `pad` on every side
pub fn aabb_expanded(aabb: &Aabb, pad: f64) -> Aabb {
    Aabb {
        min: aabb.min - DVec3::splat(pad),
        max: aabb.max + DVec3::splat(pad),
    }
}

/// Test if two AABBs intersect (touching counts)
pub fn aabb_intersects(aabb1: &Aabb, aabb2: &Aabb) -> bool {
    aabb1.min.cmple(aabb2.max).all() && aabb1.max.cmpge(aabb2.min).all()
}

/// Test if AABB contains a point (boundary included)
pub fn aabb_contains_point(aabb: &Aabb, point: DVec3) -> bool {
    point.cmpge(aabb.min).all() && point.cmple(aabb.max).all()
}

/// Euclidean distance from a point to the box, zero inside
pub fn aabb_distance_to_point(aabb: &Aabb, point: DVec3) -> f64 {
    point.distance(point.clamp(aabb.min, aabb.max))
}

/// Slab test: parameter interval `[t_enter, t_exit]` over which
/// `origin + t * direction` lies inside the box, clipped to `t >= 0`
pub fn aabb_ray_interval(aabb: &Aabb, origin: DVec3, direction: DVec3) -> Option<(f64, f64)> {
    let mut t_min = 0.0f64;
    let mut t_max = f64::INFINITY;

    for axis in 0..3 {
        let o = origin[axis];
        let d = direction[axis];
        let lo = aabb.min[axis];
        let hi = aabb.max[axis];

        if d == 0.0 {
            // Parallel to this slab
            if o < lo || o > hi {
                return None;
            }
            continue;
        }

        let inv = 1.0 / d;
        let t1 = (lo - o) * inv;
        let t2 = (hi - o) * inv;
        t_min = t_min.max(t1.min(t2));
        t_max = t_max.min(t1.max(t2));

        if t_min > t_max {
            return None;
        }
    }

    Some((t_min, t_max))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Aabb {
        create_aabb(DVec3::ZERO, DVec3::ONE)
    }

    #[test]
    fn test_aabb_from_points() {
        let points = [
            DVec3::new(1.0, -2.0, 3.0),
            DVec3::new(-1.0, 4.0, 0.5),
            DVec3::new(0.0, 0.0, 7.0),
        ];
        let bounds = aabb_from_points(&points).expect("non-empty");
        assert_eq!(bounds.min, DVec3::new(-1.0, -2.0, 0.5));
        assert_eq!(bounds.max, DVec3::new(1.0, 4.0, 7.0));
        assert_eq!(aabb_max_extent(&bounds), 6.5);
        assert!(aabb_from_points(&[]).is_none());
    }

    #[test]
    fn test_aabb_intersects_and_contains() {
        let a = unit_box();
        let touching = create_aabb(DVec3::new(1.0, 0.0, 0.0), DVec3::new(2.0, 1.0, 1.0));
        let apart = create_aabb(DVec3::splat(1.5), DVec3::splat(2.0));
        assert!(aabb_intersects(&a, &touching));
        assert!(!aabb_intersects(&a, &apart));
        assert!(aabb_contains_point(&a, DVec3::splat(0.5)));
        assert!(!aabb_contains_point(&a, DVec3::new(0.5, 1.5, 0.5)));
    }

    #[test]
    fn test_aabb_distance_to_point() {
        let a = unit_box();
        assert_eq!(aabb_distance_to_point(&a, DVec3::splat(0.25)), 0.0);
        assert!((aabb_distance_to_point(&a, DVec3::new(4.0, 0.5, 0.5)) - 3.0).abs() < 1e-15);
    }

    #[test]
    fn test_ray_interval() {
        let a = unit_box();
        let (t0, t1) = aabb_ray_interval(&a, DVec3::new(-1.0, 0.5, 0.5), DVec3::X)
            .expect("ray crosses box");
        assert!((t0 - 1.0).abs() < 1e-15);
        assert!((t1 - 2.0).abs() < 1e-15);

        // Origin inside clips the entry to zero
        let (t0, _) = aabb_ray_interval(&a, DVec3::splat(0.5), DVec3::Y).expect("inside");
        assert_eq!(t0, 0.0);

        // Pointing away
        assert!(aabb_ray_interval(&a, DVec3::new(-1.0, 0.5, 0.5), -DVec3::X).is_none());
        // Parallel and outside
        assert!(aabb_ray_interval(&a, DVec3::new(-1.0, 2.0, 0.5), DVec3::X).is_none());
    }

    #[test]
    fn test_aabb_expanded() {
        let grown = aabb_expanded(&unit_box(), 0.5);
        assert_eq!(grown.min, DVec3::splat(-0.5));
        assert_eq!(aabb_extents(&grown), DVec3::splat(2.0));
    }
}
