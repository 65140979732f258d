//! Geometry Primitives
//!
//! Pure functions over plain data: bounding boxes, rays, planes, ellipsoids
//! and triangles. No state lives here.

pub mod aabb;
pub mod ellipsoid;
pub mod plane;
pub mod ray;
pub mod triangle;

// Simple re-exports
pub use aabb::Aabb;
pub use ellipsoid::Ellipsoid;
pub use plane::Plane;
pub use ray::Ray;
pub use triangle::Triangle;

// Re-export pure operations
pub use aabb::{
    aabb_contains_point, aabb_distance_to_point, create_aabb, aabb_expanded, aabb_extents, aabb_from_points,
    aabb_intersects, aabb_max_extent, aabb_ray_interval,
};
pub use ellipsoid::{
    create_ellipsoid, ellipsoid_level, ellipsoid_surface_normal, ellipsoid_surface_point,
    ray_ellipsoid_intercept,
};
pub use plane::{
    plane_from_point_normal, plane_from_triangle, plane_project_point, plane_signed_distance,
};
pub use ray::{create_ray, ray_point_at};
pub use triangle::{
    closest_point_on_triangle, ray_triangle_intersect, triangle_aabb, triangle_area,
    triangle_normal, triangle_unit_normal,
};
