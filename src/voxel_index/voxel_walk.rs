//! Voxel grid traversal
//!
//! Amanatides-Woo style walk of the fine voxels a ray passes through, in ray
//! order, from the ray's entry into the grid box to its exit.

use super::voxel_index_data::VoxelGrid;
use super::voxel_index_operations::{clamp_to_grid, grid_bounds, voxel_coordinates};
use crate::geometry::{aabb_ray_interval, ray_point_at, Ray};

/// One voxel visited by a walk, with the ray parameters bracketing it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoxelStep {
    pub voxel: [u32; 3],
    pub t_enter: f64,
    pub t_exit: f64,
}

/// Iterator over the voxels pierced by a ray
#[derive(Debug, Clone)]
pub struct VoxelWalk {
    extents: [u32; 3],
    voxel: [i64; 3],
    step: [i64; 3],
    t_next: [f64; 3],
    t_delta: [f64; 3],
    t_current: f64,
    t_end: f64,
    done: bool,
}

/// Start a walk; the walk is empty when the ray misses the grid box
pub fn walk_voxels(grid: &VoxelGrid, ray: &Ray) -> VoxelWalk {
    let empty = VoxelWalk {
        extents: grid.extents,
        voxel: [0; 3],
        step: [0; 3],
        t_next: [f64::INFINITY; 3],
        t_delta: [f64::INFINITY; 3],
        t_current: 0.0,
        t_end: 0.0,
        done: true,
    };

    let Some((t_start, t_end)) = aabb_ray_interval(&grid_bounds(grid), ray.origin, ray.direction)
    else {
        return empty;
    };

    let entry = ray_point_at(ray, t_start);
    let voxel = clamp_to_grid(grid, voxel_coordinates(grid, entry)).map(|v| v as i64);

    let mut step = [0i64; 3];
    let mut t_next = [f64::INFINITY; 3];
    let mut t_delta = [f64::INFINITY; 3];
    for axis in 0..3 {
        let d = ray.direction[axis];
        if d == 0.0 {
            continue;
        }
        let o = ray.origin[axis];
        let cell = voxel[axis] as f64;
        let (s, boundary) = if d > 0.0 {
            (1, grid.origin[axis] + (cell + 1.0) * grid.voxel_size)
        } else {
            (-1, grid.origin[axis] + cell * grid.voxel_size)
        };
        step[axis] = s;
        t_next[axis] = (boundary - o) / d;
        t_delta[axis] = grid.voxel_size / d.abs();
    }

    VoxelWalk {
        voxel,
        step,
        t_next,
        t_delta,
        t_current: t_start,
        t_end,
        done: false,
        ..empty
    }
}

impl Iterator for VoxelWalk {
    type Item = VoxelStep;

    fn next(&mut self) -> Option<VoxelStep> {
        if self.done {
            return None;
        }

        let axis = if self.t_next[0] <= self.t_next[1] && self.t_next[0] <= self.t_next[2] {
            0
        } else if self.t_next[1] <= self.t_next[2] {
            1
        } else {
            2
        };

        let t_exit = self.t_next[axis].min(self.t_end);
        let item = VoxelStep {
            voxel: self.voxel.map(|v| v as u32),
            t_enter: self.t_current,
            t_exit,
        };

        if self.t_next[axis] >= self.t_end {
            self.done = true;
        } else {
            self.voxel[axis] += self.step[axis];
            self.t_current = self.t_next[axis];
            self.t_next[axis] += self.t_delta[axis];
            if self.voxel[axis] < 0 || self.voxel[axis] >= self.extents[axis] as i64 {
                self.done = true;
            }
        }

        Some(item)
    }
}
