//! Ray/axis-aligned-bounding-box intersection via the slab method.
//!
//! Adapted from Tavian Barnes' formulation (<https://tavianator.com/2022/ray_box_boundary.html>),
//! which is branch-free on NaN-free inputs and naturally absorbs the `+-inf` produced by
//! axis-aligned rays (zero components of `inv_dir`) into the running min/max chain.

use crate::types::{Direction, Point};

/// Intersects a ray with an AABB `[lower, upper]` given the ray's precomputed inverse direction.
///
/// `t_lo`/`t_hi` bound the segment of the ray the caller cares about; they gate *validity*,
/// they do not clip the returned times. Returns `Some((t_enter, t_exit))` — the raw box
/// entry/exit, NOT clamped to `[t_lo, t_hi]` — iff the ray hits the box at all (`t_enter <=
/// t_exit`) and that hit overlaps the caller's segment (`t_enter <= t_hi && t_lo <= t_exit`).
/// Callers that need the clamped window intersect it themselves.
pub fn clip_ray(
    lower: Point,
    upper: Point,
    origin: Point,
    inv_dir: Direction,
    t_lo: f32,
    t_hi: f32,
) -> Option<(f32, f32)> {
    let dist_lower = (lower - origin).component_mul(&inv_dir);
    let dist_upper = (upper - origin).component_mul(&inv_dir);
    clip_from_slabs(dist_lower, dist_upper, t_lo, t_hi)
}

/// Same as [`clip_ray`] but assumes the box's lower corner is the origin, i.e. `[0, upper]`.
/// This is the overload the ray tracer uses, since a grid's AABB always starts at `(0,0,0)`
/// in its own local frame.
pub fn clip_ray_zero_bounded(
    upper: Point,
    origin: Point,
    inv_dir: Direction,
    t_lo: f32,
    t_hi: f32,
) -> Option<(f32, f32)> {
    let dist_lower = -origin.component_mul(&inv_dir);
    let dist_upper = (upper - origin).component_mul(&inv_dir);
    clip_from_slabs(dist_lower, dist_upper, t_lo, t_hi)
}

/// Core slab-intersection loop, shared by both overloads above.
fn clip_from_slabs(dist_a: Direction, dist_b: Direction, t_lo: f32, t_hi: f32) -> Option<(f32, f32)> {
    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;

    for axis in 0..3 {
        t_enter = t_enter.max(dist_a[axis].min(dist_b[axis]));
        t_exit = t_exit.min(dist_a[axis].max(dist_b[axis]));
    }

    if t_enter <= t_exit && t_enter <= t_hi && t_lo <= t_exit {
        Some((t_enter, t_exit))
    } else {
        None
    }
}
