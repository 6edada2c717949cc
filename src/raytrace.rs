//! The Amanatides–Woo fast voxel traversal: walks a ray through a [`GridProperties`] grid and
//! records every voxel it crosses as a [`Trace`].
//!
//! Treats the ray as a line parametrized from the sensed point; for each axis it tracks `dist`,
//! the distance traveled before crossing into the next voxel along that axis. The axis with the
//! smallest `dist` is stepped first. The amount `dist` advances by on a step, `delta`, is the
//! voxel resolution divided by that axis's component of the ray's direction: a ray nearly
//! parallel to an axis has a small delta there and takes many steps before another axis is
//! chosen.
//!
//! The algorithm internally treats a voxel's "origin" as its lower-bounding corner, while
//! [`GridProperties`] point/index conversions treat a voxel's position as its center; a
//! half-resolution frame shift (`NEXT_ADJ` below) reconciles the two when computing crossing
//! distances.

use crate::aabb::clip_ray_zero_bounded;
use crate::error::GridPropertyError;
use crate::grid::GridProperties;
use crate::trace::{SensedLocation, Trace};
use crate::types::{Direction, Point};

const NEXT_ADJ: [f32; 2] = [0.5, -0.5];
const STEP_DIR: [isize; 2] = [1, -1];

/// Traces the ray from `sensed` toward `origin` through `grid`, recording every voxel crossed
/// within `[dist_min, dist_max]` (distances relative to `sensed`, which sits at `d = 0`).
///
/// Returns `Ok(false)` iff the segment never intersects the grid's AABB within the clipped
/// window; `out_trace` is cleared and no entries are produced. A defensive bounds check on
/// every emitted index surfaces an algorithmic inconsistency (or extreme noise pushing an
/// index negative) as `GridPropertyError::VoxelOutOfRange` rather than silently corrupting a
/// channel.
pub fn trace(
    out_trace: &mut Trace,
    sensed: Point,
    origin: Point,
    grid: &GridProperties,
    dist_min: f32,
    dist_max: f32,
) -> Result<bool, GridPropertyError> {
    out_trace.clear();

    let direction = origin - sensed;
    let length = direction.norm().min(dist_max);
    let normal = direction / direction.norm();
    let inv_normal: Direction = normal.map(|x| 1.0 / x);

    let Some((t_enter, t_exit)) =
        clip_ray_zero_bounded(grid.dimensions(), sensed, inv_normal, dist_min, length)
    else {
        return Ok(false);
    };

    let dist_min_adj = t_enter.max(dist_min);
    let dist_max_adj = t_exit.min(dist_max);

    let sensed_adj = sensed + normal * dist_min_adj;
    let mut c = grid.point_to_index(sensed_adj)?;

    let sign = [
        normal.x.is_sign_negative() as usize,
        normal.y.is_sign_negative() as usize,
        normal.z.is_sign_negative() as usize,
    ];
    let step = [STEP_DIR[sign[0]], STEP_DIR[sign[1]], STEP_DIR[sign[2]]];
    let resolution = grid.resolution();
    let delta = [
        (resolution * inv_normal.x).abs(),
        (resolution * inv_normal.y).abs(),
        (resolution * inv_normal.z).abs(),
    ];
    let mut dist = [0_f32; 3];
    for axis in 0..3 {
        dist[axis] = dist_min_adj
            + ((c[axis] as f32 + NEXT_ADJ[sign[axis]]) * resolution - sensed_adj[axis]) * inv_normal[axis];
    }

    out_trace.push(grid.at(c)?, dist_min_adj);

    let mut i = argmin(&dist);
    while dist[i] <= dist_max_adj {
        c[i] = step_index(c[i], step[i]);
        out_trace.push(grid.at(c)?, dist[i]);
        dist[i] += delta[i];
        i = argmin(&dist);
    }

    let sensed_location = if dist_min_adj > 0.0 {
        SensedLocation::Before
    } else if dist_max_adj < 0.0 {
        SensedLocation::After
    } else {
        SensedLocation::In
    };
    out_trace.set_sensed_location(sensed_location);
    out_trace.set_sensed(sensed);

    Ok(true)
}

/// Applies a signed step to an unsigned voxel-index component. A negative step past zero is
/// not clamped: it wraps per `usize` arithmetic, which a subsequent `grid.at(c)` bounds check
/// will catch and reject as `VoxelOutOfRange` rather than silently producing a valid-looking
/// but wrong index. Preserves the defensive fail-loud behavior the engine relies on under
/// degenerate/noisy input instead of masking it with a saturating clamp.
fn step_index(value: usize, step: isize) -> usize {
    value.wrapping_add_signed(step)
}

fn argmin(dist: &[f32; 3]) -> usize {
    const X: usize = 0;
    const Y: usize = 1;
    const Z: usize = 2;
    if dist[X] < dist[Y] && dist[X] < dist[Z] {
        X
    } else if dist[Y] < dist[Z] {
        Y
    } else {
        Z
    }
}
