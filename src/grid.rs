//! Grid Properties: the immutable geometric description every channel, ground-truth grid,
//! and the Reconstruction itself are built against.

use crate::error::GridPropertyError;
use crate::types::{GridSize, Point, VoxelIndex};

/// Resolution, size, and derived fields of a uniform voxel grid whose lower corner sits at
/// the origin of its own local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridProperties {
    resolution: f32,
    size: GridSize,
    dimensions: Point,
    p2i_scale: f32,
}

impl GridProperties {
    /// Construction clamps each axis of `size` to at least one voxel and coerces
    /// `resolution` to its absolute value.
    ///
    /// Voxel positions follow the point-sample convention: voxel `i` sits at `i * resolution`
    /// along each axis, so the grid's AABB runs from the origin to `(size - 1) * resolution`
    /// (a grid of 3 voxels at resolution 1 spans `[0, 2]`, with voxel centers at `{0, 1, 2}`).
    pub fn new(resolution: f32, size: GridSize) -> Self {
        let resolution = resolution.abs();
        let size = size.map(|n| n.max(1));
        let dimensions = size.map(|n| (n - 1) as f32) * resolution;
        let p2i_scale = 1.0 / resolution;

        GridProperties {
            resolution,
            size,
            dimensions,
            p2i_scale,
        }
    }

    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    pub fn dimensions(&self) -> Point {
        self.dimensions
    }

    pub fn p2i_scale(&self) -> f32 {
        self.p2i_scale
    }

    pub fn num_voxels(&self) -> usize {
        self.size.x * self.size.y * self.size.z
    }

    /// Elementwise `idx < size`.
    pub fn index_valid(&self, idx: VoxelIndex) -> bool {
        idx.x < self.size.x && idx.y < self.size.y && idx.z < self.size.z
    }

    /// Unchecked X-fastest linearization.
    pub fn index_to_vector(&self, idx: VoxelIndex) -> usize {
        idx.x + self.size.x * (idx.y + self.size.y * idx.z)
    }

    /// Checked linearization of a voxel index.
    pub fn at(&self, idx: VoxelIndex) -> Result<usize, GridPropertyError> {
        if self.index_valid(idx) {
            Ok(self.index_to_vector(idx))
        } else {
            Err(GridPropertyError::out_of_range(self.size, idx))
        }
    }

    /// Rounds `point` to the nearest voxel index using `p2i_scale`, then checks it. Points
    /// outside the grid, or whose rounded index would be negative, fail with
    /// `VoxelOutOfRange` rather than silently clamping into range.
    pub fn at_point(&self, point: Point) -> Result<usize, GridPropertyError> {
        let idx = self.point_to_index(point)?;
        self.at(idx)
    }

    /// Rounds `point` to the nearest voxel index. A point whose rounded coordinate on any
    /// axis is negative or non-finite fails loudly instead of silently saturating to zero,
    /// the way a plain `as usize` cast would: this preserves the engine's defensive
    /// bounds-failure behavior under degenerate/noisy input rather than masking it.
    pub fn point_to_index(&self, point: Point) -> Result<VoxelIndex, GridPropertyError> {
        let scaled = point * self.p2i_scale;
        let rounded = scaled.map(|c| c.round());

        if rounded.iter().any(|c| !c.is_finite() || *c < 0.0) {
            let sentinel = VoxelIndex::new(usize::MAX, usize::MAX, usize::MAX);
            return Err(GridPropertyError::out_of_range(self.size, sentinel));
        }

        Ok(VoxelIndex::new(
            rounded.x as usize,
            rounded.y as usize,
            rounded.z as usize,
        ))
    }

    /// The world-frame position of voxel `idx` under the point-sample convention
    /// (`idx * resolution`), regardless of whether `idx` is in range.
    pub fn voxel_position(&self, idx: VoxelIndex) -> Point {
        Point::new(
            idx.x as f32 * self.resolution,
            idx.y as f32 * self.resolution,
            idx.z as f32 * self.resolution,
        )
    }

    /// The overall center of the grid's AABB, `0.5 * dimensions`.
    pub fn grid_center(&self) -> Point {
        0.5 * self.dimensions
    }

    /// Exact equality of `resolution`, `size`, and derived fields.
    pub fn equal(&self, other: &GridProperties) -> bool {
        self == other
    }
}
