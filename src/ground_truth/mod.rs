//! Ground-truth grids: dense arrays of the same shape as a reconstruction, populated once by
//! sampling an external mesh scene, used as the reference for evaluation metrics.

use crate::error::GridPropertyError;
use crate::grid::GridProperties;
use crate::types::{Extrinsic, Point, PointMatrix};
use crate::voxel::VoxelLabel;

/// Narrow interface onto the external mesh raycaster named in the engine's interface contract:
/// given a batch of world-frame sample points, report whether each is inside the scene's mesh
/// (occupancy vote) or its signed distance to the surface. The core never implements this —
/// only depends on it.
pub trait MeshSampler {
    /// One vote per column of `points`: `>= 1.0` if the sample is inside the mesh, `0.0` if
    /// outside. Intermediate values (a raycaster's soft occupancy) are tolerated and summed like
    /// the original's vertex-vote rule.
    fn occupancy_votes(&self, points: &PointMatrix) -> Vec<f32>;

    /// One signed distance per column of `points`, negative inside the mesh.
    fn signed_distances(&self, points: &PointMatrix) -> Vec<f32>;
}

/// Every vote present across a voxel's 8 corners: fully outside, fully inside, or split.
const ALL_VOTES: f32 = 8.0;
const NO_VOTES: f32 = 0.0;

/// Ground-truth occupancy: one [`VoxelLabel`] per voxel, computed from an 8-corner vertex vote
/// or loaded from storage. Read-only after construction.
#[derive(Debug, Clone)]
pub struct GroundTruthOccupancy {
    grid: GridProperties,
    data: Vec<VoxelLabel>,
}

impl GroundTruthOccupancy {
    /// Samples the 8 corner vertices of every voxel cell (a cell of extent `grid.resolution()`
    /// centered on the voxel's point-sample position) through `sampler`, in `lower_bound`'s
    /// frame, and labels each voxel `FREE` (no vertex inside), `OCCUPIED` (every vertex inside,
    /// the default), or `CLIPPED` (straddles the surface).
    pub fn compute(grid: GridProperties, lower_bound: &Extrinsic, sampler: &dyn MeshSampler) -> Self {
        let vertices = voxel_vertices(&grid, lower_bound);
        let votes = sampler.occupancy_votes(&vertices);

        let size = grid.size();
        let (nx, ny, nz) = (size.x, size.y, size.z);
        let vx = nx + 1;
        let vy = ny + 1;
        let vertex_idx = |x: usize, y: usize, z: usize| x + vx * (y + vy * z);

        let mut data = vec![VoxelLabel::OCCUPIED; grid.num_voxels()];
        for z in 0..nz {
            for y in 0..ny {
                for x in 0..nx {
                    let corners = [
                        vertex_idx(x, y, z),
                        vertex_idx(x + 1, y, z),
                        vertex_idx(x, y + 1, z),
                        vertex_idx(x + 1, y + 1, z),
                        vertex_idx(x, y, z + 1),
                        vertex_idx(x + 1, y, z + 1),
                        vertex_idx(x, y + 1, z + 1),
                        vertex_idx(x + 1, y + 1, z + 1),
                    ];
                    let vote_sum: f32 = corners.iter().map(|&i| votes[i]).sum();

                    if vote_sum < ALL_VOTES {
                        let i = grid.index_to_vector(crate::types::VoxelIndex::new(x, y, z));
                        data[i] = if vote_sum == NO_VOTES { VoxelLabel::FREE } else { VoxelLabel::CLIPPED };
                    }
                }
            }
        }

        log::info!(
            "computed ground-truth occupancy over {} voxels ({} vertex samples)",
            grid.num_voxels(),
            vertices.ncols()
        );
        GroundTruthOccupancy { grid, data }
    }

    /// Rehydrates a previously computed/serialized grid. Fails if `data`'s length does not match
    /// `grid.num_voxels()`.
    pub fn from_data(grid: GridProperties, data: Vec<u8>) -> Result<Self, GridPropertyError> {
        if data.len() != grid.num_voxels() {
            return Err(GridPropertyError::DataVectorDoesNotMatch {
                size: grid.size(),
                voxels: grid.num_voxels(),
                len: data.len(),
            });
        }
        let data = data.into_iter().map(VoxelLabel::from_bits_truncate).collect();
        Ok(GroundTruthOccupancy { grid, data })
    }

    pub fn grid(&self) -> &GridProperties {
        &self.grid
    }

    pub fn data(&self) -> &[VoxelLabel] {
        &self.data
    }
}

/// Ground-truth signed-distance field: one `f64` per voxel, sampled at voxel centers.
#[derive(Debug, Clone)]
pub struct GroundTruthTsdf {
    grid: GridProperties,
    data: Vec<f64>,
}

impl GroundTruthTsdf {
    pub fn compute(grid: GridProperties, lower_bound: &Extrinsic, sampler: &dyn MeshSampler) -> Self {
        let centers = voxel_centers(&grid, lower_bound);
        let data = sampler.signed_distances(&centers).into_iter().map(|d| d as f64).collect();
        log::info!("computed ground-truth TSDF over {} voxels", grid.num_voxels());
        GroundTruthTsdf { grid, data }
    }

    pub fn from_data(grid: GridProperties, data: Vec<f64>) -> Result<Self, GridPropertyError> {
        if data.len() != grid.num_voxels() {
            return Err(GridPropertyError::DataVectorDoesNotMatch {
                size: grid.size(),
                voxels: grid.num_voxels(),
                len: data.len(),
            });
        }
        Ok(GroundTruthTsdf { grid, data })
    }

    pub fn grid(&self) -> &GridProperties {
        &self.grid
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }
}

/// World-frame position of voxel `idx`'s point-sample center, under `lower_bound`.
fn voxel_center_world(grid: &GridProperties, lower_bound: &Extrinsic, idx: (usize, usize, usize)) -> Point {
    let local = grid.voxel_position(crate::types::VoxelIndex::new(idx.0, idx.1, idx.2));
    (lower_bound * nalgebra::Point3::from(local)).coords
}

fn voxel_centers(grid: &GridProperties, lower_bound: &Extrinsic) -> PointMatrix {
    let size = grid.size();
    let mut out = PointMatrix::zeros(grid.num_voxels());
    let mut col = 0;
    for z in 0..size.z {
        for y in 0..size.y {
            for x in 0..size.x {
                out.set_column(col, &voxel_center_world(grid, lower_bound, (x, y, z)));
                col += 1;
            }
        }
    }
    out
}

/// World-frame position of voxel-grid vertex `(x, y, z)`, `x/y/z` each in `[0, size]`: the
/// corner of voxel `(x, y, z)`'s cell nearer the origin, offset half a resolution below that
/// voxel's point-sample center.
fn voxel_vertices(grid: &GridProperties, lower_bound: &Extrinsic) -> PointMatrix {
    let size = grid.size();
    let (vx, vy, vz) = (size.x + 1, size.y + 1, size.z + 1);
    let half_res = 0.5 * grid.resolution();
    let mut out = PointMatrix::zeros(vx * vy * vz);

    let mut col = 0;
    for z in 0..vz {
        for y in 0..vy {
            for x in 0..vx {
                let local = Point::new(
                    x as f32 * grid.resolution() - half_res,
                    y as f32 * grid.resolution() - half_res,
                    z as f32 * grid.resolution() - half_res,
                );
                out.set_column(col, &(lower_bound * nalgebra::Point3::from(local)).coords);
                col += 1;
            }
        }
    }
    out
}
