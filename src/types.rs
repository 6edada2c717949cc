//! Core geometric type aliases shared across the engine.
//!
//! Grid-local geometry is kept in `f32`, matching the resolution of the simulated depth
//! sensor this engine consumes; voxel *storage* element types are independently selectable
//! per channel, see [`crate::voxel::VoxelArray`].

use nalgebra::{Isometry3, Matrix3xX, Vector3};

/// A location in the grid's local reference frame (lower corner of the AABB at the origin).
pub type Point = Vector3<f32>;

/// A (not necessarily normalized) direction in 3D space.
pub type Direction = Vector3<f32>;

/// Number of voxels per axis, or an index into a [`crate::grid::GridProperties`] grid.
pub type GridSize = Vector3<usize>;

/// Index of a single voxel within the grid, same representation as [`GridSize`].
pub type VoxelIndex = Vector3<usize>;

/// A 3xN matrix of sensed points, column-major: one column per ray.
pub type PointMatrix = Matrix3xX<f32>;

/// Rigid transform from a sensor-local frame into the grid's local frame.
pub type Extrinsic = Isometry3<f32>;
