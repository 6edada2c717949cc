//!
//! Voxel reconstruction engine for next-best-view simulation. Traces simulated depth-camera
//! rays through a uniform voxel grid and updates a set of per-voxel data channels (occupancy,
//! TSDF, log-odds probability, view counts) from the resulting traces. Entry point is
//! [`reconstruction::Reconstruction`].
//!

/// Re-export the version of nalgebra used by this crate
pub use nalgebra;

mod aabb;
pub mod channels;
pub mod error;
pub mod grid;
pub mod ground_truth;
mod mathx;
pub mod metrics;
pub mod raytrace;
pub mod reconstruction;
pub mod trace;
pub mod types;
pub mod voxel;

pub use channels::VoxelChannel;
pub use error::ForgeScanError;
pub use grid::GridProperties;
pub use trace::{SensedLocation, Trace, TraceVoxel};
pub use voxel::{DataType, VoxelArray, VoxelLabel};
