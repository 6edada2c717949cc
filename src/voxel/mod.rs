//! Per-voxel storage: the element-type tag, the tagged-variant array channels store their
//! data in, and the occupancy label byte.

mod array;
mod label;

pub use array::{DataType, VoxelArray};
pub use label::VoxelLabel;
