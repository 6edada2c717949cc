//! Voxel data channels: per-channel dense arrays with a fixed update window that consume a
//! [`Trace`](crate::trace::Trace) and update themselves once per traced ray.

mod binary;
mod count_views;
mod probability;
mod tsdf;
mod update_count;

pub use binary::Binary;
pub use count_views::CountViews;
pub use probability::Probability;
pub use tsdf::{Tsdf, TsdfMode};
pub use update_count::UpdateCount;

use crate::error::GridPropertyError;
use crate::grid::GridProperties;
use crate::trace::Trace;
use crate::voxel::DataType;

/// Shared contract for every voxel data channel.
///
/// A channel owns a dense array of `grid().num_voxels()` scalars of a fixed [`DataType`], a
/// fixed `[dist_min, dist_max]` update window, and a copy of the [`GridProperties`] it was built
/// against. `update` consumes one ray's trace; `post_update` runs once per
/// `Reconstruction::update` call, after every ray has been applied.
pub trait VoxelChannel {
    /// The grid this channel's array is sized against.
    fn grid(&self) -> &GridProperties;

    /// The concrete element type backing this channel's storage.
    fn element_type(&self) -> DataType;

    /// The inclusive signed-distance window this channel updates within.
    fn dist_window(&self) -> (f32, f32);

    /// Applies `trace` to this channel's array.
    fn update(&mut self, trace: &Trace) -> Result<(), GridPropertyError>;

    /// Runs once per `Reconstruction::update`, after every ray's `update` has been applied.
    /// Most channels have no post-update behavior.
    fn post_update(&mut self) {}
}

/// Clamps `dist_min <= dist_max`, matching every channel constructor in the original design.
pub(crate) fn ordered_window(dist_min: f32, dist_max: f32) -> (f32, f32) {
    (dist_min.min(dist_max), dist_min.max(dist_max))
}
