//! Owns the named channel map, the seen bitmap, and the single reusable trace buffer; fans one
//! ray trace out to every registered channel per sensed point.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::channels::VoxelChannel;
use crate::error::{ForgeScanError, InvalidMapKey};
use crate::grid::GridProperties;
use crate::raytrace;
use crate::trace::Trace;
use crate::types::{Extrinsic, Point, PointMatrix};

const POLICY_PREFIX: &str = "Policy";
const METRIC_PREFIX: &str = "Metric";

/// Shared, reference-counted handle to a registered channel. A Policy or Metric that keeps a
/// clone of this alive prevents [`Reconstruction::remove_channel`] from dropping the entry,
/// mirroring the original design's `shared_ptr::use_count()` gate without a reference cycle back
/// into the Reconstruction.
pub type ChannelHandle = Rc<RefCell<dyn VoxelChannel>>;

/// Owns the measured reconstruction of one voxel grid: a named, insertion-ordered map of data
/// channels, the seen bitmap they share, and the trace buffer reused across every ray in an
/// `update` call.
pub struct Reconstruction {
    grid: GridProperties,
    channels: IndexMap<String, ChannelHandle>,
    seen: Vec<bool>,
    min_dist_min: f32,
    max_dist_max: f32,
    trace: Trace,
}

impl Reconstruction {
    pub fn new(grid: GridProperties) -> Self {
        let seen = vec![false; grid.num_voxels()];
        Reconstruction {
            grid,
            channels: IndexMap::new(),
            seen,
            min_dist_min: 0.0,
            max_dist_max: 0.0,
            trace: Trace::default(),
        }
    }

    pub fn grid(&self) -> &GridProperties {
        &self.grid
    }

    /// Per-voxel flag: set the first time any ray (clipped to the channels' combined window)
    /// visits that voxel at a non-negative distance. Monotone non-decreasing across updates.
    pub fn seen(&self) -> &[bool] {
        &self.seen
    }

    /// The combined `[min_dist_min, max_dist_max]` window the ray tracer clips every ray to, so
    /// no voxel outside any channel's interest is ever visited.
    pub fn dist_window(&self) -> (f32, f32) {
        (self.min_dist_min, self.max_dist_max)
    }

    /// Registers a channel under `name`. Rejects an empty name, a duplicate, and any name
    /// beginning with a reserved prefix (`"Policy"`/`"Metric"`) — those may only be inserted via
    /// [`Self::metric_add_channel`]/[`Self::policy_add_channel`].
    pub fn add_channel(&mut self, name: &str, channel: ChannelHandle) -> Result<(), ForgeScanError> {
        check_reserved(name)?;
        self.insert_channel(name.to_string(), channel)
    }

    /// Privileged insertion path for a Metric: prepends the reserved `"Metric"` prefix itself,
    /// bypassing the unprivileged-path check in [`Self::add_channel`].
    pub fn metric_add_channel(&mut self, metric_name: &str, channel: ChannelHandle) -> Result<(), ForgeScanError> {
        if metric_name.is_empty() {
            return Err(InvalidMapKey::NoNameProvided.into());
        }
        self.insert_channel(format!("{METRIC_PREFIX}{metric_name}"), channel)
    }

    /// Privileged insertion path for a Policy: prepends the reserved `"Policy"` prefix itself,
    /// bypassing the unprivileged-path check in [`Self::add_channel`].
    pub fn policy_add_channel(&mut self, policy_name: &str, channel: ChannelHandle) -> Result<(), ForgeScanError> {
        if policy_name.is_empty() {
            return Err(InvalidMapKey::NoNameProvided.into());
        }
        self.insert_channel(format!("{POLICY_PREFIX}{policy_name}"), channel)
    }

    fn insert_channel(&mut self, name: String, channel: ChannelHandle) -> Result<(), ForgeScanError> {
        if self.channels.contains_key(&name) {
            return Err(InvalidMapKey::NameAlreadyExists(name).into());
        }
        log::debug!("registering channel \"{name}\"");
        self.channels.insert(name, channel);
        self.recompute_dist_window();
        Ok(())
    }

    /// Returns a cloned, shared handle to the channel registered under `name`.
    pub fn get_channel(&self, name: &str) -> Result<ChannelHandle, InvalidMapKey> {
        self.channels
            .get(name)
            .cloned()
            .ok_or_else(|| InvalidMapKey::NonexistentValue(name.to_string()))
    }

    /// Removes the channel registered under `name`. Succeeds (`Ok(true)`) only if no external
    /// owner besides this map still holds a clone of its handle; returns `Ok(false)` if the name
    /// is absent or still shared.
    pub fn remove_channel(&mut self, name: &str) -> bool {
        let Some(channel) = self.channels.get(name) else {
            return false;
        };
        if Rc::strong_count(channel) > 1 {
            return false;
        }
        self.channels.shift_remove(name);
        log::debug!("removed channel \"{name}\"");
        self.recompute_dist_window();
        true
    }

    fn recompute_dist_window(&mut self) {
        let mut min_dist_min = 0.0_f32;
        let mut max_dist_max = 0.0_f32;
        for channel in self.channels.values() {
            let (dist_min, dist_max) = channel.borrow().dist_window();
            min_dist_min = min_dist_min.min(dist_min);
            max_dist_max = max_dist_max.max(dist_max);
        }
        self.min_dist_min = min_dist_min;
        self.max_dist_max = max_dist_max;
    }

    /// Transforms `sensed_points` (sensor-local) into the grid's frame with `extrinsic`, traces a
    /// ray from `extrinsic`'s translation to each transformed point, and fans the resulting trace
    /// out to every registered channel in insertion order. Runs every channel's `post_update`
    /// once, after all points, also in insertion order.
    pub fn update(&mut self, sensed_points: &PointMatrix, extrinsic: &Extrinsic) -> Result<(), ForgeScanError> {
        let origin = extrinsic.translation.vector;
        let (dist_min, dist_max) = (self.min_dist_min, self.max_dist_max);

        for column in sensed_points.column_iter() {
            let sensed = transform_point(extrinsic, Point::new(column.x, column.y, column.z));

            let hit = raytrace::trace(&mut self.trace, sensed, origin, &self.grid, dist_min, dist_max)?;
            if !hit {
                continue;
            }

            let start = self.trace.first_above(0.0);
            for v in &self.trace.voxels()[start..] {
                self.seen[v.index] = true;
            }

            for channel in self.channels.values() {
                channel.borrow_mut().update(&self.trace)?;
            }
        }

        for channel in self.channels.values() {
            channel.borrow_mut().post_update();
        }

        Ok(())
    }
}

/// Applies a rigid transform to a grid-local point.
fn transform_point(extrinsic: &Extrinsic, point: Point) -> Point {
    (extrinsic * nalgebra::Point3::from(point)).coords
}

fn check_reserved(name: &str) -> Result<(), InvalidMapKey> {
    if name.is_empty() {
        Err(InvalidMapKey::NoNameProvided)
    } else if name.starts_with(POLICY_PREFIX) || name.starts_with(METRIC_PREFIX) {
        Err(InvalidMapKey::ReservedMapKey(name.to_string()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::{Binary, Tsdf, TsdfMode};
    use crate::types::GridSize;
    use crate::voxel::DataType;

    fn grid() -> GridProperties {
        GridProperties::new(1.0, GridSize::new(3, 3, 3))
    }

    fn handle(channel: impl VoxelChannel + 'static) -> ChannelHandle {
        Rc::new(RefCell::new(channel))
    }

    #[test]
    fn add_channel_rejects_empty_and_reserved_names() {
        let mut recon = Reconstruction::new(grid());
        let binary = handle(Binary::new(grid(), 0.0, f32::INFINITY, true));
        assert!(matches!(recon.add_channel("", binary.clone()), Err(ForgeScanError::InvalidMapKey(InvalidMapKey::NoNameProvided))));
        assert!(matches!(
            recon.add_channel("PolicyFoo", binary),
            Err(ForgeScanError::InvalidMapKey(InvalidMapKey::ReservedMapKey(_)))
        ));
    }

    #[test]
    fn add_channel_rejects_duplicate_names() {
        let mut recon = Reconstruction::new(grid());
        recon.add_channel("occ", handle(Binary::new(grid(), 0.0, f32::INFINITY, true))).unwrap();
        let err = recon.add_channel("occ", handle(Binary::new(grid(), 0.0, f32::INFINITY, true))).unwrap_err();
        assert!(matches!(err, ForgeScanError::InvalidMapKey(InvalidMapKey::NameAlreadyExists(_))));
    }

    #[test]
    fn remove_channel_fails_while_an_external_handle_is_held() {
        let mut recon = Reconstruction::new(grid());
        let binary = handle(Binary::new(grid(), 0.0, f32::INFINITY, true));
        recon.add_channel("occ", binary.clone()).unwrap();

        assert!(!recon.remove_channel("occ"));
        drop(binary);
        assert!(recon.remove_channel("occ"));
    }

    #[test]
    fn metric_and_policy_paths_prepend_the_reserved_prefix() {
        let mut recon = Reconstruction::new(grid());
        recon
            .metric_add_channel("Confusion", handle(Binary::new(grid(), 0.0, f32::INFINITY, true)))
            .unwrap();
        assert!(recon.get_channel("MetricConfusion").is_ok());
    }

    #[test]
    fn update_visits_every_registered_channel_and_marks_seen() {
        let mut recon = Reconstruction::new(grid());
        recon.add_channel("occ", handle(Binary::new(grid(), 0.0, f32::INFINITY, true))).unwrap();
        recon
            .add_channel("tsdf", handle(Tsdf::new(grid(), -0.5, 0.5, TsdfMode::MinMagnitude, DataType::F32).unwrap()))
            .unwrap();

        // Sensor-local point that `extrinsic`'s translation carries to grid-local (1.0, 1.0, 0.4),
        // perturbed off the z=0.5 voxel-boundary tie so the crossing distances are unambiguous.
        let mut sensed = PointMatrix::zeros(1);
        sensed.set_column(0, &Point::new(0.0, 0.0, -4.6));
        let extrinsic = Extrinsic::translation(1.0, 1.0, 5.0);

        recon.update(&sensed, &extrinsic).unwrap();

        let beyond_surface = recon.grid().at(crate::types::VoxelIndex::new(1, 1, 1)).unwrap();
        assert!(recon.seen()[beyond_surface]);

        let occ_handle = recon.get_channel("occ").unwrap();
        let occ = occ_handle.borrow();
        assert_eq!(occ.element_type(), DataType::U8);
    }

    #[test]
    fn dist_window_tracks_the_widest_channel_interest() {
        let mut recon = Reconstruction::new(grid());
        recon
            .add_channel("tsdf", handle(Tsdf::new(grid(), -0.3, 0.3, TsdfMode::MinMagnitude, DataType::F32).unwrap()))
            .unwrap();
        assert_eq!(recon.dist_window(), (-0.3, 0.3));
    }
}
