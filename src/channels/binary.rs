//! Binary occupancy channel, with post-update occplane (occlusion-plane) extraction.

use crate::channels::{ordered_window, VoxelChannel};
use crate::error::GridPropertyError;
use crate::grid::GridProperties;
use crate::trace::{SensedLocation, Trace};
use crate::types::{Point, VoxelIndex};
use crate::voxel::{DataType, VoxelLabel};

/// An occplane voxel's center and the unit normal pointing toward the free space that exposed
/// it, produced by [`Binary::extract_occplanes_tracked`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Occplane {
    pub center: Point,
    pub normal: Point,
}

/// Binary occupancy channel. Element type is fixed at `u8`, interpreted as [`VoxelLabel`].
#[derive(Debug, Clone)]
pub struct Binary {
    grid: GridProperties,
    dist_min: f32,
    dist_max: f32,
    data: Vec<VoxelLabel>,
    skip_occplane: bool,
}

impl Binary {
    pub fn new(grid: GridProperties, dist_min: f32, dist_max: f32, skip_occplane: bool) -> Self {
        let (dist_min, dist_max) = ordered_window(dist_min, dist_max);
        let data = vec![VoxelLabel::UNSEEN; grid.num_voxels()];
        Binary {
            grid,
            dist_min,
            dist_max,
            data,
            skip_occplane,
        }
    }

    pub fn data(&self) -> &[VoxelLabel] {
        &self.data
    }

    /// Marks every interior `TYPE_UNKNOWN` voxel with at least one `TYPE_FREE` 6-neighbor as
    /// `TYPE_OCCPLANE`. A no-op if the grid is smaller than `3x3x3` in any axis.
    pub fn extract_occplanes(&mut self) {
        self.extract_occplanes_impl(None);
    }

    /// Same as [`Self::extract_occplanes`], but also returns the center/normal of every voxel
    /// it marks, for a policy that wants to act on the occlusion frontier directly.
    pub fn extract_occplanes_tracked(&mut self) -> Vec<Occplane> {
        let mut out = Vec::new();
        self.extract_occplanes_impl(Some(&mut out));
        out
    }

    fn extract_occplanes_impl(&mut self, mut tracked: Option<&mut Vec<Occplane>>) {
        let size = self.grid.size();
        if size.x < 3 || size.y < 3 || size.z < 3 {
            return;
        }

        let dx = 1_usize;
        let dy = size.x;
        let dz = size.x * size.y;
        let resolution = self.grid.resolution();

        for z in 1..size.z - 1 {
            for y in 1..size.y - 1 {
                for x in 1..size.x - 1 {
                    let c_idx = self.grid.index_to_vector(VoxelIndex::new(x, y, z));
                    if !self.data[c_idx].is_unknown() {
                        continue;
                    }

                    let neighbor_free = |idx: usize| self.data[idx].is_free();
                    let px = neighbor_free(c_idx + dx);
                    let nx = neighbor_free(c_idx - dx);
                    let py = neighbor_free(c_idx + dy);
                    let ny = neighbor_free(c_idx - dy);
                    let pz = neighbor_free(c_idx + dz);
                    let nz = neighbor_free(c_idx - dz);

                    if !(px || nx || py || ny || pz || nz) {
                        continue;
                    }

                    self.data[c_idx] = self.data[c_idx].with_occplane();

                    if let Some(out) = tracked.as_deref_mut() {
                        let normal = Point::new(
                            px as i32 as f32 - nx as i32 as f32,
                            py as i32 as f32 - ny as i32 as f32,
                            pz as i32 as f32 - nz as i32 as f32,
                        );
                        out.push(Occplane {
                            center: Point::new(x as f32 * resolution, y as f32 * resolution, z as f32 * resolution),
                            normal: normal.normalize(),
                        });
                    }
                }
            }
        }
    }
}

impl VoxelChannel for Binary {
    fn grid(&self) -> &GridProperties {
        &self.grid
    }

    fn element_type(&self) -> DataType {
        DataType::U8
    }

    fn dist_window(&self) -> (f32, f32) {
        (self.dist_min, self.dist_max)
    }

    fn update(&mut self, trace: &Trace) -> Result<(), GridPropertyError> {
        let iter = trace.first_above(self.dist_min);
        let last_occ = trace.first_above_from(0.0, iter);
        let last_free = trace.first_above_from(self.dist_max, last_occ);

        for v in &trace.voxels()[iter..last_occ] {
            if self.data[v.index] != VoxelLabel::OCCUPIED {
                self.data[v.index] = VoxelLabel::OCCLUDED;
            }
        }
        for v in &trace.voxels()[last_occ..last_free] {
            self.data[v.index] = VoxelLabel::FREE;
        }

        if trace.sensed_location() == Some(SensedLocation::In) {
            let idx = self.grid.at_point(trace.sensed())?;
            self.data[idx] = VoxelLabel::OCCUPIED;
        }

        Ok(())
    }

    fn post_update(&mut self) {
        if !self.skip_occplane {
            self.extract_occplanes();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GridSize;

    fn grid() -> GridProperties {
        GridProperties::new(1.0, GridSize::new(3, 3, 3))
    }

    #[test]
    fn axial_ray_marks_occupied_then_free() {
        let mut binary = Binary::new(grid(), 0.0, f32::INFINITY, true);
        let mut t = Trace::default();
        t.push(binary.grid().at(VoxelIndex::new(1, 1, 0)).unwrap(), -0.5);
        t.push(binary.grid().at(VoxelIndex::new(1, 1, 1)).unwrap(), 0.5);
        t.push(binary.grid().at(VoxelIndex::new(1, 1, 2)).unwrap(), 1.5);
        t.set_sensed_location(SensedLocation::In);
        t.set_sensed(Point::new(1.0, 1.0, 0.0));

        binary.update(&t).unwrap();

        assert_eq!(binary.data()[binary.grid().at(VoxelIndex::new(1, 1, 0)).unwrap()], VoxelLabel::OCCUPIED);
        assert_eq!(binary.data()[binary.grid().at(VoxelIndex::new(1, 1, 1)).unwrap()], VoxelLabel::FREE);
        assert_eq!(binary.data()[binary.grid().at(VoxelIndex::new(1, 1, 2)).unwrap()], VoxelLabel::FREE);
    }

    #[test]
    fn occupied_voxel_is_never_downgraded_within_one_pass() {
        let mut binary = Binary::new(grid(), -1.0, f32::INFINITY, true);
        let target = binary.grid().at(VoxelIndex::new(1, 1, 1)).unwrap();
        binary.data[target] = VoxelLabel::OCCUPIED;

        let mut t = Trace::default();
        t.push(target, -0.5);
        binary.update(&t).unwrap();

        assert_eq!(binary.data()[target], VoxelLabel::OCCUPIED);
    }

    #[test]
    fn occplane_marks_unknown_neighbors_of_free_space() {
        let mut binary = Binary::new(grid(), 0.0, f32::INFINITY, true);
        for y in 0..3 {
            for x in 0..3 {
                let idx = binary.grid().at(VoxelIndex::new(x, y, 0)).unwrap();
                binary.data[idx] = VoxelLabel::FREE;
            }
        }
        binary.extract_occplanes();

        let z1 = binary.grid().at(VoxelIndex::new(1, 1, 1)).unwrap();
        assert!(binary.data()[z1].is_occplane());

        let z2 = binary.grid().at(VoxelIndex::new(1, 1, 2)).unwrap();
        assert!(!binary.data()[z2].is_occplane());
    }

    #[test]
    fn occplane_tracking_reports_a_normal_pointing_at_free_space() {
        let mut binary = Binary::new(grid(), 0.0, f32::INFINITY, true);
        for y in 0..3 {
            for x in 0..3 {
                let idx = binary.grid().at(VoxelIndex::new(x, y, 0)).unwrap();
                binary.data[idx] = VoxelLabel::FREE;
            }
        }
        let occplanes = binary.extract_occplanes_tracked();
        assert!(occplanes.iter().any(|o| o.normal.z < 0.0));
    }

    #[test]
    fn occplane_is_a_no_op_below_minimum_grid_size() {
        let mut binary = Binary::new(GridProperties::new(1.0, GridSize::new(2, 2, 2)), 0.0, f32::INFINITY, true);
        binary.extract_occplanes();
        assert!(binary.data().iter().all(|l| *l == VoxelLabel::UNSEEN));
    }
}
