//! Per-voxel ray count: increments on every trace entry within the update window, with
//! multiplicity if a ray is re-traced.

use crate::channels::{ordered_window, VoxelChannel};
use crate::error::{DataVariantError, GridPropertyError};
use crate::grid::GridProperties;
use crate::trace::Trace;
use crate::voxel::{DataType, VoxelArray};

#[derive(Debug, Clone)]
pub struct UpdateCount {
    grid: GridProperties,
    dist_min: f32,
    dist_max: f32,
    data: VoxelArray,
}

impl UpdateCount {
    pub fn new(
        grid: GridProperties,
        dist_min: f32,
        dist_max: f32,
        element_type: DataType,
    ) -> Result<Self, DataVariantError> {
        let (dist_min, dist_max) = ordered_window(dist_min, dist_max);
        let data = VoxelArray::new(element_type, DataType::ANY, grid.num_voxels(), 0.0, "UpdateCount")?;
        Ok(UpdateCount {
            grid,
            dist_min,
            dist_max,
            data,
        })
    }

    pub fn data(&self) -> &VoxelArray {
        &self.data
    }
}

impl VoxelChannel for UpdateCount {
    fn grid(&self) -> &GridProperties {
        &self.grid
    }

    fn element_type(&self) -> DataType {
        self.data.data_type()
    }

    fn dist_window(&self) -> (f32, f32) {
        (self.dist_min, self.dist_max)
    }

    fn update(&mut self, trace: &Trace) -> Result<(), GridPropertyError> {
        let start = trace.first_above(self.dist_min);
        let end = trace.first_above_from(self.dist_max, start);
        for v in &trace.voxels()[start..end] {
            let count = self.data.get_f64(v.index);
            self.data.set_f64(v.index, count + 1.0);
        }
        Ok(())
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
    fn counts_with_multiplicity_across_calls() {
        let mut counts = UpdateCount::new(grid(), 0.0, f32::INFINITY, DataType::U32).unwrap();
        let mut t = Trace::default();
        t.push(3, 0.5);
        counts.update(&t).unwrap();
        counts.update(&t).unwrap();
        assert_eq!(counts.data().get_f64(3), 2.0);
    }

    #[test]
    fn ignores_entries_outside_the_window() {
        let mut counts = UpdateCount::new(grid(), 0.0, 1.0, DataType::U32).unwrap();
        let mut t = Trace::default();
        t.push(3, 5.0);
        counts.update(&t).unwrap();
        assert_eq!(counts.data().get_f64(3), 0.0);
    }
}
