//! Truncated signed-distance function channel: minimum-magnitude or running-average accumulation.

use crate::channels::{ordered_window, VoxelChannel};
use crate::error::{DataVariantError, GridPropertyError};
use crate::grid::GridProperties;
use crate::mathx::smallest_magnitude;
use crate::trace::Trace;
use crate::voxel::{DataType, VoxelArray};

/// How a [`Tsdf`] channel folds repeated samples of the same voxel into one stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TsdfMode {
    /// Keeps whichever sample has the smallest absolute distance. Default fill is `-inf` so
    /// the very first sample always wins.
    MinMagnitude,
    /// Welford running mean (and variance, tracked but not exposed) of every sample. Default
    /// fill is `0`.
    Average,
}

/// Truncated signed-distance channel. Element type is `f32` or `f64`.
#[derive(Debug, Clone)]
pub struct Tsdf {
    grid: GridProperties,
    dist_min: f32,
    dist_max: f32,
    mode: TsdfMode,
    data: VoxelArray,
    sample_count: Vec<usize>,
    variance: Vec<f64>,
}

impl Tsdf {
    /// `dist_min`/`dist_max` default to `[-0.2, 0.2]` in the original design; this constructor
    /// takes them explicitly since there is no config layer at this level.
    pub fn new(
        grid: GridProperties,
        dist_min: f32,
        dist_max: f32,
        mode: TsdfMode,
        element_type: DataType,
    ) -> Result<Self, DataVariantError> {
        let (dist_min, dist_max) = ordered_window(dist_min, dist_max);
        let default_value = match mode {
            TsdfMode::MinMagnitude => f64::NEG_INFINITY,
            TsdfMode::Average => 0.0,
        };
        let n = grid.num_voxels();
        let data = VoxelArray::new(element_type, DataType::ANY_FLOAT, n, default_value, "TSDF")?;
        let (sample_count, variance) = match mode {
            TsdfMode::Average => (vec![0; n], vec![0.0; n]),
            TsdfMode::MinMagnitude => (Vec::new(), Vec::new()),
        };
        Ok(Tsdf {
            grid,
            dist_min,
            dist_max,
            mode,
            data,
            sample_count,
            variance,
        })
    }

    pub fn data(&self) -> &VoxelArray {
        &self.data
    }

    fn apply_sample(&mut self, i: usize, measured: f32) {
        match self.mode {
            TsdfMode::MinMagnitude => {
                let current = self.data.get_f64(i);
                self.data.set_f64(i, smallest_magnitude(current, measured as f64));
            }
            TsdfMode::Average => {
                let mut mean = self.data.get_f64(i);
                let var = &mut self.variance[i];
                let n = &mut self.sample_count[i];

                let delta = measured as f64 - mean;
                *var *= *n as f64;
                *n += 1;
                mean += delta / *n as f64;
                *var = (*var + delta * delta) / *n as f64;

                self.data.set_f64(i, mean);
            }
        }
    }
}

impl VoxelChannel for Tsdf {
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
            self.apply_sample(v.index, v.dist);
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

    fn trace_with(entries: &[(usize, f32)]) -> Trace {
        let mut t = Trace::default();
        for &(i, d) in entries {
            t.push(i, d);
        }
        t
    }

    #[test]
    fn rejects_non_floating_element_type() {
        let err = Tsdf::new(grid(), -0.5, 0.5, TsdfMode::MinMagnitude, DataType::U8).unwrap_err();
        assert!(matches!(err, DataVariantError::VoxelGridDoesNotSupport { .. }));
    }

    #[test]
    fn min_magnitude_keeps_the_smaller_of_two_samples() {
        let mut tsdf = Tsdf::new(grid(), -0.5, 0.5, TsdfMode::MinMagnitude, DataType::F32).unwrap();
        tsdf.update(&trace_with(&[(5, 0.3)])).unwrap();
        tsdf.update(&trace_with(&[(5, -0.1)])).unwrap();
        assert_eq!(tsdf.data().get_f64(5), -0.1_f32 as f64);
    }

    #[test]
    fn min_magnitude_is_idempotent_under_repeated_identical_samples() {
        let mut tsdf = Tsdf::new(grid(), -0.5, 0.5, TsdfMode::MinMagnitude, DataType::F32).unwrap();
        tsdf.update(&trace_with(&[(2, 0.2)])).unwrap();
        let once = tsdf.data().get_f64(2);
        tsdf.update(&trace_with(&[(2, 0.2)])).unwrap();
        assert_eq!(tsdf.data().get_f64(2), once);
    }

    #[test]
    fn average_mode_tracks_the_running_mean() {
        let mut tsdf = Tsdf::new(grid(), -0.5, 0.5, TsdfMode::Average, DataType::F64).unwrap();
        tsdf.update(&trace_with(&[(0, 0.2)])).unwrap();
        tsdf.update(&trace_with(&[(0, 0.4)])).unwrap();
        assert!((tsdf.data().get_f64(0) - 0.3).abs() < 1e-6);
    }

    #[test]
    fn update_skips_samples_outside_the_truncation_band() {
        let mut tsdf = Tsdf::new(grid(), -0.5, 0.5, TsdfMode::MinMagnitude, DataType::F32).unwrap();
        tsdf.update(&trace_with(&[(1, -0.9), (1, 0.9)])).unwrap();
        assert_eq!(tsdf.data().get_f64(1), f64::NEG_INFINITY);
    }
}
