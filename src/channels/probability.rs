//! Log-odds occupancy probability channel.

use crate::channels::{ordered_window, VoxelChannel};
use crate::error::{DataVariantError, GridPropertyError};
use crate::grid::GridProperties;
use crate::mathx::{lerp, log_odds};
use crate::trace::Trace;
use crate::voxel::{DataType, VoxelArray, VoxelLabel};

/// Log-odds occupancy-probability channel (similar in spirit to OctoMap's update rule).
/// Element type is `f32` or `f64`.
#[derive(Debug, Clone)]
pub struct Probability {
    grid: GridProperties,
    dist_min: f32,
    dist_max: f32,
    data: VoxelArray,
    log_p_max: f64,
    log_p_min: f64,
    p_past: f64,
    p_sensed: f64,
    p_far: f64,
    log_p_thresh: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct ProbabilityParams {
    pub p_max: f64,
    pub p_min: f64,
    pub p_past: f64,
    pub p_sensed: f64,
    pub p_far: f64,
    pub p_init: f64,
    pub p_thresh: f64,
}

impl Default for ProbabilityParams {
    fn default() -> Self {
        ProbabilityParams {
            p_max: 0.98,
            p_min: 0.02,
            p_past: 0.60,
            p_sensed: 0.80,
            p_far: 0.10,
            p_init: 0.60,
            p_thresh: 0.51,
        }
    }
}

impl Probability {
    pub fn new(
        grid: GridProperties,
        dist_min: f32,
        dist_max: f32,
        params: ProbabilityParams,
        element_type: DataType,
    ) -> Result<Self, DataVariantError> {
        let (dist_min, dist_max) = ordered_window(dist_min, dist_max);
        let clamp01 = |p: f64| p.clamp(0.0, 1.0);
        let log_p_init = log_odds(clamp01(params.p_init));
        let data = VoxelArray::new(
            element_type,
            DataType::ANY_FLOAT,
            grid.num_voxels(),
            log_p_init,
            "Probability",
        )?;
        Ok(Probability {
            grid,
            dist_min,
            dist_max,
            data,
            log_p_max: log_odds(clamp01(params.p_max)),
            log_p_min: log_odds(clamp01(params.p_min)),
            p_past: clamp01(params.p_past),
            p_sensed: clamp01(params.p_sensed),
            p_far: clamp01(params.p_far),
            log_p_thresh: log_odds(clamp01(params.p_thresh)),
        })
    }

    pub fn data(&self) -> &VoxelArray {
        &self.data
    }

    /// Instantaneous occupancy probability implied by a single trace entry's signed distance.
    fn instantaneous_probability(&self, d: f32) -> f64 {
        let d = d as f64;
        if d <= 0.0 {
            let dx = (d / self.dist_min as f64).abs();
            lerp(self.p_sensed, self.p_past, dx)
        } else if d <= self.dist_max as f64 {
            let dx = (d / self.dist_max as f64).abs();
            lerp(self.p_sensed, self.p_far, dx)
        } else {
            self.p_far
        }
    }

    /// Derives an occupancy view: below `p_thresh` is `FREE`; otherwise `OCCUPIED` if the voxel
    /// is flagged `seen` (or no seen information is supplied), else `UNSEEN`.
    pub fn occupancy_view(&self, seen: Option<&[bool]>) -> Vec<VoxelLabel> {
        (0..self.data.len())
            .map(|i| {
                let log_odds = self.data.get_f64(i);
                if log_odds < self.log_p_thresh {
                    VoxelLabel::FREE
                } else if seen.map(|s| s[i]).unwrap_or(true) {
                    VoxelLabel::OCCUPIED
                } else {
                    VoxelLabel::UNSEEN
                }
            })
            .collect()
    }
}

impl VoxelChannel for Probability {
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
        for v in &trace.voxels()[start..] {
            let p_x = self.instantaneous_probability(v.dist);
            let updated = self.data.get_f64(v.index) + log_odds(p_x);
            self.data.set_f64(v.index, updated.clamp(self.log_p_min, self.log_p_max));
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

    fn ray_at(index: usize, dist: f32) -> Trace {
        let mut t = Trace::default();
        t.push(index, dist);
        t
    }

    #[test]
    fn saturates_at_log_odds_of_p_max_under_repeated_sensing() {
        let params = ProbabilityParams {
            p_max: 0.98,
            p_min: 0.02,
            p_sensed: 0.9,
            p_init: 0.5,
            ..Default::default()
        };
        let mut prob = Probability::new(grid(), -0.2, 0.2, params, DataType::F32).unwrap();
        for _ in 0..1000 {
            prob.update(&ray_at(13, 0.0)).unwrap();
        }
        let log_p_max = log_odds(0.98);
        assert!(prob.data().get_f64(13) <= log_p_max + 1e-6);
        assert!((prob.data().get_f64(13) - log_p_max).abs() < 1e-3);
    }

    #[test]
    fn stays_within_the_clamp_band_after_many_updates() {
        let params = ProbabilityParams::default();
        let log_p_min = log_odds(params.p_min);
        let log_p_max = log_odds(params.p_max);
        let mut prob = Probability::new(grid(), -0.2, 0.2, params, DataType::F64).unwrap();
        for i in 0..50 {
            let d = if i % 2 == 0 { -0.1 } else { 5.0 };
            prob.update(&ray_at(4, d)).unwrap();
            let v = prob.data().get_f64(4);
            assert!(v >= log_p_min - 1e-9 && v <= log_p_max + 1e-9);
        }
    }

    #[test]
    fn occupancy_view_labels_below_threshold_as_free() {
        let params = ProbabilityParams::default();
        let mut prob = Probability::new(grid(), -0.2, 0.2, params, DataType::F32).unwrap();
        for _ in 0..20 {
            prob.update(&ray_at(7, 5.0)).unwrap();
        }
        let view = prob.occupancy_view(None);
        assert_eq!(view[7], VoxelLabel::FREE);
    }
}
