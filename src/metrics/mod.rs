//! Occupancy-confusion metric: scores an occupancy-yielding channel's measurement against a
//! ground-truth occupancy grid after each reconstruction update.

use crate::channels::{Binary, Probability};
use crate::error::GridPropertyError;
use crate::ground_truth::GroundTruthOccupancy;
use crate::voxel::VoxelLabel;

/// Anything that can report a dense occupancy-label measurement for comparison against a
/// [`GroundTruthOccupancy`]. Implemented by the two occupancy-yielding channels, so the metric
/// never needs a back-reference into a `Reconstruction`'s channel map.
pub trait OccupancyMeasurement {
    fn occupancy_labels(&self) -> Vec<VoxelLabel>;
}

impl OccupancyMeasurement for Binary {
    fn occupancy_labels(&self) -> Vec<VoxelLabel> {
        self.data().to_vec()
    }
}

impl OccupancyMeasurement for Probability {
    fn occupancy_labels(&self) -> Vec<VoxelLabel> {
        self.occupancy_view(None)
    }
}

/// One update's confusion counts. `tp + tn + fp + fn_ + unknown` always equals the grid's
/// `num_voxels` (spec property P7).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Confusion {
    pub tp: usize,
    pub tn: usize,
    pub fp: usize,
    pub fn_: usize,
    pub unknown: usize,
}

impl Confusion {
    pub fn sum(&self) -> usize {
        self.tp + self.tn + self.fp + self.fn_ + self.unknown
    }
}

/// A single row of the metric's history: which reconstruction update it came from, and that
/// update's confusion counts.
#[derive(Debug, Clone, Copy)]
pub struct ConfusionRow {
    pub update_index: usize,
    pub confusion: Confusion,
}

/// Scores an occupancy measurement against ground truth after every reconstruction update,
/// accumulating a history of confusion rows.
#[derive(Debug)]
pub struct OccupancyConfusion {
    ground_truth: GroundTruthOccupancy,
    history: Vec<ConfusionRow>,
}

impl OccupancyConfusion {
    /// Fails if `ground_truth`'s grid properties do not match the reconstruction's.
    pub fn new(
        reconstruction_grid: &crate::grid::GridProperties,
        ground_truth: GroundTruthOccupancy,
    ) -> Result<Self, GridPropertyError> {
        if !reconstruction_grid.equal(ground_truth.grid()) {
            return Err(GridPropertyError::PropertiesDoNotMatch {
                a: "Reconstruction".to_string(),
                b: "GroundTruthOccupancy".to_string(),
            });
        }
        Ok(OccupancyConfusion {
            ground_truth,
            history: Vec::new(),
        })
    }

    pub fn history(&self) -> &[ConfusionRow] {
        &self.history
    }

    /// Compares `measurement` (one label per voxel, same order as the grid) against ground
    /// truth and appends a new history row tagged `update_index`.
    pub fn record(&mut self, update_index: usize, measurement: &dyn OccupancyMeasurement) -> Confusion {
        let labels = measurement.occupancy_labels();
        let truth = self.ground_truth.data();
        debug_assert_eq!(labels.len(), truth.len());

        let mut confusion = Confusion::default();
        for (t, m) in truth.iter().zip(labels.iter()) {
            if m.is_occupied() && t.is_occupied() {
                confusion.tp += 1;
            } else if m.is_free() && t.is_free() {
                confusion.tn += 1;
            } else if (m.is_unknown() || m.is_occupied()) && t.is_free() {
                confusion.fp += 1;
            } else if m.is_free() && t.is_occupied() {
                confusion.fn_ += 1;
            } else {
                confusion.unknown += 1;
            }
        }

        log::debug!(
            "occupancy confusion @update {update_index}: tp={} tn={} fp={} fn={} unknown={}",
            confusion.tp,
            confusion.tn,
            confusion.fp,
            confusion.fn_,
            confusion.unknown
        );
        self.history.push(ConfusionRow { update_index, confusion });
        confusion
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridProperties;
    use crate::types::{Extrinsic, GridSize, PointMatrix};

    fn grid() -> GridProperties {
        GridProperties::new(1.0, GridSize::new(3, 3, 3))
    }

    struct AllInside;
    impl crate::ground_truth::MeshSampler for AllInside {
        fn occupancy_votes(&self, points: &PointMatrix) -> Vec<f32> {
            vec![1.0; points.ncols()]
        }
        fn signed_distances(&self, points: &PointMatrix) -> Vec<f32> {
            vec![-1.0; points.ncols()]
        }
    }

    struct AllLabel(VoxelLabel);
    impl OccupancyMeasurement for AllLabel {
        fn occupancy_labels(&self) -> Vec<VoxelLabel> {
            vec![self.0; grid().num_voxels()]
        }
    }

    #[test]
    fn rejects_mismatched_grid_properties() {
        let mismatched_grid = GridProperties::new(1.0, GridSize::new(4, 4, 4));
        let gt = GroundTruthOccupancy::compute(mismatched_grid, &Extrinsic::identity(), &AllInside);
        let err = OccupancyConfusion::new(&grid(), gt).unwrap_err();
        assert!(matches!(err, GridPropertyError::PropertiesDoNotMatch { .. }));
    }

    #[test]
    fn confusion_counts_sum_to_num_voxels() {
        let gt = GroundTruthOccupancy::compute(grid(), &Extrinsic::identity(), &AllInside);
        let mut metric = OccupancyConfusion::new(&grid(), gt).unwrap();

        let confusion = metric.record(0, &AllLabel(VoxelLabel::OCCUPIED));
        assert_eq!(confusion.sum(), grid().num_voxels());
        assert_eq!(confusion, Confusion { tp: grid().num_voxels(), ..Default::default() });
    }

    #[test]
    fn history_accumulates_one_row_per_record_call() {
        let gt = GroundTruthOccupancy::compute(grid(), &Extrinsic::identity(), &AllInside);
        let mut metric = OccupancyConfusion::new(&grid(), gt).unwrap();
        metric.record(0, &AllLabel(VoxelLabel::OCCUPIED));
        metric.record(1, &AllLabel(VoxelLabel::FREE));
        assert_eq!(metric.history().len(), 2);
        assert_eq!(metric.history()[1].update_index, 1);
    }
}
