//! Per-voxel view counter: increments once per `Reconstruction::update` pass (not once per ray),
//! using the array element's top two bits as transient per-update flags.

use crate::channels::VoxelChannel;
use crate::error::{DataVariantError, GridPropertyError};
use crate::grid::GridProperties;
use crate::trace::Trace;
use crate::voxel::{DataType, VoxelArray};

/// View-counting channel. Element type must be an unsigned integer; the top two bits of each
/// cell are reserved as `update()`-time flags and consolidated away by `post_update`, so the
/// usable counter range is two bits narrower than the element type's full width.
#[derive(Debug, Clone)]
pub struct CountViews {
    grid: GridProperties,
    data: VoxelArray,
    viewed_count: usize,
    occluded_count: usize,
    unseen_count: usize,
}

impl CountViews {
    pub fn new(grid: GridProperties, element_type: DataType) -> Result<Self, DataVariantError> {
        let data = VoxelArray::new(element_type, DataType::ANY_UINT, grid.num_voxels(), 0.0, "CountViews")?;
        Ok(CountViews {
            grid,
            data,
            viewed_count: 0,
            occluded_count: 0,
            unseen_count: 0,
        })
    }

    pub fn data(&self) -> &VoxelArray {
        &self.data
    }

    pub fn viewed_count(&self) -> usize {
        self.viewed_count
    }

    pub fn occluded_count(&self) -> usize {
        self.occluded_count
    }

    pub fn unseen_count(&self) -> usize {
        self.unseen_count
    }
}

impl VoxelChannel for CountViews {
    fn grid(&self) -> &GridProperties {
        &self.grid
    }

    fn element_type(&self) -> DataType {
        self.data.data_type()
    }

    fn dist_window(&self) -> (f32, f32) {
        (f32::NEG_INFINITY, f32::INFINITY)
    }

    fn update(&mut self, trace: &Trace) -> Result<(), GridPropertyError> {
        macro_rules! mark {
            ($vec:expr, $ty:ty) => {{
                let viewed: $ty = !(<$ty>::MAX >> 1);
                let occluded: $ty = (!(<$ty>::MAX >> 2)) ^ viewed;
                for v in trace.voxels() {
                    $vec[v.index] |= if v.dist > 0.0 { viewed } else { occluded };
                }
            }};
        }
        match &mut self.data {
            VoxelArray::U8(vec) => mark!(vec, u8),
            VoxelArray::U16(vec) => mark!(vec, u16),
            VoxelArray::U32(vec) => mark!(vec, u32),
            VoxelArray::U64(vec) => mark!(vec, u64),
            _ => unreachable!("construction restricts this channel to unsigned integer storage"),
        }
        Ok(())
    }

    /// Consolidates this update's viewed/occluded flags into the saturating counter and
    /// clears the flag bits, then reports running totals for the pass just finished.
    fn post_update(&mut self) {
        macro_rules! consolidate {
            ($vec:expr, $ty:ty) => {{
                let viewed: $ty = !(<$ty>::MAX >> 1);
                let occluded: $ty = (!(<$ty>::MAX >> 2)) ^ viewed;
                let ceiling: $ty = <$ty>::MAX >> 2;
                self.viewed_count = 0;
                self.occluded_count = 0;
                self.unseen_count = 0;
                for cell in $vec.iter_mut() {
                    let was_viewed = (*cell & viewed) != 0;
                    let was_occluded = (*cell & occluded) != 0 && !was_viewed;
                    let mut counter = *cell & ceiling;
                    if was_viewed && counter != ceiling {
                        counter += 1;
                    }
                    *cell = counter;
                    self.viewed_count += was_viewed as usize;
                    self.occluded_count += was_occluded as usize;
                    self.unseen_count += !(was_viewed || was_occluded) as usize;
                }
            }};
        }
        match &mut self.data {
            VoxelArray::U8(vec) => consolidate!(vec, u8),
            VoxelArray::U16(vec) => consolidate!(vec, u16),
            VoxelArray::U32(vec) => consolidate!(vec, u32),
            VoxelArray::U64(vec) => consolidate!(vec, u64),
            _ => unreachable!("construction restricts this channel to unsigned integer storage"),
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
    fn rejects_signed_element_type() {
        let err = CountViews::new(grid(), DataType::I8).unwrap_err();
        assert!(matches!(err, DataVariantError::VoxelGridDoesNotSupport { .. }));
    }

    #[test]
    fn a_viewed_voxel_increments_once_per_pass_regardless_of_ray_count() {
        let mut cv = CountViews::new(grid(), DataType::U8).unwrap();
        let mut t = Trace::default();
        t.push(0, 0.5);
        t.push(0, 1.5);
        cv.update(&t).unwrap();
        cv.post_update();

        let VoxelArray::U8(vec) = cv.data() else { unreachable!() };
        assert_eq!(vec[0], 1);
        assert_eq!(cv.viewed_count(), 1);
        assert_eq!(cv.occluded_count(), 0);
    }

    #[test]
    fn an_occluded_only_voxel_does_not_increment_the_counter() {
        let mut cv = CountViews::new(grid(), DataType::U8).unwrap();
        let mut t = Trace::default();
        t.push(0, -0.5);
        cv.update(&t).unwrap();
        cv.post_update();

        let VoxelArray::U8(vec) = cv.data() else { unreachable!() };
        assert_eq!(vec[0], 0);
        assert_eq!(cv.occluded_count(), 1);
    }

    #[test]
    fn counter_saturates_instead_of_overflowing_into_the_flag_bits() {
        let mut cv = CountViews::new(grid(), DataType::U8).unwrap();
        let ceiling: u8 = u8::MAX >> 2;
        for _ in 0..(ceiling as usize + 5) {
            let mut t = Trace::default();
            t.push(0, 0.5);
            cv.update(&t).unwrap();
            cv.post_update();
        }
        let VoxelArray::U8(vec) = cv.data() else { unreachable!() };
        assert_eq!(vec[0], ceiling);
    }
}
