//! [`DataType`] tag and the [`VoxelArray`] sum type it selects.

use std::fmt;

use bitflags::bitflags;
use num::{FromPrimitive, ToPrimitive};

use crate::error::DataVariantError;

bitflags! {
    /// Tag identifying a channel's storage element type.
    ///
    /// A single set bit names a concrete type (`DataType::F32`); a channel's
    /// `accepted_type_mask` ORs together every type it is willing to store in, and
    /// construction checks `element_type` against that mask with a single bitwise-AND —
    /// never with equality, so the mask composes the same way [`crate::voxel::VoxelLabel`]
    /// classification masks do.
    pub struct DataType: u16 {
        const I8  = 1 << 0;
        const I16 = 1 << 1;
        const I32 = 1 << 2;
        const I64 = 1 << 3;
        const U8  = 1 << 4;
        const U16 = 1 << 5;
        const U32 = 1 << 6;
        const U64 = 1 << 7;
        const F32 = 1 << 8;
        const F64 = 1 << 9;

        /// Every integer type, signed or unsigned.
        const ANY_INT = Self::I8.bits | Self::I16.bits | Self::I32.bits | Self::I64.bits
            | Self::U8.bits | Self::U16.bits | Self::U32.bits | Self::U64.bits;
        /// Every floating-point type.
        const ANY_FLOAT = Self::F32.bits | Self::F64.bits;
        /// Every unsigned integer type.
        const ANY_UINT = Self::U8.bits | Self::U16.bits | Self::U32.bits | Self::U64.bits;
        /// Every type this crate knows how to store.
        const ANY = Self::ANY_INT.bits | Self::ANY_FLOAT.bits;
    }
}

impl DataType {
    /// True iff exactly one type bit is set, i.e. `self` names a concrete element type
    /// rather than a mask of several.
    pub fn is_concrete(&self) -> bool {
        self.bits().count_ones() == 1
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Dense per-voxel storage for a single channel, dispatched once per `update()` call rather
/// than per voxel: the channel selects its arm at construction and every subsequent access
/// goes through a `match` that the compiler specializes, not a per-element dynamic dispatch.
#[derive(Debug, Clone)]
pub enum VoxelArray {
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

macro_rules! dispatch {
    ($self:expr, $arr:ident => $body:expr) => {
        match $self {
            VoxelArray::I8($arr) => $body,
            VoxelArray::I16($arr) => $body,
            VoxelArray::I32($arr) => $body,
            VoxelArray::I64($arr) => $body,
            VoxelArray::U8($arr) => $body,
            VoxelArray::U16($arr) => $body,
            VoxelArray::U32($arr) => $body,
            VoxelArray::U64($arr) => $body,
            VoxelArray::F32($arr) => $body,
            VoxelArray::F64($arr) => $body,
        }
    };
}

impl VoxelArray {
    /// Allocates a `len`-voxel array of `element_type`, filled with `default_value` coerced
    /// into that type. Fails if `element_type` is not a concrete type in `accepted_mask`.
    pub fn new(
        element_type: DataType,
        accepted_mask: DataType,
        len: usize,
        default_value: f64,
        channel: &'static str,
    ) -> Result<Self, DataVariantError> {
        if !element_type.is_concrete() || !accepted_mask.contains(element_type) {
            return Err(DataVariantError::VoxelGridDoesNotSupport {
                channel,
                attempted: element_type,
                supported: accepted_mask_name(accepted_mask),
            });
        }

        Ok(match element_type {
            DataType::I8 => VoxelArray::I8(vec![cast(default_value); len]),
            DataType::I16 => VoxelArray::I16(vec![cast(default_value); len]),
            DataType::I32 => VoxelArray::I32(vec![cast(default_value); len]),
            DataType::I64 => VoxelArray::I64(vec![cast(default_value); len]),
            DataType::U8 => VoxelArray::U8(vec![cast(default_value); len]),
            DataType::U16 => VoxelArray::U16(vec![cast(default_value); len]),
            DataType::U32 => VoxelArray::U32(vec![cast(default_value); len]),
            DataType::U64 => VoxelArray::U64(vec![cast(default_value); len]),
            DataType::F32 => VoxelArray::F32(vec![cast(default_value); len]),
            DataType::F64 => VoxelArray::F64(vec![cast(default_value); len]),
            _ => unreachable!("is_concrete() guarantees exactly one of the arms above matches"),
        })
    }

    pub fn len(&self) -> usize {
        dispatch!(self, a => a.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data_type(&self) -> DataType {
        match self {
            VoxelArray::I8(_) => DataType::I8,
            VoxelArray::I16(_) => DataType::I16,
            VoxelArray::I32(_) => DataType::I32,
            VoxelArray::I64(_) => DataType::I64,
            VoxelArray::U8(_) => DataType::U8,
            VoxelArray::U16(_) => DataType::U16,
            VoxelArray::U32(_) => DataType::U32,
            VoxelArray::U64(_) => DataType::U64,
            VoxelArray::F32(_) => DataType::F32,
            VoxelArray::F64(_) => DataType::F64,
        }
    }

    /// Reads voxel `i` as an `f64`, widening from the array's concrete storage type.
    pub fn get_f64(&self, i: usize) -> f64 {
        dispatch!(self, a => a[i].to_f64().expect("primitive numeric conversion to f64"))
    }

    /// Writes voxel `i`, narrowing `value` to the array's concrete storage type.
    pub fn set_f64(&mut self, i: usize, value: f64) {
        dispatch!(self, a => a[i] = cast(value))
    }
}

fn cast<T: FromPrimitive>(value: f64) -> T {
    T::from_f64(value).expect("default/update value representable in the channel's element type")
}

fn accepted_mask_name(mask: DataType) -> &'static str {
    match mask {
        DataType::ANY => "any numeric type",
        DataType::ANY_INT => "any integer type",
        DataType::ANY_FLOAT => "any floating-point type",
        DataType::ANY_UINT => "any unsigned integer type",
        _ => "a restricted set of numeric types",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_rejects_type_outside_mask() {
        let err = VoxelArray::new(DataType::U8, DataType::ANY_FLOAT, 4, 0.0, "TSDF").unwrap_err();
        assert!(matches!(
            err,
            DataVariantError::VoxelGridDoesNotSupport { attempted: DataType::U8, .. }
        ));
    }

    #[test]
    fn construction_rejects_non_concrete_element_type() {
        let err = VoxelArray::new(DataType::ANY_INT, DataType::ANY, 4, 0.0, "UpdateCount").unwrap_err();
        assert!(matches!(err, DataVariantError::VoxelGridDoesNotSupport { .. }));
    }

    #[test]
    fn round_trips_values_through_f64() {
        let mut arr = VoxelArray::new(DataType::F32, DataType::ANY_FLOAT, 3, -1.0, "TSDF").unwrap();
        assert_eq!(arr.len(), 3);
        assert_eq!(arr.get_f64(0), -1.0);
        arr.set_f64(1, 0.5);
        assert_eq!(arr.get_f64(1), 0.5_f32 as f64);
    }

    #[test]
    fn narrows_into_integer_storage() {
        let mut arr = VoxelArray::new(DataType::U8, DataType::ANY_UINT, 2, 0.0, "CountViews").unwrap();
        arr.set_f64(0, 200.0);
        assert_eq!(arr.get_f64(0), 200.0);
    }
}
