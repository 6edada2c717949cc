//! The occupancy label byte.
//!
//! Part of the external contract (ground-truth files, confusion masks): treated as an opaque
//! nominal type whose classification predicates key on the type-mask bits, never on equality
//! with a concrete label, so a new label sharing a type classifies correctly without touching
//! existing consumers.

use bitflags::bitflags;

bitflags! {
    /// A single voxel's occupancy classification.
    pub struct VoxelLabel: u8 {
        const UNSEEN   = 0b0000_0000;
        const FREE     = 0b0100_0001;
        const OCCUPIED = 0b1000_0001;
        const OCCLUDED = 0b1000_0010;
        const CLIPPED  = 0b1000_0010;

        /// Set alongside [`Self::OCCUPIED`]/[`Self::OCCLUDED`]/[`Self::CLIPPED`] once a voxel
        /// has been classified as a member of an occlusion plane.
        const OCCPLANE_BIT = 0b0000_0100;

        /// Type mask: voxel is on the "known free" side, regardless of finer classification.
        const TYPE_FREE = 0b0100_0000;
        /// Type mask: voxel is on the "known occupied" side.
        const TYPE_OCCUPIED = 0b1000_0000;
        /// Type mask: voxel has not been classified as free or occupied.
        const TYPE_UNKNOWN = 0b0000_0011;
        /// Type mask: voxel is part of an occlusion plane.
        const TYPE_OCCPLANE = 0b0000_0100;
    }
}

impl VoxelLabel {
    /// Bitwise-AND classification test against a type mask whose bits mark a *committed*
    /// classification (`TYPE_FREE`, `TYPE_OCCUPIED`, `TYPE_OCCPLANE`): true iff any bit of
    /// `mask` is set on `self`. Never use equality here — labels that share a type
    /// (`OCCLUDED` and `CLIPPED`) must both classify the same way without being equal to
    /// each other or to the mask itself.
    pub fn is_type(&self, mask: VoxelLabel) -> bool {
        !(*self & mask).is_empty()
    }

    pub fn is_free(&self) -> bool {
        self.is_type(VoxelLabel::TYPE_FREE)
    }

    pub fn is_occupied(&self) -> bool {
        self.is_type(VoxelLabel::TYPE_OCCUPIED)
    }

    /// `TYPE_UNKNOWN`'s bits mark the *absence* of a free/occupied commitment, so unlike
    /// [`Self::is_type`] this is a zero test: a voxel is unknown iff neither of its low two
    /// bits (shared with `FREE`'s and `OCCLUDED`'s low bit) is set.
    pub fn is_unknown(&self) -> bool {
        (*self & VoxelLabel::TYPE_UNKNOWN).is_empty()
    }

    pub fn is_occplane(&self) -> bool {
        self.is_type(VoxelLabel::TYPE_OCCPLANE)
    }

    /// Returns `self` with the occplane bit set, preserving every other bit.
    pub fn with_occplane(self) -> VoxelLabel {
        self | VoxelLabel::OCCPLANE_BIT
    }
}
