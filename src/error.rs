//! Error taxonomy for the reconstruction engine.
//!
//! All fallible operations in this crate return one of the variants below rather than an
//! opaque string; callers that need to recover (e.g. the channel factory, or a map lookup)
//! can match on the specific variant instead of inspecting a message.

use crate::types::{GridSize, VoxelIndex};
use crate::voxel::DataType;
use thiserror::Error as ThisError;

/// Errors related to [`crate::grid::GridProperties`] mismatches or invalid voxel access.
#[derive(Debug, ThisError)]
pub enum GridPropertyError {
    /// Two collaborating objects (a channel, a ground-truth grid, a metric) were constructed
    /// against `Grid Properties` that do not compare equal.
    #[error("grid properties of {a} do not match those of {b}")]
    PropertiesDoNotMatch { a: String, b: String },

    /// A data vector's length does not equal `numVoxels` for the given grid size.
    #[error("grid of size {size:?} ({voxels} voxels) does not match a data vector of length {len}")]
    DataVectorDoesNotMatch {
        size: GridSize,
        voxels: usize,
        len: usize,
    },

    /// A voxel index or a point-derived index falls outside the grid's size in some axis.
    #[error("grid of size {size:?} does not contain voxel {idx:?}")]
    VoxelOutOfRange { size: GridSize, idx: VoxelIndex },
}

impl GridPropertyError {
    pub fn out_of_range(size: GridSize, idx: VoxelIndex) -> Self {
        Self::VoxelOutOfRange { size, idx }
    }
}

/// Errors constructing or operating on a [`crate::voxel::VoxelArray`].
#[derive(Debug, ThisError)]
pub enum DataVariantError {
    /// The requested [`DataType`] is not among those a channel supports.
    #[error("a {channel} channel does not support {attempted:?} values, it accepts {supported}")]
    VoxelGridDoesNotSupport {
        channel: &'static str,
        attempted: DataType,
        supported: &'static str,
    },
}

/// Errors for the string-keyed channel maps used by [`crate::reconstruction::Reconstruction`].
#[derive(Debug, ThisError)]
pub enum InvalidMapKey {
    #[error("no name was provided for the map")]
    NoNameProvided,

    #[error("no value exists in the map for the key \"{0}\"")]
    NonexistentValue(String),

    #[error("the name \"{0}\" already exists in the map")]
    NameAlreadyExists(String),

    /// Specialization of [`InvalidMapKey`]: the caller used an unprivileged path to touch a
    /// name reserved for policies or metrics.
    #[error("the name \"{0}\" begins with a reserved prefix and may not be created or destroyed directly")]
    ReservedMapKey(String),
}

/// Top-level error type for the engine, composing the other variants.
#[derive(Debug, ThisError)]
pub enum ForgeScanError {
    #[error(transparent)]
    GridProperty(#[from] GridPropertyError),

    #[error(transparent)]
    DataVariant(#[from] DataVariantError),

    #[error(transparent)]
    InvalidMapKey(#[from] InvalidMapKey),

    #[error("{0}")]
    Constructor(String),
}
