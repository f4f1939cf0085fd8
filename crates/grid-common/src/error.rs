//! Error types for canonical grid construction.

use thiserror::Error;

/// Result type alias using GridError.
pub type GridResult<T> = Result<T, GridError>;

/// Errors raised when a canonical grid (or its configuration) is inconsistent.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("Grid dimensions must be positive, got {nx}x{ny}x{nz}")]
    InvalidDimensions { nx: usize, ny: usize, nz: usize },

    #[error("Grid dimensions {nx}x{ny}x{nz} are too large to index")]
    DimensionsTooLarge { nx: usize, ny: usize, nz: usize },

    #[error("Array '{array}' has {actual} values, expected {expected}")]
    ShapeMismatch {
        array: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Subgrid '{name}' references layer {layer}, grid has {nz} layers")]
    SubgridOutOfRange {
        name: String,
        layer: usize,
        nz: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl GridError {
    /// Create a ShapeMismatch error.
    pub fn shape_mismatch(array: &'static str, expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch {
            array,
            expected,
            actual,
        }
    }
}
