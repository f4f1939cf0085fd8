//! Error types for ROFF parsing and conversion.

use grid_common::GridError;
use thiserror::Error;

/// Result type for ROFF operations.
pub type Result<T> = std::result::Result<T, RoffError>;

/// Errors raised while reading, writing or converting ROFF grids.
#[derive(Error, Debug)]
pub enum RoffError {
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Neither a binary nor an ASCII ROFF header
    #[error("Not a ROFF file: expected a 'roff-bin' or 'roff-asc' header")]
    InvalidHeader,

    /// Data ended in the middle of a tag
    #[error("Unexpected end of ROFF data while reading {0}")]
    UnexpectedEof(String),

    /// Container contents that do not follow the tag grammar
    #[error("Malformed ROFF data at {location}: {reason}")]
    Malformed { location: String, reason: String },

    /// No filedata.filetype key
    #[error("ROFF file has no filetype key in its filedata tag")]
    MissingFiletype,

    /// filedata.filetype is not "grid"
    #[error("ROFF filetype is '{0}', expected 'grid'")]
    WrongFiletype(String),

    /// The same tag/key pair appeared twice
    #[error("Duplicate key {tag}.{key}")]
    DuplicateKey { tag: String, key: String },

    /// A required tag/key pair is absent
    #[error("Missing required key {tag}.{key}")]
    MissingKey { tag: &'static str, key: &'static str },

    /// A key holds a value of the wrong kind
    #[error("Key {tag}.{key} should be {expected}, found {found}")]
    TypeMismatch {
        tag: &'static str,
        key: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    /// A key holds a value outside its valid range
    #[error("Invalid value for {tag}.{key}: {reason}")]
    InvalidValue {
        tag: &'static str,
        key: &'static str,
        reason: String,
    },

    /// splitEnz does not have one entry per node
    #[error("splitEnz has {actual} entries, expected one per node ({expected})")]
    SplitSizeMismatch { expected: usize, actual: usize },

    /// zvalues.data does not match the split encoding
    #[error("zvalues has {actual} entries, split encoding requires {expected}")]
    ZValueSizeMismatch { expected: usize, actual: usize },

    /// A split code other than 1, 2, 4 or 8
    #[error("Unsupported split type {split} at node {node}, only 1, 2, 4 and 8 are supported")]
    UnsupportedSplitType { node: usize, split: u8 },

    /// The cells above and below a node disagree on its depth
    #[error(
        "Grid has a horizontal split at node ({i}, {j}, {k}) quadrant {quadrant}: \
         depth {below} below does not match {above} above"
    )]
    HorizontalSplit {
        i: usize,
        j: usize,
        k: usize,
        quadrant: usize,
        below: f32,
        above: f32,
    },

    /// A subgrid whose layers are not one run of consecutive indices
    #[error("Subgrid '{0}' is not a consecutive run of layers and cannot be written to ROFF")]
    NonContiguousSubgrid(String),

    /// Array shapes disagree with the grid dimensions
    #[error(transparent)]
    Grid(#[from] GridError),
}

impl RoffError {
    pub(crate) fn malformed(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            location: location.into(),
            reason: reason.into(),
        }
    }

    /// True for geometry the canonical grid or ROFF cannot represent.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedSplitType { .. }
                | Self::HorizontalSplit { .. }
                | Self::NonContiguousSubgrid(_)
        )
    }

    /// True for malformed input.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidHeader
                | Self::UnexpectedEof(_)
                | Self::Malformed { .. }
                | Self::MissingFiletype
                | Self::WrongFiletype(_)
                | Self::DuplicateKey { .. }
                | Self::MissingKey { .. }
                | Self::TypeMismatch { .. }
                | Self::InvalidValue { .. }
                | Self::SplitSizeMismatch { .. }
                | Self::ZValueSizeMismatch { .. }
                | Self::Grid(_)
        )
    }
}
