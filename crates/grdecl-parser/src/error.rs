//! Error types for GRDECL parsing and conversion.

use grid_common::GridError;
use thiserror::Error;

/// Result type for GRDECL operations.
pub type Result<T> = std::result::Result<T, GrdeclError>;

/// Errors raised while reading, writing or converting GRDECL grids.
#[derive(Error, Debug)]
pub enum GrdeclError {
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// End of input reached before the record's terminating slash
    #[error("Reached end of stream while reading {keyword} (started on line {line})")]
    UnterminatedRecord { keyword: String, line: usize },

    /// A keyword line that is neither wanted nor ignorable
    #[error("Unrecognized keyword '{keyword}' on line {line}")]
    UnrecognizedKeyword { keyword: String, line: usize },

    /// A record that expands to more values than the reader allows
    #[error("Record {keyword} (started on line {line}) holds more than {limit} values")]
    TooManyValues {
        keyword: String,
        line: usize,
        limit: usize,
    },

    /// The same keyword appeared twice
    #[error("Duplicate keyword {keyword} on line {line}")]
    DuplicateKeyword { keyword: String, line: usize },

    /// A required keyword never appeared
    #[error("Missing required keyword {0}")]
    MissingKeyword(&'static str),

    /// Record contents do not fit the keyword
    #[error("Invalid {keyword} record: {reason}")]
    InvalidRecord { keyword: &'static str, reason: String },

    /// Valid GRDECL that the canonical grid cannot represent
    #[error("Unsupported grid: {0}")]
    Unsupported(String),

    /// Vertically adjacent cells disagree on a shared corner depth
    #[error(
        "Grid has a horizontal split at cell ({i}, {j}, {k}) corner ({di}, {dj}): \
         depth {upper} above does not match {lower} below"
    )]
    HorizontalSplit {
        i: usize,
        j: usize,
        k: usize,
        di: usize,
        dj: usize,
        upper: f32,
        lower: f32,
    },

    /// Array shapes disagree with the grid dimensions
    #[error(transparent)]
    Grid(#[from] GridError),
}

impl GrdeclError {
    /// Create an InvalidRecord error.
    pub fn invalid_record(keyword: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            keyword,
            reason: reason.into(),
        }
    }

    /// True for geometry the canonical grid cannot represent.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_) | Self::HorizontalSplit { .. })
    }

    /// True for malformed input.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::UnterminatedRecord { .. }
                | Self::UnrecognizedKeyword { .. }
                | Self::DuplicateKeyword { .. }
                | Self::TooManyValues { .. }
                | Self::MissingKeyword(_)
                | Self::InvalidRecord { .. }
                | Self::Grid(_)
        )
    }
}
