//! Reader and writer for ROFF corner-point grids.
//!
//! ROFF (Roxar Open File Format) is a tagged container available in a
//! binary and an ASCII form. This crate decodes and encodes both forms,
//! models the grid stored in them, and converts between the ROFF layout and
//! [`grid_common::CanonicalGrid`].
//!
//! ```ignore
//! use grid_common::RoffFormat;
//! use roff_parser::RoffGrid;
//!
//! let grid = RoffGrid::from_file("model.roff")?;
//! let canonical = grid.to_canonical()?;
//! RoffGrid::from_canonical(&canonical)?.to_file("copy.roff", RoffFormat::Ascii)?;
//! ```

pub mod container;
pub mod error;
pub mod grid;
pub mod zvalues;

pub use container::{read_tags, write_tags, RoffTag, RoffValue};
pub use error::{Result, RoffError};
pub use grid::RoffGrid;
pub use zvalues::ZValues;
