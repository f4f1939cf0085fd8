//! Reader and writer for Eclipse GRDECL grid files.
//!
//! GRDECL is the keyword-based text format of the Eclipse simulator input
//! deck. This crate reads the grid keywords (SPECGRID, COORD, ZCORN, ACTNUM
//! and the optional map/unit/orientation records), writes them back, and
//! converts between the GRDECL layout and [`grid_common::CanonicalGrid`].
//!
//! ```ignore
//! use grdecl_parser::GrdeclGrid;
//!
//! let grid = GrdeclGrid::from_file("model.grdecl")?;
//! let canonical = grid.to_canonical()?;
//! ```

pub mod error;
pub mod grid;
pub mod keywords;
pub mod lexer;
pub mod reader;
pub mod zcorn;

pub use error::{GrdeclError, Result};
pub use grid::GrdeclGrid;
pub use keywords::{
    CoordinateType, GdOrient, GrdeclKeyword, GridRelative, GridUnit, Handedness, MapAxes,
    MapUnits, Order, Orientation, SpecGrid, Units,
};
pub use reader::{GrdeclReader, IgnorePolicy, ReaderOptions, Record};
