//! Canonical corner-point grid shared by the GRDECL and ROFF readers.
//!
//! Both file formats convert to and from [`CanonicalGrid`]; it is the hub
//! of every conversion.

pub mod config;
pub mod error;
pub mod grid;

pub use config::{ConversionConfig, GeometryTolerance, RoffFormat, Tolerance};
pub use error::{GridError, GridResult};
pub use grid::{CanonicalGrid, Dimensions, Quadrant, Subgrid};
