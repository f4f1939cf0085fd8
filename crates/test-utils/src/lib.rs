//! Shared test utilities for the corner-point grid workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Test data path helpers
//! - Skip macros for optional test data
//! - Canonical grid generators
//! - GRDECL and ROFF sample files
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{create_faulted_grid, fixtures};
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

// Re-export commonly used items at the crate root
pub use generators::*;
pub use grid_common::CanonicalGrid;
pub use paths::*;

/// Macro to skip a test if the required file is not found.
///
/// Real-world grids are too large to keep in the repository; tests that use
/// them look in `TEST_DATA_DIR` and the crates' `testdata/` directories.
///
/// # Usage
///
/// ```ignore
/// use test_utils::require_test_file;
///
/// #[test]
/// fn test_reek_grid() {
///     let path = require_test_file!("reek.grdecl");
///     // Test code using path...
/// }
/// ```
///
/// If the file is not found, the test will print a skip message and return early.
#[macro_export]
macro_rules! require_test_file {
    ($name:expr) => {{
        match $crate::find_test_file($name) {
            Some(path) => path,
            None => {
                eprintln!(
                    "SKIPPED: Test file '{}' not found. Download test data or set TEST_DATA_DIR.",
                    $name
                );
                return;
            }
        }
    }};
}

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Macro for approximate equality of canonical grids.
///
/// Panics with the dimensions of both grids when
/// [`CanonicalGrid::approx_eq`](grid_common::CanonicalGrid::approx_eq) fails.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_grids_approx_eq;
///
/// assert_grids_approx_eq!(roundtripped, original, 1e-4);
/// ```
#[macro_export]
macro_rules! assert_grids_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: &$crate::CanonicalGrid = &$left;
        let right: &$crate::CanonicalGrid = &$right;
        if !left.approx_eq(right, $epsilon as f64) {
            panic!(
                "assertion failed: grids differ\n  left: {} grid,\n right: {} grid,\n epsilon: {:?}",
                left.dimensions(),
                right.dimensions(),
                $epsilon
            );
        }
    }};
}
