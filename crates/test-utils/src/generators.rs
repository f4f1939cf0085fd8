//! Generators for synthetic corner-point grids.
//!
//! These generators create predictable, verifiable grids with integral
//! coordinates, so conversions through `f32` storage are exact.

use grid_common::{CanonicalGrid, Dimensions, Quadrant, Subgrid};

fn dims(nx: usize, ny: usize, nz: usize) -> Dimensions {
    Dimensions::new(nx, ny, nz).expect("Generated grid dimensions must be non-zero")
}

/// Creates an axis-aligned box with unit cells, top at depth 0.
///
/// # Example
///
/// ```
/// use test_utils::create_box_grid;
///
/// let grid = create_box_grid(2, 3, 4);
/// assert_eq!(grid.coordinates().len(), 3 * 4 * 6);
/// assert_eq!(grid.corner_depths().len(), 3 * 4 * 5 * 4);
/// ```
pub fn create_box_grid(nx: usize, ny: usize, nz: usize) -> CanonicalGrid {
    CanonicalGrid::create_box(dims(nx, ny, nz), (0.0, 0.0, 0.0), (1.0, 1.0, 1.0), 0.0)
        .expect("Box grid arrays must match their dimensions")
}

/// Creates the 1x1x1 unit cube spanning depths 0 to 1.
pub fn create_single_cell_grid() -> CanonicalGrid {
    create_box_grid(1, 1, 1)
}

/// Creates a box grid where every column of cells is shifted down by
/// `throw * i`, giving a fault along every interior pillar row.
///
/// Quadrants of border pillars that have no cell repeat the depth of the
/// nearest cell, matching what the GRDECL reader produces.
pub fn create_faulted_grid(nx: usize, ny: usize, nz: usize, throw: f32) -> CanonicalGrid {
    let dims = dims(nx, ny, nz);
    let base = create_box_grid(nx, ny, nz);

    let mut corner_depths = Vec::with_capacity(dims.num_nodes() * 4);
    for i in 0..=nx {
        for j in 0..=ny {
            for k in 0..=nz {
                for quadrant in Quadrant::ALL {
                    let (ci, _) = quadrant.clamped_cell(&dims, i, j);
                    corner_depths.push(k as f32 + throw * ci as f32);
                }
            }
        }
    }

    CanonicalGrid::new(dims, base.coordinates().to_vec(), corner_depths, None)
        .expect("Faulted grid arrays must match their dimensions")
}

/// Creates a box grid whose layers dip: each node lies `0.5 * i + 0.25 * j`
/// below its flat position, with layer `k` being `k + 1` units thick.
pub fn create_dipping_grid(nx: usize, ny: usize, nz: usize) -> CanonicalGrid {
    let dims = dims(nx, ny, nz);
    let base = create_box_grid(nx, ny, nz);

    let mut corner_depths = Vec::with_capacity(dims.num_nodes() * 4);
    for i in 0..=nx {
        for j in 0..=ny {
            for k in 0..=nz {
                let top_of_layer = (k * (k + 1) / 2) as f32;
                let depth = top_of_layer + 0.5 * i as f32 + 0.25 * j as f32;
                corner_depths.extend_from_slice(&[depth; 4]);
            }
        }
    }

    CanonicalGrid::new(dims, base.coordinates().to_vec(), corner_depths, None)
        .expect("Dipping grid arrays must match their dimensions")
}

/// ACTNUM in canonical order with every cell whose `i + j + k` is odd inactive.
pub fn checkerboard_active(nx: usize, ny: usize, nz: usize) -> Vec<i32> {
    let mut active = Vec::with_capacity(nx * ny * nz);
    for i in 0..nx {
        for j in 0..ny {
            for k in 0..nz {
                active.push(((i + j + k + 1) % 2) as i32);
            }
        }
    }
    active
}

/// Replaces the active array of `grid`.
pub fn with_active(grid: CanonicalGrid, active: Vec<i32>) -> CanonicalGrid {
    CanonicalGrid::new(
        grid.dimensions(),
        grid.coordinates().to_vec(),
        grid.corner_depths().to_vec(),
        Some(active),
    )
    .expect("Active array must match the grid")
}

/// Splits the layers of `grid` into consecutive subgrids of the given sizes.
///
/// # Example
///
/// ```
/// use test_utils::{create_box_grid, with_subgrids};
///
/// let grid = with_subgrids(create_box_grid(1, 1, 5), &[2, 3]);
/// let subgrids = grid.subgrids().unwrap();
/// assert_eq!(subgrids[1].layers, vec![2, 3, 4]);
/// ```
pub fn with_subgrids(grid: CanonicalGrid, sizes: &[usize]) -> CanonicalGrid {
    let mut start = 0;
    let subgrids = sizes
        .iter()
        .enumerate()
        .map(|(index, &size)| {
            let subgrid = Subgrid::new(format!("subgrid_{}", index), (start..start + size).collect());
            start += size;
            subgrid
        })
        .collect();
    grid.with_subgrids(subgrids)
        .expect("Subgrid layers must lie within the grid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_cell_grid() {
        let grid = create_single_cell_grid();
        assert_eq!(grid.pillar(1, 1), &[1.0, 1.0, 0.0, 1.0, 1.0, 1.0]);
        assert_eq!(grid.corner_depth(0, 0, 0, Quadrant::NorthEast), 0.0);
        assert_eq!(grid.corner_depth(1, 1, 1, Quadrant::SouthWest), 1.0);
        assert!(grid.is_all_active());
    }

    #[test]
    fn test_faulted_grid_throw() {
        let grid = create_faulted_grid(2, 1, 1, 10.0);
        // pillar (1, 0) sits between the two columns
        assert_eq!(grid.corner_depth(1, 0, 0, Quadrant::NorthWest), 0.0);
        assert_eq!(grid.corner_depth(1, 0, 0, Quadrant::NorthEast), 10.0);
        // border pillars repeat the nearest column
        assert_eq!(grid.corner_depth(2, 1, 1, Quadrant::NorthEast), 11.0);
        assert_eq!(grid.corner_depth(0, 0, 1, Quadrant::SouthWest), 1.0);
    }

    #[test]
    fn test_dipping_grid_thickness() {
        let grid = create_dipping_grid(1, 1, 3);
        let depths: Vec<f32> = (0..=3)
            .map(|k| grid.corner_depth(1, 0, k, Quadrant::SouthWest))
            .collect();
        assert_eq!(depths, vec![0.5, 1.5, 3.5, 6.5]);
    }

    #[test]
    fn test_checkerboard_active() {
        let active = checkerboard_active(2, 1, 2);
        assert_eq!(active, vec![1, 0, 0, 1]);

        let grid = with_active(create_box_grid(2, 1, 2), active);
        assert!(grid.is_active(0, 0, 0));
        assert!(!grid.is_active(1, 0, 0));
    }
}
