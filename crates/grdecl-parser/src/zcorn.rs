//! Regrouping between GRDECL ZCORN and canonical corner depths.
//!
//! ZCORN holds 8 depths per cell. Corner `(di, dj, dk)` of cell `(i, j, k)`
//! (`di` left/right, `dj` near/far, `dk` upper/bottom) is stored at
//! `((((2i + di) * ny + j) * 2 + dj) * nz + k) * 2 + dk`.
//!
//! The canonical layout stores one depth per pillar, layer boundary and
//! [`Quadrant`], so the bottom of layer `k` and the top of layer `k + 1`
//! must agree. Grids where they do not have a horizontal split and are
//! rejected.

use grid_common::{Dimensions, GridError, Quadrant, Tolerance};

use crate::error::{GrdeclError, Result};

/// Position of corner `(di, dj, dk)` of cell `(i, j, k)` in ZCORN.
pub fn zcorn_index(dims: &Dimensions, i: usize, j: usize, k: usize, di: usize, dj: usize, dk: usize) -> usize {
    ((((2 * i + di) * dims.ny + j) * 2 + dj) * dims.nz + k) * 2 + dk
}

/// Check that vertically adjacent cells agree on every shared corner.
///
/// Reports the first mismatch with the lower cell's index and corner.
pub fn check_horizontal_split(dims: &Dimensions, zcorn: &[f32], tolerance: Tolerance) -> Result<()> {
    for i in 0..dims.nx {
        for j in 0..dims.ny {
            for k in 1..dims.nz {
                for (di, dj) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                    let upper = zcorn[zcorn_index(dims, i, j, k - 1, di, dj, 1)];
                    let lower = zcorn[zcorn_index(dims, i, j, k, di, dj, 0)];
                    if !tolerance.is_close(f64::from(upper), f64::from(lower)) {
                        return Err(GrdeclError::HorizontalSplit {
                            i,
                            j,
                            k,
                            di,
                            dj,
                            upper,
                            lower,
                        });
                    }
                }
            }
        }
    }
    Ok(())
}

/// Convert ZCORN to canonical corner depths.
///
/// Each node takes its depth from the cell below it (the bottom layer
/// boundary from the cell above). Quadrants of border pillars that have no
/// cell repeat the depth of the nearest cell touching the pillar.
pub fn to_canonical_depths(dims: &Dimensions, zcorn: &[f32], tolerance: Tolerance) -> Result<Vec<f32>> {
    let expected = dims.num_cells() * 8;
    if zcorn.len() != expected {
        return Err(GridError::shape_mismatch("zcorn", expected, zcorn.len()).into());
    }

    check_horizontal_split(dims, zcorn, tolerance)?;

    let mut depths = Vec::with_capacity(dims.num_nodes() * 4);
    for pi in 0..=dims.nx {
        for pj in 0..=dims.ny {
            for pk in 0..=dims.nz {
                let (ck, dk) = if pk < dims.nz { (pk, 0) } else { (pk - 1, 1) };
                for quadrant in Quadrant::ALL {
                    let (ci, cj) = quadrant.clamped_cell(dims, pi, pj);
                    depths.push(zcorn[zcorn_index(dims, ci, cj, ck, pi - ci, pj - cj, dk)]);
                }
            }
        }
    }
    Ok(depths)
}

/// Convert canonical corner depths to ZCORN.
///
/// The inverse of [`to_canonical_depths`]: every cell corner copies the
/// depth its quadrant holds on the corner's pillar.
pub fn from_canonical_depths(dims: &Dimensions, corner_depths: &[f32]) -> Result<Vec<f32>> {
    let expected = dims.num_nodes() * 4;
    if corner_depths.len() != expected {
        return Err(GridError::shape_mismatch("corner_depths", expected, corner_depths.len()).into());
    }

    let mut zcorn = vec![0.0f32; dims.num_cells() * 8];
    for i in 0..dims.nx {
        for j in 0..dims.ny {
            for k in 0..dims.nz {
                for di in 0..2 {
                    for dj in 0..2 {
                        let quadrant = Quadrant::from_cell_corner(di, dj);
                        for dk in 0..2 {
                            let node = dims.node_index(i + di, j + dj, k + dk);
                            zcorn[zcorn_index(dims, i, j, k, di, dj, dk)] =
                                corner_depths[node * 4 + quadrant.index()];
                        }
                    }
                }
            }
        }
    }
    Ok(zcorn)
}
