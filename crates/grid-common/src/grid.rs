//! Canonical corner-point grid.
//!
//! Every file format converts to and from this layout; the formats never
//! talk to each other directly.
//!
//! # Layout
//!
//! - **coordinates**: one pillar line per `(i, j)` grid-line index, i-major
//!   (`i * (ny + 1) + j`), stored as `[x_top, y_top, z_top, x_bot, y_bot, z_bot]`.
//! - **corner depths**: 4 depths per pillar per layer boundary, indexed
//!   `((i * (ny + 1) + j) * (nz + 1) + k) * 4 + quadrant`. The quadrant names
//!   the cell relative to the pillar, see [`Quadrant`]. Depths increase downward.
//! - **active**: one ACTNUM value per cell, indexed `(i * ny + j) * nz + k`.

use serde::{Deserialize, Serialize};

use crate::error::{GridError, GridResult};

/// Cell counts along the three logical axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
}

impl Dimensions {
    /// Create dimensions, rejecting zero-sized axes.
    ///
    /// The corner-depth array (4 values per node) must also be indexable, so
    /// every count derived from the dimensions fits in `usize`.
    pub fn new(nx: usize, ny: usize, nz: usize) -> GridResult<Self> {
        if nx == 0 || ny == 0 || nz == 0 {
            return Err(GridError::InvalidDimensions { nx, ny, nz });
        }
        let depth_values = nx
            .checked_add(1)
            .zip(ny.checked_add(1))
            .and_then(|(px, py)| px.checked_mul(py))
            .zip(nz.checked_add(1))
            .and_then(|(pillars, layers)| pillars.checked_mul(layers))
            .and_then(|nodes| nodes.checked_mul(4));
        if depth_values.is_none() {
            return Err(GridError::DimensionsTooLarge { nx, ny, nz });
        }
        Ok(Self { nx, ny, nz })
    }

    /// Number of cells.
    pub fn num_cells(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    /// Number of pillars (corner lines).
    pub fn num_pillars(&self) -> usize {
        (self.nx + 1) * (self.ny + 1)
    }

    /// Number of pillar nodes, one per pillar per layer boundary.
    pub fn num_nodes(&self) -> usize {
        self.num_pillars() * (self.nz + 1)
    }

    /// Flat index of pillar `(i, j)`.
    pub fn pillar_index(&self, i: usize, j: usize) -> usize {
        i * (self.ny + 1) + j
    }

    /// Flat index of the node on pillar `(i, j)` at layer boundary `k`.
    pub fn node_index(&self, i: usize, j: usize, k: usize) -> usize {
        self.pillar_index(i, j) * (self.nz + 1) + k
    }

    /// Flat index of cell `(i, j, k)`.
    pub fn cell_index(&self, i: usize, j: usize, k: usize) -> usize {
        (i * self.ny + j) * self.nz + k
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}x{}", self.nx, self.ny, self.nz)
    }
}

/// Position of a cell relative to a pillar it touches.
///
/// `SouthWest` is the cell `(i - 1, j - 1)` of pillar `(i, j)`, `NorthEast`
/// is the cell `(i, j)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    SouthWest = 0,
    SouthEast = 1,
    NorthWest = 2,
    NorthEast = 3,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::SouthWest,
        Quadrant::SouthEast,
        Quadrant::NorthWest,
        Quadrant::NorthEast,
    ];

    /// Position within a node's 4 corner depths.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Offsets `(di, dj)` such that the cell is at `(pillar_i - di, pillar_j - dj)`.
    ///
    /// Equivalently, `(di, dj)` is the corner of the cell the pillar sits on:
    /// `di = 1` means the right-hand side, `dj = 1` the far side.
    pub fn cell_offset(self) -> (usize, usize) {
        match self {
            Quadrant::SouthWest => (1, 1),
            Quadrant::SouthEast => (0, 1),
            Quadrant::NorthWest => (1, 0),
            Quadrant::NorthEast => (0, 0),
        }
    }

    /// Quadrant a cell occupies around the pillar at its `(di, dj)` corner.
    pub fn from_cell_corner(di: usize, dj: usize) -> Self {
        match (di, dj) {
            (1, 1) => Quadrant::SouthWest,
            (0, 1) => Quadrant::SouthEast,
            (1, 0) => Quadrant::NorthWest,
            _ => Quadrant::NorthEast,
        }
    }

    /// The cell in this quadrant of pillar `(i, j)`, clamped into the grid.
    ///
    /// Border pillars have quadrants without a cell; clamping picks the
    /// nearest cell that does touch the pillar.
    pub fn clamped_cell(self, dims: &Dimensions, i: usize, j: usize) -> (usize, usize) {
        let (di, dj) = self.cell_offset();
        let ci = i.saturating_sub(di).min(dims.nx - 1);
        let cj = j.saturating_sub(dj).min(dims.ny - 1);
        (ci, cj)
    }
}

/// A named run of layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subgrid {
    pub name: String,
    pub layers: Vec<usize>,
}

impl Subgrid {
    pub fn new(name: impl Into<String>, layers: Vec<usize>) -> Self {
        Self {
            name: name.into(),
            layers,
        }
    }

    /// Number of layers if they form one run of consecutive indices.
    pub fn consecutive_len(&self) -> Option<usize> {
        let first = *self.layers.first()?;
        let consecutive = self
            .layers
            .iter()
            .enumerate()
            .all(|(offset, &layer)| layer == first + offset);
        consecutive.then_some(self.layers.len())
    }
}

/// Format-agnostic corner-point grid.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalGrid {
    dimensions: Dimensions,
    coordinates: Vec<f64>,
    corner_depths: Vec<f32>,
    active: Vec<i32>,
    subgrids: Option<Vec<Subgrid>>,
}

impl CanonicalGrid {
    /// Create a canonical grid, checking every array against the dimensions.
    ///
    /// A missing active array means every cell is active.
    pub fn new(
        dimensions: Dimensions,
        coordinates: Vec<f64>,
        corner_depths: Vec<f32>,
        active: Option<Vec<i32>>,
    ) -> GridResult<Self> {
        let dims = Dimensions::new(dimensions.nx, dimensions.ny, dimensions.nz)?;

        check_len("coordinates", dims.num_pillars() * 6, coordinates.len())?;
        check_len("corner_depths", dims.num_nodes() * 4, corner_depths.len())?;

        let active = match active {
            Some(active) => {
                check_len("active", dims.num_cells(), active.len())?;
                active
            }
            None => vec![1; dims.num_cells()],
        };

        Ok(Self {
            dimensions: dims,
            coordinates,
            corner_depths,
            active,
            subgrids: None,
        })
    }

    /// Attach named layer ranges.
    pub fn with_subgrids(mut self, subgrids: Vec<Subgrid>) -> GridResult<Self> {
        let nz = self.dimensions.nz;
        for subgrid in &subgrids {
            if let Some(&layer) = subgrid.layers.iter().find(|&&layer| layer >= nz) {
                return Err(GridError::SubgridOutOfRange {
                    name: subgrid.name.clone(),
                    layer,
                    nz,
                });
            }
        }
        self.subgrids = Some(subgrids);
        Ok(self)
    }

    /// Regular box grid, rotated `rotation` degrees counter-clockwise about the origin.
    ///
    /// `origin` is the top of pillar `(0, 0)`; depths grow by `increment.2` per layer.
    pub fn create_box(
        dimensions: Dimensions,
        origin: (f64, f64, f64),
        increment: (f64, f64, f64),
        rotation: f64,
    ) -> GridResult<Self> {
        let dims = Dimensions::new(dimensions.nx, dimensions.ny, dimensions.nz)?;
        let (x0, y0, z0) = origin;
        let (dx, dy, dz) = increment;
        let (sin, cos) = rotation.to_radians().sin_cos();
        let z_bottom = z0 + dz * dims.nz as f64;

        let mut coordinates = Vec::with_capacity(dims.num_pillars() * 6);
        for i in 0..=dims.nx {
            for j in 0..=dims.ny {
                let (lx, ly) = (i as f64 * dx, j as f64 * dy);
                let x = x0 + lx * cos - ly * sin;
                let y = y0 + lx * sin + ly * cos;
                coordinates.extend_from_slice(&[x, y, z0, x, y, z_bottom]);
            }
        }

        let mut corner_depths = Vec::with_capacity(dims.num_nodes() * 4);
        for _ in 0..dims.num_pillars() {
            for k in 0..=dims.nz {
                let depth = (z0 + dz * k as f64) as f32;
                corner_depths.extend_from_slice(&[depth; 4]);
            }
        }

        Self::new(dims, coordinates, corner_depths, None)
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Pillar lines, 6 values per pillar.
    pub fn coordinates(&self) -> &[f64] {
        &self.coordinates
    }

    /// Corner depths, 4 values per node.
    pub fn corner_depths(&self) -> &[f32] {
        &self.corner_depths
    }

    /// ACTNUM values, one per cell.
    pub fn active(&self) -> &[i32] {
        &self.active
    }

    /// Named layer ranges, if any.
    pub fn subgrids(&self) -> Option<&[Subgrid]> {
        self.subgrids.as_deref()
    }

    /// Pillar line `(i, j)` as `[x_top, y_top, z_top, x_bot, y_bot, z_bot]`.
    pub fn pillar(&self, i: usize, j: usize) -> &[f64] {
        let start = self.dimensions.pillar_index(i, j) * 6;
        &self.coordinates[start..start + 6]
    }

    /// Depth of pillar `(i, j)` at layer boundary `k`, as seen from `quadrant`.
    pub fn corner_depth(&self, i: usize, j: usize, k: usize, quadrant: Quadrant) -> f32 {
        self.corner_depths[self.dimensions.node_index(i, j, k) * 4 + quadrant.index()]
    }

    pub fn is_active(&self, i: usize, j: usize, k: usize) -> bool {
        self.active[self.dimensions.cell_index(i, j, k)] != 0
    }

    /// True when every cell has ACTNUM 1.
    pub fn is_all_active(&self) -> bool {
        self.active.iter().all(|&value| value == 1)
    }

    /// Compare two grids with an absolute tolerance on coordinates and depths.
    ///
    /// Active flags and subgrids must match exactly.
    pub fn approx_eq(&self, other: &CanonicalGrid, tolerance: f64) -> bool {
        self.dimensions == other.dimensions
            && self.active == other.active
            && self.subgrids == other.subgrids
            && self
                .coordinates
                .iter()
                .zip(&other.coordinates)
                .all(|(a, b)| (a - b).abs() <= tolerance)
            && self
                .corner_depths
                .iter()
                .zip(&other.corner_depths)
                .all(|(a, b)| f64::from(a - b).abs() <= tolerance)
    }
}

fn check_len(array: &'static str, expected: usize, actual: usize) -> GridResult<()> {
    if expected != actual {
        return Err(GridError::shape_mismatch(array, expected, actual));
    }
    Ok(())
}
