//! Split-encoded ROFF depth values and their canonical regrouping.
//!
//! ROFF stores depths per node (a point where a pillar crosses a layer
//! boundary). Nodes are ordered `(i * (ny + 1) + j) * (nz + 1) + k` with `k`
//! counting layer boundaries from the bottom. Each node has a split code
//! telling how many distinct depths it stores for the up to 8 cells that
//! touch it:
//!
//! | code | stored values | meaning |
//! |------|---------------|---------|
//! | 1 | 1 | every cell agrees |
//! | 2 | 2 | one value below the node, one above |
//! | 4 | 4 | one per quadrant, shared by the cells below and above |
//! | 8 | 8 | one per quadrant below, then one per quadrant above |
//!
//! Quadrants are ordered as [`Quadrant::ALL`].

use std::cell::OnceCell;

use grid_common::{Dimensions, GridError, Quadrant, Tolerance};

use crate::error::{Result, RoffError};

/// Depth values with their optional split encoding.
///
/// Without a split encoding every node stores one value.
#[derive(Debug, Clone)]
pub struct ZValues {
    split_enz: Option<Vec<u8>>,
    data: Vec<f32>,
    /// Start of each node's values in `data`, built on first lookup.
    offsets: OnceCell<Vec<usize>>,
}

impl PartialEq for ZValues {
    fn eq(&self, other: &Self) -> bool {
        self.split_enz == other.split_enz && self.data == other.data
    }
}

impl ZValues {
    /// Create z-values for `num_nodes` nodes.
    ///
    /// `split_enz` must have one entry per node and `data` as many entries
    /// as the split codes add up to.
    pub fn new(split_enz: Option<Vec<u8>>, data: Vec<f32>, num_nodes: usize) -> Result<Self> {
        let expected = match &split_enz {
            Some(split) => {
                if split.len() != num_nodes {
                    return Err(RoffError::SplitSizeMismatch {
                        expected: num_nodes,
                        actual: split.len(),
                    });
                }
                split.iter().map(|&code| usize::from(code)).sum()
            }
            None => num_nodes,
        };
        if data.len() != expected {
            return Err(RoffError::ZValueSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            split_enz,
            data,
            offsets: OnceCell::new(),
        })
    }

    pub fn split_enz(&self) -> Option<&[u8]> {
        self.split_enz.as_deref()
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    fn offsets(&self) -> &[usize] {
        self.offsets.get_or_init(|| {
            let mut offsets = Vec::with_capacity(self.data.len() + 1);
            offsets.push(0);
            let mut total = 0;
            match &self.split_enz {
                Some(split) => {
                    for &code in split {
                        total += usize::from(code);
                        offsets.push(total);
                    }
                }
                None => offsets.extend(1..=self.data.len()),
            }
            offsets
        })
    }

    /// Depths of the 8 cells touching `node`: the 4 quadrants below the
    /// node followed by the 4 above.
    pub fn node_values(&self, node: usize) -> Result<[f32; 8]> {
        let offsets = self.offsets();
        let start = offsets[node];
        let v = &self.data[start..offsets[node + 1]];
        match v.len() {
            1 => Ok([v[0]; 8]),
            2 => Ok([v[0], v[0], v[0], v[0], v[1], v[1], v[1], v[1]]),
            4 => Ok([v[0], v[1], v[2], v[3], v[0], v[1], v[2], v[3]]),
            8 => Ok([v[0], v[1], v[2], v[3], v[4], v[5], v[6], v[7]]),
            split => Err(RoffError::UnsupportedSplitType {
                node,
                split: split as u8,
            }),
        }
    }
}

/// Convert ROFF z-values to canonical corner depths.
///
/// A node takes the depth of the cell below it, or the cell above for the
/// bottom boundary. Where a node has cells on both sides their depths must
/// agree within `tolerance`. Depths are `(z + zoffset) * zscale`.
pub fn to_canonical_depths(
    dims: &Dimensions,
    zvalues: &ZValues,
    zoffset: f32,
    zscale: f32,
    tolerance: Tolerance,
) -> Result<Vec<f32>> {
    let to_depth = |z: f32| ((f64::from(z) + f64::from(zoffset)) * f64::from(zscale)) as f32;
    let mut depths = vec![0.0f32; dims.num_nodes() * 4];

    for i in 0..=dims.nx {
        for j in 0..=dims.ny {
            for k in 0..=dims.nz {
                let node = dims.node_index(i, j, k);
                let values = zvalues.node_values(node)?;
                let (below, above) = values.split_at(4);
                let target = dims.node_index(i, j, dims.nz - k) * 4;

                for quadrant in Quadrant::ALL {
                    let q = quadrant.index();
                    let below_depth = to_depth(below[q]);
                    let above_depth = to_depth(above[q]);
                    if k > 0
                        && k < dims.nz
                        && !tolerance.is_close(f64::from(below_depth), f64::from(above_depth))
                    {
                        return Err(RoffError::HorizontalSplit {
                            i,
                            j,
                            k,
                            quadrant: q,
                            below: below_depth,
                            above: above_depth,
                        });
                    }
                    depths[target + q] = if k > 0 { below_depth } else { above_depth };
                }
            }
        }
    }
    Ok(depths)
}

/// Convert canonical corner depths to z-values with split code 4 at every
/// node, for a transform with zero offset and a z scale of -1.
pub fn from_canonical_depths(dims: &Dimensions, corner_depths: &[f32]) -> Result<ZValues> {
    let expected = dims.num_nodes() * 4;
    if corner_depths.len() != expected {
        return Err(GridError::shape_mismatch("corner_depths", expected, corner_depths.len()).into());
    }

    let mut data = Vec::with_capacity(expected);
    for i in 0..=dims.nx {
        for j in 0..=dims.ny {
            for k in 0..=dims.nz {
                let source = dims.node_index(i, j, dims.nz - k) * 4;
                data.extend(corner_depths[source..source + 4].iter().map(|&depth| -depth));
            }
        }
    }
    ZValues::new(Some(vec![4; dims.num_nodes()]), data, dims.num_nodes())
}
