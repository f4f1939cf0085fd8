//! ROFF grid model.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use bytes::Bytes;
use chrono::Utc;
use grid_common::{
    CanonicalGrid, ConversionConfig, Dimensions, GeometryTolerance, GridError, RoffFormat,
    Subgrid, Tolerance,
};
use tracing::{debug, info, warn};

use crate::container::{self, RoffTag, RoffValue};
use crate::error::{Result, RoffError};
use crate::zvalues::{self, ZValues};

/// Tags understood when reading a grid.
const KNOWN_TAGS: [&str; 9] = [
    "filedata",
    "version",
    "dimensions",
    "translate",
    "scale",
    "subgrids",
    "cornerLines",
    "zvalues",
    "active",
];

const DEFAULT_OFFSET: [f32; 3] = [0.0, 0.0, 0.0];
const DEFAULT_SCALE: [f32; 3] = [1.0, 1.0, -1.0];

/// A corner-point grid as stored in a ROFF file.
///
/// Coordinates are local; world coordinates are `(local + offset) * scale`.
/// Pillars are ordered `i * (ny + 1) + j` with corner lines stored bottom
/// point first. Layers are counted from the bottom, so ROFF layer `k` is
/// canonical layer `nz - 1 - k`.
#[derive(Debug, Clone, PartialEq)]
pub struct RoffGrid {
    dimensions: Dimensions,
    corner_lines: Vec<f32>,
    zvalues: ZValues,
    active: Vec<bool>,
    subgrids: Option<Vec<i32>>,
    offset: [f32; 3],
    scale: [f32; 3],
}

impl RoffGrid {
    /// Create a grid with no transform, checking every array against the
    /// dimensions.
    pub fn new(
        dimensions: Dimensions,
        corner_lines: Vec<f32>,
        split_enz: Option<Vec<u8>>,
        zvals: Vec<f32>,
        active: Vec<bool>,
    ) -> Result<Self> {
        let dims = Dimensions::new(dimensions.nx, dimensions.ny, dimensions.nz)?;
        let expected = dims.num_pillars() * 6;
        if corner_lines.len() != expected {
            return Err(GridError::shape_mismatch("corner_lines", expected, corner_lines.len()).into());
        }
        if active.len() != dims.num_cells() {
            return Err(GridError::shape_mismatch("active", dims.num_cells(), active.len()).into());
        }
        let zvalues = ZValues::new(split_enz, zvals, dims.num_nodes())?;

        Ok(Self {
            dimensions: dims,
            corner_lines,
            zvalues,
            active,
            subgrids: None,
            offset: DEFAULT_OFFSET,
            scale: DEFAULT_SCALE,
        })
    }

    /// Set the local to world transform.
    pub fn with_transform(mut self, offset: [f32; 3], scale: [f32; 3]) -> Self {
        self.offset = offset;
        self.scale = scale;
        self
    }

    /// Set the layer count of each subgrid, top subgrid first.
    pub fn with_subgrids(mut self, layers: Vec<i32>) -> Self {
        self.subgrids = Some(layers);
        self
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Local pillar lines, `[x_bot, y_bot, z_bot, x_top, y_top, z_top]` each.
    pub fn corner_lines(&self) -> &[f32] {
        &self.corner_lines
    }

    pub fn zvalues(&self) -> &ZValues {
        &self.zvalues
    }

    /// Active flags ordered `(i * ny + j) * nz + k` with `k` from the bottom.
    pub fn active(&self) -> &[bool] {
        &self.active
    }

    pub fn subgrids(&self) -> Option<&[i32]> {
        self.subgrids.as_deref()
    }

    pub fn offset(&self) -> [f32; 3] {
        self.offset
    }

    pub fn scale(&self) -> [f32; 3] {
        self.scale
    }

    /// Build a grid from decoded container tags.
    pub fn from_tags(tags: Vec<RoffTag>) -> Result<Self> {
        let mut keys = TagKeys::index(tags)?;

        match keys.take("filedata", "filetype") {
            None => return Err(RoffError::MissingFiletype),
            Some(RoffValue::Char(filetype)) if filetype == "grid" => {}
            Some(RoffValue::Char(filetype)) => return Err(RoffError::WrongFiletype(filetype)),
            Some(other) => {
                return Err(RoffError::TypeMismatch {
                    tag: "filedata",
                    key: "filetype",
                    expected: "char",
                    found: other.describe(),
                })
            }
        }

        let nx = keys.dimension("nX")?;
        let ny = keys.dimension("nY")?;
        let nz = keys.dimension("nZ")?;
        let dims = Dimensions::new(nx, ny, nz)?;

        let offset = [
            keys.float_or("translate", "xoffset", DEFAULT_OFFSET[0])?,
            keys.float_or("translate", "yoffset", DEFAULT_OFFSET[1])?,
            keys.float_or("translate", "zoffset", DEFAULT_OFFSET[2])?,
        ];
        let scale = [
            keys.float_or("scale", "xscale", DEFAULT_SCALE[0])?,
            keys.float_or("scale", "yscale", DEFAULT_SCALE[1])?,
            keys.float_or("scale", "zscale", DEFAULT_SCALE[2])?,
        ];

        let corner_lines = keys.required("cornerLines", "data", "array of float", |value| match value {
            RoffValue::FloatArray(values) => Ok(values),
            other => Err(other),
        })?;
        let zvals = keys.required("zvalues", "data", "array of float", |value| match value {
            RoffValue::FloatArray(values) => Ok(values),
            other => Err(other),
        })?;
        let split_enz = keys.optional("zvalues", "splitEnz", "array of byte", |value| match value {
            RoffValue::ByteArray(values) => Ok(values),
            other => Err(other),
        })?;
        if split_enz.is_none() {
            warn!("ROFF grid has no zvalues.splitEnz, assuming one value per node");
        }
        let active = keys.required("active", "data", "array of bool", |value| match value {
            RoffValue::BoolArray(values) => Ok(values),
            other => Err(other),
        })?;
        let subgrids = keys.optional("subgrids", "nLayers", "array of int", |value| match value {
            RoffValue::IntArray(values) => Ok(values),
            other => Err(other),
        })?;

        let mut grid =
            Self::new(dims, corner_lines, split_enz, zvals, active)?.with_transform(offset, scale);
        grid.subgrids = subgrids;
        Ok(grid)
    }

    /// Container tags for this grid, without the trailing `eof` tag.
    pub fn to_tags(&self) -> Vec<RoffTag> {
        let dims = self.dimensions;
        let mut tags = vec![
            RoffTag::new("filedata")
                .with_key("byteswaptest", RoffValue::Int(1))
                .with_key("filetype", RoffValue::Char("grid".to_string()))
                .with_key(
                    "creationDate",
                    RoffValue::Char(Utc::now().format("%d/%m/%Y %H:%M:%S").to_string()),
                ),
            RoffTag::new("version")
                .with_key("major", RoffValue::Int(2))
                .with_key("minor", RoffValue::Int(0)),
            RoffTag::new("dimensions")
                .with_key("nX", RoffValue::Int(dims.nx as i32))
                .with_key("nY", RoffValue::Int(dims.ny as i32))
                .with_key("nZ", RoffValue::Int(dims.nz as i32)),
            RoffTag::new("translate")
                .with_key("xoffset", RoffValue::Float(self.offset[0]))
                .with_key("yoffset", RoffValue::Float(self.offset[1]))
                .with_key("zoffset", RoffValue::Float(self.offset[2])),
            RoffTag::new("scale")
                .with_key("xscale", RoffValue::Float(self.scale[0]))
                .with_key("yscale", RoffValue::Float(self.scale[1]))
                .with_key("zscale", RoffValue::Float(self.scale[2])),
        ];

        if let Some(layers) = &self.subgrids {
            tags.push(RoffTag::new("subgrids").with_key("nLayers", RoffValue::IntArray(layers.clone())));
        }
        tags.push(
            RoffTag::new("cornerLines").with_key("data", RoffValue::FloatArray(self.corner_lines.clone())),
        );

        let mut zvalues = RoffTag::new("zvalues");
        if let Some(split) = self.zvalues.split_enz() {
            zvalues = zvalues.with_key("splitEnz", RoffValue::ByteArray(split.to_vec()));
        }
        tags.push(zvalues.with_key("data", RoffValue::FloatArray(self.zvalues.data().to_vec())));
        tags.push(RoffTag::new("active").with_key("data", RoffValue::BoolArray(self.active.clone())));
        tags
    }

    /// Read a grid from a binary or ASCII ROFF file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let grid = Self::from_tags(container::decode_tags(Bytes::from(data))?)?;
        info!(
            path = %path.display(),
            dimensions = %grid.dimensions(),
            "Read ROFF grid"
        );
        Ok(grid)
    }

    /// Read a grid from a binary or ASCII ROFF stream.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_tags(container::read_tags(reader)?)
    }

    /// Write the grid to a ROFF file in the given form.
    pub fn to_file(&self, path: impl AsRef<Path>, format: RoffFormat) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        self.to_writer(&mut writer, format)?;
        writer.flush()?;
        info!(
            path = %path.display(),
            dimensions = %self.dimensions,
            format = format.as_str(),
            "Wrote ROFF grid"
        );
        Ok(())
    }

    pub fn to_writer<W: Write>(&self, writer: &mut W, format: RoffFormat) -> Result<()> {
        container::write_tags(writer, &self.to_tags(), format)
    }

    /// World coordinates of a local point.
    pub fn local_to_world(&self, local: [f32; 3]) -> [f64; 3] {
        std::array::from_fn(|axis| {
            (f64::from(local[axis]) + f64::from(self.offset[axis])) * f64::from(self.scale[axis])
        })
    }

    /// World pillar line `(i, j)` as `[x_bot, y_bot, z_bot, x_top, y_top, z_top]`.
    pub fn line_vertices(&self, i: usize, j: usize) -> [f64; 6] {
        let start = self.dimensions.pillar_index(i, j) * 6;
        let line = &self.corner_lines[start..start + 6];
        let bottom = self.local_to_world([line[0], line[1], line[2]]);
        let top = self.local_to_world([line[3], line[4], line[5]]);
        [bottom[0], bottom[1], bottom[2], top[0], top[1], top[2]]
    }

    /// Canonical pillar lines, top point first.
    pub fn to_canonical_coordinates(&self) -> Vec<f64> {
        let dims = self.dimensions;
        let mut coordinates = Vec::with_capacity(dims.num_pillars() * 6);
        for i in 0..=dims.nx {
            for j in 0..=dims.ny {
                let [xb, yb, zb, xt, yt, zt] = self.line_vertices(i, j);
                coordinates.extend_from_slice(&[xt, yt, zt, xb, yb, zb]);
            }
        }
        coordinates
    }

    pub fn to_canonical_depths(&self) -> Result<Vec<f32>> {
        self.to_canonical_depths_with(Tolerance::default())
    }

    /// Canonical corner depths, rejecting nodes whose cells above and below
    /// disagree by more than `tolerance`.
    pub fn to_canonical_depths_with(&self, tolerance: Tolerance) -> Result<Vec<f32>> {
        zvalues::to_canonical_depths(
            &self.dimensions,
            &self.zvalues,
            self.offset[2],
            self.scale[2],
            tolerance,
        )
    }

    /// Canonical ACTNUM values, layers counted from the top.
    pub fn to_canonical_active(&self) -> Vec<i32> {
        let dims = self.dimensions;
        let mut active = Vec::with_capacity(dims.num_cells());
        for i in 0..dims.nx {
            for j in 0..dims.ny {
                for k in 0..dims.nz {
                    let flag = self.active[dims.cell_index(i, j, dims.nz - 1 - k)];
                    active.push(i32::from(flag));
                }
            }
        }
        active
    }

    /// Subgrids as consecutive layer ranges named `subgrid_0`, `subgrid_1`, ...
    pub fn canonical_subgrids(&self) -> Result<Option<Vec<Subgrid>>> {
        let Some(layers) = &self.subgrids else {
            return Ok(None);
        };
        let mut start = 0;
        let mut subgrids = Vec::with_capacity(layers.len());
        for (index, &count) in layers.iter().enumerate() {
            let count = usize::try_from(count).map_err(|_| RoffError::InvalidValue {
                tag: "subgrids",
                key: "nLayers",
                reason: format!("negative layer count {}", count),
            })?;
            subgrids.push(Subgrid::new(format!("subgrid_{}", index), (start..start + count).collect()));
            start += count;
        }
        Ok(Some(subgrids))
    }

    pub fn to_canonical(&self) -> Result<CanonicalGrid> {
        self.to_canonical_with(&ConversionConfig::default())
    }

    /// Convert to the canonical grid with explicit settings.
    pub fn to_canonical_with(&self, config: &ConversionConfig) -> Result<CanonicalGrid> {
        let mut grid = CanonicalGrid::new(
            self.dimensions,
            self.to_canonical_coordinates(),
            self.to_canonical_depths_with(config.split_tolerance)?,
            Some(self.to_canonical_active()),
        )?;
        if let Some(subgrids) = self.canonical_subgrids()? {
            grid = grid.with_subgrids(subgrids)?;
        }
        debug!(dimensions = %grid.dimensions(), "Converted ROFF grid to canonical");
        Ok(grid)
    }

    /// Build a ROFF grid from the canonical grid.
    ///
    /// Depths are stored with split code 4 at every node and a z scale of -1.
    /// The x and y offsets are the floored minimum pillar coordinates, so
    /// local coordinates stay small enough for `f32` even at UTM scale.
    pub fn from_canonical(grid: &CanonicalGrid) -> Result<Self> {
        let dims = grid.dimensions();
        let offset = horizontal_offset(grid.coordinates());
        let [ox, oy, _] = offset.map(f64::from);

        let mut corner_lines = Vec::with_capacity(dims.num_pillars() * 6);
        for i in 0..=dims.nx {
            for j in 0..=dims.ny {
                let p = grid.pillar(i, j);
                corner_lines.extend_from_slice(&[
                    (p[3] - ox) as f32,
                    (p[4] - oy) as f32,
                    -p[5] as f32,
                    (p[0] - ox) as f32,
                    (p[1] - oy) as f32,
                    -p[2] as f32,
                ]);
            }
        }

        let zvalues = zvalues::from_canonical_depths(&dims, grid.corner_depths())?;

        let mut active = Vec::with_capacity(dims.num_cells());
        for i in 0..dims.nx {
            for j in 0..dims.ny {
                for k in 0..dims.nz {
                    active.push(grid.is_active(i, j, dims.nz - 1 - k));
                }
            }
        }

        let subgrids = match grid.subgrids() {
            Some(subgrids) => Some(
                subgrids
                    .iter()
                    .map(|subgrid| {
                        subgrid
                            .consecutive_len()
                            .map(|len| len as i32)
                            .ok_or_else(|| RoffError::NonContiguousSubgrid(subgrid.name.clone()))
                    })
                    .collect::<Result<Vec<_>>>()?,
            ),
            None => None,
        };

        Ok(Self {
            dimensions: dims,
            corner_lines,
            zvalues,
            active,
            subgrids,
            offset,
            scale: DEFAULT_SCALE,
        })
    }

    /// Compare the world geometry of two grids.
    ///
    /// Only interior pillars and interior nodes are compared; grids with
    /// different dimensions never match.
    pub fn same_geometry(&self, other: &RoffGrid, tolerance: GeometryTolerance) -> Result<bool> {
        let dims = self.dimensions;
        if dims != other.dimensions {
            return Ok(false);
        }

        let close = |a: f64, b: f64, tol: f64| (a - b).abs() <= tol;

        for i in 1..dims.nx {
            for j in 1..dims.ny {
                let ours = self.line_vertices(i, j);
                let theirs = other.line_vertices(i, j);
                if !ours
                    .iter()
                    .zip(&theirs)
                    .all(|(&a, &b)| close(a, b, tolerance.coordinates))
                {
                    debug!(i, j, "Pillar lines differ");
                    return Ok(false);
                }

                for k in 1..dims.nz {
                    let node = dims.node_index(i, j, k);
                    let ours = self.zvalues.node_values(node)?;
                    let theirs = other.zvalues.node_values(node)?;
                    let matches = ours.iter().zip(&theirs).all(|(&a, &b)| {
                        let a = self.local_to_world([0.0, 0.0, a])[2];
                        let b = other.local_to_world([0.0, 0.0, b])[2];
                        close(a, b, tolerance.depths)
                    });
                    if !matches {
                        debug!(i, j, k, "Node depths differ");
                        return Ok(false);
                    }
                }
            }
        }
        Ok(true)
    }
}

/// Translation moving the grid's x and y minimum near the local origin.
fn horizontal_offset(coordinates: &[f64]) -> [f32; 3] {
    let min_along = |axis: usize| {
        let min = coordinates
            .chunks_exact(3)
            .map(|point| point[axis])
            .fold(f64::INFINITY, f64::min);
        if min.is_finite() {
            min.floor() as f32
        } else {
            0.0
        }
    };
    [min_along(0), min_along(1), 0.0]
}

/// Tag keys indexed by `(tag, key)`, taken out as the grid is assembled.
struct TagKeys {
    values: HashMap<(String, String), RoffValue>,
}

impl TagKeys {
    fn index(tags: Vec<RoffTag>) -> Result<Self> {
        let mut values = HashMap::new();
        for tag in tags {
            if !KNOWN_TAGS.contains(&tag.name.as_str()) {
                warn!(tag = %tag.name, "Ignoring unknown ROFF tag");
                continue;
            }
            for (key, value) in tag.keys {
                let id = (tag.name.clone(), key);
                if values.contains_key(&id) {
                    let (tag, key) = id;
                    return Err(RoffError::DuplicateKey { tag, key });
                }
                values.insert(id, value);
            }
        }
        Ok(Self { values })
    }

    fn take(&mut self, tag: &str, key: &str) -> Option<RoffValue> {
        self.values.remove(&(tag.to_string(), key.to_string()))
    }

    fn optional<T>(
        &mut self,
        tag: &'static str,
        key: &'static str,
        expected: &'static str,
        extract: impl FnOnce(RoffValue) -> std::result::Result<T, RoffValue>,
    ) -> Result<Option<T>> {
        match self.take(tag, key) {
            None => Ok(None),
            Some(value) => extract(value).map(Some).map_err(|value| RoffError::TypeMismatch {
                tag,
                key,
                expected,
                found: value.describe(),
            }),
        }
    }

    fn required<T>(
        &mut self,
        tag: &'static str,
        key: &'static str,
        expected: &'static str,
        extract: impl FnOnce(RoffValue) -> std::result::Result<T, RoffValue>,
    ) -> Result<T> {
        self.optional(tag, key, expected, extract)?
            .ok_or(RoffError::MissingKey { tag, key })
    }

    fn dimension(&mut self, key: &'static str) -> Result<usize> {
        let value = self.required("dimensions", key, "int", |value| match value {
            RoffValue::Int(value) => Ok(value),
            other => Err(other),
        })?;
        usize::try_from(value).map_err(|_| RoffError::InvalidValue {
            tag: "dimensions",
            key,
            reason: format!("negative dimension {}", value),
        })
    }

    fn float_or(&mut self, tag: &'static str, key: &'static str, default: f32) -> Result<f32> {
        let value = self.optional(tag, key, "float", |value| match value {
            RoffValue::Float(value) => Ok(value),
            other => Err(other),
        })?;
        Ok(value.unwrap_or(default))
    }
}
