//! GRDECL grid model.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use grid_common::{CanonicalGrid, ConversionConfig, Dimensions, GridError, Tolerance};
use tracing::{debug, info};

use crate::error::{GrdeclError, Result};
use crate::keywords::{
    CoordinateType, GdOrient, GrdeclKeyword, GridRelative, GridUnit, MapAxes, MapUnits, SpecGrid,
};
use crate::lexer::Value;
use crate::reader::{GrdeclReader, IgnorePolicy, ReaderOptions};
use crate::zcorn;

/// Keywords read from a GRDECL grid file.
pub const GRID_KEYWORDS: [&str; 8] = [
    "COORD", "ZCORN", "ACTNUM", "MAPAXES", "MAPUNITS", "GRIDUNIT", "SPECGRID", "GDORIENT",
];

/// Data-less keywords accepted between records in strict mode.
pub const TOLERATED_KEYWORDS: [&str; 2] = ["ECHO", "NOECHO"];

/// A corner-point grid as stored in a GRDECL file.
///
/// COORD holds `[x_top, y_top, z_top, x_bot, y_bot, z_bot]` per pillar with
/// pillars ordered `i * (ny + 1) + j`; ACTNUM is ordered `(i * ny + j) * nz + k`.
/// See [`crate::zcorn`] for the ZCORN layout.
#[derive(Debug, Clone, PartialEq)]
pub struct GrdeclGrid {
    pub specgrid: SpecGrid,
    pub coord: Vec<f64>,
    pub zcorn: Vec<f32>,
    pub actnum: Option<Vec<i32>>,
    pub mapaxes: Option<MapAxes>,
    pub mapunits: Option<MapUnits>,
    pub gridunit: Option<GridUnit>,
    pub gdorient: Option<GdOrient>,
}

#[derive(Default)]
struct FoundKeywords {
    coord: Option<Vec<f64>>,
    zcorn: Option<Vec<f32>>,
    actnum: Option<Vec<i32>>,
    mapaxes: Option<MapAxes>,
    mapunits: Option<MapUnits>,
    gridunit: Option<GridUnit>,
    specgrid: Option<SpecGrid>,
    gdorient: Option<GdOrient>,
}

fn number_array(keyword: &'static str, values: &[Value]) -> Result<Vec<f64>> {
    values
        .iter()
        .map(|value| {
            value.as_f64().ok_or_else(|| {
                GrdeclError::invalid_record(keyword, format!("expected a number, got {}", value))
            })
        })
        .collect()
}

fn float_array(keyword: &'static str, values: &[Value]) -> Result<Vec<f32>> {
    Ok(number_array(keyword, values)?.into_iter().map(|v| v as f32).collect())
}

fn int_array(keyword: &'static str, values: &[Value]) -> Result<Vec<i32>> {
    values
        .iter()
        .map(|value| {
            value
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .ok_or_else(|| {
                    GrdeclError::invalid_record(keyword, format!("expected an integer, got {}", value))
                })
        })
        .collect()
}

impl GrdeclGrid {
    /// Read a grid from a GRDECL file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_file_with(path, &ConversionConfig::default())
    }

    /// Read a grid from a GRDECL file with explicit settings.
    pub fn from_file_with(path: impl AsRef<Path>, config: &ConversionConfig) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let grid = Self::from_reader_with(BufReader::new(file), config)?;
        info!(
            path = %path.display(),
            dimensions = %grid.dimensions(),
            "Read GRDECL grid"
        );
        Ok(grid)
    }

    /// Read a grid from a GRDECL stream.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        Self::from_reader_with(reader, &ConversionConfig::default())
    }

    /// Read a grid from a GRDECL stream with explicit settings.
    ///
    /// Reading stops once every grid keyword has been seen. Each keyword may
    /// appear at most once; COORD, ZCORN and SPECGRID are required.
    pub fn from_reader_with<R: BufRead>(reader: R, config: &ConversionConfig) -> Result<Self> {
        let ignore = if config.grdecl_strict_keywords {
            IgnorePolicy::Only(TOLERATED_KEYWORDS.iter().map(|kw| kw.to_string()).collect())
        } else {
            IgnorePolicy::Unlisted
        };
        let options = ReaderOptions {
            max_len: config.grdecl_keyword_max_len,
            ignore,
            ..Default::default()
        };

        let mut found = FoundKeywords::default();
        let mut seen = HashSet::new();

        for record in GrdeclReader::new(reader, &GRID_KEYWORDS, options) {
            let record = record?;
            if !seen.insert(record.keyword.clone()) {
                return Err(GrdeclError::DuplicateKeyword {
                    keyword: record.keyword,
                    line: record.line,
                });
            }

            let values = &record.values;
            match record.keyword.as_str() {
                "COORD" => found.coord = Some(number_array("COORD", values)?),
                "ZCORN" => found.zcorn = Some(float_array("ZCORN", values)?),
                "ACTNUM" => found.actnum = Some(int_array("ACTNUM", values)?),
                "MAPAXES" => found.mapaxes = Some(MapAxes::from_grdecl(values)?),
                "MAPUNITS" => found.mapunits = Some(MapUnits::from_grdecl(values)?),
                "GRIDUNIT" => found.gridunit = Some(GridUnit::from_grdecl(values)?),
                "SPECGRID" => found.specgrid = Some(SpecGrid::from_grdecl(values)?),
                "GDORIENT" => found.gdorient = Some(GdOrient::from_grdecl(values)?),
                other => debug!(keyword = other, "Ignoring keyword"),
            }

            if seen.len() == GRID_KEYWORDS.len() {
                break;
            }
        }

        Ok(Self {
            specgrid: found.specgrid.ok_or(GrdeclError::MissingKeyword("SPECGRID"))?,
            coord: found.coord.ok_or(GrdeclError::MissingKeyword("COORD"))?,
            zcorn: found.zcorn.ok_or(GrdeclError::MissingKeyword("ZCORN"))?,
            actnum: found.actnum,
            mapaxes: found.mapaxes,
            mapunits: found.mapunits,
            gridunit: found.gridunit,
            gdorient: found.gdorient,
        })
    }

    /// Write the grid to a GRDECL file.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        self.to_writer(&mut writer)?;
        writer.flush()?;
        info!(
            path = %path.display(),
            dimensions = %self.dimensions(),
            "Wrote GRDECL grid"
        );
        Ok(())
    }

    /// Write the grid as GRDECL records. Absent optional keywords are omitted.
    pub fn to_writer<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_record(writer, SpecGrid::KEYWORD, &self.specgrid.to_grdecl())?;
        if let Some(mapaxes) = &self.mapaxes {
            write_record(writer, MapAxes::KEYWORD, &mapaxes.to_grdecl())?;
        }
        if let Some(mapunits) = &self.mapunits {
            write_record(writer, MapUnits::KEYWORD, &mapunits.to_grdecl())?;
        }
        if let Some(gridunit) = &self.gridunit {
            write_record(writer, GridUnit::KEYWORD, &gridunit.to_grdecl())?;
        }
        if let Some(gdorient) = &self.gdorient {
            write_record(writer, GdOrient::KEYWORD, &gdorient.to_grdecl())?;
        }
        write_record(writer, "COORD", &self.coord)?;
        // widen to f64 so the written text reads back to the same f32
        write_record(writer, "ZCORN", self.zcorn.iter().map(|&v| f64::from(v)))?;
        if let Some(actnum) = &self.actnum {
            write_record(writer, "ACTNUM", actnum)?;
        }
        Ok(())
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            nx: self.specgrid.ndivix,
            ny: self.specgrid.ndiviy,
            nz: self.specgrid.ndiviz,
        }
    }

    /// Reject grids the canonical layout cannot represent.
    pub fn check_canonical_compatible(&self) -> Result<()> {
        if self
            .gridunit
            .is_some_and(|unit| unit.grid_relative == GridRelative::Map)
        {
            return Err(GrdeclError::Unsupported(
                "map relative grid units are not supported".to_string(),
            ));
        }
        if self.specgrid.coordinate_type == CoordinateType::Cylindrical {
            return Err(GrdeclError::Unsupported(
                "cylindrical coordinate systems are not supported".to_string(),
            ));
        }
        if self.gdorient.is_some_and(|orient| orient != GdOrient::default()) {
            return Err(GrdeclError::Unsupported(
                "only the default grid orientation (INC INC INC DOWN RIGHT) is supported".to_string(),
            ));
        }
        Ok(())
    }

    /// Pillar coordinates in canonical layout.
    pub fn to_canonical_coordinates(&self) -> Result<Vec<f64>> {
        self.check_canonical_compatible()?;
        let expected = self.dimensions().num_pillars() * 6;
        if self.coord.len() != expected {
            return Err(GridError::shape_mismatch("coord", expected, self.coord.len()).into());
        }
        Ok(self.coord.clone())
    }

    /// ACTNUM in canonical layout; all active when the grid has none.
    pub fn to_canonical_active(&self) -> Result<Vec<i32>> {
        self.check_canonical_compatible()?;
        let dims = self.dimensions();
        match &self.actnum {
            Some(actnum) if actnum.len() != dims.num_cells() => {
                Err(GridError::shape_mismatch("actnum", dims.num_cells(), actnum.len()).into())
            }
            Some(actnum) => Ok(actnum.clone()),
            None => Ok(vec![1; dims.num_cells()]),
        }
    }

    /// Corner depths in canonical layout, using the default split tolerance.
    pub fn to_canonical_depths(&self) -> Result<Vec<f32>> {
        self.to_canonical_depths_with(Tolerance::default())
    }

    /// Corner depths in canonical layout.
    ///
    /// Fails with [`GrdeclError::HorizontalSplit`] when vertically adjacent
    /// cells disagree beyond `tolerance`.
    pub fn to_canonical_depths_with(&self, tolerance: Tolerance) -> Result<Vec<f32>> {
        self.check_canonical_compatible()?;
        zcorn::to_canonical_depths(&self.dimensions(), &self.zcorn, tolerance)
    }

    /// Convert to the canonical grid.
    pub fn to_canonical(&self) -> Result<CanonicalGrid> {
        self.to_canonical_with(&ConversionConfig::default())
    }

    /// Convert to the canonical grid with explicit settings.
    pub fn to_canonical_with(&self, config: &ConversionConfig) -> Result<CanonicalGrid> {
        let grid = CanonicalGrid::new(
            self.dimensions(),
            self.to_canonical_coordinates()?,
            self.to_canonical_depths_with(config.split_tolerance)?,
            Some(self.to_canonical_active()?),
        )?;
        debug!(dimensions = %grid.dimensions(), "Converted GRDECL grid to canonical");
        Ok(grid)
    }

    /// Build a GRDECL grid from the canonical grid.
    ///
    /// ACTNUM is omitted when every cell is active.
    pub fn from_canonical(grid: &CanonicalGrid) -> Result<Self> {
        let dims = grid.dimensions();
        let actnum = (!grid.is_all_active()).then(|| grid.active().to_vec());

        Ok(Self {
            specgrid: SpecGrid::new(dims.nx, dims.ny, dims.nz),
            coord: grid.coordinates().to_vec(),
            zcorn: zcorn::from_canonical_depths(&dims, grid.corner_depths())?,
            actnum,
            mapaxes: None,
            mapunits: None,
            gridunit: None,
            gdorient: None,
        })
    }
}

fn write_record<W, I>(writer: &mut W, keyword: &str, values: I) -> std::io::Result<()>
where
    W: Write,
    I: IntoIterator,
    I::Item: std::fmt::Display,
{
    writeln!(writer, "{}", keyword)?;
    for value in values {
        write!(writer, " {}", value)?;
    }
    writeln!(writer, "\n /")
}
