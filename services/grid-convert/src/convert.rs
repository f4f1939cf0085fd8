//! Conversion between grid files through the canonical grid.

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use grdecl_parser::GrdeclGrid;
use grid_common::{CanonicalGrid, ConversionConfig, RoffFormat};
use roff_parser::RoffGrid;
use tracing::{info, warn};

/// On-disk grid format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GridFormat {
    Grdecl,
    Roff,
}

impl GridFormat {
    /// Format implied by a file extension, ignoring case.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "grdecl" => Some(GridFormat::Grdecl),
            "roff" | "roffbin" | "roffasc" => Some(GridFormat::Roff),
            _ => None,
        }
    }

    /// Use `explicit` if given, otherwise infer from the path.
    pub fn resolve(explicit: Option<Self>, path: &Path) -> Result<Self> {
        match explicit.or_else(|| Self::from_path(path)) {
            Some(format) => Ok(format),
            None => bail!(
                "Cannot tell the grid format of {}, pass --from/--to grdecl|roff",
                path.display()
            ),
        }
    }
}

/// A single conversion job.
#[derive(Debug, Clone)]
pub struct Conversion<'a> {
    pub input: &'a Path,
    pub input_format: GridFormat,
    pub output: &'a Path,
    pub output_format: GridFormat,
    pub roff_format: RoffFormat,
    /// Re-read the output and compare it with the input grid.
    pub check: bool,
}

impl Conversion<'_> {
    pub fn run(&self, config: &ConversionConfig) -> Result<CanonicalGrid> {
        let grid = read_canonical(self.input, self.input_format, config)
            .with_context(|| format!("Failed to read {}", self.input.display()))?;
        info!(
            input = %self.input.display(),
            dimensions = %grid.dimensions(),
            "Loaded grid"
        );

        write_canonical(&grid, self.output, self.output_format, self.roff_format)
            .with_context(|| format!("Failed to write {}", self.output.display()))?;

        if self.check {
            self.check_output(&grid, config)?;
        }
        Ok(grid)
    }

    fn check_output(&self, grid: &CanonicalGrid, config: &ConversionConfig) -> Result<()> {
        let reread = read_canonical(self.output, self.output_format, config)
            .with_context(|| format!("Failed to re-read {}", self.output.display()))?;

        let expected = match self.output_format {
            GridFormat::Grdecl => without_subgrids(grid)?,
            GridFormat::Roff => grid.clone(),
        };
        let tolerance = config
            .geometry_tolerance
            .coordinates
            .min(config.geometry_tolerance.depths);
        if !reread.approx_eq(&expected, tolerance) {
            bail!(
                "{} does not re-read to the same grid (tolerance {})",
                self.output.display(),
                tolerance
            );
        }
        info!(output = %self.output.display(), "Output re-reads to the same grid");
        Ok(())
    }
}

/// Read a grid file and convert it to the canonical grid.
pub fn read_canonical(path: &Path, format: GridFormat, config: &ConversionConfig) -> Result<CanonicalGrid> {
    let grid = match format {
        GridFormat::Grdecl => GrdeclGrid::from_file_with(path, config)?.to_canonical_with(config)?,
        GridFormat::Roff => RoffGrid::from_file(path)?.to_canonical_with(config)?,
    };
    Ok(grid)
}

/// Write the canonical grid in the given format.
pub fn write_canonical(
    grid: &CanonicalGrid,
    path: &Path,
    format: GridFormat,
    roff_format: RoffFormat,
) -> Result<()> {
    match format {
        GridFormat::Grdecl => {
            if grid.subgrids().is_some() {
                warn!("GRDECL has no subgrids, dropping them");
            }
            GrdeclGrid::from_canonical(grid)?.to_file(path)?;
        }
        GridFormat::Roff => RoffGrid::from_canonical(grid)?.to_file(path, roff_format)?,
    }
    Ok(())
}

fn without_subgrids(grid: &CanonicalGrid) -> Result<CanonicalGrid> {
    Ok(CanonicalGrid::new(
        grid.dimensions(),
        grid.coordinates().to_vec(),
        grid.corner_depths().to_vec(),
        Some(grid.active().to_vec()),
    )?)
}
