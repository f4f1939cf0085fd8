//! Configuration for grid conversions.

use serde::{Deserialize, Serialize};

use crate::error::{GridError, GridResult};

/// Closeness test used when two depths must describe the same point.
///
/// Two values are close when `|a - b| <= absolute + relative * |b|`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    pub absolute: f64,
    pub relative: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            absolute: 1e-8,
            relative: 1e-5,
        }
    }
}

impl Tolerance {
    pub fn new(absolute: f64, relative: f64) -> Self {
        Self { absolute, relative }
    }

    /// Check whether `a` and `b` are within tolerance. NaN is never close.
    pub fn is_close(&self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.absolute + self.relative * b.abs()
    }
}

/// Absolute tolerances for comparing two grids' world geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometryTolerance {
    /// Pillar end point coordinates.
    pub coordinates: f64,
    /// Node depths.
    pub depths: f64,
}

impl Default for GeometryTolerance {
    fn default() -> Self {
        Self {
            coordinates: 0.1,
            depths: 0.2,
        }
    }
}

/// Encoding used when writing ROFF files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoffFormat {
    #[default]
    Binary,
    Ascii,
}

impl RoffFormat {
    /// Parse from string (case-insensitive), defaulting to binary.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "ascii" | "asc" | "roff-asc" => Self::Ascii,
            _ => Self::Binary,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Ascii => "ascii",
        }
    }
}

/// Settings shared by every conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Tolerance for detecting horizontally split nodes.
    pub split_tolerance: Tolerance,

    /// Significant keyword length when reading GRDECL (`None` = unconstrained).
    pub grdecl_keyword_max_len: Option<usize>,

    /// Fail on unknown GRDECL keywords instead of skipping them.
    ///
    /// `ECHO` and `NOECHO` are tolerated either way.
    pub grdecl_strict_keywords: bool,

    /// Tolerances for ROFF geometry comparison.
    pub geometry_tolerance: GeometryTolerance,

    /// Encoding for written ROFF files.
    pub roff_output_format: RoffFormat,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            split_tolerance: Tolerance::default(),
            grdecl_keyword_max_len: Some(8),
            grdecl_strict_keywords: false,
            geometry_tolerance: GeometryTolerance::default(),
            roff_output_format: RoffFormat::Binary,
        }
    }
}

impl ConversionConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("GRID_SPLIT_ATOL") {
            if let Ok(tol) = val.parse() {
                config.split_tolerance.absolute = tol;
            }
        }

        if let Ok(val) = std::env::var("GRID_SPLIT_RTOL") {
            if let Ok(tol) = val.parse() {
                config.split_tolerance.relative = tol;
            }
        }

        if let Ok(val) = std::env::var("GRDECL_KEYWORD_MAX_LEN") {
            if let Ok(len) = val.parse::<usize>() {
                config.grdecl_keyword_max_len = (len > 0).then_some(len);
            }
        }

        if let Ok(val) = std::env::var("GRDECL_STRICT_KEYWORDS") {
            config.grdecl_strict_keywords = val.to_lowercase() == "true" || val == "1";
        }

        if let Ok(val) = std::env::var("ROFF_GEOMETRY_COORD_TOL") {
            if let Ok(tol) = val.parse() {
                config.geometry_tolerance.coordinates = tol;
            }
        }

        if let Ok(val) = std::env::var("ROFF_GEOMETRY_DEPTH_TOL") {
            if let Ok(tol) = val.parse() {
                config.geometry_tolerance.depths = tol;
            }
        }

        if let Ok(val) = std::env::var("ROFF_OUTPUT_FORMAT") {
            config.roff_output_format = RoffFormat::from_str(&val);
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> GridResult<()> {
        let tolerances = [
            ("split_tolerance.absolute", self.split_tolerance.absolute),
            ("split_tolerance.relative", self.split_tolerance.relative),
            ("geometry_tolerance.coordinates", self.geometry_tolerance.coordinates),
            ("geometry_tolerance.depths", self.geometry_tolerance.depths),
        ];
        for (name, value) in tolerances {
            if !value.is_finite() || value < 0.0 {
                return Err(GridError::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        if self.grdecl_keyword_max_len == Some(0) {
            return Err(GridError::InvalidConfig(
                "grdecl_keyword_max_len must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = ConversionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.grdecl_keyword_max_len, Some(8));
        assert_eq!(config.roff_output_format, RoffFormat::Binary);
    }

    #[test]
    fn test_validate_rejects_negative_tolerance() {
        let mut config = ConversionConfig::default();
        config.geometry_tolerance.depths = -0.1;
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("geometry_tolerance.depths"));

        let mut config = ConversionConfig::default();
        config.split_tolerance.absolute = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_keyword_length() {
        let config = ConversionConfig {
            grdecl_keyword_max_len: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tolerance_is_close() {
        let tol = Tolerance::default();
        assert!(tol.is_close(1000.0, 1000.005));
        assert!(!tol.is_close(1000.0, 1000.1));
        assert!(!tol.is_close(f64::NAN, f64::NAN));
        assert!(Tolerance::new(0.5, 0.0).is_close(1.0, 1.4));
    }

    #[test]
    fn test_roff_format_from_str() {
        assert_eq!(RoffFormat::from_str("ASCII"), RoffFormat::Ascii);
        assert_eq!(RoffFormat::from_str("roff-asc"), RoffFormat::Ascii);
        assert_eq!(RoffFormat::from_str("binary"), RoffFormat::Binary);
        assert_eq!(RoffFormat::from_str("whatever"), RoffFormat::Binary);
    }
}
