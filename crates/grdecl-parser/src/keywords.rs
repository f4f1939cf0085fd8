//! Typed GRDECL keyword records.
//!
//! Each record converts to and from the flat value list of its keyword.
//! String values are compared with [`match_keyword`], so `'METRES  '` and
//! `METRES` are the same unit.

use grid_common::Dimensions;

use crate::error::{GrdeclError, Result};
use crate::lexer::{match_keyword, Value};

/// A keyword record with a fixed value layout.
pub trait GrdeclKeyword: Sized {
    /// Keyword name as written in files.
    const KEYWORD: &'static str;

    /// Values written after the keyword.
    fn to_grdecl(&self) -> Vec<Value>;

    /// Build the record from the values read after the keyword.
    fn from_grdecl(values: &[Value]) -> Result<Self>;
}

macro_rules! keyword_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn to_grdecl(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }

            pub fn from_grdecl(s: &str) -> Option<Self> {
                $(
                    if match_keyword(s, $text) {
                        return Some(Self::$variant);
                    }
                )+
                None
            }
        }
    };
}

keyword_enum! {
    /// Length unit of grid coordinates.
    Units {
        Metres => "METRES",
        Feet => "FEET",
        Cm => "CM",
    }
}

keyword_enum! {
    /// Direction in which an index runs.
    Order {
        Increasing => "INC",
        Decreasing => "DEC",
    }
}

keyword_enum! {
    /// Direction of the z axis.
    Orientation {
        Up => "UP",
        Down => "DOWN",
    }
}

keyword_enum! {
    /// Handedness of the grid axes.
    Handedness {
        Left => "LEFT",
        Right => "RIGHT",
    }
}

keyword_enum! {
    /// Coordinate system of COORD, written as the SPECGRID flag `F` / `T`.
    CoordinateType {
        Cartesian => "F",
        Cylindrical => "T",
    }
}

/// Whether grid coordinates are relative to the map origin or the grid origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GridRelative {
    Map,
    #[default]
    Origin,
}

impl GridRelative {
    /// `MAP` for map relative grids; origin relative grids write nothing.
    pub fn to_grdecl(&self) -> Option<&'static str> {
        match self {
            GridRelative::Map => Some("MAP"),
            GridRelative::Origin => None,
        }
    }

    pub fn from_grdecl(s: &str) -> Self {
        if match_keyword(s, "MAP") {
            GridRelative::Map
        } else {
            GridRelative::Origin
        }
    }
}

fn expect_len(keyword: &'static str, values: &[Value], expected: usize) -> Result<()> {
    if values.len() != expected {
        return Err(GrdeclError::invalid_record(
            keyword,
            format!("expected {} values, got {}", expected, values.len()),
        ));
    }
    Ok(())
}

fn number(keyword: &'static str, value: &Value) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| GrdeclError::invalid_record(keyword, format!("expected a number, got {}", value)))
}

fn positive_int(keyword: &'static str, value: &Value) -> Result<usize> {
    match value.as_i64() {
        Some(v) if v > 0 => Ok(v as usize),
        _ => Err(GrdeclError::invalid_record(
            keyword,
            format!("expected a positive integer, got {}", value),
        )),
    }
}

fn word<T>(keyword: &'static str, value: &Value, parse: fn(&str) -> Option<T>) -> Result<T> {
    value
        .as_str()
        .and_then(parse)
        .ok_or_else(|| GrdeclError::invalid_record(keyword, format!("unexpected value {}", value)))
}

/// Unit of the map coordinates in MAPAXES.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapUnits(pub Units);

impl GrdeclKeyword for MapUnits {
    const KEYWORD: &'static str = "MAPUNITS";

    fn to_grdecl(&self) -> Vec<Value> {
        vec![Value::from(self.0.to_grdecl())]
    }

    fn from_grdecl(values: &[Value]) -> Result<Self> {
        expect_len(Self::KEYWORD, values, 1)?;
        word(Self::KEYWORD, &values[0], Units::from_grdecl).map(MapUnits)
    }
}

/// Local-to-map transform given by three points: a point on the y axis,
/// the origin, and a point on the x axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapAxes {
    pub y_line: (f64, f64),
    pub origin: (f64, f64),
    pub x_line: (f64, f64),
}

impl Default for MapAxes {
    fn default() -> Self {
        Self {
            y_line: (0.0, 1.0),
            origin: (0.0, 0.0),
            x_line: (1.0, 0.0),
        }
    }
}

impl GrdeclKeyword for MapAxes {
    const KEYWORD: &'static str = "MAPAXES";

    fn to_grdecl(&self) -> Vec<Value> {
        [self.y_line, self.origin, self.x_line]
            .into_iter()
            .flat_map(|(x, y)| [Value::Float(x), Value::Float(y)])
            .collect()
    }

    fn from_grdecl(values: &[Value]) -> Result<Self> {
        expect_len(Self::KEYWORD, values, 6)?;
        let v = values
            .iter()
            .map(|value| number(Self::KEYWORD, value))
            .collect::<Result<Vec<f64>>>()?;
        Ok(Self {
            y_line: (v[0], v[1]),
            origin: (v[2], v[3]),
            x_line: (v[4], v[5]),
        })
    }
}

/// Grid orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GdOrient {
    pub i_order: Order,
    pub j_order: Order,
    pub k_order: Order,
    pub z_direction: Orientation,
    pub handedness: Handedness,
}

impl Default for GdOrient {
    fn default() -> Self {
        Self {
            i_order: Order::Increasing,
            j_order: Order::Increasing,
            k_order: Order::Increasing,
            z_direction: Orientation::Down,
            handedness: Handedness::Right,
        }
    }
}

impl GrdeclKeyword for GdOrient {
    const KEYWORD: &'static str = "GDORIENT";

    fn to_grdecl(&self) -> Vec<Value> {
        vec![
            Value::from(self.i_order.to_grdecl()),
            Value::from(self.j_order.to_grdecl()),
            Value::from(self.k_order.to_grdecl()),
            Value::from(self.z_direction.to_grdecl()),
            Value::from(self.handedness.to_grdecl()),
        ]
    }

    fn from_grdecl(values: &[Value]) -> Result<Self> {
        expect_len(Self::KEYWORD, values, 5)?;
        Ok(Self {
            i_order: word(Self::KEYWORD, &values[0], Order::from_grdecl)?,
            j_order: word(Self::KEYWORD, &values[1], Order::from_grdecl)?,
            k_order: word(Self::KEYWORD, &values[2], Order::from_grdecl)?,
            z_direction: word(Self::KEYWORD, &values[3], Orientation::from_grdecl)?,
            handedness: word(Self::KEYWORD, &values[4], Handedness::from_grdecl)?,
        })
    }
}

/// Grid dimensions and coordinate system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecGrid {
    pub ndivix: usize,
    pub ndiviy: usize,
    pub ndiviz: usize,
    pub numres: usize,
    pub coordinate_type: CoordinateType,
}

impl SpecGrid {
    /// Cartesian single-reservoir grid of the given size.
    pub fn new(ndivix: usize, ndiviy: usize, ndiviz: usize) -> Self {
        Self {
            ndivix,
            ndiviy,
            ndiviz,
            numres: 1,
            coordinate_type: CoordinateType::Cartesian,
        }
    }
}

impl Default for SpecGrid {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

impl GrdeclKeyword for SpecGrid {
    const KEYWORD: &'static str = "SPECGRID";

    fn to_grdecl(&self) -> Vec<Value> {
        vec![
            Value::Int(self.ndivix as i64),
            Value::Int(self.ndiviy as i64),
            Value::Int(self.ndiviz as i64),
            Value::Int(self.numres as i64),
            Value::from(self.coordinate_type.to_grdecl()),
        ]
    }

    fn from_grdecl(values: &[Value]) -> Result<Self> {
        expect_len(Self::KEYWORD, values, 5)?;
        let ndivix = positive_int(Self::KEYWORD, &values[0])?;
        let ndiviy = positive_int(Self::KEYWORD, &values[1])?;
        let ndiviz = positive_int(Self::KEYWORD, &values[2])?;
        Dimensions::new(ndivix, ndiviy, ndiviz)
            .map_err(|err| GrdeclError::invalid_record(Self::KEYWORD, err.to_string()))?;
        Ok(Self {
            ndivix,
            ndiviy,
            ndiviz,
            numres: positive_int(Self::KEYWORD, &values[3])?,
            coordinate_type: word(Self::KEYWORD, &values[4], CoordinateType::from_grdecl)?,
        })
    }
}

/// Unit of the grid data and what the coordinates are relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridUnit {
    pub unit: Units,
    pub grid_relative: GridRelative,
}

impl Default for GridUnit {
    fn default() -> Self {
        Self {
            unit: Units::Metres,
            grid_relative: GridRelative::Origin,
        }
    }
}

impl GrdeclKeyword for GridUnit {
    const KEYWORD: &'static str = "GRIDUNIT";

    fn to_grdecl(&self) -> Vec<Value> {
        let mut values = vec![Value::from(self.unit.to_grdecl())];
        values.extend(self.grid_relative.to_grdecl().map(Value::from));
        values
    }

    fn from_grdecl(values: &[Value]) -> Result<Self> {
        let unit = match values.first() {
            Some(value) if values.len() <= 2 => word(Self::KEYWORD, value, Units::from_grdecl)?,
            _ => {
                return Err(GrdeclError::invalid_record(
                    Self::KEYWORD,
                    format!("expected 1 or 2 values, got {}", values.len()),
                ))
            }
        };
        let grid_relative = match values.get(1) {
            Some(Value::Str(s)) => GridRelative::from_grdecl(s),
            Some(other) => {
                return Err(GrdeclError::invalid_record(
                    Self::KEYWORD,
                    format!("unexpected value {}", other),
                ))
            }
            None => GridRelative::Origin,
        };
        Ok(Self {
            unit,
            grid_relative,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::interpret_token;

    fn values(text: &str) -> Vec<Value> {
        crate::lexer::split_line(text)
            .flat_map(|token| interpret_token(&token).unwrap())
            .collect()
    }

    #[test]
    fn test_units_padding() {
        assert_eq!(Units::from_grdecl("METRES  "), Some(Units::Metres));
        assert_eq!(Units::from_grdecl("FEET"), Some(Units::Feet));
        assert_eq!(Units::from_grdecl("INCHES"), None);
    }

    #[test]
    fn test_specgrid_from_values() {
        let spec = SpecGrid::from_grdecl(&values("4 3 2 1 F")).unwrap();
        assert_eq!(spec, SpecGrid::new(4, 3, 2));

        let spec = SpecGrid::from_grdecl(&values("4 3 2 1 'T'")).unwrap();
        assert_eq!(spec.coordinate_type, CoordinateType::Cylindrical);
    }

    #[test]
    fn test_specgrid_wrong_length() {
        let err = SpecGrid::from_grdecl(&values("4 3 2")).unwrap_err();
        assert!(err.to_string().contains("SPECGRID"));
        assert!(err.is_format_error());
    }

    #[test]
    fn test_specgrid_rejects_zero() {
        assert!(SpecGrid::from_grdecl(&values("0 3 2 1 F")).is_err());
        assert!(SpecGrid::from_grdecl(&values("1.5 3 2 1 F")).is_err());
    }

    #[test]
    fn test_specgrid_rejects_unindexable_size() {
        let err = SpecGrid::from_grdecl(&values("4000000000 4000000000 2 1 F")).unwrap_err();
        assert!(err.is_format_error());
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn test_mapaxes_roundtrip() {
        let axes = MapAxes {
            y_line: (0.5, 101.25),
            origin: (0.5, 0.0),
            x_line: (-3.0, 0.0),
        };
        let text: Vec<String> = axes.to_grdecl().iter().map(|v| v.to_string()).collect();
        assert_eq!(MapAxes::from_grdecl(&values(&text.join(" "))).unwrap(), axes);
    }

    #[test]
    fn test_mapaxes_requires_numbers() {
        assert!(MapAxes::from_grdecl(&values("1 2 3 4 5 X")).is_err());
        assert!(MapAxes::from_grdecl(&values("1 2 3 4 5")).is_err());
    }

    #[test]
    fn test_gdorient() {
        let orient = GdOrient::from_grdecl(&values("INC INC INC DOWN RIGHT")).unwrap();
        assert_eq!(orient, GdOrient::default());

        let orient = GdOrient::from_grdecl(&values("DEC INC INC UP LEFT")).unwrap();
        assert_eq!(orient.i_order, Order::Decreasing);
        assert_eq!(orient.z_direction, Orientation::Up);
        assert_eq!(orient.handedness, Handedness::Left);

        assert!(GdOrient::from_grdecl(&values("INC INC INC SIDEWAYS RIGHT")).is_err());
    }

    #[test]
    fn test_gridunit_forms() {
        let unit = GridUnit::from_grdecl(&values("'METRES  '")).unwrap();
        assert_eq!(unit, GridUnit::default());

        let unit = GridUnit::from_grdecl(&values("FEET MAP")).unwrap();
        assert_eq!(unit.unit, Units::Feet);
        assert_eq!(unit.grid_relative, GridRelative::Map);

        let unit = GridUnit::from_grdecl(&values("CM '    '")).unwrap();
        assert_eq!(unit.grid_relative, GridRelative::Origin);

        assert!(GridUnit::from_grdecl(&[]).is_err());
        assert!(GridUnit::from_grdecl(&values("CM MAP X")).is_err());
    }

    #[test]
    fn test_gridunit_to_grdecl_omits_origin() {
        assert_eq!(GridUnit::default().to_grdecl(), vec![Value::from("METRES")]);
        let map = GridUnit {
            unit: Units::Cm,
            grid_relative: GridRelative::Map,
        };
        assert_eq!(map.to_grdecl(), vec![Value::from("CM"), Value::from("MAP")]);
    }

    #[test]
    fn test_mapunits_record() {
        assert_eq!(MapUnits::from_grdecl(&values("FEET")).unwrap(), MapUnits(Units::Feet));
        assert!(MapUnits::from_grdecl(&values("FEET CM")).is_err());
        assert_eq!(MapUnits(Units::Cm).to_grdecl(), vec![Value::from("CM")]);
    }
}
