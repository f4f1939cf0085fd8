//! Sample grid files for testing.
//!
//! Small hand-written files covering the syntax the readers must accept.

/// GRDECL samples.
pub mod grdecl {
    /// The unit cube: pillars at the corners of `[0, 1] x [0, 1]`, depths 0 to 1.
    pub const SINGLE_CELL: &str = "\
SPECGRID
 1 1 1 1 F /
COORD
 0 0 0 0 0 1
 0 1 0 0 1 1
 1 0 0 1 0 1
 1 1 0 1 1 1 /
ZCORN
 0 1 0 1 0 1 0 1 /
";

    /// A 2x2x1 grid exercising comments, padding, repeat counts and the
    /// optional keywords. Cell `(0, 1, 0)` is inactive.
    pub const TWO_BY_TWO: &str = "\
-- Exported grid
ECHO

SPECGRID
 2 2 1 1 F /

MAPUNITS
 'METRES  ' /

MAPAXES
 0.0 1.0 0.0 0.0 1.0 0.0 /

GRIDUNIT
 'METRES  ' '  ' /

GDORIENT
 INC INC INC DOWN RIGHT /

COORD -- pillars
 0 0 0 0 0 1   0 1 0 0 1 1   0 2 0 0 2 1
 1 0 0 1 0 1   1 1 0 1 1 1   1 2 0 1 2 1
 2 0 0 2 0 1   2 1 0 2 1 1   2 2 0 2 2 1
/

ZCORN
 0 1 0 1 0 1 0 1
 0 1 0 1 0 1 0 1
 0 1 0 1 0 1 0 1
 0 1 0 1 0 1 0 1 /

ACTNUM
 1 0 2*1 /
NOECHO
";

    /// A 1x1x2 column whose second layer starts half a unit below the
    /// first layer's bottom at the near-left corner.
    pub const HORIZONTAL_SPLIT: &str = "\
SPECGRID
 1 1 2 1 F /
COORD
 0 0 0 0 0 2
 0 1 0 0 1 2
 1 0 0 1 0 2
 1 1 0 1 1 2 /
ZCORN
 0 1 1.5 2
 0 1 1 2
 0 1 1 2
 0 1 1 2 /
";

    /// SPECGRID declaring cylindrical coordinates.
    pub const CYLINDRICAL: &str = "\
SPECGRID
 1 1 1 1 T /
COORD
 24*0 /
ZCORN
 8*0 /
";
}

/// ROFF samples.
pub mod roff {
    /// The unit cube as an ASCII ROFF grid, all cells active.
    ///
    /// Corner lines are stored bottom first with z pointing up. Nodes run
    /// bottom to top within each pillar, and the scale flips z so that world
    /// depth runs from 0 at the top to 1 at the bottom.
    pub const SINGLE_CELL_ASCII: &str = "\
roff-asc
#ROFF file#
#Creator: hand written#
tag filedata
int byteswaptest 1
char filetype \"grid\"
char creationDate \"01/01/2024 00:00:00\"
endtag
tag version
int major 2
int minor 0
endtag
tag dimensions
int nX 1
int nY 1
int nZ 1
endtag
tag translate
float xoffset 0.0
float yoffset 0.0
float zoffset 0.0
endtag
tag scale
float xscale 1.0
float yscale 1.0
float zscale -1.0
endtag
tag cornerLines
array float data 24
 0.0 0.0 -1.0 0.0 0.0 0.0
 0.0 1.0 -1.0 0.0 1.0 0.0
 1.0 0.0 -1.0 1.0 0.0 0.0
 1.0 1.0 -1.0 1.0 1.0 0.0
endtag
tag zvalues
array byte splitEnz 8
 1 1 1 1 1 1 1 1
array float data 8
 -1.0 0.0 -1.0 0.0 -1.0 0.0 -1.0 0.0
endtag
tag active
array bool data 1
 1
endtag
tag eof
endtag
";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_end_with_newline() {
        for text in [
            grdecl::SINGLE_CELL,
            grdecl::TWO_BY_TWO,
            grdecl::HORIZONTAL_SPLIT,
            grdecl::CYLINDRICAL,
            roff::SINGLE_CELL_ASCII,
        ] {
            assert!(text.ends_with('\n'));
        }
    }

    #[test]
    fn test_roff_fixture_header() {
        assert!(roff::SINGLE_CELL_ASCII.starts_with("roff-asc\n"));
        assert!(roff::SINGLE_CELL_ASCII.contains("tag eof"));
    }
}
